//! `EventFdNotifier`: Linux notifier.
//!
//! Coalescing: multiple `notify()` calls before the consumer resets result
//! in a single readable event (eventfd counter semantics).

use fsaio_core::error::{AioError, Result};
use fsaio_core::notifier::Notifier;

use nix::errno::Errno;
use nix::sys::eventfd::{EfdFlags, EventFd};

use std::os::fd::{AsFd, AsRawFd, RawFd};

pub struct EventFdNotifier {
    efd: EventFd,
}

impl EventFdNotifier {
    /// Create a non-blocking, close-on-exec eventfd. Closed on drop.
    pub fn create() -> Result<Self> {
        let efd = EventFd::from_value_and_flags(0, EfdFlags::EFD_NONBLOCK | EfdFlags::EFD_CLOEXEC)
            .map_err(|e| AioError::Os(e as i32))?;
        Ok(Self { efd })
    }
}

impl Notifier for EventFdNotifier {
    fn notify(&self) -> Result<()> {
        match self.efd.write(1) {
            Ok(_) => Ok(()),
            // Counter saturated: a wakeup is already pending.
            Err(Errno::EAGAIN) => Ok(()),
            Err(e) => Err(AioError::Os(e as i32)),
        }
    }

    fn reset(&self) {
        // EAGAIN when the counter is already zero.
        let _ = self.efd.read();
    }

    fn fd(&self) -> RawFd {
        self.efd.as_fd().as_raw_fd()
    }
}
