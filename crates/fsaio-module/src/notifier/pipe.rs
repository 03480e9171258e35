//! `PipeNotifier`: self-pipe notifier for unix platforms without eventfd.

use fsaio_core::error::{AioError, Result};
use fsaio_core::notifier::Notifier;

use nix::errno::Errno;
use nix::fcntl::{fcntl, FcntlArg, FdFlag, OFlag};

use std::os::fd::{AsRawFd, OwnedFd, RawFd};

pub struct PipeNotifier {
    rx: OwnedFd,
    tx: OwnedFd,
}

impl PipeNotifier {
    /// Create a non-blocking, close-on-exec pipe pair. Closed on drop.
    pub fn create() -> Result<Self> {
        let (rx, tx) = nix::unistd::pipe().map_err(|e| AioError::Os(e as i32))?;
        for fd in [rx.as_raw_fd(), tx.as_raw_fd()] {
            fcntl(fd, FcntlArg::F_SETFL(OFlag::O_NONBLOCK)).map_err(|e| AioError::Os(e as i32))?;
            fcntl(fd, FcntlArg::F_SETFD(FdFlag::FD_CLOEXEC)).map_err(|e| AioError::Os(e as i32))?;
        }
        Ok(Self { rx, tx })
    }
}

impl Notifier for PipeNotifier {
    fn notify(&self) -> Result<()> {
        match nix::unistd::write(&self.tx, &[1u8]) {
            Ok(_) => Ok(()),
            // Pipe full: the reader already has plenty to wake on.
            Err(Errno::EAGAIN) => Ok(()),
            Err(e) => Err(AioError::Os(e as i32)),
        }
    }

    fn reset(&self) {
        let mut buf = [0u8; 128];
        while let Ok(n) = nix::unistd::read(self.rx.as_raw_fd(), &mut buf) {
            if n < buf.len() {
                break;
            }
        }
    }

    fn fd(&self) -> RawFd {
        self.rx.as_raw_fd()
    }
}
