//! Completion notifiers.
//!
//! The platform notifier gives the event loop a descriptor that becomes
//! readable when finished requests are waiting in the completion queue.

use fsaio_core::error::Result;
use fsaio_core::notifier::Notifier;

cfg_if::cfg_if! {
    if #[cfg(target_os = "linux")] {
        mod eventfd_linux;
        pub use eventfd_linux::EventFdNotifier as PlatformNotifier;
    } else {
        mod pipe;
        pub use pipe::PipeNotifier as PlatformNotifier;
    }
}

/// Create a new platform-appropriate notifier.
pub fn new_notifier() -> Result<Box<dyn Notifier>> {
    Ok(Box::new(PlatformNotifier::create()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn readable(fd: std::os::unix::io::RawFd) -> bool {
        let mut pfd = libc::pollfd { fd, events: libc::POLLIN, revents: 0 };
        let n = unsafe { libc::poll(&mut pfd, 1, 0) };
        n == 1 && (pfd.revents & libc::POLLIN) != 0
    }

    #[test]
    fn test_notify_makes_fd_readable_until_reset() {
        let n = new_notifier().unwrap();
        assert!(n.fd() >= 0);
        assert!(!readable(n.fd()));

        n.notify().unwrap();
        n.notify().unwrap();
        assert!(readable(n.fd()));

        n.reset();
        assert!(!readable(n.fd()));

        // Reset with nothing pending must not block.
        n.reset();
    }
}
