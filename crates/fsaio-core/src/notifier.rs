//! Completion notification abstraction.
//!
//! A `Notifier` wakes the event loop when a finished request lands in the
//! completion queue, so the loop can wait on a descriptor instead of
//! polling on a timer.
//!
//! # Implementors
//!
//! - `EventFdNotifier` (Linux): eventfd counter, one read drains it.
//! - `PipeNotifier` (other unix): non-blocking self-pipe.

use std::os::unix::io::RawFd;

use crate::error::Result;

/// Wakes the polling thread when completions are ready.
///
/// **Contract:**
/// - `notify()` must NEVER block; it runs on worker threads.
/// - Multiple notifications before the consumer wakes may coalesce.
/// - `reset()` is called by the poller *before* draining, so a completion
///   pushed during the drain re-arms the descriptor.
pub trait Notifier: Send + Sync {
    /// Signal that new completions are available.
    fn notify(&self) -> Result<()>;

    /// Consume pending signals. Non-blocking.
    fn reset(&self);

    /// Descriptor that becomes readable after `notify()`.
    fn fd(&self) -> RawFd;
}
