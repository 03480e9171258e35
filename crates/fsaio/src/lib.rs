//! # fsaio
//!
//! Asynchronous file-system I/O for single-threaded event loops.
//!
//! Blocking calls (open, read, write, close, mkdir, rmdir) run on a fixed
//! pool of worker threads. Finished requests collect in a completion queue
//! which the event loop drains with [`Aio::poll`], once per tick or
//! whenever [`Aio::notify_fd`] becomes readable.
//!
//! ```rust,ignore
//! use fsaio::{Aio, BufferMut};
//!
//! let aio = Aio::init()?;
//! aio.open("/etc/hostname", libc::O_RDONLY, 0, |req| {
//!     println!("open -> {}", req.result());
//! })?;
//!
//! loop {
//!     // ... other event-loop work ...
//!     aio.poll();
//! }
//! ```
//!
//! ## Ordering
//!
//! Callbacks run in delivery order, not submission order. The default
//! [`DeliveryOrder::Lifo`] hands out the most recently finished request
//! first; [`DeliveryOrder::Fifo`] follows finish order.

pub mod config;

pub use config::AioConfig;
pub use fsaio_core::{
    AioError, BufferMut, BufferRef, Callback, DeliveryOrder, Executor, InlineExecutor, OpKind,
    Request, Result,
};
pub use fsaio_core::kprint;

use fsaio_core::completion::CompletionQueue;
use fsaio_core::{kdebug, kinfo};
use fsaio_module::{new_notifier, FixedPool};

use std::fmt;
use std::os::unix::io::RawFd;
use std::path::Path;
use std::sync::Arc;

/// Asynchronous file-system I/O front end.
///
/// Submissions are safe from any thread. `poll()` is meant for a single
/// consumer thread; callbacks run there.
///
/// Dropping an `Aio` shuts the executor down. Requests still in flight are
/// executed, but their callbacks are dropped without being invoked.
pub struct Aio {
    queue: Arc<CompletionQueue>,
    executor: Box<dyn Executor>,
}

impl Aio {
    /// Create the completion queue and a `FixedPool`, configured from the
    /// environment.
    ///
    /// Fails with `InvalidEnv` when `FSAIO_WORKERS` is set to something
    /// that is not a worker count (such as `-1`).
    pub fn init() -> Result<Self> {
        Self::with_config(AioConfig::try_from_env()?)
    }

    /// Create the completion queue and a `FixedPool` with `config`.
    ///
    /// Fails before allocating anything when `num_workers` is zero.
    pub fn with_config(config: AioConfig) -> Result<Self> {
        if config.num_workers == 0 {
            return Err(AioError::InvalidWorkerCount(0));
        }
        let queue = Self::build_queue(&config)?;
        let pool = FixedPool::with_park_timeout(
            config.num_workers,
            config.queue_depth,
            config.park_timeout,
        )?;
        kinfo!("aio ready: {} workers, {:?} delivery", config.num_workers, config.delivery);
        Ok(Self { queue: Arc::new(queue), executor: Box::new(pool) })
    }

    /// Use a caller-supplied executor. `num_workers`, `queue_depth` and
    /// `park_timeout` are ignored.
    pub fn with_executor(executor: Box<dyn Executor>, config: &AioConfig) -> Result<Self> {
        let queue = Self::build_queue(config)?;
        Ok(Self { queue: Arc::new(queue), executor })
    }

    fn build_queue(config: &AioConfig) -> Result<CompletionQueue> {
        if config.notify {
            Ok(CompletionQueue::with_notifier(config.delivery, new_notifier()?))
        } else {
            Ok(CompletionQueue::new(config.delivery))
        }
    }

    // ── Submission ──

    /// Hand a prebuilt request to the executor.
    ///
    /// `Ok` means the executor accepted it, not that the I/O is done. On
    /// error the request is dropped and its callback never runs.
    pub fn submit(&self, req: Request) -> Result<()> {
        let kind = req.kind();
        self.executor.submit(self.queue.job(req)).map_err(|e| {
            kdebug!("{} submission refused: {}", kind, e);
            e
        })
    }

    /// Read up to `buf.len()` bytes from `fd` into `buf`.
    ///
    /// The callback can view the bytes through [`Request::filled`].
    pub fn read<F>(&self, fd: RawFd, buf: BufferMut, finish: F) -> Result<()>
    where
        F: FnOnce(&Request) + Send + 'static,
    {
        self.submit(Request::read(fd, buf).on_finish(finish))
    }

    /// Write `buf.len()` bytes from `buf` to `fd`.
    pub fn write<F>(&self, fd: RawFd, buf: BufferRef, finish: F) -> Result<()>
    where
        F: FnOnce(&Request) + Send + 'static,
    {
        self.submit(Request::write(fd, buf).on_finish(finish))
    }

    /// Open `path`; the result is the new descriptor or -1.
    ///
    /// The path is copied before this returns.
    pub fn open<P, F>(&self, path: P, flags: libc::c_int, mode: libc::mode_t, finish: F) -> Result<()>
    where
        P: AsRef<Path>,
        F: FnOnce(&Request) + Send + 'static,
    {
        self.submit(Request::open(path, flags, mode)?.on_finish(finish))
    }

    pub fn close<F>(&self, fd: RawFd, finish: F) -> Result<()>
    where
        F: FnOnce(&Request) + Send + 'static,
    {
        self.submit(Request::close(fd).on_finish(finish))
    }

    pub fn mkdir<P, F>(&self, path: P, mode: libc::mode_t, finish: F) -> Result<()>
    where
        P: AsRef<Path>,
        F: FnOnce(&Request) + Send + 'static,
    {
        self.submit(Request::mkdir(path, mode)?.on_finish(finish))
    }

    pub fn rmdir<P, F>(&self, path: P, finish: F) -> Result<()>
    where
        P: AsRef<Path>,
        F: FnOnce(&Request) + Send + 'static,
    {
        self.submit(Request::rmdir(path)?.on_finish(finish))
    }

    // ── Completion ──

    /// Deliver every completed request to its callback. Never blocks.
    ///
    /// Returns the number processed; 0 when nothing has finished.
    pub fn poll(&self) -> usize {
        self.queue.drain()
    }

    /// Deliver at most `max` completed requests.
    pub fn poll_max(&self, max: usize) -> usize {
        self.queue.drain_max(max)
    }

    /// Completed requests waiting for `poll()`.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Accepted requests not yet delivered.
    pub fn in_flight(&self) -> usize {
        self.queue.in_flight()
    }

    /// Descriptor readable while completions are waiting, if enabled.
    pub fn notify_fd(&self) -> Option<RawFd> {
        self.queue.notify_fd()
    }

    pub fn delivery(&self) -> DeliveryOrder {
        self.queue.order()
    }

    pub fn workers(&self) -> usize {
        self.executor.total_workers()
    }

    pub fn active_workers(&self) -> usize {
        self.executor.active_workers()
    }

    /// Stop accepting submissions. Accepted requests still finish and
    /// remain pollable.
    ///
    /// Blocks until every accepted request has executed and the workers
    /// are joined; a syscall that never returns hangs the caller.
    pub fn shutdown(&self) {
        self.executor.shutdown();
    }
}

impl Drop for Aio {
    fn drop(&mut self) {
        self.executor.shutdown();
    }
}

impl fmt::Debug for Aio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Aio")
            .field("queue", &self.queue)
            .field("workers", &self.executor.total_workers())
            .finish()
    }
}
