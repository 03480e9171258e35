//! # fsaio-core
//!
//! Core of the fsaio system: blocking file-system calls are executed on
//! worker threads and their results handed back to a single event-loop
//! thread through a pollable completion queue.
//!
//! This crate contains no thread spawning. The worker pool is consumed
//! through the [`Executor`] trait; default implementations live in
//! `fsaio-module`.
//!
//! ## Request lifecycle
//!
//! ```text
//! caller thread          worker thread               caller thread
//! ─────────────          ─────────────               ─────────────
//! Request::open(..)  ─▶  execute()  ─▶  finish()  ─▶  drain()
//!   (owned path)         (syscall,      (push onto     (callback,
//!                         result)        queue)         drop)
//! ```
//!
//! ## Modules
//!
//! - `request` - Request value object, operation kinds, callbacks
//! - `buffer` - Borrowed references to caller-owned I/O memory
//! - `execute` - Execute phase: blocking syscall dispatch
//! - `completion` - Completion queue and the poll/drain loop
//! - `executor` - Executor and job traits, inline executor
//! - `notifier` - Completion notification trait
//! - `error` - Error types
//! - `spinlock` - Short critical-section lock used by the queue
//! - `kprint` - Kernel-style leveled logging macros
//! - `env` - Environment variable utilities

pub mod kprint;
pub mod env;
pub mod error;
pub mod spinlock;
pub mod buffer;
pub mod request;
pub mod execute;
pub mod notifier;
pub mod completion;
pub mod executor;

// Re-exports for convenience
pub use buffer::{BufferMut, BufferRef};
pub use completion::{CompletionQueue, DeliveryOrder, RequestJob};
pub use error::{AioError, Result};
pub use executor::{Executor, InlineExecutor, Job};
pub use notifier::Notifier;
pub use request::{Callback, OpKind, Request};
pub use spinlock::SpinLock;
