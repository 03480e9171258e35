//! Executor abstraction.
//!
//! An `Executor` runs jobs off the caller's thread. Each job has two
//! phases: `execute` (may block) and `finish` (publishes the result).
//! The executor guarantees `finish` runs once, after `execute` returns.
//!
//! # Implementors
//!
//! - `FixedPool` (fsaio-module): N OS threads fed by a bounded lock-free
//!   queue. The default for `Aio`.
//!
//! - `InlineExecutor` (here): runs both phases synchronously on the
//!   submitting thread. For tests and for embedding where blocking the
//!   caller is acceptable.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{AioError, Result};

/// A unit of work with an execute phase and a finish phase.
pub trait Job: Send + 'static {
    /// Blocking work. Runs once on a worker thread.
    fn execute(&mut self);

    /// Publish the outcome. Runs once, after `execute` has returned.
    fn finish(self: Box<Self>);
}

/// Runs jobs on worker threads.
///
/// **Contract:**
/// - `submit()` must NEVER block the caller. If the job cannot be
///   accepted it is dropped and `Err(ExecutorUnavailable)` returned.
/// - An accepted job always runs to completion; there is no cancellation.
pub trait Executor: Send + Sync {
    /// Hand a job to the executor.
    fn submit(&self, job: Box<dyn Job>) -> Result<()>;

    /// Number of workers currently inside a job.
    fn active_workers(&self) -> usize;

    /// Total number of workers.
    fn total_workers(&self) -> usize;

    /// Stop accepting jobs. Accepted jobs still complete.
    fn shutdown(&self);
}

/// Runs each job synchronously inside `submit()`.
#[derive(Debug, Default)]
pub struct InlineExecutor {
    shutdown: AtomicBool,
}

impl InlineExecutor {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Executor for InlineExecutor {
    fn submit(&self, mut job: Box<dyn Job>) -> Result<()> {
        if self.shutdown.load(Ordering::Acquire) {
            return Err(AioError::ExecutorUnavailable);
        }
        job.execute();
        job.finish();
        Ok(())
    }

    fn active_workers(&self) -> usize {
        0
    }

    fn total_workers(&self) -> usize {
        1
    }

    fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    struct Trace {
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    impl Job for Trace {
        fn execute(&mut self) {
            self.log.lock().unwrap().push("execute");
        }

        fn finish(self: Box<Self>) {
            self.log.lock().unwrap().push("finish");
        }
    }

    #[test]
    fn test_inline_runs_execute_then_finish() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let exec = InlineExecutor::new();

        exec.submit(Box::new(Trace { log: Arc::clone(&log) })).unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["execute", "finish"]);
    }

    #[test]
    fn test_inline_rejects_after_shutdown() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let exec = InlineExecutor::new();
        exec.shutdown();

        let err = exec.submit(Box::new(Trace { log: Arc::clone(&log) })).unwrap_err();
        assert_eq!(err, AioError::ExecutorUnavailable);
        assert!(log.lock().unwrap().is_empty());
        // The rejected job was dropped, releasing its clone.
        assert_eq!(Arc::strong_count(&log), 1);
    }
}
