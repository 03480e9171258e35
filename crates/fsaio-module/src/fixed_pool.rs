//! `FixedPool`: default `Executor` implementation.
//!
//! Spawns N OS threads at creation. Workers dequeue jobs from a bounded
//! lock-free MPMC queue, run the execute phase (the blocking syscall),
//! then the finish phase. Idle workers park with a timeout and are
//! unparked round-robin on submit.
//!
//! No dynamic scaling. Simple, predictable, safe.

use fsaio_core::error::{AioError, Result};
use fsaio_core::executor::{Executor, Job};
use fsaio_core::{kdebug, kinfo, kwarn};

use crossbeam_queue::ArrayQueue;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::thread::{self, JoinHandle, Thread};
use std::time::Duration;

/// Upper bound on pool size.
pub const MAX_WORKERS: usize = 256;

/// Shared state between submitters and workers.
struct PoolInner {
    /// Work queue: submitters → workers.
    work_queue: ArrayQueue<Box<dyn Job>>,
    /// Number of workers currently inside a job.
    active: AtomicUsize,
    /// Shutdown flag.
    shutdown: AtomicBool,
    /// Submitters hold it shared across flag check and push; shutdown
    /// flips the flag under the exclusive side. No push lands after the
    /// flag is visible.
    gate: RwLock<()>,
    /// Idle park timeout.
    park_timeout: Duration,
}

pub struct FixedPool {
    inner: Arc<PoolInner>,
    threads: Vec<Thread>,
    handles: Mutex<Vec<JoinHandle<()>>>,
    next_wake: AtomicUsize,
}

impl FixedPool {
    /// Create a pool with `n` workers.
    ///
    /// `queue_depth`: max pending jobs before `submit` fails.
    pub fn new(n: usize, queue_depth: usize) -> Result<Self> {
        Self::with_park_timeout(n, queue_depth, Duration::from_millis(1))
    }

    /// Create a pool whose idle workers re-check the queue every `park_timeout`.
    pub fn with_park_timeout(n: usize, queue_depth: usize, park_timeout: Duration) -> Result<Self> {
        if n == 0 || n > MAX_WORKERS {
            return Err(AioError::InvalidWorkerCount(n));
        }
        if queue_depth == 0 {
            return Err(AioError::InvalidQueueDepth);
        }

        let inner = Arc::new(PoolInner {
            work_queue: ArrayQueue::new(queue_depth),
            active: AtomicUsize::new(0),
            shutdown: AtomicBool::new(false),
            gate: RwLock::new(()),
            park_timeout,
        });

        let mut handles = Vec::with_capacity(n);
        for worker_id in 0..n {
            let worker_inner = Arc::clone(&inner);
            let spawned = thread::Builder::new()
                .name(format!("fsaio-worker-{}", worker_id))
                .spawn(move || worker_loop(worker_inner, worker_id));
            match spawned {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    kwarn!("worker {} spawn failed: {}", worker_id, e);
                    inner.shutdown.store(true, Ordering::SeqCst);
                    for h in handles {
                        h.thread().unpark();
                        let _ = h.join();
                    }
                    return Err(AioError::SpawnFailed(e.to_string()));
                }
            }
        }

        kinfo!("fixed pool started: {} workers, queue depth {}", n, queue_depth);
        let threads = handles.iter().map(|h| h.thread().clone()).collect();
        Ok(FixedPool {
            inner,
            threads,
            handles: Mutex::new(handles),
            next_wake: AtomicUsize::new(0),
        })
    }

    /// Jobs accepted but not yet picked up by a worker.
    pub fn queued(&self) -> usize {
        self.inner.work_queue.len()
    }

    fn wake_one(&self) {
        let idx = self.next_wake.fetch_add(1, Ordering::Relaxed) % self.threads.len();
        self.threads[idx].unpark();
    }

    fn join_workers(&self) {
        let handles = {
            let mut guard = self.handles.lock().unwrap_or_else(|p| p.into_inner());
            std::mem::take(&mut *guard)
        };
        for t in &self.threads {
            t.unpark();
        }
        for h in handles {
            if h.join().is_err() {
                kwarn!("fsaio worker panicked");
            }
        }

        // Workers exit on an empty queue; anything left was pushed between
        // their last pop and the flag flip.
        while let Some(mut job) = self.inner.work_queue.pop() {
            job.execute();
            job.finish();
        }
    }
}

impl Executor for FixedPool {
    fn submit(&self, job: Box<dyn Job>) -> Result<()> {
        let _gate = self.inner.gate.read().unwrap_or_else(|p| p.into_inner());
        if self.inner.shutdown.load(Ordering::Acquire) {
            return Err(AioError::ExecutorUnavailable);
        }
        match self.inner.work_queue.push(job) {
            Ok(()) => {
                self.wake_one();
                Ok(())
            }
            Err(_rejected) => {
                kwarn!("work queue full ({} jobs), rejecting", self.inner.work_queue.capacity());
                Err(AioError::ExecutorUnavailable)
            }
        }
    }

    fn active_workers(&self) -> usize {
        self.inner.active.load(Ordering::Relaxed)
    }

    fn total_workers(&self) -> usize {
        self.threads.len()
    }

    /// Stop accepting jobs, let workers drain the queue, and join them.
    fn shutdown(&self) {
        {
            let _gate = self.inner.gate.write().unwrap_or_else(|p| p.into_inner());
            if !self.inner.shutdown.swap(true, Ordering::SeqCst) {
                kdebug!("fixed pool shutting down");
            }
        }
        self.join_workers();
    }
}

impl Drop for FixedPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Worker thread main loop.
///
/// Exits only once shutdown is flagged and the queue is empty, so every
/// accepted job runs.
fn worker_loop(inner: Arc<PoolInner>, worker_id: usize) {
    loop {
        match inner.work_queue.pop() {
            Some(mut job) => {
                inner.active.fetch_add(1, Ordering::Relaxed);
                job.execute();
                inner.active.fetch_sub(1, Ordering::Relaxed);
                job.finish();
            }
            None => {
                if inner.shutdown.load(Ordering::Acquire) {
                    break;
                }
                thread::park_timeout(inner.park_timeout);
            }
        }
    }
    kdebug!("fsaio worker {} exiting", worker_id);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::time::Instant;

    struct Step {
        tx: mpsc::Sender<(&'static str, String)>,
        sleep: Duration,
    }

    impl Job for Step {
        fn execute(&mut self) {
            thread::sleep(self.sleep);
            let name = thread::current().name().unwrap_or("").to_string();
            self.tx.send(("execute", name)).unwrap();
        }

        fn finish(self: Box<Self>) {
            self.tx.send(("finish", String::new())).unwrap();
        }
    }

    fn step(tx: &mpsc::Sender<(&'static str, String)>, ms: u64) -> Box<dyn Job> {
        Box::new(Step { tx: tx.clone(), sleep: Duration::from_millis(ms) })
    }

    #[test]
    fn test_zero_workers_rejected() {
        assert_eq!(FixedPool::new(0, 16).err(), Some(AioError::InvalidWorkerCount(0)));
        assert_eq!(
            FixedPool::new(MAX_WORKERS + 1, 16).err(),
            Some(AioError::InvalidWorkerCount(MAX_WORKERS + 1))
        );
        assert_eq!(FixedPool::new(2, 0).err(), Some(AioError::InvalidQueueDepth));
    }

    #[test]
    fn test_job_runs_on_worker_execute_before_finish() {
        let pool = FixedPool::new(2, 16).unwrap();
        assert_eq!(pool.total_workers(), 2);
        let (tx, rx) = mpsc::channel();

        pool.submit(step(&tx, 0)).unwrap();

        let (phase, name) = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(phase, "execute");
        assert!(name.starts_with("fsaio-worker-"), "ran on {:?}", name);
        let (phase, _) = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(phase, "finish");
    }

    /// Holds its worker until `target` jobs are inside `execute` at once.
    struct Rendezvous {
        inside: Arc<AtomicUsize>,
        peak: Arc<AtomicUsize>,
        target: usize,
    }

    impl Job for Rendezvous {
        fn execute(&mut self) {
            let now = self.inside.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            let deadline = Instant::now() + Duration::from_secs(10);
            while self.peak.load(Ordering::SeqCst) < self.target && Instant::now() < deadline {
                thread::yield_now();
            }
            self.inside.fetch_sub(1, Ordering::SeqCst);
        }

        fn finish(self: Box<Self>) {}
    }

    #[test]
    fn test_jobs_run_in_parallel() {
        let pool = FixedPool::new(4, 16).unwrap();
        let inside = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        for _ in 0..4 {
            pool.submit(Box::new(Rendezvous {
                inside: Arc::clone(&inside),
                peak: Arc::clone(&peak),
                target: 4,
            }))
            .unwrap();
        }
        pool.shutdown();

        // A serial pool never has more than one job inside execute.
        assert_eq!(peak.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_full_queue_rejects() {
        let pool = FixedPool::new(1, 1).unwrap();
        let (tx, rx) = mpsc::channel();

        // Occupy the single worker, then fill the single queue slot.
        pool.submit(step(&tx, 300)).unwrap();
        let deadline = Instant::now() + Duration::from_secs(5);
        while pool.queued() > 0 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(1));
        }
        pool.submit(step(&tx, 0)).unwrap();
        assert_eq!(pool.submit(step(&tx, 0)).err(), Some(AioError::ExecutorUnavailable));

        drop(pool);
        let finished = rx.try_iter().filter(|(p, _)| *p == "finish").count();
        assert_eq!(finished, 2);
    }

    #[test]
    fn test_shutdown_completes_accepted_jobs() {
        let pool = FixedPool::new(1, 64).unwrap();
        let (tx, rx) = mpsc::channel();

        for _ in 0..10 {
            pool.submit(step(&tx, 1)).unwrap();
        }
        pool.shutdown();

        assert_eq!(pool.submit(step(&tx, 0)).err(), Some(AioError::ExecutorUnavailable));
        let finished = rx.try_iter().filter(|(p, _)| *p == "finish").count();
        assert_eq!(finished, 10);
        assert_eq!(pool.active_workers(), 0);
    }

    struct Tally(Arc<AtomicUsize>);

    impl Job for Tally {
        fn execute(&mut self) {}

        fn finish(self: Box<Self>) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_submit_racing_shutdown_never_strands_jobs() {
        use std::sync::Barrier;

        for _ in 0..20 {
            let pool = Arc::new(FixedPool::new(2, 256).unwrap());
            let finished = Arc::new(AtomicUsize::new(0));
            let barrier = Arc::new(Barrier::new(2));

            let submitter = {
                let pool = Arc::clone(&pool);
                let finished = Arc::clone(&finished);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    let mut accepted = 0;
                    for _ in 0..200 {
                        if pool.submit(Box::new(Tally(Arc::clone(&finished)))).is_ok() {
                            accepted += 1;
                        }
                    }
                    accepted
                })
            };

            barrier.wait();
            pool.shutdown();
            let accepted = submitter.join().unwrap();

            assert_eq!(pool.queued(), 0);
            assert_eq!(finished.load(Ordering::SeqCst), accepted);
        }
    }
}
