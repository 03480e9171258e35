//! Completion queue and the poll/drain loop.
//!
//! The queue is the only state shared between worker threads and the
//! poller. Workers push finished requests (Finish phase); the event-loop
//! thread pops them one at a time, runs the callback and drops the request.
//!
//! ```text
//!  worker 0 ──push──┐
//!  worker 1 ──push──┼──▶ [ SpinLock { list, count } ] ──pop──▶ poller ──▶ callback ──▶ drop
//!  worker N ──push──┘            O(1) under lock
//! ```
//!
//! The lock is held for one push or one pop, never across a syscall, a
//! notification or a callback.

use std::collections::VecDeque;
use std::fmt;
use std::os::unix::io::RawFd;
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::execute::execute;
use crate::executor::Job;
use crate::kwarn;
use crate::notifier::Notifier;
use crate::request::Request;
use crate::spinlock::SpinLock;

/// Order in which finished requests reach their callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeliveryOrder {
    /// Most recently finished first (stack).
    #[default]
    Lifo,
    /// Finish order (queue).
    Fifo,
}

impl FromStr for DeliveryOrder {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, ()> {
        match s.trim().to_lowercase().as_str() {
            "lifo" | "stack" => Ok(DeliveryOrder::Lifo),
            "fifo" | "queue" => Ok(DeliveryOrder::Fifo),
            _ => Err(()),
        }
    }
}

struct QueueInner {
    list: VecDeque<Box<Request>>,
    /// Always equals `list.len()` outside the critical section.
    count: usize,
}

/// Lock-protected list of finished requests awaiting delivery.
pub struct CompletionQueue {
    inner: SpinLock<QueueInner>,
    order: DeliveryOrder,
    notifier: Option<Box<dyn Notifier>>,
    /// Requests accepted for execution and not yet delivered.
    in_flight: AtomicUsize,
}

impl CompletionQueue {
    pub fn new(order: DeliveryOrder) -> Self {
        Self {
            inner: SpinLock::new(QueueInner { list: VecDeque::new(), count: 0 }),
            order,
            notifier: None,
            in_flight: AtomicUsize::new(0),
        }
    }

    /// Queue that signals `notifier` after every push.
    pub fn with_notifier(order: DeliveryOrder, notifier: Box<dyn Notifier>) -> Self {
        let mut queue = Self::new(order);
        queue.notifier = Some(notifier);
        queue
    }

    /// Wrap `req` as an executor job that publishes into this queue.
    ///
    /// The request counts as in flight from here until it is delivered,
    /// or until the job is dropped unfinished (rejected by the executor).
    pub fn job(self: &Arc<Self>, req: Request) -> Box<RequestJob> {
        self.in_flight.fetch_add(1, Ordering::AcqRel);
        Box::new(RequestJob {
            req: Some(Box::new(req)),
            queue: Arc::clone(self),
        })
    }

    /// Finish phase: publish a completed request.
    pub fn push(&self, req: Box<Request>) {
        {
            let mut q = self.inner.lock();
            q.list.push_back(req);
            q.count += 1;
            debug_assert_eq!(q.count, q.list.len());
        }
        self.signal();
    }

    /// Detach the next request per the delivery order.
    ///
    /// # Panics
    ///
    /// Panics if the count is nonzero but the list yields nothing.
    fn pop(&self) -> Option<Box<Request>> {
        let mut q = self.inner.lock();
        if q.count == 0 {
            return None;
        }
        let req = match self.order {
            DeliveryOrder::Lifo => q.list.pop_back(),
            DeliveryOrder::Fifo => q.list.pop_front(),
        };
        assert!(
            req.is_some(),
            "completion queue corrupted: count {} with empty list",
            q.count
        );
        q.count -= 1;
        debug_assert_eq!(q.count, q.list.len());
        req
    }

    /// Poll/drain: deliver every completed request. Never blocks.
    ///
    /// Returns the number of requests processed, possibly 0.
    pub fn drain(&self) -> usize {
        self.drain_max(usize::MAX)
    }

    /// Deliver at most `max` completed requests.
    pub fn drain_max(&self, max: usize) -> usize {
        if let Some(n) = &self.notifier {
            n.reset();
        }

        let mut processed = 0;
        while processed < max {
            let Some(mut req) = self.pop() else {
                return processed;
            };
            self.in_flight.fetch_sub(1, Ordering::AcqRel);

            if let Some(callback) = req.take_callback() {
                callback(&req);
            }
            drop(req);
            processed += 1;
        }

        // Budget exhausted with work left: keep the descriptor readable.
        if !self.is_empty() {
            self.signal();
        }
        processed
    }

    fn signal(&self) {
        if let Some(n) = &self.notifier {
            if let Err(e) = n.notify() {
                kwarn!("completion notify failed: {}", e);
            }
        }
    }

    /// Completed requests awaiting delivery.
    pub fn len(&self) -> usize {
        self.inner.lock().count
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Accepted requests not yet delivered (executing or queued).
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn order(&self) -> DeliveryOrder {
        self.order
    }

    pub fn notify_fd(&self) -> Option<RawFd> {
        self.notifier.as_ref().map(|n| n.fd())
    }
}

impl fmt::Debug for CompletionQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionQueue")
            .field("order", &self.order)
            .field("pending", &self.len())
            .field("in_flight", &self.in_flight())
            .field("notify_fd", &self.notify_fd())
            .finish()
    }
}

/// A request travelling through an executor.
///
/// `execute` runs the syscall; `finish` moves the request into the queue.
pub struct RequestJob {
    req: Option<Box<Request>>,
    queue: Arc<CompletionQueue>,
}

impl Job for RequestJob {
    fn execute(&mut self) {
        if let Some(req) = self.req.as_deref_mut() {
            execute(req);
        }
    }

    fn finish(mut self: Box<Self>) {
        if let Some(req) = self.req.take() {
            self.queue.push(req);
        }
    }
}

impl Drop for RequestJob {
    fn drop(&mut self) {
        // Dropped before finish: the request is destroyed undelivered.
        if self.req.is_some() {
            self.queue.in_flight.fetch_sub(1, Ordering::AcqRel);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AioError, Result};
    use crate::executor::{Executor, InlineExecutor};
    use std::sync::Mutex;

    fn tagged(id: u32, log: &Arc<Mutex<Vec<u32>>>) -> Request {
        let log = Arc::clone(log);
        Request::close(-1).on_finish(move |_| log.lock().unwrap().push(id))
    }

    #[test]
    fn test_drain_empty_returns_zero() {
        let queue = CompletionQueue::new(DeliveryOrder::Lifo);
        assert_eq!(queue.drain(), 0);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_lifo_delivery_reverses_finish_order() {
        let queue = Arc::new(CompletionQueue::new(DeliveryOrder::Lifo));
        let exec = InlineExecutor::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        for id in [1, 2, 3] {
            exec.submit(queue.job(tagged(id, &log))).unwrap();
        }
        assert_eq!(queue.len(), 3);
        assert_eq!(queue.drain(), 3);
        assert_eq!(*log.lock().unwrap(), vec![3, 2, 1]);
        assert_eq!(queue.in_flight(), 0);
    }

    #[test]
    fn test_fifo_delivery_keeps_finish_order() {
        let queue = Arc::new(CompletionQueue::new(DeliveryOrder::Fifo));
        let exec = InlineExecutor::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        for id in [1, 2, 3] {
            exec.submit(queue.job(tagged(id, &log))).unwrap();
        }
        assert_eq!(queue.drain(), 3);
        assert_eq!(*log.lock().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_drain_max_bounds_work() {
        let queue = Arc::new(CompletionQueue::new(DeliveryOrder::Lifo));
        let exec = InlineExecutor::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        for id in 0..5 {
            exec.submit(queue.job(tagged(id, &log))).unwrap();
        }
        assert_eq!(queue.drain_max(2), 2);
        assert_eq!(queue.len(), 3);
        assert_eq!(queue.in_flight(), 3);
        assert_eq!(queue.drain(), 3);
        assert_eq!(log.lock().unwrap().len(), 5);
    }

    #[test]
    fn test_result_visible_in_callback() {
        let queue = Arc::new(CompletionQueue::new(DeliveryOrder::Lifo));
        let seen = Arc::new(Mutex::new(None));
        let s = Arc::clone(&seen);
        let req = Request::close(-1).on_finish(move |r| {
            *s.lock().unwrap() = Some((r.result(), r.errno()));
        });

        InlineExecutor::new().submit(queue.job(req)).unwrap();
        queue.drain();
        assert_eq!(*seen.lock().unwrap(), Some((-1, libc::EBADF)));
    }

    #[test]
    fn test_request_without_callback_is_consumed() {
        let queue = Arc::new(CompletionQueue::new(DeliveryOrder::Lifo));
        InlineExecutor::new().submit(queue.job(Request::close(-1))).unwrap();
        assert_eq!(queue.drain(), 1);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_rejected_job_is_destroyed_untracked() {
        let queue = Arc::new(CompletionQueue::new(DeliveryOrder::Lifo));
        let exec = InlineExecutor::new();
        exec.shutdown();

        let guard = Arc::new(());
        let held = Arc::clone(&guard);
        let req = Request::close(-1).on_finish(move |_| drop(held));

        assert_eq!(exec.submit(queue.job(req)).unwrap_err(), AioError::ExecutorUnavailable);
        assert_eq!(Arc::strong_count(&guard), 1);
        assert_eq!(queue.in_flight(), 0);
        assert_eq!(queue.drain(), 0);
    }

    #[test]
    fn test_each_request_destroyed_once() {
        let queue = Arc::new(CompletionQueue::new(DeliveryOrder::Lifo));
        let exec = InlineExecutor::new();
        let guard = Arc::new(());
        let calls = Arc::new(AtomicUsize::new(0));

        for i in 0..16 {
            let held = Arc::clone(&guard);
            let calls = Arc::clone(&calls);
            let req = if i % 2 == 0 {
                Request::rmdir(format!("/nonexistent/fsaio/{}", i)).unwrap()
            } else {
                Request::close(-1)
            };
            let req = req.on_finish(move |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                drop(held);
            });
            exec.submit(queue.job(req)).unwrap();
        }

        assert_eq!(Arc::strong_count(&guard), 17);
        assert_eq!(queue.drain(), 16);
        assert_eq!(calls.load(Ordering::SeqCst), 16);
        assert_eq!(Arc::strong_count(&guard), 1);
        assert_eq!(queue.drain(), 0);
    }

    #[test]
    #[should_panic(expected = "completion queue corrupted")]
    fn test_count_without_entries_panics() {
        let queue = CompletionQueue::new(DeliveryOrder::Lifo);
        queue.inner.lock().count = 1;
        queue.drain();
    }

    #[derive(Default)]
    struct CountingNotifier {
        notified: Arc<AtomicUsize>,
        resets: Arc<AtomicUsize>,
    }

    impl Notifier for CountingNotifier {
        fn notify(&self) -> Result<()> {
            self.notified.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn reset(&self) {
            self.resets.fetch_add(1, Ordering::SeqCst);
        }

        fn fd(&self) -> RawFd {
            -1
        }
    }

    #[test]
    fn test_notifier_signalled_per_push_and_reset_on_drain() {
        let notifier = CountingNotifier::default();
        let notified = Arc::clone(&notifier.notified);
        let resets = Arc::clone(&notifier.resets);
        let queue = Arc::new(CompletionQueue::with_notifier(DeliveryOrder::Lifo, Box::new(notifier)));
        let exec = InlineExecutor::new();

        exec.submit(queue.job(Request::close(-1))).unwrap();
        exec.submit(queue.job(Request::close(-1))).unwrap();
        assert_eq!(notified.load(Ordering::SeqCst), 2);
        assert_eq!(queue.notify_fd(), Some(-1));

        // Partial drain re-arms the notifier for what is left.
        assert_eq!(queue.drain_max(1), 1);
        assert_eq!(resets.load(Ordering::SeqCst), 1);
        assert_eq!(notified.load(Ordering::SeqCst), 3);

        assert_eq!(queue.drain(), 1);
        assert_eq!(notified.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_delivery_order_parse() {
        assert_eq!("FIFO".parse::<DeliveryOrder>(), Ok(DeliveryOrder::Fifo));
        assert_eq!("lifo".parse::<DeliveryOrder>(), Ok(DeliveryOrder::Lifo));
        assert!("random".parse::<DeliveryOrder>().is_err());
        assert_eq!(DeliveryOrder::default(), DeliveryOrder::Lifo);
    }
}
