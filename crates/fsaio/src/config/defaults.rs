//! Library defaults for `AioConfig`.

use fsaio_core::completion::DeliveryOrder;

/// Worker threads in the pool.
pub const NUM_WORKERS: usize = 4;

/// Jobs that may wait for a free worker before submission is refused.
pub const QUEUE_DEPTH: usize = 4096;

/// How long an idle worker parks before re-checking the queue.
pub const PARK_TIMEOUT_US: u64 = 1000;

/// Completion delivery order.
pub const DELIVERY: DeliveryOrder = DeliveryOrder::Lifo;

/// Create a notification descriptor for the event loop.
pub const NOTIFY: bool = false;
