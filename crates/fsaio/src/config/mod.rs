//! fsaio Configuration
//!
//! Compile-time defaults with runtime environment overrides.
//!
//! # Configuration Priority (highest wins)
//!
//! 1. Builder calls
//! 2. Environment variables (`from_env()` only)
//! 3. Library defaults (`defaults`)
//!
//! # Example
//!
//! ```rust,ignore
//! use fsaio::config::AioConfig;
//! use fsaio::DeliveryOrder;
//!
//! let config = AioConfig::from_env()
//!     .num_workers(8)
//!     .delivery(DeliveryOrder::Fifo);
//! ```

pub mod defaults;

use std::time::Duration;

use fsaio_core::completion::DeliveryOrder;
use fsaio_core::env::{env_get, env_get_bool, env_get_strict};
use fsaio_core::error::{AioError, Result};

/// Configuration for an `Aio` instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AioConfig {
    /// Number of worker threads
    pub num_workers: usize,
    /// Max jobs waiting for a worker
    pub queue_depth: usize,
    /// Idle worker park timeout
    pub park_timeout: Duration,
    /// Completion delivery order
    pub delivery: DeliveryOrder,
    /// Create a notification descriptor
    pub notify: bool,
}

impl Default for AioConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl AioConfig {
    /// Library defaults, no environment lookup.
    pub fn new() -> Self {
        Self {
            num_workers: defaults::NUM_WORKERS,
            queue_depth: defaults::QUEUE_DEPTH,
            park_timeout: Duration::from_micros(defaults::PARK_TIMEOUT_US),
            delivery: defaults::DELIVERY,
            notify: defaults::NOTIFY,
        }
    }

    /// Library defaults with environment overrides.
    ///
    /// Environment variables (all optional):
    /// - `FSAIO_WORKERS` - Number of worker threads
    /// - `FSAIO_QUEUE_DEPTH` - Max jobs waiting for a worker
    /// - `FSAIO_PARK_TIMEOUT_US` - Idle park timeout in microseconds
    /// - `FSAIO_DELIVERY` - `lifo` or `fifo`
    /// - `FSAIO_NOTIFY` - Create a notification descriptor (0/1)
    pub fn from_env() -> Self {
        Self {
            num_workers: env_get("FSAIO_WORKERS", defaults::NUM_WORKERS),
            queue_depth: env_get("FSAIO_QUEUE_DEPTH", defaults::QUEUE_DEPTH),
            park_timeout: Duration::from_micros(env_get(
                "FSAIO_PARK_TIMEOUT_US",
                defaults::PARK_TIMEOUT_US,
            )),
            delivery: env_get("FSAIO_DELIVERY", defaults::DELIVERY),
            notify: env_get_bool("FSAIO_NOTIFY", defaults::NOTIFY),
        }
    }

    /// `from_env()`, except that a set but unparsable `FSAIO_WORKERS`
    /// (e.g. `-1`) is an error instead of silently using the default.
    pub fn try_from_env() -> Result<Self> {
        let mut config = Self::from_env();
        match env_get_strict::<usize>("FSAIO_WORKERS") {
            Ok(Some(n)) => config.num_workers = n,
            Ok(None) => {}
            Err(raw) => return Err(AioError::InvalidEnv("FSAIO_WORKERS", raw)),
        }
        Ok(config)
    }

    pub fn num_workers(mut self, n: usize) -> Self {
        self.num_workers = n;
        self
    }

    pub fn queue_depth(mut self, depth: usize) -> Self {
        self.queue_depth = depth;
        self
    }

    pub fn park_timeout(mut self, timeout: Duration) -> Self {
        self.park_timeout = timeout;
        self
    }

    pub fn delivery(mut self, order: DeliveryOrder) -> Self {
        self.delivery = order;
        self
    }

    pub fn notify(mut self, enabled: bool) -> Self {
        self.notify = enabled;
        self
    }
}
