//! # fsaio-module: Default implementations
//!
//! Each impl prioritizes correctness and simplicity over performance.
//!
//! ## Default stack
//!
//! | Trait     | Default Impl                          |
//! |-----------|---------------------------------------|
//! | Executor  | FixedPool                             |
//! | Notifier  | EventFdNotifier (linux), PipeNotifier |

pub mod fixed_pool;
pub mod notifier;

pub use fixed_pool::FixedPool;
pub use notifier::{new_notifier, PlatformNotifier};
