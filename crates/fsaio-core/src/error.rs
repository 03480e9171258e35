//! fsaio error types.
//!
//! Syscall failures are not errors of this crate: they travel inside the
//! completed `Request` (`result` / `errno`). `AioError` only covers
//! submission and setup failures.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AioError {
    /// Worker pool created with an unusable worker count.
    InvalidWorkerCount(usize),
    /// Work queue depth of zero.
    InvalidQueueDepth,
    /// Path cannot be represented as a null-terminated string.
    InvalidPath,
    /// Executor rejected the job (queue full or shut down).
    ExecutorUnavailable,
    /// Environment variable is set but its value does not parse.
    InvalidEnv(&'static str, String),
    /// Worker thread could not be spawned.
    SpawnFailed(String),
    /// OS error with errno.
    Os(i32),
}

impl fmt::Display for AioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidWorkerCount(n) => write!(f, "invalid worker count {}", n),
            Self::InvalidQueueDepth => write!(f, "invalid work queue depth"),
            Self::InvalidPath => write!(f, "path contains an interior NUL byte"),
            Self::ExecutorUnavailable => write!(f, "executor unavailable"),
            Self::InvalidEnv(key, val) => write!(f, "invalid value {:?} for {}", val, key),
            Self::SpawnFailed(e) => write!(f, "failed to spawn worker: {}", e),
            Self::Os(e) => write!(f, "OS error: errno {}", e),
        }
    }
}

impl std::error::Error for AioError {}

pub type Result<T> = std::result::Result<T, AioError>;
