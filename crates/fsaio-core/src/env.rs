//! Environment variable utilities
//!
//! Typed lookups with defaults, used by `AioConfig::from_env()` and the
//! logging setup.
//!
//! ```ignore
//! use fsaio_core::env::{env_get, env_get_bool};
//!
//! let workers: usize = env_get("FSAIO_WORKERS", 4);
//! let notify: bool = env_get_bool("FSAIO_NOTIFY", false);
//! ```

use std::str::FromStr;

/// Get environment variable parsed as type T, or return default.
///
/// A set but unparsable value also yields the default.
#[inline]
pub fn env_get<T>(key: &str, default: T) -> T
where
    T: FromStr,
{
    env_get_opt(key).unwrap_or(default)
}

/// Get environment variable as boolean.
///
/// Accepts "1", "true", "yes", "on" (case-insensitive) as true; any other
/// set value is false. Unset returns the default.
#[inline]
pub fn env_get_bool(key: &str, default: bool) -> bool {
    match std::env::var(key) {
        Ok(val) => matches!(val.to_lowercase().as_str(), "1" | "true" | "yes" | "on"),
        Err(_) => default,
    }
}

/// Get environment variable as optional value.
///
/// `None` when unset or when the value does not parse.
#[inline]
pub fn env_get_opt<T>(key: &str) -> Option<T>
where
    T: FromStr,
{
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

/// Like `env_get_opt`, but a set value that does not parse is an error
/// carrying the raw value instead of being ignored.
pub fn env_get_strict<T>(key: &str) -> Result<Option<T>, String>
where
    T: FromStr,
{
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().map(Some).map_err(|_| raw),
        Err(_) => Ok(None),
    }
}
