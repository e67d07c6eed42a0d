//! Error handling utilities for graceful degradation
//!
//! Helpers for operations whose failure should be recorded but must not stop
//! execution.

use tracing::{debug, warn};

/// Execute an operation and log errors without failing.
///
/// Returns `Some(T)` on success, `None` on error (after logging).
pub fn log_error<F, T, E>(operation: F, context: &str) -> Option<T>
where
    F: FnOnce() -> Result<T, E>,
    E: std::fmt::Display,
{
    match operation() {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("{}: {}", context, e);
            None
        }
    }
}

/// Execute an operation and return a default value on error.
///
/// Returns the result on success, or the default on error (after logging at
/// debug level). Useful for operations where failure is expected and a
/// default is acceptable.
pub fn with_default<F, T, E>(operation: F, default: T, context: &str) -> T
where
    F: FnOnce() -> Result<T, E>,
    E: std::fmt::Display,
{
    match operation() {
        Ok(value) => value,
        Err(e) => {
            debug!("{}: {}, using default", context, e);
            default
        }
    }
}
