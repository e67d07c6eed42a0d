//! Utility modules for logging, signals, and graceful degradation

pub mod error;
pub mod logging;
pub mod signal;

pub use error::{log_error, with_default};
#[cfg(feature = "json-logging")]
pub use logging::init_json_logging;
pub use logging::init_logging;
pub use signal::wait_for_shutdown_signal;
