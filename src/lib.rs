//! modhost - modular runtime host
//!
//! Boots a module runtime inside the current process: scans directories for
//! module archives, reconciles the desired module set against the live set,
//! assigns start priorities, and dispatches the user command in-process, as a
//! forked child process, or under the headless batch driver.
//!
//! ## Subsystems
//!
//! - [`config`]: flat key/value configuration merged from file, environment,
//!   and command-line flags
//! - [`module`]: module registry, archive discovery, deploy reconciliation,
//!   and auto-install/auto-start property processing
//! - [`launch`]: launch-mode dispatch and host shutdown sequencing
//! - [`utils`]: logging, signal handling, graceful-degradation helpers

// Memory allocator optimization using mimalloc (faster than default allocator)
#[cfg(not(target_os = "windows"))]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

pub mod config;
pub mod launch;
pub mod module;
pub mod utils;

pub use config::HostConfig;
pub use launch::dispatcher::{DispatchOutcome, Dispatcher, LaunchMode, NO_RESTART_EXIT_CODE};
pub use launch::shutdown::ShutdownHandle;
pub use module::registry::host::HostRuntime;
pub use module::traits::{
    ModuleError, ModuleHandle, ModuleId, ModuleRegistry, ModuleState, ROOT_MODULE_ID,
};
