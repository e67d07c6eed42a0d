//! Module system traits and interfaces
//!
//! Defines the registry contract the deploy engine drives and the shared
//! module types.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stable numeric identifier for a live module.
pub type ModuleId = u64;

/// The root module: the host itself. Never uninstalled.
pub const ROOT_MODULE_ID: ModuleId = 0;

/// File extension of deployable module archives.
pub const MODULE_ARCHIVE_EXTENSION: &str = "mod";

/// Module lifecycle state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModuleState {
    /// Installed but not started
    Installed,
    /// Started and running
    Active,
}

/// Handle to a live module inside the registry.
///
/// The deploy engine only reads identity and classification fields; all
/// mutation goes through [`ModuleRegistry`] operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleHandle {
    /// Registry-assigned identifier
    pub id: ModuleId,
    /// Location string the module was installed from (uniqueness key)
    pub location: String,
    /// Symbolic name declared by the module manifest
    pub symbolic_name: String,
    /// Fragment modules attach to a host module and are never started
    pub is_fragment: bool,
    /// Start priority relative to other modules
    pub priority: i32,
}

/// Module system errors
#[derive(Debug, Error)]
pub enum ModuleError {
    #[error("invalid module manifest: {0}")]
    InvalidManifest(String),

    #[error("module not found: {0}")]
    ModuleNotFound(String),

    #[error("module operation failed: {0}")]
    OperationError(String),

    #[error("fragment module cannot be started: {0}")]
    FragmentStart(String),

    #[error("timed out waiting for the host runtime to stop")]
    StopTimeout,
}

/// Registry of live modules.
///
/// Operations are issued sequentially from a single control task; their
/// ordering is a correctness requirement for the deploy reconciliation pass.
#[async_trait]
pub trait ModuleRegistry: Send + Sync {
    /// Priority assigned to modules when no override applies.
    fn initial_priority(&self) -> i32;

    /// Snapshot of every live module, the root module included.
    async fn live_modules(&self) -> Vec<ModuleHandle>;

    /// Install the archive at `location`.
    ///
    /// Installing a location that is already live returns the existing
    /// handle.
    async fn install(&self, location: &str) -> Result<ModuleHandle, ModuleError>;

    /// Re-read the module's archive in place; the location is unchanged.
    async fn update(&self, id: ModuleId) -> Result<(), ModuleError>;

    /// Remove the module from the registry.
    async fn uninstall(&self, id: ModuleId) -> Result<(), ModuleError>;

    /// Set the module's start priority.
    async fn set_priority(&self, id: ModuleId, priority: i32) -> Result<(), ModuleError>;

    /// Start the module. Fragments are rejected.
    async fn start(&self, id: ModuleId) -> Result<(), ModuleError>;
}
