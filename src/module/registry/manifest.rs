//! Module archive manifest parsing
//!
//! A module archive (`.mod` file) is a TOML manifest describing the module's
//! identity and classification.

use crate::module::traits::ModuleError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Module archive manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleManifest {
    /// Symbolic name (unique identifier)
    pub name: String,
    /// Module version (semantic versioning)
    pub version: String,
    /// Human-readable description
    #[serde(default)]
    pub description: Option<String>,
    /// Module author
    #[serde(default)]
    pub author: Option<String>,
    /// Symbolic name of the host module this fragment attaches to.
    /// Present only for fragment modules.
    #[serde(default)]
    pub fragment_host: Option<String>,
    /// Capabilities this module declares it can use
    #[serde(default)]
    pub capabilities: Vec<String>,
}

impl ModuleManifest {
    /// Load a manifest from an archive file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ModuleError> {
        let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            ModuleError::InvalidManifest(format!("failed to read archive manifest: {}", e))
        })?;

        let manifest: ModuleManifest = toml::from_str(&contents).map_err(|e| {
            ModuleError::InvalidManifest(format!("failed to parse archive manifest: {}", e))
        })?;

        if manifest.name.is_empty() {
            return Err(ModuleError::InvalidManifest(
                "module name cannot be empty".to_string(),
            ));
        }

        Ok(manifest)
    }

    /// Fragments declare a host module and never run on their own.
    pub fn is_fragment(&self) -> bool {
        self.fragment_host.is_some()
    }
}
