//! Auto-install and auto-start property processing
//!
//! Configuration keys under the reserved prefixes carry token-delimited
//! lists of archive locations. A key may append `.<priority>` to pin the
//! priority for its whole list. Locations are installed in one pass; the
//! auto-start lists are started in a second pass once every install has
//! settled.

use tracing::warn;

use crate::config::tokens::TokenScanner;
use crate::config::{HostConfig, AUTO_INSTALL_PROP, AUTO_START_PROP};
use crate::module::traits::ModuleRegistry;

/// Install every location referenced by an auto-install or auto-start
/// property and apply the key's priority.
///
/// Per-location failures are reported and do not abort the remaining
/// locations.
pub async fn install_from_properties(config: &HostConfig, registry: &dyn ModuleRegistry) {
    let default_priority = registry.initial_priority();

    for (key, value) in config.entries() {
        let key = key.to_ascii_lowercase();
        if !key.starts_with(AUTO_INSTALL_PROP) && !key.starts_with(AUTO_START_PROP) {
            continue;
        }

        let priority = auto_priority(&key, default_priority);
        for location in TokenScanner::new(value) {
            match registry.install(&location).await {
                Ok(module) => {
                    if let Err(e) = registry.set_priority(module.id, priority).await {
                        warn!("Auto-properties set priority {}: {}", location, e);
                    }
                }
                Err(e) => {
                    warn!("Auto-properties install {}: {}", location, e);
                }
            }
        }
    }
}

/// Start every location referenced by an auto-start property.
///
/// Installing an already-live location just returns the existing module, so
/// this pass is safe to run after [`install_from_properties`].
pub async fn start_from_properties(config: &HostConfig, registry: &dyn ModuleRegistry) {
    for (key, value) in config.entries() {
        if !key.to_ascii_lowercase().starts_with(AUTO_START_PROP) {
            continue;
        }

        for location in TokenScanner::new(value) {
            match registry.install(&location).await {
                Ok(module) => {
                    if let Err(e) = registry.start(module.id).await {
                        warn!("Auto-properties start {}: {}", location, e);
                    }
                }
                Err(e) => {
                    warn!("Auto-properties start {}: {}", location, e);
                }
            }
        }
    }
}

/// Extract the priority suffix from an auto property key.
///
/// A bare prefix key uses the registry default; otherwise the segment after
/// the last `.` must parse as an integer, and a malformed segment falls back
/// to the default with a warning.
fn auto_priority(key: &str, default: i32) -> i32 {
    if key == AUTO_INSTALL_PROP || key == AUTO_START_PROP {
        return default;
    }

    let suffix = key.rsplit('.').next().unwrap_or("");
    match suffix.parse::<i32>() {
        Ok(priority) => priority,
        Err(_) => {
            warn!("Invalid priority suffix on auto property {}", key);
            default
        }
    }
}
