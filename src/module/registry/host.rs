//! In-process host runtime
//!
//! The live module registry owned by this process, plus the host's own
//! stop/wait lifecycle. Module operations are driven sequentially by the
//! deploy engine and the property installer; the stop signal may arrive
//! concurrently from the shutdown hook.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{watch, Mutex};
use tokio::time::Duration;
use tracing::{debug, info};

use async_trait::async_trait;

use crate::module::registry::manifest::ModuleManifest;
use crate::module::traits::{
    ModuleError, ModuleHandle, ModuleId, ModuleRegistry, ModuleState, ROOT_MODULE_ID,
};

/// Priority given to modules when no configuration or naming rule overrides it.
pub const DEFAULT_INITIAL_PRIORITY: i32 = 1;

/// Location string of the root module (the host itself).
pub const ROOT_MODULE_LOCATION: &str = "system:modhost";

/// Symbolic name of the root module.
pub const ROOT_MODULE_NAME: &str = "modhost-system";

struct InstalledModule {
    handle: ModuleHandle,
    state: ModuleState,
}

/// Live module registry and host lifecycle.
pub struct HostRuntime {
    /// Live modules (id -> module)
    modules: Mutex<HashMap<ModuleId, InstalledModule>>,
    /// Next module id; the root module owns id 0
    next_id: AtomicU64,
    /// Default start priority for new modules
    initial_priority: i32,
    /// Stop signal; flips to `true` exactly once
    stop_tx: watch::Sender<bool>,
}

impl HostRuntime {
    /// Create a host runtime with the default initial priority.
    pub fn new() -> Self {
        Self::with_initial_priority(DEFAULT_INITIAL_PRIORITY)
    }

    /// Create a host runtime with a custom initial priority.
    ///
    /// The root module (id 0) is registered as part of construction.
    pub fn with_initial_priority(initial_priority: i32) -> Self {
        let (stop_tx, _) = watch::channel(false);

        let root = InstalledModule {
            handle: ModuleHandle {
                id: ROOT_MODULE_ID,
                location: ROOT_MODULE_LOCATION.to_string(),
                symbolic_name: ROOT_MODULE_NAME.to_string(),
                is_fragment: false,
                priority: 0,
            },
            state: ModuleState::Active,
        };
        let mut modules = HashMap::new();
        modules.insert(ROOT_MODULE_ID, root);

        Self {
            modules: Mutex::new(modules),
            next_id: AtomicU64::new(1),
            initial_priority,
            stop_tx,
        }
    }

    /// Request host shutdown. Safe to call any number of times.
    pub fn stop(&self) {
        if !*self.stop_tx.borrow() {
            info!("Stopping host runtime");
        }
        self.stop_tx.send_replace(true);
    }

    /// Wait until the host has stopped.
    ///
    /// With a timeout the wait is bounded and [`ModuleError::StopTimeout`] is
    /// returned on expiry; without one it blocks until the stop signal fires.
    pub async fn wait_for_stop(&self, timeout: Option<Duration>) -> Result<(), ModuleError> {
        let mut stop_rx = self.stop_tx.subscribe();
        match timeout {
            Some(limit) => {
                match tokio::time::timeout(limit, stop_rx.wait_for(|stopped| *stopped)).await {
                    Ok(_) => Ok(()),
                    Err(_) => Err(ModuleError::StopTimeout),
                }
            }
            None => {
                let _ = stop_rx.wait_for(|stopped| *stopped).await;
                Ok(())
            }
        }
    }

    /// Whether shutdown has been requested.
    pub fn is_stopped(&self) -> bool {
        *self.stop_tx.borrow()
    }

    /// Current lifecycle state of a module.
    pub async fn module_state(&self, id: ModuleId) -> Option<ModuleState> {
        let modules = self.modules.lock().await;
        modules.get(&id).map(|m| m.state.clone())
    }

    /// Find a live module by its location string.
    pub async fn find_by_location(&self, location: &str) -> Option<ModuleHandle> {
        let modules = self.modules.lock().await;
        modules
            .values()
            .find(|m| m.handle.location == location)
            .map(|m| m.handle.clone())
    }
}

impl Default for HostRuntime {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ModuleRegistry for HostRuntime {
    fn initial_priority(&self) -> i32 {
        self.initial_priority
    }

    async fn live_modules(&self) -> Vec<ModuleHandle> {
        let modules = self.modules.lock().await;
        modules.values().map(|m| m.handle.clone()).collect()
    }

    async fn install(&self, location: &str) -> Result<ModuleHandle, ModuleError> {
        let mut modules = self.modules.lock().await;

        if let Some(existing) = modules.values().find(|m| m.handle.location == location) {
            debug!("Module at {} already installed", location);
            return Ok(existing.handle.clone());
        }

        let manifest = ModuleManifest::from_file(location)?;
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let handle = ModuleHandle {
            id,
            location: location.to_string(),
            symbolic_name: manifest.name.clone(),
            is_fragment: manifest.is_fragment(),
            priority: self.initial_priority,
        };

        info!("Installed module {} from {}", manifest.name, location);
        modules.insert(
            id,
            InstalledModule {
                handle: handle.clone(),
                state: ModuleState::Installed,
            },
        );
        Ok(handle)
    }

    async fn update(&self, id: ModuleId) -> Result<(), ModuleError> {
        let mut modules = self.modules.lock().await;
        let module = modules
            .get_mut(&id)
            .ok_or_else(|| ModuleError::ModuleNotFound(format!("module {}", id)))?;

        let manifest = ModuleManifest::from_file(&module.handle.location)?;
        module.handle.is_fragment = manifest.is_fragment();
        module.handle.symbolic_name = manifest.name;
        info!(
            "Updated module {} in place from {}",
            module.handle.symbolic_name, module.handle.location
        );
        Ok(())
    }

    async fn uninstall(&self, id: ModuleId) -> Result<(), ModuleError> {
        if id == ROOT_MODULE_ID {
            return Err(ModuleError::OperationError(
                "the root module cannot be uninstalled".to_string(),
            ));
        }

        let mut modules = self.modules.lock().await;
        let module = modules
            .remove(&id)
            .ok_or_else(|| ModuleError::ModuleNotFound(format!("module {}", id)))?;
        info!("Uninstalled module {}", module.handle.symbolic_name);
        Ok(())
    }

    async fn set_priority(&self, id: ModuleId, priority: i32) -> Result<(), ModuleError> {
        let mut modules = self.modules.lock().await;
        let module = modules
            .get_mut(&id)
            .ok_or_else(|| ModuleError::ModuleNotFound(format!("module {}", id)))?;
        module.handle.priority = priority;
        Ok(())
    }

    async fn start(&self, id: ModuleId) -> Result<(), ModuleError> {
        let mut modules = self.modules.lock().await;
        let module = modules
            .get_mut(&id)
            .ok_or_else(|| ModuleError::ModuleNotFound(format!("module {}", id)))?;

        if module.handle.is_fragment {
            return Err(ModuleError::FragmentStart(
                module.handle.symbolic_name.clone(),
            ));
        }

        module.state = ModuleState::Active;
        info!("Started module {}", module.handle.symbolic_name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn write_archive(dir: &Path, file_name: &str, contents: &str) -> String {
        let path = dir.join(file_name);
        std::fs::write(&path, contents).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[tokio::test]
    async fn install_is_idempotent_per_location() {
        let dir = tempfile::tempdir().unwrap();
        let location = write_archive(
            dir.path(),
            "widget.mod",
            "name = \"widget\"\nversion = \"1.0.0\"\n",
        );

        let runtime = HostRuntime::new();
        let first = runtime.install(&location).await.unwrap();
        let second = runtime.install(&location).await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(runtime.live_modules().await.len(), 2); // root + widget
    }

    #[tokio::test]
    async fn fragments_cannot_be_started() {
        let dir = tempfile::tempdir().unwrap();
        let location = write_archive(
            dir.path(),
            "widget-l10n.mod",
            "name = \"widget-l10n\"\nversion = \"1.0.0\"\nfragment_host = \"widget\"\n",
        );

        let runtime = HostRuntime::new();
        let fragment = runtime.install(&location).await.unwrap();
        assert!(fragment.is_fragment);
        assert!(matches!(
            runtime.start(fragment.id).await,
            Err(ModuleError::FragmentStart(_))
        ));
    }

    #[tokio::test]
    async fn root_module_cannot_be_uninstalled() {
        let runtime = HostRuntime::new();
        assert!(runtime.uninstall(ROOT_MODULE_ID).await.is_err());
        assert_eq!(runtime.live_modules().await.len(), 1);
    }

    #[tokio::test]
    async fn stop_is_idempotent_and_wait_is_bounded() {
        let runtime = HostRuntime::new();
        assert!(matches!(
            runtime.wait_for_stop(Some(Duration::from_millis(20))).await,
            Err(ModuleError::StopTimeout)
        ));

        runtime.stop();
        runtime.stop();
        assert!(runtime.is_stopped());
        runtime
            .wait_for_stop(Some(Duration::from_millis(20)))
            .await
            .unwrap();
    }
}
