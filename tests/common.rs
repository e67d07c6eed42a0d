//! Shared test fixtures for the module deploy tests

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tempfile::TempDir;

use modhost::config::{self, HostConfig};
use modhost::{HostRuntime, ModuleError, ModuleHandle, ModuleId, ModuleRegistry};

/// Temp-dir host fixture with a bundled and a plugin archive directory.
pub struct HostFixture {
    pub temp_dir: TempDir,
    pub bundled_dir: PathBuf,
    pub plugin_dir: PathBuf,
    pub runtime: std::sync::Arc<HostRuntime>,
}

impl HostFixture {
    pub fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let temp_dir = TempDir::new()?;
        let bundled_dir = temp_dir.path().join("bundled");
        let plugin_dir = temp_dir.path().join("plugins");
        std::fs::create_dir_all(&bundled_dir)?;
        std::fs::create_dir_all(&plugin_dir)?;

        Ok(HostFixture {
            temp_dir,
            bundled_dir,
            plugin_dir,
            runtime: std::sync::Arc::new(HostRuntime::new()),
        })
    }

    /// Write a plain module archive and return its location string.
    pub fn write_archive(&self, dir: &Path, file_name: &str, module_name: &str) -> String {
        let path = dir.join(file_name);
        std::fs::write(
            &path,
            format!("name = \"{}\"\nversion = \"1.0.0\"\n", module_name),
        )
        .unwrap();
        path.to_string_lossy().into_owned()
    }

    /// Write a fragment archive attached to `host_name`.
    pub fn write_fragment_archive(
        &self,
        dir: &Path,
        file_name: &str,
        module_name: &str,
        host_name: &str,
    ) -> String {
        let path = dir.join(file_name);
        std::fs::write(
            &path,
            format!(
                "name = \"{}\"\nversion = \"1.0.0\"\nfragment_host = \"{}\"\n",
                module_name, host_name
            ),
        )
        .unwrap();
        path.to_string_lossy().into_owned()
    }

    /// Configuration pointing at the fixture directories with the given
    /// action list.
    pub fn config(&self, actions: &str) -> HostConfig {
        let mut config = HostConfig::new();
        config.set(config::DEPLOY_ACTION_PROP, actions);
        config.set(
            config::BUNDLED_DIR_PROP,
            self.bundled_dir.to_string_lossy(),
        );
        config.set(config::PLUGIN_DIR_PROP, self.plugin_dir.to_string_lossy());
        config
    }
}

/// Registry mock that records every operation issued against it.
pub struct RecordingRegistry {
    calls: Mutex<Vec<String>>,
    live: Mutex<Vec<ModuleHandle>>,
    next_id: AtomicU64,
}

impl RecordingRegistry {
    pub fn new() -> Self {
        Self::with_live(Vec::new())
    }

    pub fn with_live(live: Vec<ModuleHandle>) -> Self {
        let next_id = live.iter().map(|m| m.id).max().unwrap_or(0) + 1;
        Self {
            calls: Mutex::new(Vec::new()),
            live: Mutex::new(live),
            next_id: AtomicU64::new(next_id),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| call.starts_with(prefix))
            .count()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl ModuleRegistry for RecordingRegistry {
    fn initial_priority(&self) -> i32 {
        self.record("initial_priority".to_string());
        1
    }

    async fn live_modules(&self) -> Vec<ModuleHandle> {
        self.record("live_modules".to_string());
        self.live.lock().unwrap().clone()
    }

    async fn install(&self, location: &str) -> Result<ModuleHandle, ModuleError> {
        self.record(format!("install {}", location));
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let handle = ModuleHandle {
            id,
            location: location.to_string(),
            symbolic_name: Path::new(location)
                .file_stem()
                .and_then(|stem| stem.to_str())
                .unwrap_or("module")
                .to_string(),
            is_fragment: false,
            priority: 1,
        };
        self.live.lock().unwrap().push(handle.clone());
        Ok(handle)
    }

    async fn update(&self, id: ModuleId) -> Result<(), ModuleError> {
        self.record(format!("update {}", id));
        Ok(())
    }

    async fn uninstall(&self, id: ModuleId) -> Result<(), ModuleError> {
        self.record(format!("uninstall {}", id));
        self.live.lock().unwrap().retain(|m| m.id != id);
        Ok(())
    }

    async fn set_priority(&self, id: ModuleId, priority: i32) -> Result<(), ModuleError> {
        self.record(format!("set_priority {} {}", id, priority));
        Ok(())
    }

    async fn start(&self, id: ModuleId) -> Result<(), ModuleError> {
        self.record(format!("start {}", id));
        Ok(())
    }
}

/// Build a live handle for seeding `RecordingRegistry`.
pub fn handle(id: ModuleId, location: &str, symbolic_name: &str) -> ModuleHandle {
    ModuleHandle {
        id,
        location: location.to_string(),
        symbolic_name: symbolic_name.to_string(),
        is_fragment: false,
        priority: 1,
    }
}
