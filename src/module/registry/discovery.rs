//! Module archive discovery
//!
//! Enumerates candidate module archives from the built-in bundled directory
//! and the optionally configured plugin directory.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::config::{HostConfig, BUNDLED_DIR_PROP, PLUGIN_DIR_PROP};
use crate::module::traits::MODULE_ARCHIVE_EXTENSION;
use crate::utils::log_error;

/// Name of the bundled archive directory next to the executable.
pub const BUNDLED_DIR_NAME: &str = "bundled";

/// Scanner producing the ordered list of candidate archive locations.
///
/// Bundled archives come first, then plugin-directory archives. Each source
/// is filtered to the archive extension and lexically sorted so scans are
/// deterministic. The same filename in both sources yields two distinct
/// locations.
pub struct ArtifactScanner {
    bundled_dir: PathBuf,
    plugin_dir: Option<PathBuf>,
}

impl ArtifactScanner {
    /// Create a scanner over the given bundled directory.
    pub fn new<P: AsRef<Path>>(bundled_dir: P) -> Self {
        Self {
            bundled_dir: bundled_dir.as_ref().to_path_buf(),
            plugin_dir: None,
        }
    }

    /// Add an external plugin directory, scanned after the bundled one.
    pub fn with_plugin_dir<P: AsRef<Path>>(mut self, plugin_dir: Option<P>) -> Self {
        self.plugin_dir = plugin_dir.map(|p| p.as_ref().to_path_buf());
        self
    }

    /// Build a scanner from configuration.
    pub fn from_config(config: &HostConfig) -> Self {
        let bundled_dir = config
            .get(BUNDLED_DIR_PROP)
            .map(PathBuf::from)
            .unwrap_or_else(default_bundled_dir);
        Self::new(bundled_dir).with_plugin_dir(config.get(PLUGIN_DIR_PROP))
    }

    /// Enumerate archive locations.
    ///
    /// Unreadable directories are logged and skipped; the scan returns
    /// whatever was collected.
    pub fn scan(&self) -> Vec<String> {
        let mut locations = Vec::new();
        Self::scan_dir(&self.bundled_dir, &mut locations);
        if let Some(dir) = &self.plugin_dir {
            Self::scan_dir(dir, &mut locations);
        }
        debug!("Scanned {} module archives", locations.len());
        locations
    }

    fn scan_dir(dir: &Path, out: &mut Vec<String>) {
        if !dir.is_dir() {
            debug!("Archive directory {:?} does not exist, skipping", dir);
            return;
        }

        let Some(entries) = log_error(|| fs::read_dir(dir), "Failed to list archive directory")
        else {
            return;
        };

        let mut found = Vec::new();
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Failed to read directory entry in {:?}: {}", dir, e);
                    continue;
                }
            };
            let path = entry.path();
            if path.is_file()
                && path.extension().and_then(|ext| ext.to_str())
                    == Some(MODULE_ARCHIVE_EXTENSION)
            {
                found.push(path.to_string_lossy().into_owned());
            }
        }

        found.sort();
        out.extend(found);
    }
}

/// Default bundled archive directory: `bundled/` next to the executable.
pub fn default_bundled_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(BUNDLED_DIR_NAME)))
        .unwrap_or_else(|| PathBuf::from(BUNDLED_DIR_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), "name = \"x\"\nversion = \"0.0.0\"\n").unwrap();
    }

    #[test]
    fn filters_extension_and_sorts_lexically() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "z.mod");
        touch(dir.path(), "a.mod");
        touch(dir.path(), "m.txt");

        let locations = ArtifactScanner::new(dir.path()).scan();
        let names: Vec<_> = locations
            .iter()
            .map(|l| Path::new(l).file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, vec!["a.mod", "z.mod"]);
    }

    #[test]
    fn bundled_archives_come_before_plugin_archives() {
        let bundled = tempfile::tempdir().unwrap();
        let plugin = tempfile::tempdir().unwrap();
        touch(bundled.path(), "b.mod");
        touch(plugin.path(), "a.mod");

        let locations = ArtifactScanner::new(bundled.path())
            .with_plugin_dir(Some(plugin.path()))
            .scan();
        let names: Vec<_> = locations
            .iter()
            .map(|l| Path::new(l).file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, vec!["b.mod", "a.mod"]);
    }

    #[test]
    fn missing_directories_scan_empty() {
        let locations = ArtifactScanner::new("/nonexistent/bundled")
            .with_plugin_dir(Some("/nonexistent/plugins"))
            .scan();
        assert!(locations.is_empty());
    }
}
