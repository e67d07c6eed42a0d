//! Configuration for the host runtime
//!
//! The host is driven by a flat string-to-string map merged from a TOML
//! configuration file, `MODHOST_*` environment variables, and command-line
//! flags. Nested TOML tables flatten to dot-separated keys so every consumer
//! sees one uniform namespace.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

pub mod tokens;

pub use tokens::{tokenize, TokenScanner};

/// Comma-separated subset of {install, start, update, uninstall} applied by
/// the deploy reconciliation pass.
pub const DEPLOY_ACTION_PROP: &str = "modhost.deploy.action";

/// Integer priority override for newly deployed modules.
pub const DEPLOY_PRIORITY_PROP: &str = "modhost.deploy.priority";

/// Directory scanned (non-recursively) for externally supplied module archives.
pub const PLUGIN_DIR_PROP: &str = "modhost.plugin.dir";

/// Override for the built-in bundled archive directory.
pub const BUNDLED_DIR_PROP: &str = "modhost.bundled.dir";

/// Prefix for auto-install properties, optionally suffixed with `.<priority>`.
pub const AUTO_INSTALL_PROP: &str = "modhost.auto.install";

/// Prefix for auto-start properties, optionally suffixed with `.<priority>`.
pub const AUTO_START_PROP: &str = "modhost.auto.start";

/// Whether the launch dispatcher runs the batch driver instead of the CLI.
pub const BATCH_MODE_PROP: &str = "modhost.batch.mode";

/// Newline-joined original command-line tokens, re-parsed by the dispatcher.
pub const LAUNCH_ARGS_PROP: &str = "modhost.launch.args";

/// Set to `false` to skip registering the shutdown hook.
pub const SHUTDOWN_HOOK_PROP: &str = "modhost.shutdown.hook";

/// Log filter applied when `RUST_LOG` is not set.
pub const LOG_FILTER_PROP: &str = "modhost.log.filter";

/// Environment variable prefix copied into the configuration map.
pub const ENV_PREFIX: &str = "MODHOST_";

/// Default configuration file probed when no `--config=` flag is given.
pub const DEFAULT_CONFIG_FILE: &str = "conf/modhost.toml";

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Flat key/value configuration map for the host.
#[derive(Debug, Clone, Default)]
pub struct HostConfig {
    values: HashMap<String, String>,
}

impl HostConfig {
    /// Create an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an already-merged map.
    pub fn from_map(values: HashMap<String, String>) -> Self {
        Self { values }
    }

    /// Load and flatten a TOML configuration file.
    ///
    /// If the file is not valid TOML it is re-read as simple `key=value`
    /// lines (blank lines and `#` comments ignored).
    pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let mut values = HashMap::new();
        match contents.parse::<toml::Table>() {
            Ok(table) => {
                for (key, value) in &table {
                    flatten_toml_value(key.clone(), value, &mut values);
                }
            }
            Err(e) => {
                debug!(
                    "Config file {:?} is not TOML ({}), falling back to key=value lines",
                    path, e
                );
                for line in contents.lines() {
                    let line = line.trim();
                    if line.is_empty() || line.starts_with('#') {
                        continue;
                    }
                    if let Some((key, value)) = line.split_once('=') {
                        values.insert(key.trim().to_string(), value.trim().to_string());
                    }
                }
            }
        }

        Ok(Self { values })
    }

    /// Copy `MODHOST_*` environment variables over the loaded values.
    ///
    /// `MODHOST_DEPLOY_ACTION` becomes `modhost.deploy.action`, so every key
    /// in the reserved namespace can be overridden without a config file.
    pub fn overlay_env(&mut self) {
        for (key, value) in std::env::vars() {
            if let Some(rest) = key.strip_prefix(ENV_PREFIX) {
                let dotted = format!("modhost.{}", rest.to_ascii_lowercase().replace('_', "."));
                self.values.insert(dotted, value);
            }
        }
    }

    /// Look up a value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Insert or replace a value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    /// `true` only when the value is the literal string `true` (any case).
    pub fn get_bool(&self, key: &str) -> bool {
        self.get(key)
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    }

    /// Iterate over all entries.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Flatten a TOML value into dot-notation string entries.
fn flatten_toml_value(prefix: String, value: &toml::Value, result: &mut HashMap<String, String>) {
    use toml::Value;

    match value {
        Value::String(s) => {
            result.insert(prefix, s.clone());
        }
        Value::Integer(i) => {
            result.insert(prefix, i.to_string());
        }
        Value::Float(f) => {
            result.insert(prefix, f.to_string());
        }
        Value::Boolean(b) => {
            result.insert(prefix, b.to_string());
        }
        Value::Array(arr) => {
            let values: Vec<String> = arr
                .iter()
                .map(|v| match v {
                    Value::String(s) => s.clone(),
                    _ => v.to_string(),
                })
                .collect();
            result.insert(prefix, values.join(","));
        }
        Value::Table(table) => {
            for (key, val) in table {
                let new_prefix = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", prefix, key)
                };
                flatten_toml_value(new_prefix, val, result);
            }
        }
        Value::Datetime(dt) => {
            result.insert(prefix, dt.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_tables_flatten_to_dotted_keys() {
        let mut values = HashMap::new();
        let table: toml::Table = r#"
            [modhost.deploy]
            action = "install,start"
            priority = 4

            [modhost]
            "plugin.dir" = "/opt/mods"
        "#
        .parse()
        .unwrap();
        for (key, value) in &table {
            flatten_toml_value(key.clone(), value, &mut values);
        }

        assert_eq!(
            values.get(DEPLOY_ACTION_PROP).map(String::as_str),
            Some("install,start")
        );
        assert_eq!(
            values.get(DEPLOY_PRIORITY_PROP).map(String::as_str),
            Some("4")
        );
        assert_eq!(values.get(PLUGIN_DIR_PROP).map(String::as_str), Some("/opt/mods"));
    }

    #[test]
    fn get_bool_only_accepts_true() {
        let mut config = HostConfig::new();
        config.set(BATCH_MODE_PROP, "TRUE");
        assert!(config.get_bool(BATCH_MODE_PROP));

        config.set(BATCH_MODE_PROP, "yes");
        assert!(!config.get_bool(BATCH_MODE_PROP));
        assert!(!config.get_bool("modhost.missing"));
    }

    #[test]
    #[serial_test::serial]
    fn environment_overlays_reserved_namespace() {
        std::env::set_var("MODHOST_DEPLOY_ACTION", "install");
        let mut config = HostConfig::new();
        config.set(DEPLOY_ACTION_PROP, "uninstall");
        config.overlay_env();
        std::env::remove_var("MODHOST_DEPLOY_ACTION");

        assert_eq!(config.get(DEPLOY_ACTION_PROP), Some("install"));
    }
}
