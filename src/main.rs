//! modhost binary entry point
//!
//! Boots the host runtime: merges configuration from file, environment, and
//! command line, deploys the configured module set, then hands the command
//! line to the launch dispatcher.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use modhost::config::{self, HostConfig};
use modhost::launch::dispatcher::{
    BatchDriver, CommandRunner, CommandStatus, DispatchOutcome, Dispatcher, BATCH_MODE_FLAG,
};
use modhost::launch::shutdown::{register_shutdown_hook, ShutdownHandle};
use modhost::module::properties;
use modhost::module::reconcile::ReconcileEngine;
use modhost::utils::init_logging;
use modhost::{HostRuntime, ModuleRegistry};

/// Host flags consumed before module startup. Everything else passes through
/// to the launch dispatcher untouched.
struct LaunchOptions {
    config_path: Option<PathBuf>,
    plugin_dir: Option<PathBuf>,
    batch_mode: bool,
}

impl LaunchOptions {
    fn parse(args: &[String]) -> Self {
        let mut options = LaunchOptions {
            config_path: None,
            plugin_dir: None,
            batch_mode: false,
        };
        for arg in args {
            if let Some(path) = arg.strip_prefix("--config=") {
                options.config_path = Some(PathBuf::from(path));
            } else if let Some(dir) = arg.strip_prefix("--plugin-dir=") {
                options.plugin_dir = Some(PathBuf::from(dir));
            } else if arg == BATCH_MODE_FLAG {
                options.batch_mode = true;
            }
        }
        options
    }
}

/// In-process command handler wired to the live host.
struct HostCommandRunner {
    runtime: Arc<HostRuntime>,
}

#[async_trait]
impl CommandRunner for HostCommandRunner {
    async fn run(&self, command: &[String]) -> anyhow::Result<CommandStatus> {
        let live = self.runtime.live_modules().await;
        info!(
            "Executing command {:?} against {} live modules",
            command,
            live.len()
        );
        Ok(CommandStatus::Complete)
    }
}

/// Headless batch driver wired by the binary.
struct HostBatchDriver;

#[async_trait]
impl BatchDriver for HostBatchDriver {
    async fn execute(&self, command: &[String]) -> anyhow::Result<()> {
        if command.is_empty() {
            anyhow::bail!("batch driver requires a command");
        }
        info!("Batch driver processing command {:?}", command);
        Ok(())
    }
}

fn load_config(path: Option<&Path>) -> HostConfig {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => {
            let default = PathBuf::from(config::DEFAULT_CONFIG_FILE);
            if !default.is_file() {
                return HostConfig::new();
            }
            default
        }
    };

    HostConfig::load_file(&path).unwrap_or_else(|e| {
        eprintln!("modhost: {}", e);
        HostConfig::new()
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let options = LaunchOptions::parse(&args);

    let mut config = load_config(options.config_path.as_deref());
    config.overlay_env();
    if let Some(dir) = &options.plugin_dir {
        config.set(config::PLUGIN_DIR_PROP, dir.to_string_lossy());
    }
    config.set(config::BATCH_MODE_PROP, options.batch_mode.to_string());
    config.set(config::LAUNCH_ARGS_PROP, args.join("\n"));

    init_logging(config.get(config::LOG_FILTER_PROP));

    let runtime = Arc::new(HostRuntime::new());
    let shutdown = ShutdownHandle::new(Arc::clone(&runtime));

    let hook_enabled = config
        .get(config::SHUTDOWN_HOOK_PROP)
        .map(|v| !v.eq_ignore_ascii_case("false"))
        .unwrap_or(true);
    if hook_enabled {
        register_shutdown_hook(shutdown.clone());
    }

    ReconcileEngine::new()
        .reconcile(&config, runtime.as_ref())
        .await;
    properties::install_from_properties(&config, runtime.as_ref()).await;
    properties::start_from_properties(&config, runtime.as_ref()).await;

    let dispatcher = Dispatcher::new(shutdown.clone());
    let runner = HostCommandRunner {
        runtime: Arc::clone(&runtime),
    };
    match dispatcher.dispatch(&config, &runner, &HostBatchDriver).await {
        DispatchOutcome::Completed => Ok(()),
        DispatchOutcome::KeepRunning => {
            runtime.wait_for_stop(None).await?;
            Ok(())
        }
        DispatchOutcome::FatalExit(code) => std::process::exit(code),
    }
}
