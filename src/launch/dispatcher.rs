//! Launch-mode dispatch
//!
//! Inspects the re-parsed launch arguments and the batch-mode flag, selects
//! exactly one of three execution modes, runs it, and coordinates host
//! shutdown afterwards.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tokio::time::Duration;
use tracing::{error, info, warn};

use async_trait::async_trait;

use crate::config::{HostConfig, BATCH_MODE_PROP, LAUNCH_ARGS_PROP};
use crate::launch::shutdown::ShutdownHandle;

/// Short flag requesting fork mode.
pub const FORK_FLAG_SHORT: &str = "-f";

/// Long flag requesting fork mode.
pub const FORK_FLAG_LONG: &str = "--fork";

/// Flag requesting batch mode; stripped before the batch driver runs.
pub const BATCH_MODE_FLAG: &str = "--batch-mode";

/// Exit code signaling an outer supervisor that the process must not be
/// restarted.
pub const NO_RESTART_EXIT_CODE: i32 = 254;

/// Bound on waiting for the host runtime to stop during normal dispatch.
const STOP_WAIT: Duration = Duration::from_millis(2000);

/// The three mutually exclusive execution modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchMode {
    /// Re-invoke the executable as a child process and block until it exits
    Fork,
    /// Run the headless batch driver in-process
    Batch,
    /// Run the command in-process against the live host
    Interactive,
}

impl LaunchMode {
    /// Select the mode once from the command tokens and the batch flag.
    /// Fork wins over batch when both are requested.
    pub fn select(command: &[String], batch_mode: bool) -> Self {
        let fork = command
            .iter()
            .any(|arg| arg == FORK_FLAG_SHORT || arg == FORK_FLAG_LONG);
        if fork {
            LaunchMode::Fork
        } else if batch_mode {
            LaunchMode::Batch
        } else {
            LaunchMode::Interactive
        }
    }
}

/// Result of an in-process command run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandStatus {
    /// The command finished; the host should shut down
    Complete,
    /// The command left an interactive session running
    Continue,
}

/// In-process command execution seam.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, command: &[String]) -> anyhow::Result<CommandStatus>;
}

/// Headless bulk-processing driver seam.
#[async_trait]
pub trait BatchDriver: Send + Sync {
    async fn execute(&self, command: &[String]) -> anyhow::Result<()>;
}

/// What the process should do after dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The host has stopped; exit normally
    Completed,
    /// An interactive session is still running; keep the process alive
    KeepRunning,
    /// Exit with the given code; restart must be suppressed
    FatalExit(i32),
}

/// Drives one launch-mode decision and the shutdown that follows it.
pub struct Dispatcher {
    shutdown: ShutdownHandle,
    fork_program: Option<PathBuf>,
}

impl Dispatcher {
    pub fn new(shutdown: ShutdownHandle) -> Self {
        Self {
            shutdown,
            fork_program: None,
        }
    }

    /// Override the executable re-invoked in fork mode. The current
    /// executable is used when unset.
    pub fn with_fork_program(mut self, program: PathBuf) -> Self {
        self.fork_program = Some(program);
        self
    }

    /// Select and run the launch mode for the configured command line.
    pub async fn dispatch(
        &self,
        config: &HostConfig,
        runner: &dyn CommandRunner,
        batch: &dyn BatchDriver,
    ) -> DispatchOutcome {
        let command = parse_launch_args(config);
        let batch_mode = config.get_bool(BATCH_MODE_PROP);

        match LaunchMode::select(&command, batch_mode) {
            LaunchMode::Fork => self.run_fork(&command).await,
            LaunchMode::Batch => self.run_batch(&command, batch).await,
            LaunchMode::Interactive => self.run_cli(&command, runner).await,
        }
    }

    /// Fork mode: spawn the child, block until it exits, then stop the host
    /// whatever the child's exit status was.
    async fn run_fork(&self, command: &[String]) -> DispatchOutcome {
        let stripped: Vec<String> = command
            .iter()
            .filter(|arg| *arg != FORK_FLAG_SHORT && *arg != FORK_FLAG_LONG)
            .cloned()
            .collect();

        let program = match &self.fork_program {
            Some(program) => Ok(program.clone()),
            None => std::env::current_exe(),
        };
        match program {
            Ok(program) => match fork_process(&program, &stripped).await {
                Ok(status) => info!("Forked process exited with {}", status),
                Err(e) => warn!("Failed to run forked process: {}", e),
            },
            Err(e) => warn!("Could not resolve the executable to fork: {}", e),
        }

        self.stop_host().await;
        DispatchOutcome::Completed
    }

    /// Batch mode: run the driver with the batch flag stripped. Failure is
    /// fatal for the whole process and must suppress supervisor restart.
    async fn run_batch(&self, command: &[String], driver: &dyn BatchDriver) -> DispatchOutcome {
        let stripped: Vec<String> = command
            .iter()
            .filter(|arg| *arg != BATCH_MODE_FLAG)
            .cloned()
            .collect();

        match driver.execute(&stripped).await {
            Ok(()) => {
                self.stop_host().await;
                DispatchOutcome::Completed
            }
            Err(e) => {
                error!("Fatal error from batch driver: {:#}", e);
                self.stop_host().await;
                DispatchOutcome::FatalExit(NO_RESTART_EXIT_CODE)
            }
        }
    }

    /// Interactive mode: a completed or failed command stops the host; only
    /// a `Continue` status leaves it running.
    async fn run_cli(&self, command: &[String], runner: &dyn CommandRunner) -> DispatchOutcome {
        match runner.run(command).await {
            Ok(CommandStatus::Complete) => {
                self.stop_host().await;
                DispatchOutcome::Completed
            }
            Ok(CommandStatus::Continue) => DispatchOutcome::KeepRunning,
            Err(e) => {
                warn!("Command execution failed: {:#}", e);
                self.stop_host().await;
                DispatchOutcome::Completed
            }
        }
    }

    async fn stop_host(&self) {
        if let Err(e) = self.shutdown.stop_and_wait(Some(STOP_WAIT)).await {
            warn!("Error stopping host runtime: {}", e);
        }
    }
}

/// Re-parse the newline-joined launch arguments recorded at startup.
pub fn parse_launch_args(config: &HostConfig) -> Vec<String> {
    config
        .get(LAUNCH_ARGS_PROP)
        .map(|raw| {
            raw.lines()
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Spawn `program` with `command` as its arguments, inheriting standard
/// output and error, and wait for it to exit.
pub async fn fork_process(
    program: &Path,
    command: &[String],
) -> std::io::Result<std::process::ExitStatus> {
    let mut child = Command::new(program)
        .args(command)
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()?;
    child.wait().await
}
