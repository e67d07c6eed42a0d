//! Host shutdown sequencing
//!
//! One explicitly-owned handle is shared by the dispatcher and the shutdown
//! hook; both funnel into the runtime's idempotent stop, so the host is
//! never left half-stopped regardless of which path terminates the process.

use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tracing::warn;

use crate::module::registry::host::HostRuntime;
use crate::module::traits::ModuleError;
use crate::utils::wait_for_shutdown_signal;

/// Cloneable handle for requesting host shutdown.
#[derive(Clone)]
pub struct ShutdownHandle {
    runtime: Arc<HostRuntime>,
}

impl ShutdownHandle {
    pub fn new(runtime: Arc<HostRuntime>) -> Self {
        Self { runtime }
    }

    /// Request stop and wait for it to take effect.
    ///
    /// Safe to call from several places; the underlying stop fires once.
    pub async fn stop_and_wait(&self, timeout: Option<Duration>) -> Result<(), ModuleError> {
        self.runtime.stop();
        self.runtime.wait_for_stop(timeout).await
    }

    /// Whether the runtime has been stopped.
    pub fn is_stopped(&self) -> bool {
        self.runtime.is_stopped()
    }
}

/// Register the shutdown hook: a background task that waits for a
/// termination signal and performs the same stop-and-wait, unbounded.
pub fn register_shutdown_hook(handle: ShutdownHandle) -> JoinHandle<()> {
    tokio::spawn(async move {
        wait_for_shutdown_signal().await;
        if let Err(e) = handle.stop_and_wait(None).await {
            warn!("Shutdown hook failed to stop the host runtime: {}", e);
        }
    })
}
