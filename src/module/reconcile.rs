//! Deploy reconciliation engine
//!
//! Diffs the scanned archive set against the live module set and applies
//! the configured install/update/uninstall/start actions. Module operation
//! failures are reported per module and never abort the pass; partial
//! failure is the expected steady state for a directory with mixed-health
//! archives.

use std::collections::HashMap;

use bitflags::bitflags;
use tracing::{info, warn};

use crate::config::{HostConfig, DEPLOY_ACTION_PROP, DEPLOY_PRIORITY_PROP};
use crate::module::priority::PriorityPolicy;
use crate::module::registry::discovery::ArtifactScanner;
use crate::module::traits::{ModuleHandle, ModuleRegistry, ROOT_MODULE_ID};
use crate::utils::with_default;

bitflags! {
    /// Deploy actions enabled for one reconciliation pass.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ActionSet: u8 {
        const INSTALL = 1 << 0;
        const START = 1 << 1;
        const UPDATE = 1 << 2;
        const UNINSTALL = 1 << 3;
    }
}

impl ActionSet {
    /// Parse a comma-separated action list.
    ///
    /// Only the four recognized tokens contribute; anything else is dropped
    /// without complaint.
    pub fn parse_list(raw: &str) -> Self {
        let mut actions = ActionSet::empty();
        for token in raw.split(',') {
            match token.trim().to_ascii_lowercase().as_str() {
                "install" => actions |= ActionSet::INSTALL,
                "start" => actions |= ActionSet::START,
                "update" => actions |= ActionSet::UPDATE,
                "uninstall" => actions |= ActionSet::UNINSTALL,
                _ => {}
            }
        }
        actions
    }
}

/// Outcome counters for one reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub installed: usize,
    pub updated: usize,
    pub uninstalled: usize,
    pub started: usize,
    pub failed: usize,
}

/// Reconciles scanned archives against the live module set.
pub struct ReconcileEngine {
    policy: PriorityPolicy,
}

impl ReconcileEngine {
    /// Engine with the default naming-convention priority policy.
    pub fn new() -> Self {
        Self {
            policy: PriorityPolicy::default(),
        }
    }

    /// Engine with a custom priority policy.
    pub fn with_policy(policy: PriorityPolicy) -> Self {
        Self { policy }
    }

    /// Run one reconciliation pass.
    ///
    /// An empty action set makes the pass a complete no-op: no directory
    /// scan and no registry calls.
    pub async fn reconcile(
        &self,
        config: &HostConfig,
        registry: &dyn ModuleRegistry,
    ) -> ReconcileReport {
        let mut report = ReconcileReport::default();

        let actions = ActionSet::parse_list(config.get(DEPLOY_ACTION_PROP).unwrap_or(""));
        if actions.is_empty() {
            return report;
        }
        info!("Reconciling module deployment with actions {:?}", actions);

        let default_priority = registry.initial_priority();
        let target_priority = match config.get(DEPLOY_PRIORITY_PROP) {
            Some(raw) => with_default(
                || raw.parse::<i32>(),
                default_priority,
                "Invalid deploy priority override",
            ),
            None => default_priority,
        };

        // Snapshot the live set keyed by location. Matches are consumed as
        // the scan is walked; whatever remains is live but absent from the
        // scan.
        let mut live: HashMap<String, ModuleHandle> = registry
            .live_modules()
            .await
            .into_iter()
            .map(|module| (module.location.clone(), module))
            .collect();

        let locations = ArtifactScanner::from_config(config).scan();

        let mut pending_start: Vec<ModuleHandle> = Vec::new();
        for location in &locations {
            let module = match live.remove(location) {
                None if actions.contains(ActionSet::INSTALL) => {
                    match registry.install(location).await {
                        Ok(module) => {
                            report.installed += 1;
                            Some(module)
                        }
                        Err(e) => {
                            warn!("Deploy install {}: {}", location, e);
                            report.failed += 1;
                            continue;
                        }
                    }
                }
                None => None,
                Some(module) => {
                    if actions.contains(ActionSet::UPDATE) {
                        if let Err(e) = registry.update(module.id).await {
                            warn!("Deploy update {}: {}", location, e);
                            report.failed += 1;
                            continue;
                        }
                        report.updated += 1;
                    }
                    Some(module)
                }
            };

            // Found or deployed, and not a fragment: assign the priority and
            // queue the module for the start phase.
            if let Some(module) = module {
                if !module.is_fragment {
                    let priority = self.policy.resolve(&module.symbolic_name, target_priority);
                    if let Err(e) = registry.set_priority(module.id, priority).await {
                        warn!("Deploy set priority {}: {}", location, e);
                        report.failed += 1;
                        continue;
                    }
                    pending_start.push(module);
                }
            }
        }

        // Everything still in the snapshot is live but was not scanned.
        if actions.contains(ActionSet::UNINSTALL) {
            for module in live.into_values() {
                if module.id == ROOT_MODULE_ID {
                    continue;
                }
                match registry.uninstall(module.id).await {
                    Ok(()) => report.uninstalled += 1,
                    Err(e) => {
                        warn!("Deploy uninstall {}: {}", module.location, e);
                        report.failed += 1;
                    }
                }
            }
        }

        if actions.contains(ActionSet::START) {
            for module in pending_start {
                match registry.start(module.id).await {
                    Ok(()) => report.started += 1,
                    Err(e) => {
                        warn!("Deploy start {}: {}", module.location, e);
                        report.failed += 1;
                    }
                }
            }
        }

        info!(
            "Deploy reconciliation finished: {} installed, {} updated, {} uninstalled, {} started, {} failed",
            report.installed, report.updated, report.uninstalled, report.started, report.failed
        );
        report
    }
}

impl Default for ReconcileEngine {
    fn default() -> Self {
        Self::new()
    }
}
