// /////////////////////////////////////////////////////////////////////////////
// Broker Control Plane
// Copyright (c) 2026 the broker-control contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Controller
//!
//! The orchestrator: a state machine that serializes every mutating
//! operation (`configure`, `apply_changes`, `rollback`, `restart_with`,
//! `shutdown`) through a single fairness-respecting critical section, while
//! read operations (`current_version`, `list_versions`, monitoring
//! pass-through) proceed against a lock-free snapshot that is atomically
//! swapped at the end of each successful mutation.

use crate::change_bus::ChangeBus;
use crate::outcome::MutationOutcome;
use crate::validator::ValidatorPipeline;
use broker_control_domain::config::BrokerConfiguration;
use broker_control_domain::compute_diff;
use broker_control_domain::error::BrokerError;
use broker_control_domain::events::{ConfigurationChanged, ConfigurationChanging};
use broker_control_domain::ports::{BrokerAdapter, BrokerInfo, VersionRecord, VersionStore};
use parking_lot::RwLock as SyncRwLock;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// States the controller moves through across one broker lifecycle.
/// `Stopped` is terminal for that lifecycle, but a fresh `configure` call
/// may re-enter `Starting` with a new configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Unconfigured,
    Starting,
    Running,
    /// A substate of `Running` entered after a reload timed out with the
    /// adapter left in an indeterminate state. Mutations are still
    /// accepted, but every outcome carries a warning until an operator
    /// resolves it (which happens implicitly the next time a mutation
    /// succeeds cleanly).
    Degraded,
    Reloading,
    Stopping,
    Stopped,
}

/// How a cold-touching diff should be handled. `apply_changes` always uses
/// `Reject`; `rollback` uses `Restart` only when the caller opts in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColdHandling {
    Reject,
    Restart,
}

const DEFAULT_READINESS_DEADLINE: Duration = Duration::from_secs(10);
const DEFAULT_OPERATION_DEADLINE: Duration = Duration::from_secs(10);

pub struct Controller {
    state: Mutex<ControllerState>,
    /// Lock-free read-path snapshot, swapped atomically at the end of every
    /// successful mutation — grounded in the same `RwLock<Arc<T>>` pattern
    /// other control-plane configuration reloaders use to let readers
    /// never contend with the mutating path.
    current: SyncRwLock<Option<Arc<VersionRecord>>>,
    adapter: Arc<dyn BrokerAdapter>,
    store: Arc<dyn VersionStore>,
    validator: ValidatorPipeline,
    bus: ChangeBus,
    readiness_deadline: Duration,
    operation_deadline: Duration,
}

impl Controller {
    pub fn new(adapter: Arc<dyn BrokerAdapter>, store: Arc<dyn VersionStore>) -> Self {
        Self {
            state: Mutex::new(ControllerState::Unconfigured),
            current: SyncRwLock::new(None),
            adapter,
            store,
            validator: ValidatorPipeline::new(),
            bus: ChangeBus::new(),
            readiness_deadline: DEFAULT_READINESS_DEADLINE,
            operation_deadline: DEFAULT_OPERATION_DEADLINE,
        }
    }

    /// Builds a controller whose deadlines come from the control plane's own
    /// layered [`crate::config::RuntimeSettings`] instead of the hardcoded
    /// defaults.
    pub fn with_settings(
        adapter: Arc<dyn BrokerAdapter>,
        store: Arc<dyn VersionStore>,
        settings: &crate::config::RuntimeSettings,
    ) -> Self {
        Self::new(adapter, store)
            .with_readiness_deadline(settings.readiness_deadline())
            .with_operation_deadline(settings.operation_deadline())
    }

    pub fn with_readiness_deadline(mut self, deadline: Duration) -> Self {
        self.readiness_deadline = deadline;
        self
    }

    pub fn with_operation_deadline(mut self, deadline: Duration) -> Self {
        self.operation_deadline = deadline;
        self
    }

    pub fn add_validation_rule<F>(&mut self, rule: F)
    where
        F: Fn(&BrokerConfiguration) -> crate::validator::RuleOutcome + Send + Sync + 'static,
    {
        self.validator.add_rule(rule);
    }

    pub fn subscribe_pre<F>(&self, handler: F) -> crate::change_bus::SubscriptionHandle
    where
        F: Fn(&ConfigurationChanging, &mut broker_control_domain::events::PreChangeVote) + Send + Sync + 'static,
    {
        self.bus.subscribe_pre(handler)
    }

    pub fn subscribe_post<F>(&self, handler: F) -> crate::change_bus::SubscriptionHandle
    where
        F: Fn(&ConfigurationChanged) + Send + Sync + 'static,
    {
        self.bus.subscribe_post(handler)
    }

    /// Lock-free read of the current version, if any. Never blocks on a
    /// mutation in flight.
    pub fn current_version(&self) -> Option<Arc<VersionRecord>> {
        self.current.read().clone()
    }

    pub async fn list_versions(&self, limit: usize, offset: usize) -> Result<Vec<VersionRecord>, BrokerError> {
        self.store.list(limit, offset).await
    }

    pub async fn probe_info(&self) -> Option<BrokerInfo> {
        self.adapter.probe_info().await
    }

    pub async fn probe_ready(&self) -> bool {
        self.adapter.probe_ready().await
    }

    /// Monitoring pass-through: thin forwarding to the adapter, not
    /// elaborated beyond the adapter's own read-only surface.
    pub async fn connections(&self) -> Result<serde_json::Value, BrokerError> {
        self.adapter.connections().await
    }

    pub async fn subscriptions(&self) -> Result<serde_json::Value, BrokerError> {
        self.adapter.subscriptions().await
    }

    pub async fn persistence_stats(&self) -> Result<serde_json::Value, BrokerError> {
        self.adapter.persistence_stats().await
    }

    pub async fn routes(&self) -> Result<serde_json::Value, BrokerError> {
        self.adapter.routes().await
    }

    pub async fn leaf_nodes(&self) -> Result<serde_json::Value, BrokerError> {
        self.adapter.leaf_nodes().await
    }

    pub async fn accounts(&self) -> Result<serde_json::Value, BrokerError> {
        self.adapter.accounts().await
    }

    pub async fn disconnect_client(&self, client_id: &str) -> Result<(), BrokerError> {
        self.adapter.disconnect_client(client_id).await
    }

    fn publish_snapshot(&self, record: Arc<VersionRecord>) {
        *self.current.write() = Some(record);
    }

    /// `configure(cfg)` from UNCONFIGURED: validate, start the broker,
    /// append version 1, fire the post-change event, transition to RUNNING.
    pub async fn configure(&self, cfg: BrokerConfiguration) -> MutationOutcome {
        let mut state = self.state.lock().await;
        if *state != ControllerState::Unconfigured {
            return MutationOutcome::failure(
                &BrokerError::not_running(format!("configure requires UNCONFIGURED, controller is {state:?}")),
                Vec::new(),
            );
        }

        let report = self.validator.validate(&cfg);
        if !report.is_ok() {
            warn!(errors = ?report.errors, "configure rejected by validator pipeline");
            return MutationOutcome::failure(&BrokerError::validation_failed(&report.errors), report.warnings);
        }

        *state = ControllerState::Starting;

        let start_result = match tokio::time::timeout(self.readiness_deadline, self.adapter.start(&cfg)).await {
            Ok(result) => result,
            Err(_) => Err(BrokerError::start_failed("readiness deadline exceeded")),
        };

        let outcome = match start_result {
            Err(err) => {
                *state = ControllerState::Unconfigured;
                MutationOutcome::failure(&err, report.warnings)
            }
            Ok(_started) => {
                let record = VersionRecord {
                    version_id: 0,
                    config: cfg,
                    parent_version_id: None,
                    applied_at: chrono::Utc::now(),
                    description: "initial configuration".to_string(),
                    diff_from_parent: None,
                    actor: "controller".to_string(),
                };
                match self.store.append(record.clone()).await {
                    Ok(version_id) => {
                        let mut record = record;
                        record.version_id = version_id;
                        let record = Arc::new(record);
                        self.publish_snapshot(record.clone());

                        self.bus.fire_post_change(&ConfigurationChanged {
                            old: None,
                            new: Some(record.config.clone()),
                            diff: None,
                            new_version_id: Some(version_id),
                        });

                        *state = ControllerState::Running;
                        info!(version_id, "broker configured and started");
                        MutationOutcome::success("broker started", report.warnings, Some(version_id))
                    }
                    Err(err) => {
                        *state = ControllerState::Unconfigured;
                        warn!(error = %err, "version store append failed during configure, reverting to UNCONFIGURED");
                        MutationOutcome::failure(&err, report.warnings)
                    }
                }
            }
        };

        outcome
    }

    /// `apply_changes(mutator)` from RUNNING (or the degraded substate).
    pub async fn apply_changes<F>(&self, mutator: F) -> MutationOutcome
    where
        F: FnOnce(&mut BrokerConfiguration),
    {
        let mut state = self.state.lock().await;
        if !matches!(*state, ControllerState::Running | ControllerState::Degraded) {
            return MutationOutcome::failure(
                &BrokerError::not_running(format!("apply_changes requires RUNNING, controller is {state:?}")),
                Vec::new(),
            );
        }

        let was_degraded = *state == ControllerState::Degraded;
        let current_record = match self.current_version() {
            Some(r) => r,
            None => {
                return MutationOutcome::failure(&BrokerError::not_running("no current version to mutate"), Vec::new())
            }
        };

        let mut candidate = current_record.config.clone();
        mutator(&mut candidate);

        self.transition_to_candidate(&mut state, &current_record, candidate, ColdHandling::Reject, was_degraded).await
    }

    /// `rollback(target_version_id)`: re-applies a prior version's exact
    /// snapshot as a brand-new version. If the target differs in cold
    /// fields, `allow_restart` decides whether to restart or reject.
    pub async fn rollback(&self, target_version_id: u64, allow_restart: bool) -> MutationOutcome {
        let mut state = self.state.lock().await;
        if !matches!(*state, ControllerState::Running | ControllerState::Degraded) {
            return MutationOutcome::failure(
                &BrokerError::not_running(format!("rollback requires RUNNING, controller is {state:?}")),
                Vec::new(),
            );
        }

        let was_degraded = *state == ControllerState::Degraded;
        let current_record = match self.current_version() {
            Some(r) => r,
            None => {
                return MutationOutcome::failure(&BrokerError::not_running("no current version to roll back from"), Vec::new())
            }
        };

        let target = match self.store.get(target_version_id).await {
            Ok(Some(v)) => v,
            Ok(None) => return MutationOutcome::failure(&BrokerError::version_not_found(target_version_id), Vec::new()),
            Err(err) => return MutationOutcome::failure(&err, Vec::new()),
        };

        let candidate = target.config;
        let handling = if allow_restart { ColdHandling::Restart } else { ColdHandling::Reject };
        self.transition_to_candidate(&mut state, &current_record, candidate, handling, was_degraded).await
    }

    /// `restart_with(cfg)` from RUNNING: validate, fire pre-change, stop,
    /// start with `cfg`, append, fire post-change. Clients disconnect; this
    /// is expected.
    pub async fn restart_with(&self, cfg: BrokerConfiguration) -> MutationOutcome {
        let mut state = self.state.lock().await;
        if !matches!(*state, ControllerState::Running | ControllerState::Degraded) {
            return MutationOutcome::failure(
                &BrokerError::not_running(format!("restart_with requires RUNNING, controller is {state:?}")),
                Vec::new(),
            );
        }

        let current_record = match self.current_version() {
            Some(r) => r,
            None => return MutationOutcome::failure(&BrokerError::not_running("no current version"), Vec::new()),
        };

        let delta = compute_diff(&current_record.config, &cfg);
        if delta.is_empty() {
            return MutationOutcome::no_op();
        }
        if delta.has_immutable() {
            return MutationOutcome::failure(
                &BrokerError::immutable_change("restart_with candidate changes an immutable field"),
                Vec::new(),
            );
        }

        let report = self.validator.validate_change(&current_record.config, &cfg);
        if !report.is_ok() {
            return MutationOutcome::failure(&BrokerError::validation_failed(&report.errors), report.warnings);
        }

        let vote = self.bus.fire_pre_change(&ConfigurationChanging {
            current: current_record.config.clone(),
            candidate: cfg.clone(),
            diff: delta.clone(),
            warnings: report.warnings.clone(),
        });
        if vote.is_cancelled() {
            let reason = vote.into_reason().unwrap_or_else(|| "cancelled".to_string());
            return MutationOutcome::failure(&BrokerError::cancelled_by_subscriber(reason), report.warnings);
        }

        *state = ControllerState::Stopping;
        self.adapter.shutdown().await;
        *state = ControllerState::Starting;

        let start_result = tokio::time::timeout(self.readiness_deadline, self.adapter.start(&cfg))
            .await
            .unwrap_or_else(|_| Err(BrokerError::start_failed("readiness deadline exceeded")));

        match start_result {
            Err(err) => {
                *state = ControllerState::Unconfigured;
                MutationOutcome::failure(&err, report.warnings)
            }
            Ok(_) => {
                let record = VersionRecord {
                    version_id: 0,
                    config: cfg,
                    parent_version_id: Some(current_record.version_id),
                    applied_at: chrono::Utc::now(),
                    description: "restart".to_string(),
                    diff_from_parent: Some(delta.clone()),
                    actor: "controller".to_string(),
                };
                match self.store.append(record.clone()).await {
                    Ok(version_id) => {
                        let mut record = record;
                        record.version_id = version_id;
                        let record = Arc::new(record);
                        self.publish_snapshot(record.clone());

                        self.bus.fire_post_change(&ConfigurationChanged {
                            old: Some(current_record.config.clone()),
                            new: Some(record.config.clone()),
                            diff: Some(delta),
                            new_version_id: Some(version_id),
                        });

                        *state = ControllerState::Running;
                        MutationOutcome::success("broker restarted", report.warnings, Some(version_id))
                    }
                    Err(err) => {
                        *state = ControllerState::Unconfigured;
                        MutationOutcome::failure(&err, report.warnings)
                    }
                }
            }
        }
    }

    /// Shared tail of `apply_changes` and `rollback`: diff, immutable
    /// check, validation, pre-fire, reload-or-restart, append, post-fire.
    async fn transition_to_candidate(
        &self,
        state: &mut ControllerState,
        current_record: &Arc<VersionRecord>,
        candidate: BrokerConfiguration,
        cold_handling: ColdHandling,
        was_degraded: bool,
    ) -> MutationOutcome {
        let current = &current_record.config;
        let delta = compute_diff(current, &candidate);

        if delta.is_empty() {
            return MutationOutcome::no_op();
        }

        if delta.has_immutable() {
            return MutationOutcome::failure(
                &BrokerError::immutable_change("candidate changes an immutable field"),
                Vec::new(),
            );
        }

        let report = self.validator.validate_change(current, &candidate);
        if !report.is_ok() {
            return MutationOutcome::failure(&BrokerError::validation_failed(&report.errors), report.warnings);
        }

        let mut warnings = report.warnings;
        if was_degraded {
            warnings.push("controller was degraded by a prior timeout; proceeding with caution".to_string());
        }

        let vote = self.bus.fire_pre_change(&ConfigurationChanging {
            current: current.clone(),
            candidate: candidate.clone(),
            diff: delta.clone(),
            warnings: warnings.clone(),
        });
        if vote.is_cancelled() {
            let reason = vote.into_reason().unwrap_or_else(|| "cancelled".to_string());
            warn!(reason = %reason, "pre-change subscriber cancelled the mutation");
            return MutationOutcome::failure(&BrokerError::cancelled_by_subscriber(reason), warnings);
        }

        *state = ControllerState::Reloading;

        if delta.has_cold() {
            match cold_handling {
                ColdHandling::Reject => {
                    *state = if was_degraded { ControllerState::Degraded } else { ControllerState::Running };
                    debug!(fields = delta.entries().len(), "candidate touches cold fields, rejecting via apply_changes policy");
                    return MutationOutcome::failure(
                        &BrokerError::restart_required("candidate touches cold fields; call restart_with to apply"),
                        warnings,
                    );
                }
                ColdHandling::Restart => {
                    *state = ControllerState::Stopping;
                    self.adapter.shutdown().await;
                    *state = ControllerState::Starting;
                    let start_result =
                        tokio::time::timeout(self.readiness_deadline, self.adapter.start(&candidate))
                            .await
                            .unwrap_or_else(|_| Err(BrokerError::start_failed("readiness deadline exceeded")));
                    if let Err(err) = start_result {
                        *state = ControllerState::Unconfigured;
                        return MutationOutcome::failure(&err, warnings);
                    }
                }
            }
        } else {
            let reload_result = tokio::time::timeout(self.operation_deadline, self.adapter.reload(&candidate)).await;
            match reload_result {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    *state = if was_degraded { ControllerState::Degraded } else { ControllerState::Running };
                    warn!(error = %err, "adapter reload failed, broker remains on previous options");
                    return MutationOutcome::failure(&err, warnings);
                }
                Err(_) => {
                    // Adapter is in an indeterminate state: degrade rather
                    // than assume either the old or new options are live.
                    *state = ControllerState::Degraded;
                    warn!(deadline = ?self.operation_deadline, "reload did not complete in time, controller entering DEGRADED");
                    return MutationOutcome::failure(&BrokerError::timed_out("reload did not complete in time"), warnings);
                }
            }
        }

        let record = VersionRecord {
            version_id: 0,
            config: candidate.clone(),
            parent_version_id: Some(current_record.version_id),
            applied_at: chrono::Utc::now(),
            description: "applied change".to_string(),
            diff_from_parent: Some(delta.clone()),
            actor: "controller".to_string(),
        };

        match self.store.append(record.clone()).await {
            Ok(version_id) => {
                let mut record = record;
                record.version_id = version_id;
                let record = Arc::new(record);
                self.publish_snapshot(record.clone());

                self.bus.fire_post_change(&ConfigurationChanged {
                    old: Some(current.clone()),
                    new: Some(candidate),
                    diff: Some(delta),
                    new_version_id: Some(version_id),
                });

                *state = ControllerState::Running;
                info!(version_id, fields = record.diff_from_parent.as_ref().map(|d| d.entries().len()).unwrap_or(0), "configuration change applied");
                MutationOutcome::success("change applied", warnings, Some(version_id))
            }
            Err(err) => {
                *state = if was_degraded { ControllerState::Degraded } else { ControllerState::Running };
                warn!(error = %err, "version store append failed after successful reload");
                MutationOutcome::failure(&err, warnings)
            }
        }
    }

    /// Fires a post-change event with `new = None`, transitions to
    /// STOPPING, shuts the broker down, transitions to STOPPED. Valid from
    /// any state except STOPPED.
    pub async fn shutdown(&self) -> MutationOutcome {
        let mut state = self.state.lock().await;
        if *state == ControllerState::Stopped {
            return MutationOutcome::success("already stopped", Vec::new(), None);
        }

        let old_config = self.current_version().map(|r| r.config.clone());

        self.bus.fire_post_change(&ConfigurationChanged { old: old_config, new: None, diff: None, new_version_id: None });

        *state = ControllerState::Stopping;
        self.adapter.shutdown().await;
        *state = ControllerState::Stopped;
        info!("broker shut down");

        MutationOutcome::success("broker stopped", Vec::new(), None)
    }

    /// Waits for any in-flight mutation, then shuts the broker down if it
    /// is running, then unregisters every subscriber.
    pub async fn dispose(&self) {
        let state = self.state.lock().await;
        let should_shutdown = matches!(*state, ControllerState::Running | ControllerState::Degraded | ControllerState::Reloading);
        drop(state);

        if should_shutdown {
            self.shutdown().await;
        }

        self.bus.clear();
    }
}
