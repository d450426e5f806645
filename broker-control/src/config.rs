// /////////////////////////////////////////////////////////////////////////////
// Broker Control Plane
// Copyright (c) 2026 the broker-control contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Control Plane Runtime Settings
//!
//! The control plane has its own small set of runtime knobs — independent of
//! the [`broker_control_domain::config::BrokerConfiguration`] model under
//! test — covering readiness and drain deadlines and the default operation
//! deadline used to bound a mutation while it holds the controller's
//! critical section. These are layered the usual way a service layers its
//! own configuration: a file (TOML, JSON, or YAML), overridable by
//! `BROKER_CONTROL_*` environment variables, falling back to hardcoded
//! defaults when no file is present.

use broker_control_domain::error::BrokerError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

/// Runtime knobs for the control plane itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeSettings {
    /// How long `configure`/`restart_with` wait for `BrokerAdapter::start` to
    /// report readiness before failing with `START_FAILED`.
    pub readiness_deadline_secs: u64,
    /// How long `apply_changes`/`rollback` wait for `BrokerAdapter::reload`
    /// before failing with `TIMED_OUT` and possibly degrading.
    pub operation_deadline_secs: u64,
    /// Upper bound `BrokerAdapter::shutdown` is allowed to block draining
    /// existing connections.
    pub drain_deadline_secs: u64,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self { readiness_deadline_secs: 10, operation_deadline_secs: 10, drain_deadline_secs: 30 }
    }
}

impl RuntimeSettings {
    pub fn readiness_deadline(&self) -> Duration {
        Duration::from_secs(self.readiness_deadline_secs)
    }

    pub fn operation_deadline(&self) -> Duration {
        Duration::from_secs(self.operation_deadline_secs)
    }

    pub fn drain_deadline(&self) -> Duration {
        Duration::from_secs(self.drain_deadline_secs)
    }

    /// Loads settings from `path` (TOML/JSON/YAML inferred from extension),
    /// layering `BROKER_CONTROL_*` environment variable overrides on top,
    /// falling back to [`RuntimeSettings::default`] when `path` does not
    /// exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, BrokerError> {
        let path = path.as_ref();
        let mut builder = config::Config::builder();

        if path.exists() {
            builder = builder.add_source(config::File::from(path.to_path_buf()));
        } else {
            warn!(path = %path.display(), "runtime settings file not found, using defaults");
        }

        builder = builder.add_source(config::Environment::with_prefix("BROKER_CONTROL").separator("_"));

        let defaults = Self::default();
        builder = builder
            .set_default("readiness_deadline_secs", defaults.readiness_deadline_secs)
            .map_err(|e| BrokerError::internal_error(e.to_string()))?
            .set_default("operation_deadline_secs", defaults.operation_deadline_secs)
            .map_err(|e| BrokerError::internal_error(e.to_string()))?
            .set_default("drain_deadline_secs", defaults.drain_deadline_secs)
            .map_err(|e| BrokerError::internal_error(e.to_string()))?;

        let settings: Self =
            builder.build().map_err(|e| BrokerError::internal_error(e.to_string()))?.try_deserialize().map_err(|e| {
                BrokerError::internal_error(format!("failed to parse runtime settings: {e}"))
            })?;

        debug!(
            readiness_deadline_secs = settings.readiness_deadline_secs,
            operation_deadline_secs = settings.operation_deadline_secs,
            drain_deadline_secs = settings.drain_deadline_secs,
            "loaded control plane runtime settings"
        );

        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_controller_defaults() {
        let settings = RuntimeSettings::default();
        assert_eq!(settings.readiness_deadline(), Duration::from_secs(10));
        assert_eq!(settings.operation_deadline(), Duration::from_secs(10));
    }

    #[test]
    fn load_falls_back_to_defaults_when_file_missing() {
        let settings = RuntimeSettings::load("/nonexistent/broker-control.toml").unwrap();
        assert_eq!(settings.readiness_deadline_secs, 10);
    }

    #[test]
    fn load_reads_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("settings.toml");
        std::fs::write(&file, "readiness_deadline_secs = 5\noperation_deadline_secs = 7\ndrain_deadline_secs = 20\n")
            .unwrap();

        let settings = RuntimeSettings::load(&file).unwrap();
        assert_eq!(settings.readiness_deadline_secs, 5);
        assert_eq!(settings.operation_deadline_secs, 7);
        assert_eq!(settings.drain_deadline_secs, 20);
    }
}
