// /////////////////////////////////////////////////////////////////////////////
// Broker Control Plane
// Copyright (c) 2026 the broker-control contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Diff Engine
//!
//! Computes a structured, field-level delta between two configuration
//! snapshots. The engine never inspects values beyond equality — it defers
//! entirely to [`crate::config::reload_class`] for what a changed field
//! *means*.

use crate::config::{BrokerConfiguration, ReloadClass};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One differing field: its dotted path, old and new value (as JSON, so the
/// diff is serializable independent of the concrete field type), and the
/// field's static reload classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDiff {
    pub path: String,
    pub old_value: Value,
    pub new_value: Value,
    pub reload_class: ReloadClass,
}

/// The coarse classification of a whole diff, used by the controller to
/// pick between a live reload and a restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffClass {
    /// No differing fields at all.
    Empty,
    /// At least one differing field, none of them cold or immutable.
    HotOnly,
    /// At least one differing cold field, none immutable.
    HasCold,
    /// At least one differing immutable field.
    HasImmutable,
}

/// The structured delta between two configurations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigurationDiff {
    /// Always kept sorted by `path`, depth-first lexicographic, so equality
    /// and iteration order are both deterministic regardless of how the
    /// diff was constructed.
    entries: Vec<FieldDiff>,
}

impl ConfigurationDiff {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[FieldDiff] {
        &self.entries
    }

    pub fn contains_path(&self, path: &str) -> bool {
        self.entries.iter().any(|e| e.path == path)
    }

    /// Classifies the whole diff for the controller's reload-vs-restart
    /// decision. Immutable takes precedence over cold, which takes
    /// precedence over hot-only.
    pub fn classify(&self) -> DiffClass {
        if self.entries.is_empty() {
            return DiffClass::Empty;
        }
        if self.entries.iter().any(|e| e.reload_class == ReloadClass::Immutable) {
            DiffClass::HasImmutable
        } else if self.entries.iter().any(|e| e.reload_class == ReloadClass::Cold) {
            DiffClass::HasCold
        } else {
            DiffClass::HotOnly
        }
    }

    pub fn has_cold(&self) -> bool {
        matches!(self.classify(), DiffClass::HasCold)
    }

    pub fn has_immutable(&self) -> bool {
        matches!(self.classify(), DiffClass::HasImmutable)
    }

    pub fn hot_only(&self) -> bool {
        matches!(self.classify(), DiffClass::HotOnly)
    }
}

macro_rules! diff_field {
    ($entries:expr, $path:expr, $a:expr, $b:expr) => {
        if $a != $b {
            $entries.push(FieldDiff {
                path: $path.to_string(),
                old_value: serde_json::to_value(&$a).expect("scalar field always serializes"),
                new_value: serde_json::to_value(&$b).expect("scalar field always serializes"),
                reload_class: crate::config::reload_class($path),
            });
        }
    };
}

/// Computes every differing field path between `a` and `b`, each tagged
/// with its reload classification. `diff(a, a)` is always empty;
/// `diff(a, b).is_empty()` iff `a == b` (field-by-field).
pub fn diff(a: &BrokerConfiguration, b: &BrokerConfiguration) -> ConfigurationDiff {
    let mut entries = Vec::new();

    diff_field!(entries, "identity.id", a.id, b.id);
    diff_field!(entries, "identity.description", a.description, b.description);
    diff_field!(entries, "identity.created_at", a.created_at, b.created_at);

    diff_field!(entries, "network.host", a.network.host, b.network.host);
    diff_field!(entries, "network.port", a.network.port, b.network.port);
    diff_field!(entries, "network.http_port", a.network.http_port, b.network.http_port);
    diff_field!(entries, "network.https_port", a.network.https_port, b.network.https_port);

    diff_field!(entries, "limits.max_payload", a.limits.max_payload, b.limits.max_payload);
    diff_field!(entries, "limits.max_control_line", a.limits.max_control_line, b.limits.max_control_line);
    diff_field!(entries, "limits.ping_interval_secs", a.limits.ping_interval_secs, b.limits.ping_interval_secs);
    diff_field!(entries, "limits.max_pings_out", a.limits.max_pings_out, b.limits.max_pings_out);
    diff_field!(entries, "limits.write_deadline_secs", a.limits.write_deadline_secs, b.limits.write_deadline_secs);

    diff_field!(entries, "flags.debug", a.flags.debug, b.flags.debug);
    diff_field!(entries, "flags.trace", a.flags.trace, b.flags.trace);

    diff_field!(entries, "persistence.enabled", a.persistence.enabled, b.persistence.enabled);
    diff_field!(entries, "persistence.store_dir", a.persistence.store_dir, b.persistence.store_dir);
    diff_field!(entries, "persistence.max_memory", a.persistence.max_memory, b.persistence.max_memory);
    diff_field!(entries, "persistence.max_store", a.persistence.max_store, b.persistence.max_store);
    diff_field!(entries, "persistence.domain", a.persistence.domain, b.persistence.domain);
    diff_field!(entries, "persistence.unique_tag", a.persistence.unique_tag, b.persistence.unique_tag);

    diff_field!(entries, "authentication.username", a.authentication.username, b.authentication.username);
    diff_field!(entries, "authentication.password", a.authentication.password, b.authentication.password);
    diff_field!(entries, "authentication.token", a.authentication.token, b.authentication.token);

    diff_field!(entries, "cluster.name", a.cluster.name, b.cluster.name);
    diff_field!(entries, "cluster.host", a.cluster.host, b.cluster.host);
    diff_field!(entries, "cluster.port", a.cluster.port, b.cluster.port);
    diff_field!(entries, "cluster.routes", a.cluster.routes, b.cluster.routes);

    diff_field!(entries, "leaf_node.host", a.leaf_node.host, b.leaf_node.host);
    diff_field!(entries, "leaf_node.port", a.leaf_node.port, b.leaf_node.port);
    diff_field!(entries, "leaf_node.remotes", a.leaf_node.remotes, b.leaf_node.remotes);
    diff_field!(entries, "leaf_node.credentials", a.leaf_node.credentials, b.leaf_node.credentials);
    diff_field!(entries, "leaf_node.tls_cert", a.leaf_node.tls_cert, b.leaf_node.tls_cert);
    diff_field!(entries, "leaf_node.tls_key", a.leaf_node.tls_key, b.leaf_node.tls_key);

    diff_field!(entries, "logging.log_file", a.logging.log_file, b.logging.log_file);
    diff_field!(entries, "logging.log_time_utc", a.logging.log_time_utc, b.logging.log_time_utc);
    diff_field!(entries, "logging.log_file_size_bytes", a.logging.log_file_size_bytes, b.logging.log_file_size_bytes);

    entries.sort_by(|x, y| x.path.cmp(&y.path));
    ConfigurationDiff { entries }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diff_of_identical_configs_is_empty() {
        let cfg = BrokerConfiguration::new("a");
        assert!(diff(&cfg, &cfg).is_empty());
        assert_eq!(diff(&cfg, &cfg).classify(), DiffClass::Empty);
    }

    #[test]
    fn diff_empty_iff_equal() {
        let a = BrokerConfiguration::new("a");
        let mut b = a.clone();
        assert!(diff(&a, &b).is_empty());
        b.limits.max_payload += 1;
        assert!(!diff(&a, &b).is_empty());
        assert_ne!(a, b);
    }

    #[test]
    fn diff_computation_covers_every_classified_field() {
        let mut a = BrokerConfiguration::new("s4");
        a.network.port = 4222;
        a.flags.debug = true;
        a.limits.max_payload = 1024;

        let mut b = a.clone();
        b.flags.debug = false;
        b.limits.max_payload = 2048;

        let d = diff(&a, &b);
        assert_eq!(d.entries().len(), 2);
        assert!(d.contains_path("flags.debug"));
        assert!(d.contains_path("limits.max_payload"));
        assert!(!d.contains_path("network.port"));
    }

    #[test]
    fn classify_prioritizes_immutable_over_cold_over_hot() {
        let a = BrokerConfiguration::new("a");

        let mut cold = a.clone();
        cold.network.port = 5000;
        assert_eq!(diff(&a, &cold).classify(), DiffClass::HasCold);

        let mut hot = a.clone();
        hot.flags.debug = true;
        assert_eq!(diff(&a, &hot).classify(), DiffClass::HotOnly);

        let mut immutable = cold;
        immutable.id = uuid::Uuid::new_v4();
        assert_eq!(diff(&a, &immutable).classify(), DiffClass::HasImmutable);
    }
}
