// /////////////////////////////////////////////////////////////////////////////
// Broker Control Plane
// Copyright (c) 2026 the broker-control contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Broker Configuration Model
//!
//! A typed, deep-cloneable snapshot of everything the embedded broker needs
//! to start or reload, plus the static field-classification table that the
//! [diff engine][crate::diff] and the controller consult to decide whether
//! a change can be applied live.
//!
//! Field classification is attached here, at schema-definition time, rather
//! than computed at diff time — see [`reload_class`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Whether a field can be changed on a running broker, requires a restart,
/// or must never change after the broker starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReloadClass {
    /// Reloadable on a live broker without disconnecting clients.
    Hot,
    /// Requires stopping and restarting the broker.
    Cold,
    /// Fixed once the configuration is created; any change is rejected.
    Immutable,
}

/// Full broker configuration snapshot. Cheap to clone: owned strings and
/// small `Vec<String>` sequences, no shared references, so the facade can
/// hand out deep copies on every mutation without worrying about aliasing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrokerConfiguration {
    pub id: Uuid,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub network: NetworkConfig,
    pub limits: LimitsConfig,
    pub flags: FlagsConfig,
    pub persistence: PersistenceConfig,
    pub authentication: AuthenticationConfig,
    pub cluster: ClusterConfig,
    pub leaf_node: LeafNodeConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub host: String,
    pub port: u16,
    /// 0 disables the monitoring HTTP listener.
    pub http_port: u16,
    /// 0 disables the monitoring HTTPS listener.
    pub https_port: u16,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LimitsConfig {
    pub max_payload: u64,
    pub max_control_line: u64,
    pub ping_interval_secs: u64,
    pub max_pings_out: u32,
    pub write_deadline_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagsConfig {
    pub debug: bool,
    pub trace: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistenceConfig {
    pub enabled: bool,
    pub store_dir: String,
    /// -1 means unlimited.
    pub max_memory: i64,
    /// -1 means unlimited.
    pub max_store: i64,
    pub domain: Option<String>,
    pub unique_tag: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticationConfig {
    pub username: Option<String>,
    pub password: Option<String>,
    pub token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterConfig {
    pub name: Option<String>,
    pub host: String,
    /// 0 disables clustering.
    pub port: u16,
    pub routes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeafNodeConfig {
    pub host: String,
    /// 0 disables the leafnode listener.
    pub port: u16,
    pub remotes: Vec<String>,
    pub credentials: Option<String>,
    pub tls_cert: Option<String>,
    pub tls_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub log_file: Option<String>,
    pub log_time_utc: bool,
    /// 0 disables rotation.
    pub log_file_size_bytes: u64,
}

impl BrokerConfiguration {
    /// Builds a fresh draft configuration with conservative broker-typical
    /// defaults. Callers mutate a clone of this (or of an existing version's
    /// snapshot) through the fluent facade; this constructor is only the
    /// starting point for a brand-new deployment.
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            description: description.into(),
            created_at: Utc::now(),
            network: NetworkConfig {
                host: "0.0.0.0".to_string(),
                port: 4222,
                http_port: 0,
                https_port: 0,
            },
            limits: LimitsConfig {
                max_payload: 1024 * 1024,
                max_control_line: 4096,
                ping_interval_secs: 120,
                max_pings_out: 2,
                write_deadline_secs: 10,
            },
            flags: FlagsConfig { debug: false, trace: false },
            persistence: PersistenceConfig {
                enabled: false,
                store_dir: String::new(),
                max_memory: -1,
                max_store: -1,
                domain: None,
                unique_tag: None,
            },
            authentication: AuthenticationConfig { username: None, password: None, token: None },
            cluster: ClusterConfig { name: None, host: "0.0.0.0".to_string(), port: 0, routes: Vec::new() },
            leaf_node: LeafNodeConfig {
                host: "0.0.0.0".to_string(),
                port: 0,
                remotes: Vec::new(),
                credentials: None,
                tls_cert: None,
                tls_key: None,
            },
            logging: LoggingConfig { log_file: None, log_time_utc: true, log_file_size_bytes: 0 },
        }
    }

    /// Canonical, field-by-field, order-sensitive equality. `#[derive(PartialEq)]`
    /// already gives us this (every nested type derives it too and `Vec`
    /// equality is order-sensitive), so this is just a readable alias for
    /// call sites that want to say what they mean.
    pub fn canonically_equals(&self, other: &Self) -> bool {
        self == other
    }
}

/// Returns the reload classification for a dotted field path as produced by
/// [`crate::diff::diff`]. Unknown paths are treated as [`ReloadClass::Cold`]
/// — the conservative choice, since an unrecognized field should never be
/// silently treated as hot-reloadable.
pub fn reload_class(field_path: &str) -> ReloadClass {
    match field_path {
        "identity.id" | "identity.description" | "identity.created_at" => ReloadClass::Immutable,

        "network.host" | "network.port" | "network.http_port" | "network.https_port" => ReloadClass::Cold,

        "limits.max_payload"
        | "limits.max_control_line"
        | "limits.ping_interval_secs"
        | "limits.max_pings_out"
        | "limits.write_deadline_secs" => ReloadClass::Hot,

        "flags.debug" | "flags.trace" => ReloadClass::Hot,

        // Persistence-enablement is hot where the underlying broker supports
        // it; the default adapter does not, so this table is conservative
        // and an adapter capability layer may override it for a specific
        // broker. store_dir/domain/unique_tag change the on-disk layout and
        // stay cold; the numeric limits can be applied live.
        "persistence.enabled" | "persistence.store_dir" | "persistence.domain" | "persistence.unique_tag" => {
            ReloadClass::Cold
        }
        "persistence.max_memory" | "persistence.max_store" => ReloadClass::Hot,

        "authentication.username" | "authentication.password" | "authentication.token" => ReloadClass::Hot,

        "cluster.name" | "cluster.host" | "cluster.port" | "cluster.routes" => ReloadClass::Cold,

        "leaf_node.host"
        | "leaf_node.port"
        | "leaf_node.remotes"
        | "leaf_node.credentials"
        | "leaf_node.tls_cert"
        | "leaf_node.tls_key" => ReloadClass::Cold,

        "logging.log_file" | "logging.log_time_utc" | "logging.log_file_size_bytes" => ReloadClass::Hot,

        _ => ReloadClass::Cold,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stated_examples_match_the_spec() {
        assert_eq!(reload_class("network.port"), ReloadClass::Cold);
        assert_eq!(reload_class("flags.debug"), ReloadClass::Hot);
        assert_eq!(reload_class("flags.trace"), ReloadClass::Hot);
        assert_eq!(reload_class("logging.log_file"), ReloadClass::Hot);
        assert_eq!(reload_class("limits.max_payload"), ReloadClass::Hot);
        assert_eq!(reload_class("identity.id"), ReloadClass::Immutable);
    }

    #[test]
    fn new_configuration_is_internally_consistent() {
        let cfg = BrokerConfiguration::new("test");
        assert!(cfg.canonically_equals(&cfg.clone()));
        assert_ne!(BrokerConfiguration::new("a").id, BrokerConfiguration::new("b").id);
    }

    #[test]
    fn serialize_then_deserialize_is_an_equal_configuration() {
        let mut cfg = BrokerConfiguration::new("l3");
        cfg.cluster.routes.push("nats-route://peer-a:6222".to_string());
        cfg.leaf_node.remotes.push("nats-leaf://hub:7422".to_string());
        cfg.authentication.token = Some("s3cr3t".to_string());

        let json = serde_json::to_string(&cfg).expect("configuration serializes");
        let restored: BrokerConfiguration = serde_json::from_str(&json).expect("configuration deserializes");
        assert!(cfg.canonically_equals(&restored));
    }
}
