// /////////////////////////////////////////////////////////////////////////////
// Broker Control Plane
// Copyright (c) 2026 the broker-control contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Ports
//!
//! The two infrastructure contracts the controller depends on but never
//! implements itself: an append-only version log and a handle to the
//! native broker. Declaring them here, in the domain crate, keeps the
//! controller's orchestration logic decoupled from any particular storage
//! backend or broker binding, the same seam a repository trait draws
//! between an aggregate and its persistence.

use crate::config::BrokerConfiguration;
use crate::diff::ConfigurationDiff;
use crate::error::BrokerError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One entry in the append-only configuration history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionRecord {
    pub version_id: u64,
    pub config: BrokerConfiguration,
    pub parent_version_id: Option<u64>,
    pub applied_at: DateTime<Utc>,
    pub description: String,
    pub diff_from_parent: Option<ConfigurationDiff>,
    pub actor: String,
}

/// Append-only log of applied configurations, keyed by a monotonically
/// increasing `version_id` starting at 1. Implementations must guarantee:
/// no deletion, no in-place mutation, and `append` assigns strictly
/// increasing ids even under concurrent callers.
#[async_trait]
pub trait VersionStore: Send + Sync {
    /// Assigns and returns the new version's id. `record.version_id` is
    /// ignored on input and overwritten by the store.
    async fn append(&self, record: VersionRecord) -> Result<u64, BrokerError>;

    async fn get(&self, version_id: u64) -> Result<Option<VersionRecord>, BrokerError>;

    async fn latest(&self) -> Result<Option<VersionRecord>, BrokerError>;

    /// Paginated, newest first.
    async fn list(&self, limit: usize, offset: usize) -> Result<Vec<VersionRecord>, BrokerError>;
}

/// What `BrokerAdapter::start` returns on success.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartOutcome {
    pub client_url: String,
    pub broker_version: String,
}

/// The opaque, read-only snapshot `probe_info` returns while the broker is
/// running.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrokerInfo {
    pub version: String,
    pub url: String,
    pub jetstream_enabled: bool,
    pub connections: u64,
}

/// The sole seam between the control plane and the native broker. Every
/// method maps directly to a row of the Broker Adapter ABI table: `start`,
/// `reload`, `shutdown`, `probe_ready`, `probe_info`.
///
/// `reload` must be atomic from the caller's perspective: either the new
/// options are fully in effect or the broker is left exactly as it was. An
/// adapter that cannot guarantee this for a given diff must fail the reload
/// before touching the broker, never partway through.
#[async_trait]
pub trait BrokerAdapter: Send + Sync {
    async fn start(&self, config: &BrokerConfiguration) -> Result<StartOutcome, BrokerError>;

    /// Precondition: the broker is already started. Must not disconnect
    /// existing clients for a pure-hot diff.
    async fn reload(&self, config: &BrokerConfiguration) -> Result<(), BrokerError>;

    /// Drains and stops the broker. Never fails observably; an adapter that
    /// hits trouble logs it and returns anyway.
    async fn shutdown(&self);

    async fn probe_ready(&self) -> bool;

    /// `None` if the broker is not running.
    async fn probe_info(&self) -> Option<BrokerInfo>;

    /// Thin pass-through to the broker's connection list. Not elaborated
    /// beyond forwarding; this is not an extensive monitoring/telemetry
    /// read-through API. The default returns an empty array; a concrete
    /// adapter overrides it with whatever its native monitoring surface
    /// reports.
    async fn connections(&self) -> Result<serde_json::Value, BrokerError> {
        Ok(serde_json::json!([]))
    }

    async fn subscriptions(&self) -> Result<serde_json::Value, BrokerError> {
        Ok(serde_json::json!([]))
    }

    async fn persistence_stats(&self) -> Result<serde_json::Value, BrokerError> {
        Ok(serde_json::json!({}))
    }

    async fn routes(&self) -> Result<serde_json::Value, BrokerError> {
        Ok(serde_json::json!([]))
    }

    async fn leaf_nodes(&self) -> Result<serde_json::Value, BrokerError> {
        Ok(serde_json::json!([]))
    }

    async fn accounts(&self) -> Result<serde_json::Value, BrokerError> {
        Ok(serde_json::json!([]))
    }

    /// Forcibly disconnects one client. The default rejects, since the
    /// default in-memory adapter has no real connections to drop.
    async fn disconnect_client(&self, client_id: &str) -> Result<(), BrokerError> {
        Err(BrokerError::internal_error(format!("disconnect_client not supported by this adapter: {client_id}")))
    }
}
