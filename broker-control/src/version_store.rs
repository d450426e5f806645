// /////////////////////////////////////////////////////////////////////////////
// Broker Control Plane
// Copyright (c) 2026 the broker-control contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Default in-memory [`VersionStore`]. The contract permits disk or
//! database-backed alternatives; this implementation is the one wired by
//! default and does not persist version history beyond process lifetime.

use async_trait::async_trait;
use broker_control_domain::error::BrokerError;
use broker_control_domain::ports::{VersionRecord, VersionStore};
use tokio::sync::Mutex;

/// Ordered, append-only sequence of versions, guarded by a single mutex so
/// `append` can assign ids atomically even under concurrent callers.
#[derive(Default)]
pub struct InMemoryVersionStore {
    versions: Mutex<Vec<VersionRecord>>,
}

impl InMemoryVersionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VersionStore for InMemoryVersionStore {
    async fn append(&self, mut record: VersionRecord) -> Result<u64, BrokerError> {
        let mut versions = self.versions.lock().await;
        let next_id = versions.last().map(|v| v.version_id + 1).unwrap_or(1);
        record.version_id = next_id;
        versions.push(record);
        Ok(next_id)
    }

    async fn get(&self, version_id: u64) -> Result<Option<VersionRecord>, BrokerError> {
        let versions = self.versions.lock().await;
        Ok(versions.iter().find(|v| v.version_id == version_id).cloned())
    }

    async fn latest(&self) -> Result<Option<VersionRecord>, BrokerError> {
        let versions = self.versions.lock().await;
        Ok(versions.last().cloned())
    }

    async fn list(&self, limit: usize, offset: usize) -> Result<Vec<VersionRecord>, BrokerError> {
        let versions = self.versions.lock().await;
        Ok(versions.iter().rev().skip(offset).take(limit).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use broker_control_domain::config::BrokerConfiguration;
    use chrono::Utc;

    fn record(parent: Option<u64>) -> VersionRecord {
        VersionRecord {
            version_id: 0,
            config: BrokerConfiguration::new("test"),
            parent_version_id: parent,
            applied_at: Utc::now(),
            description: "test".to_string(),
            diff_from_parent: None,
            actor: "test".to_string(),
        }
    }

    #[tokio::test]
    async fn append_assigns_strictly_increasing_ids() {
        let store = InMemoryVersionStore::new();
        let first = store.append(record(None)).await.unwrap();
        let second = store.append(record(Some(first))).await.unwrap();
        assert_eq!(first, 1);
        assert_eq!(second, 2);
    }

    #[tokio::test]
    async fn latest_and_get_agree() {
        let store = InMemoryVersionStore::new();
        let id = store.append(record(None)).await.unwrap();
        let latest = store.latest().await.unwrap().unwrap();
        let fetched = store.get(id).await.unwrap().unwrap();
        assert_eq!(latest.version_id, fetched.version_id);
    }

    #[tokio::test]
    async fn list_is_newest_first_and_paginated() {
        let store = InMemoryVersionStore::new();
        for _ in 0..5 {
            store.append(record(None)).await.unwrap();
        }
        let page = store.list(2, 1).await.unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].version_id, 4);
        assert_eq!(page[1].version_id, 3);
    }

    #[tokio::test]
    async fn get_unknown_version_returns_none() {
        let store = InMemoryVersionStore::new();
        assert!(store.get(99).await.unwrap().is_none());
    }
}
