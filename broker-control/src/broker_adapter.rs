// /////////////////////////////////////////////////////////////////////////////
// Broker Control Plane
// Copyright (c) 2026 the broker-control contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! A test double for [`BrokerAdapter`] plus the `"ERROR: ..."` string-prefix
//! parsing shim every adapter boundary (native, FFI, or in-process) is
//! expected to honor per the Broker Adapter ABI.

use async_trait::async_trait;
use broker_control_domain::config::BrokerConfiguration;
use broker_control_domain::error::BrokerError;
use broker_control_domain::ports::{BrokerAdapter, BrokerInfo, StartOutcome};
use parking_lot::Mutex;

/// Parses the sole failure channel across the adapter ABI: a response
/// string beginning with `"ERROR: "` carries the failure reason; anything
/// else is success. Kept as a standalone function so a future FFI-backed
/// adapter can reuse it without depending on this crate's mock.
pub fn parse_adapter_response(raw: &str) -> Result<(), String> {
    match raw.strip_prefix("ERROR: ") {
        Some(reason) => Err(reason.to_string()),
        None => Ok(()),
    }
}

#[derive(Default)]
struct MockState {
    started: bool,
    current_config: Option<BrokerConfiguration>,
    next_start_failure: Option<String>,
    next_reload_failure: Option<String>,
    connections: u64,
}

/// An in-process stand-in for the native broker, used by controller and
/// facade tests. Failures are injected by pre-loading a wire string that
/// begins with `"ERROR: "`, run through the same [`parse_adapter_response`]
/// shim a real adapter would use, so the test fidelity matches production.
#[derive(Default)]
pub struct MockBrokerAdapter {
    state: Mutex<MockState>,
}

impl MockBrokerAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// The next `start()` call will fail with this reason instead of
    /// succeeding.
    pub fn fail_next_start(&self, reason: impl Into<String>) {
        self.state.lock().next_start_failure = Some(format!("ERROR: {}", reason.into()));
    }

    /// The next `reload()` call will fail with this reason instead of
    /// succeeding; the broker remains on its previous configuration.
    pub fn fail_next_reload(&self, reason: impl Into<String>) {
        self.state.lock().next_reload_failure = Some(format!("ERROR: {}", reason.into()));
    }

    pub fn is_started(&self) -> bool {
        self.state.lock().started
    }

    /// Simulates clients having connected, for monitoring-pass-through tests.
    pub fn set_connections(&self, count: u64) {
        self.state.lock().connections = count;
    }
}

#[async_trait]
impl BrokerAdapter for MockBrokerAdapter {
    async fn start(&self, config: &BrokerConfiguration) -> Result<StartOutcome, BrokerError> {
        let wire = self.state.lock().next_start_failure.take();
        if let Some(raw) = wire {
            if let Err(reason) = parse_adapter_response(&raw) {
                return Err(BrokerError::start_failed(reason));
            }
        }

        let mut state = self.state.lock();
        state.started = true;
        state.current_config = Some(config.clone());
        Ok(StartOutcome {
            client_url: format!("nats://{}:{}", config.network.host, config.network.port),
            broker_version: "mock-1.0.0".to_string(),
        })
    }

    async fn reload(&self, config: &BrokerConfiguration) -> Result<(), BrokerError> {
        let wire = self.state.lock().next_reload_failure.take();
        if let Some(raw) = wire {
            if let Err(reason) = parse_adapter_response(&raw) {
                // Old options remain in effect: current_config is untouched.
                return Err(BrokerError::reload_failed(reason));
            }
        }

        self.state.lock().current_config = Some(config.clone());
        Ok(())
    }

    async fn shutdown(&self) {
        let mut state = self.state.lock();
        state.started = false;
        state.current_config = None;
        state.connections = 0;
    }

    async fn probe_ready(&self) -> bool {
        self.state.lock().started
    }

    async fn probe_info(&self) -> Option<BrokerInfo> {
        let state = self.state.lock();
        if !state.started {
            return None;
        }
        let config = state.current_config.as_ref()?;
        Some(BrokerInfo {
            version: "mock-1.0.0".to_string(),
            url: format!("nats://{}:{}", config.network.host, config.network.port),
            jetstream_enabled: config.persistence.enabled,
            connections: state.connections,
        })
    }

    async fn connections(&self) -> Result<serde_json::Value, BrokerError> {
        Ok(serde_json::json!({ "count": self.state.lock().connections }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_error_prefix() {
        assert_eq!(parse_adapter_response("ERROR: simulated"), Err("simulated".to_string()));
        assert_eq!(parse_adapter_response("ok"), Ok(()));
    }

    #[tokio::test]
    async fn start_then_reload_succeeds_by_default() {
        let adapter = MockBrokerAdapter::new();
        let cfg = BrokerConfiguration::new("test");
        let outcome = adapter.start(&cfg).await.unwrap();
        assert!(outcome.client_url.contains(&cfg.network.port.to_string()));
        assert!(adapter.probe_ready().await);
        adapter.reload(&cfg).await.unwrap();
    }

    #[tokio::test]
    async fn injected_reload_failure_surfaces_message() {
        let adapter = MockBrokerAdapter::new();
        let cfg = BrokerConfiguration::new("test");
        adapter.start(&cfg).await.unwrap();
        adapter.fail_next_reload("simulated");
        let err = adapter.reload(&cfg).await.unwrap_err();
        assert!(err.to_string().contains("simulated"));
        // The next reload call (without a fresh injected failure) succeeds again.
        adapter.reload(&cfg).await.unwrap();
    }

    #[tokio::test]
    async fn monitoring_connections_pass_through() {
        let adapter = MockBrokerAdapter::new();
        adapter.set_connections(3);
        let connections = adapter.connections().await.unwrap();
        assert_eq!(connections["count"], 3);
    }

    #[tokio::test]
    async fn disconnect_client_defaults_to_unsupported() {
        let adapter = MockBrokerAdapter::new();
        assert!(adapter.disconnect_client("client-1").await.is_err());
    }
}
