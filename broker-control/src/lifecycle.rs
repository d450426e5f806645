// /////////////////////////////////////////////////////////////////////////////
// Broker Control Plane
// Copyright (c) 2026 the broker-control contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Process Lifecycle
//!
//! Wires a [`broker_control_bootstrap::ShutdownCoordinator`] to
//! [`Controller::dispose`], so a binary embedding the control plane gets a
//! graceful-shutdown entry point without hand-rolling its own signal
//! `select!`.

use crate::controller::Controller;
use broker_control_bootstrap::ShutdownCoordinator;
use std::sync::Arc;

/// Waits for the coordinator's shutdown signal, then disposes `controller`.
/// Returns once disposal has completed, so a caller can follow this with
/// process exit.
pub async fn run_until_shutdown(controller: Arc<Controller>, coordinator: ShutdownCoordinator) {
    coordinator.wait_for_shutdown_signal().await;
    tracing::info!("shutdown signal received, disposing controller");
    controller.dispose().await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broker_adapter::MockBrokerAdapter;
    use crate::version_store::InMemoryVersionStore;
    use broker_control_domain::config::BrokerConfiguration;
    use std::time::Duration;

    #[tokio::test]
    async fn run_until_shutdown_disposes_after_noop_coordinator_is_driven_externally() {
        let controller = Arc::new(Controller::new(
            Arc::new(MockBrokerAdapter::new()),
            Arc::new(InMemoryVersionStore::new()),
        ));
        let mut cfg = BrokerConfiguration::new("lifecycle");
        cfg.network.port = 4222;
        controller.configure(cfg).await;

        let coordinator = ShutdownCoordinator::noop(Duration::from_secs(1));
        let controller_for_run = controller.clone();

        let handle = tokio::spawn(run_until_shutdown(controller_for_run, coordinator));

        // The noop coordinator never signals on its own; confirm the run
        // task is still pending rather than having disposed prematurely.
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!handle.is_finished());
        assert!(controller.current_version().is_some());

        handle.abort();
    }
}
