// /////////////////////////////////////////////////////////////////////////////
// Broker Control Plane
// Copyright (c) 2026 the broker-control contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Fluent Mutation Facade
//!
//! A thin, ergonomic wrapper over [`Controller::apply_changes`]: callers
//! write a mutator closure against an owned copy of the current
//! configuration instead of hand-assembling a candidate. Every helper in
//! [`mutators`] is pure sugar over that same closure shape — none of them
//! touch the controller directly, so there is no way to bypass validation,
//! the change bus, or the version store through this module.

use crate::controller::Controller;
use crate::outcome::MutationOutcome;
use broker_control_domain::config::BrokerConfiguration;

/// Borrows a [`Controller`] and offers a fluent `mutate` entry point plus
/// access to the [`mutators`] helper library.
pub struct MutationFacade<'a> {
    controller: &'a Controller,
}

impl<'a> MutationFacade<'a> {
    pub fn new(controller: &'a Controller) -> Self {
        Self { controller }
    }

    /// Runs `mutator` against a clone of the current configuration and
    /// submits the result to [`Controller::apply_changes`]. The controller
    /// is solely responsible for snapshotting, validating, diffing, and
    /// firing events — this method never sees the internals of that
    /// pipeline.
    pub async fn mutate<F>(&self, mutator: F) -> MutationOutcome
    where
        F: FnOnce(&mut BrokerConfiguration),
    {
        self.controller.apply_changes(mutator).await
    }
}

/// Pre-built mutators for common single-field changes. Each returns a
/// closure compatible with [`MutationFacade::mutate`] / [`Controller::apply_changes`];
/// none of them call into the controller themselves.
pub mod mutators {
    use broker_control_domain::config::BrokerConfiguration;

    pub fn set_port(port: u16) -> impl FnOnce(&mut BrokerConfiguration) {
        move |cfg| cfg.network.port = port
    }

    pub fn set_debug(enabled: bool) -> impl FnOnce(&mut BrokerConfiguration) {
        move |cfg| cfg.flags.debug = enabled
    }

    pub fn set_trace(enabled: bool) -> impl FnOnce(&mut BrokerConfiguration) {
        move |cfg| cfg.flags.trace = enabled
    }

    pub fn set_max_payload(bytes: u64) -> impl FnOnce(&mut BrokerConfiguration) {
        move |cfg| cfg.limits.max_payload = bytes
    }

    pub fn enable_persistence(store_dir: impl Into<String>) -> impl FnOnce(&mut BrokerConfiguration) {
        let store_dir = store_dir.into();
        move |cfg| {
            cfg.persistence.enabled = true;
            cfg.persistence.store_dir = store_dir;
        }
    }

    pub fn disable_persistence() -> impl FnOnce(&mut BrokerConfiguration) {
        move |cfg| cfg.persistence.enabled = false
    }

    pub fn set_log_file(path: impl Into<String>, size_bytes: u64) -> impl FnOnce(&mut BrokerConfiguration) {
        let path = path.into();
        move |cfg| {
            cfg.logging.log_file = Some(path);
            cfg.logging.log_file_size_bytes = size_bytes;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broker_adapter::MockBrokerAdapter;
    use crate::version_store::InMemoryVersionStore;
    use std::sync::Arc;

    fn new_controller() -> Controller {
        Controller::new(Arc::new(MockBrokerAdapter::new()), Arc::new(InMemoryVersionStore::new()))
    }

    #[tokio::test]
    async fn facade_mutate_goes_through_apply_changes() {
        let controller = new_controller();
        let mut cfg = BrokerConfiguration::new("facade");
        cfg.network.port = 4222;
        controller.configure(cfg).await;

        let facade = MutationFacade::new(&controller);
        let outcome = facade.mutate(mutators::set_debug(true)).await;
        assert!(outcome.success);
        assert!(controller.current_version().unwrap().config.flags.debug);
    }

    #[tokio::test]
    async fn enable_persistence_mutator_sets_both_fields() {
        let controller = new_controller();
        let mut cfg = BrokerConfiguration::new("persistence");
        cfg.network.port = 4222;
        controller.configure(cfg).await;

        let facade = MutationFacade::new(&controller);
        let outcome = facade.mutate(mutators::enable_persistence("/tmp/broker-store")).await;
        assert!(outcome.success);
        let current = controller.current_version().unwrap();
        assert!(current.config.persistence.enabled);
        assert_eq!(current.config.persistence.store_dir, "/tmp/broker-store");
    }

    #[tokio::test]
    async fn set_port_mutator_hits_cold_rejection_through_apply_changes() {
        let controller = new_controller();
        let mut cfg = BrokerConfiguration::new("port");
        cfg.network.port = 4222;
        controller.configure(cfg).await;

        let facade = MutationFacade::new(&controller);
        let outcome = facade.mutate(mutators::set_port(4223)).await;
        assert!(!outcome.success);
        assert_eq!(
            outcome.error_kind,
            Some(broker_control_domain::error::BrokerErrorKind::RestartRequired)
        );
    }
}
