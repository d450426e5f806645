// /////////////////////////////////////////////////////////////////////////////
// Broker Control Plane
// Copyright (c) 2026 the broker-control contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Broker Control Domain
//!
//! Pure domain layer for the broker configuration control plane: the
//! typed configuration model, the diff engine, the error
//! taxonomy, domain events, and the two ports (`VersionStore`,
//! `BrokerAdapter`) the control-plane crate implements and orchestrates.
//!
//! This crate has no opinion about threading models beyond what the async
//! trait ports require, and no opinion about how the broker is actually
//! hosted — that belongs to `broker-control` and `broker-control-bootstrap`.

pub mod config;
pub mod diff;
pub mod error;
pub mod events;
pub mod ports;

pub use config::{
    AuthenticationConfig, BrokerConfiguration, ClusterConfig, FlagsConfig, LeafNodeConfig, LimitsConfig,
    LoggingConfig, NetworkConfig, PersistenceConfig, ReloadClass,
};
pub use diff::{diff as compute_diff, ConfigurationDiff, DiffClass, FieldDiff};
pub use error::{BrokerError, BrokerErrorKind};
pub use events::{ConfigurationChanged, ConfigurationChanging, PreChangeVote};
pub use ports::{BrokerAdapter, BrokerInfo, StartOutcome, VersionRecord, VersionStore};
