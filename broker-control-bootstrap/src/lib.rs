// /////////////////////////////////////////////////////////////////////////////
// Broker Control Plane
// Copyright (c) 2026 the broker-control contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Broker Control Bootstrap
//!
//! Ambient process concerns for a binary embedding the control plane:
//! `logger` installs the `tracing-subscriber` global subscriber, `shutdown`
//! bridges OS signals to a [`shutdown::ShutdownCoordinator`] a caller can
//! `await` before driving `Controller::dispose`. Neither module knows
//! anything about brokers, configuration, or validation — that is left
//! entirely to `broker-control-domain` and `broker-control`.

pub mod logger;
pub mod shutdown;

pub use logger::{init_logging, LogFormat, LoggerError};
pub use shutdown::ShutdownCoordinator;
