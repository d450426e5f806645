// /////////////////////////////////////////////////////////////////////////////
// Broker Control Plane
// Copyright (c) 2026 the broker-control contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Logger Setup
//!
//! `tracing-subscriber` initialization for a process hosting the control
//! plane. Field names here (`version_id`, `reason`, `error`) are the same
//! ones the controller and change bus attach to their own `tracing` calls,
//! so a plain/JSON choice here is the only knob an operator needs to touch
//! to get either a human-readable console or a machine-parseable log
//! stream.

use thiserror::Error;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("invalid log filter directive: {0}")]
    InvalidFilter(String),

    #[error("a global tracing subscriber is already set")]
    AlreadyInitialized,
}

/// Output shape for the process's log stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable, colored when attached to a terminal.
    Pretty,
    /// Newline-delimited JSON, one object per event.
    Json,
}

/// Installs the global `tracing` subscriber. `filter` is an `EnvFilter`
/// directive string (e.g. `"broker_control=debug,info"`); pass `None` to
/// fall back to the `RUST_LOG` environment variable, defaulting to `info`
/// if that is unset too.
pub fn init_logging(format: LogFormat, filter: Option<&str>) -> Result<(), LoggerError> {
    let env_filter = match filter {
        Some(directive) => {
            EnvFilter::try_new(directive).map_err(|e| LoggerError::InvalidFilter(e.to_string()))?
        }
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    let subscriber = fmt().with_env_filter(env_filter).with_target(true);

    let result = match format {
        LogFormat::Pretty => subscriber.try_init(),
        LogFormat::Json => subscriber.json().try_init(),
    };

    result.map_err(|_| LoggerError::AlreadyInitialized)
}
