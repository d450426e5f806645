// /////////////////////////////////////////////////////////////////////////////
// Broker Control Plane
// Copyright (c) 2026 the broker-control contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Control Plane Error Taxonomy
//!
//! A flat, cloneable error enum covering every failure mode the control
//! plane can surface, plus a small set of infrastructure-boundary errors
//! (serialization, I/O) needed by pluggable `VersionStore` implementations.
//!
//! Each variant corresponds to exactly one row of the error taxonomy table:
//! the error kind, its source component, whether it is recoverable, and
//! what state it leaves the system in are all derivable from the variant
//! itself via [`BrokerError::kind`], [`BrokerError::is_recoverable`], and
//! [`BrokerError::category`].

use thiserror::Error;

/// The error kind, independent of the human-readable message — this is
/// what callers match on, and what appears in a mutation's structured
/// result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BrokerErrorKind {
    ValidationFailed,
    ImmutableChange,
    CancelledBySubscriber,
    RestartRequired,
    StartFailed,
    ReloadFailed,
    TimedOut,
    NotRunning,
    VersionNotFound,
    SerializationError,
    IoError,
    InternalError,
}

impl std::fmt::Display for BrokerErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::ValidationFailed => "VALIDATION_FAILED",
            Self::ImmutableChange => "IMMUTABLE_CHANGE",
            Self::CancelledBySubscriber => "CANCELLED_BY_SUBSCRIBER",
            Self::RestartRequired => "RESTART_REQUIRED",
            Self::StartFailed => "START_FAILED",
            Self::ReloadFailed => "RELOAD_FAILED",
            Self::TimedOut => "TIMED_OUT",
            Self::NotRunning => "NOT_RUNNING",
            Self::VersionNotFound => "VERSION_NOT_FOUND",
            Self::SerializationError => "SERIALIZATION_ERROR",
            Self::IoError => "IO_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
        };
        f.write_str(s)
    }
}

/// Errors produced anywhere in the control plane.
///
/// Variants carry a human-readable message only; structured detail (the
/// validation error list, the diff that was rejected, etc.) is attached by
/// the caller at the point where the error is turned into a
/// [`crate::outcome::MutationOutcome`].
#[derive(Error, Debug, Clone)]
pub enum BrokerError {
    #[error("validation failed: {0}")]
    ValidationFailed(String),

    #[error("immutable field change rejected: {0}")]
    ImmutableChange(String),

    #[error("mutation cancelled by subscriber: {0}")]
    CancelledBySubscriber(String),

    #[error("restart required: {0}")]
    RestartRequired(String),

    #[error("broker start failed: {0}")]
    StartFailed(String),

    #[error("broker reload failed: {0}")]
    ReloadFailed(String),

    #[error("operation timed out: {0}")]
    TimedOut(String),

    #[error("controller not running: {0}")]
    NotRunning(String),

    #[error("version not found: {0}")]
    VersionNotFound(String),

    #[error("serialization error: {0}")]
    SerializationError(String),

    #[error("io error: {0}")]
    IoError(String),

    #[error("internal error: {0}")]
    InternalError(String),
}

impl BrokerError {
    pub fn validation_failed(errors: &[String]) -> Self {
        Self::ValidationFailed(errors.join("; "))
    }

    pub fn immutable_change(msg: impl Into<String>) -> Self {
        Self::ImmutableChange(msg.into())
    }

    pub fn cancelled_by_subscriber(reason: impl Into<String>) -> Self {
        Self::CancelledBySubscriber(reason.into())
    }

    pub fn restart_required(msg: impl Into<String>) -> Self {
        Self::RestartRequired(msg.into())
    }

    pub fn start_failed(msg: impl Into<String>) -> Self {
        Self::StartFailed(msg.into())
    }

    pub fn reload_failed(msg: impl Into<String>) -> Self {
        Self::ReloadFailed(msg.into())
    }

    pub fn timed_out(msg: impl Into<String>) -> Self {
        Self::TimedOut(msg.into())
    }

    pub fn not_running(msg: impl Into<String>) -> Self {
        Self::NotRunning(msg.into())
    }

    pub fn version_not_found(version_id: u64) -> Self {
        Self::VersionNotFound(format!("version {version_id} not found"))
    }

    pub fn internal_error(msg: impl Into<String>) -> Self {
        Self::InternalError(msg.into())
    }

    /// The taxonomy kind this error belongs to.
    pub fn kind(&self) -> BrokerErrorKind {
        match self {
            Self::ValidationFailed(_) => BrokerErrorKind::ValidationFailed,
            Self::ImmutableChange(_) => BrokerErrorKind::ImmutableChange,
            Self::CancelledBySubscriber(_) => BrokerErrorKind::CancelledBySubscriber,
            Self::RestartRequired(_) => BrokerErrorKind::RestartRequired,
            Self::StartFailed(_) => BrokerErrorKind::StartFailed,
            Self::ReloadFailed(_) => BrokerErrorKind::ReloadFailed,
            Self::TimedOut(_) => BrokerErrorKind::TimedOut,
            Self::NotRunning(_) => BrokerErrorKind::NotRunning,
            Self::VersionNotFound(_) => BrokerErrorKind::VersionNotFound,
            Self::SerializationError(_) => BrokerErrorKind::SerializationError,
            Self::IoError(_) => BrokerErrorKind::IoError,
            Self::InternalError(_) => BrokerErrorKind::InternalError,
        }
    }

    /// Whether a caller can reasonably retry the operation that produced
    /// this error without changing anything else first.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::ValidationFailed(_)
                | Self::ImmutableChange(_)
                | Self::CancelledBySubscriber(_)
                | Self::RestartRequired(_)
                | Self::ReloadFailed(_)
                | Self::TimedOut(_)
        )
    }

    /// Coarse category, mirroring the source component column of the
    /// taxonomy table.
    pub fn category(&self) -> &'static str {
        match self {
            Self::ValidationFailed(_) => "validator",
            Self::ImmutableChange(_) => "diff",
            Self::CancelledBySubscriber(_) => "change_bus",
            Self::RestartRequired(_) => "controller",
            Self::StartFailed(_) => "broker_adapter",
            Self::ReloadFailed(_) => "broker_adapter",
            Self::TimedOut(_) => "controller",
            Self::NotRunning(_) => "controller",
            Self::VersionNotFound(_) => "version_store",
            Self::SerializationError(_) => "serialization",
            Self::IoError(_) => "io",
            Self::InternalError(_) => "internal",
        }
    }
}

impl From<std::io::Error> for BrokerError {
    fn from(err: std::io::Error) -> Self {
        Self::IoError(err.to_string())
    }
}

impl From<serde_json::Error> for BrokerError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_matches_taxonomy() {
        assert_eq!(BrokerError::validation_failed(&["bad port".into()]).kind(), BrokerErrorKind::ValidationFailed);
        assert_eq!(BrokerError::not_running("no config").kind(), BrokerErrorKind::NotRunning);
    }

    #[test]
    fn recoverable_flags_match_taxonomy_table() {
        assert!(BrokerError::validation_failed(&[]).is_recoverable());
        assert!(!BrokerError::start_failed("bind failed").is_recoverable());
        assert!(BrokerError::reload_failed("simulated").is_recoverable());
    }

    #[test]
    fn kind_display_matches_spec_names() {
        assert_eq!(BrokerErrorKind::ValidationFailed.to_string(), "VALIDATION_FAILED");
        assert_eq!(BrokerErrorKind::CancelledBySubscriber.to_string(), "CANCELLED_BY_SUBSCRIBER");
    }
}
