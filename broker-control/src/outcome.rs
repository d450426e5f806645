// /////////////////////////////////////////////////////////////////////////////
// Broker Control Plane
// Copyright (c) 2026 the broker-control contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! The structured result every mutating controller operation returns:
//! success flag, error kind (if any), a human-readable message, any
//! validation warnings, and the new version id on success.

use broker_control_domain::error::{BrokerError, BrokerErrorKind};

#[derive(Debug, Clone, PartialEq)]
pub struct MutationOutcome {
    pub success: bool,
    pub error_kind: Option<BrokerErrorKind>,
    pub message: String,
    pub warnings: Vec<String>,
    pub new_version_id: Option<u64>,
}

impl MutationOutcome {
    pub fn success(message: impl Into<String>, warnings: Vec<String>, new_version_id: Option<u64>) -> Self {
        Self { success: true, error_kind: None, message: message.into(), warnings, new_version_id }
    }

    /// A successful mutation that turned out to be a no-op: the diff was
    /// empty, so nothing was appended and no events fired.
    pub fn no_op() -> Self {
        Self {
            success: true,
            error_kind: None,
            message: "no-op: candidate equals current configuration".to_string(),
            warnings: Vec::new(),
            new_version_id: None,
        }
    }

    pub fn failure(err: &BrokerError, warnings: Vec<String>) -> Self {
        Self { success: false, error_kind: Some(err.kind()), message: err.to_string(), warnings, new_version_id: None }
    }
}
