// /////////////////////////////////////////////////////////////////////////////
// Broker Control Plane
// Copyright (c) 2026 the broker-control contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Domain events fired around the edges of a configuration change: a
//! cancellable pre-change notification and an informational post-change
//! notification, both fanned out by the change bus in the same calling
//! context the controller runs in.

use crate::config::BrokerConfiguration;
use crate::diff::ConfigurationDiff;
use serde::{Deserialize, Serialize};

/// Fired before the broker is touched. Carries the current and candidate
/// configurations, the computed diff (including cold/hot classification),
/// and any warnings the validator attached for subscriber inspection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigurationChanging {
    pub current: BrokerConfiguration,
    pub candidate: BrokerConfiguration,
    pub diff: ConfigurationDiff,
    pub warnings: Vec<String>,
}

/// Fired after a configuration was successfully appended to the version
/// store, or with `new = None` as the final event of a shutdown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigurationChanged {
    pub old: Option<BrokerConfiguration>,
    pub new: Option<BrokerConfiguration>,
    pub diff: Option<ConfigurationDiff>,
    pub new_version_id: Option<u64>,
}

/// Mutable ballot passed to every pre-change subscriber in turn. The first
/// subscriber to cancel wins the reason; later subscribers may still cancel
/// (so they are recorded as having attempted to), but they cannot overwrite
/// an existing reason.
#[derive(Debug, Clone, Default)]
pub struct PreChangeVote {
    cancelled: bool,
    reason: Option<String>,
}

impl PreChangeVote {
    pub fn cancel(&mut self, reason: impl Into<String>) {
        if !self.cancelled {
            self.cancelled = true;
            self.reason = Some(reason.into());
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    pub fn into_reason(self) -> Option<String> {
        self.reason
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_cancellation_wins() {
        let mut vote = PreChangeVote::default();
        vote.cancel("first reason");
        vote.cancel("second reason");
        assert_eq!(vote.reason(), Some("first reason"));
    }
}
