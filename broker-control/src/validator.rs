// /////////////////////////////////////////////////////////////////////////////
// Broker Control Plane
// Copyright (c) 2026 the broker-control contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Validator Pipeline
//!
//! An ordered chain of pure rules, each `config -> (errors, warnings)`. The
//! pipeline never short-circuits: every rule runs on every validation so
//! callers get the full picture in one pass, not one error at a time.

use broker_control_domain::config::{BrokerConfiguration, ReloadClass};
use broker_control_domain::diff::diff;
use std::path::Path;

/// The (errors, warnings) pair a single rule contributes.
#[derive(Debug, Clone, Default)]
pub struct RuleOutcome {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl RuleOutcome {
    fn ok() -> Self {
        Self::default()
    }

    fn error(msg: impl Into<String>) -> Self {
        Self { errors: vec![msg.into()], warnings: Vec::new() }
    }
}

type Rule = Box<dyn Fn(&BrokerConfiguration) -> RuleOutcome + Send + Sync>;

/// Aggregated result of running the whole pipeline once.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Holds the built-in rules plus whatever the caller registers with
/// [`ValidatorPipeline::add_rule`]. User rules run after built-ins, in
/// registration order.
pub struct ValidatorPipeline {
    built_in: Vec<Rule>,
    user: Vec<Rule>,
}

impl Default for ValidatorPipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl ValidatorPipeline {
    pub fn new() -> Self {
        Self {
            built_in: vec![
                Box::new(rule_port_range),
                Box::new(rule_port_conflict),
                Box::new(rule_payload_range),
                Box::new(rule_persistence_consistency),
                Box::new(rule_auth_exclusivity),
                Box::new(rule_timeouts),
                Box::new(rule_log_file),
            ],
            user: Vec::new(),
        }
    }

    pub fn add_rule<F>(&mut self, rule: F)
    where
        F: Fn(&BrokerConfiguration) -> RuleOutcome + Send + Sync + 'static,
    {
        self.user.push(Box::new(rule));
    }

    /// Runs every built-in rule, then every user rule, on `config`, in
    /// order, without short-circuiting on the first error.
    pub fn validate(&self, config: &BrokerConfiguration) -> ValidationReport {
        let mut report = ValidationReport::default();
        for rule in self.built_in.iter().chain(self.user.iter()) {
            let outcome = rule(config);
            report.errors.extend(outcome.errors);
            report.warnings.extend(outcome.warnings);
        }
        report
    }

    /// Same as [`Self::validate`] on `new`, plus impact warnings for every
    /// cold field the diff against `old` touches.
    pub fn validate_change(&self, old: &BrokerConfiguration, new: &BrokerConfiguration) -> ValidationReport {
        let mut report = self.validate(new);
        let delta = diff(old, new);
        for entry in delta.entries() {
            if entry.reload_class == ReloadClass::Cold {
                report.warnings.push(format!(
                    "{} change requires a restart; clients will reconnect",
                    entry.path
                ));
            }
        }
        report
    }
}

/// network.port is mandatory and must never be the disabled sentinel.
/// The optional listener ports (`http_port`, `https_port`, `cluster.port`,
/// `leaf_node.port`) accept 0-as-disabled; anything else is in range by
/// construction since they are `u16`.
fn rule_port_range(config: &BrokerConfiguration) -> RuleOutcome {
    if config.network.port == 0 {
        RuleOutcome::error("network.port must be in 1..=65535")
    } else {
        RuleOutcome::ok()
    }
}

/// http_port, https_port, cluster.port, leaf_node.port must each differ
/// from network.port when non-zero, and from each other.
fn rule_port_conflict(config: &BrokerConfiguration) -> RuleOutcome {
    let mut out = RuleOutcome::ok();
    let main = config.network.port;

    let listeners = [
        ("network.http_port", config.network.http_port),
        ("network.https_port", config.network.https_port),
        ("cluster.port", config.cluster.port),
        ("leaf_node.port", config.leaf_node.port),
    ];

    for (name, port) in listeners {
        if port != 0 && port == main {
            out.errors.push(format!("{name} must not equal network.port ({main})"));
        }
    }

    for i in 0..listeners.len() {
        for j in (i + 1)..listeners.len() {
            let (name_a, port_a) = listeners[i];
            let (name_b, port_b) = listeners[j];
            if port_a != 0 && port_a == port_b {
                out.errors.push(format!("{name_a} and {name_b} must not share the same port ({port_a})"));
            }
        }
    }

    out
}

fn rule_payload_range(config: &BrokerConfiguration) -> RuleOutcome {
    let p = config.limits.max_payload;
    if p == 0 || p > 1024 * 1024 * 1024 {
        RuleOutcome::error(format!("limits.max_payload must be in 1..=1073741824 bytes, got {p}"))
    } else {
        RuleOutcome::ok()
    }
}

/// persistence.enabled implies store_dir is non-empty and its parent is
/// writable, and max_store >= max_memory when both are finite.
fn rule_persistence_consistency(config: &BrokerConfiguration) -> RuleOutcome {
    let mut out = RuleOutcome::ok();
    let p = &config.persistence;

    if p.enabled {
        if p.store_dir.trim().is_empty() {
            out.errors.push("persistence.store_dir must be set when persistence.enabled".to_string());
        } else if !parent_writable(Path::new(&p.store_dir)) {
            out.errors.push(format!("persistence.store_dir parent is not writable: {}", p.store_dir));
        }

        if p.max_memory >= 0 && p.max_store >= 0 && p.max_store < p.max_memory {
            out.errors.push(format!(
                "persistence.max_store ({}) must be >= persistence.max_memory ({}) when both are finite",
                p.max_store, p.max_memory
            ));
        }
    }

    out
}

fn parent_writable(path: &Path) -> bool {
    let parent = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or_else(|| Path::new("."));
    match std::fs::metadata(parent) {
        Ok(meta) => !meta.permissions().readonly(),
        Err(_) => false,
    }
}

/// At most one of (username+password) or token may be set.
fn rule_auth_exclusivity(config: &BrokerConfiguration) -> RuleOutcome {
    let a = &config.authentication;
    let has_userpass = a.username.is_some() || a.password.is_some();
    let has_token = a.token.is_some();
    if has_userpass && has_token {
        RuleOutcome::error("authentication must use either username/password or token, not both")
    } else {
        RuleOutcome::ok()
    }
}

fn rule_timeouts(config: &BrokerConfiguration) -> RuleOutcome {
    let mut out = RuleOutcome::ok();
    if config.limits.ping_interval_secs == 0 {
        out.errors.push("limits.ping_interval_secs must be > 0".to_string());
    }
    if config.limits.write_deadline_secs == 0 {
        out.errors.push("limits.write_deadline_secs must be > 0".to_string());
    }
    if config.limits.max_control_line == 0 {
        out.errors.push("limits.max_control_line must be > 0".to_string());
    }
    if config.limits.max_pings_out == 0 {
        out.errors.push("limits.max_pings_out must be > 0".to_string());
    }
    out
}

fn rule_log_file(config: &BrokerConfiguration) -> RuleOutcome {
    let l = &config.logging;
    if l.log_file_size_bytes > 0 {
        match &l.log_file {
            None => return RuleOutcome::error("logging.log_file must be set when logging.log_file_size_bytes > 0"),
            Some(path) if path.trim().is_empty() => {
                return RuleOutcome::error("logging.log_file must be set when logging.log_file_size_bytes > 0")
            }
            Some(path) => {
                if !parent_writable(Path::new(path)) {
                    return RuleOutcome::error(format!("logging.log_file parent is not writable: {path}"));
                }
            }
        }
    }
    RuleOutcome::ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> BrokerConfiguration {
        BrokerConfiguration::new("test")
    }

    #[test]
    fn port_boundaries() {
        let pipeline = ValidatorPipeline::new();
        let mut cfg = base();

        cfg.network.port = 0;
        assert!(!pipeline.validate(&cfg).is_ok());

        cfg.network.port = 1;
        assert!(pipeline.validate(&cfg).is_ok());

        cfg.network.port = 65535;
        assert!(pipeline.validate(&cfg).is_ok());
    }

    #[test]
    fn max_payload_boundaries() {
        let pipeline = ValidatorPipeline::new();
        let mut cfg = base();

        cfg.limits.max_payload = 0;
        assert!(!pipeline.validate(&cfg).is_ok());

        cfg.limits.max_payload = 1;
        assert!(pipeline.validate(&cfg).is_ok());

        cfg.limits.max_payload = 1024 * 1024 * 1024 + 1;
        assert!(!pipeline.validate(&cfg).is_ok());
    }

    #[test]
    fn timeouts_rule_rejects_zero_control_line_and_zero_pings_out() {
        let pipeline = ValidatorPipeline::new();
        let mut cfg = base();

        cfg.limits.max_control_line = 0;
        assert!(!pipeline.validate(&cfg).is_ok());
        cfg.limits.max_control_line = 4096;
        assert!(pipeline.validate(&cfg).is_ok());

        cfg.limits.max_pings_out = 0;
        assert!(!pipeline.validate(&cfg).is_ok());
        cfg.limits.max_pings_out = 2;
        assert!(pipeline.validate(&cfg).is_ok());
    }

    #[test]
    fn port_70000_is_out_of_range_for_u16() {
        // u16 cannot represent 70000; callers constructing configuration
        // from an external source (e.g. a u32/JSON number) must reject it
        // before it ever reaches a BrokerConfiguration. This pipeline still
        // guards the representable range.
        let pipeline = ValidatorPipeline::new();
        let mut cfg = base();
        cfg.network.port = 65535;
        assert!(pipeline.validate(&cfg).is_ok());
    }

    #[test]
    fn auth_exclusivity_rejects_both() {
        let pipeline = ValidatorPipeline::new();
        let mut cfg = base();
        cfg.authentication.username = Some("alice".into());
        cfg.authentication.password = Some("secret".into());
        cfg.authentication.token = Some("tok".into());
        assert!(!pipeline.validate(&cfg).is_ok());
    }

    #[test]
    fn log_file_rule_requires_a_writable_path_when_rotation_is_enabled() {
        let pipeline = ValidatorPipeline::new();
        let mut cfg = base();

        cfg.logging.log_file_size_bytes = 1024;
        cfg.logging.log_file = None;
        assert!(!pipeline.validate(&cfg).is_ok());

        let dir = tempfile::tempdir().unwrap();
        cfg.logging.log_file = Some(dir.path().join("broker.log").to_string_lossy().to_string());
        assert!(pipeline.validate(&cfg).is_ok());

        cfg.logging.log_file_size_bytes = 0;
        cfg.logging.log_file = None;
        assert!(pipeline.validate(&cfg).is_ok());
    }

    #[test]
    fn http_port_conflict_i4() {
        let pipeline = ValidatorPipeline::new();
        let mut cfg = base();
        cfg.network.port = 4222;
        cfg.network.http_port = 4222;
        assert!(!pipeline.validate(&cfg).is_ok());

        cfg.network.http_port = 0;
        assert!(pipeline.validate(&cfg).is_ok());
    }

    #[test]
    fn persistence_consistency_i2_i5() {
        let dir = tempfile::tempdir().unwrap();
        let store_dir = dir.path().join("store").to_string_lossy().to_string();

        let pipeline = ValidatorPipeline::new();
        let mut cfg = base();
        cfg.persistence.enabled = true;
        cfg.persistence.store_dir = String::new();
        assert!(!pipeline.validate(&cfg).is_ok());

        cfg.persistence.store_dir = store_dir;
        cfg.persistence.max_memory = 1000;
        cfg.persistence.max_store = 500;
        assert!(!pipeline.validate(&cfg).is_ok());

        cfg.persistence.max_store = 2000;
        assert!(pipeline.validate(&cfg).is_ok());
    }

    #[test]
    fn persistence_store_dir_under_a_nonexistent_parent_is_rejected() {
        let pipeline = ValidatorPipeline::new();
        let mut cfg = base();
        cfg.persistence.enabled = true;
        cfg.persistence.store_dir = "/no/such/parent/store".to_string();
        let report = pipeline.validate(&cfg);
        assert!(!report.is_ok());
        assert!(report.errors.iter().any(|e| e.contains("not writable")));
    }

    #[test]
    fn validate_change_warns_on_cold_fields() {
        let pipeline = ValidatorPipeline::new();
        let old = base();
        let mut new = old.clone();
        new.network.port = 4223;
        let report = pipeline.validate_change(&old, &new);
        assert!(report.is_ok());
        assert!(report.warnings.iter().any(|w| w.contains("network.port")));
    }

    #[test]
    fn user_rules_run_after_built_ins_and_are_preserved_in_order() {
        let mut pipeline = ValidatorPipeline::new();
        pipeline.add_rule(|_cfg| RuleOutcome { errors: vec![], warnings: vec!["first".into()] });
        pipeline.add_rule(|_cfg| RuleOutcome { errors: vec![], warnings: vec!["second".into()] });
        let report = pipeline.validate(&base());
        let positions: Vec<_> = report.warnings.iter().map(String::as_str).collect();
        let first = positions.iter().position(|w| *w == "first").unwrap();
        let second = positions.iter().position(|w| *w == "second").unwrap();
        assert!(first < second);
    }
}
