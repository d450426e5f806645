// /////////////////////////////////////////////////////////////////////////////
// Broker Control Plane
// Copyright (c) 2026 the broker-control contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Change Bus
//!
//! Two ordered subscriber lists fanned out synchronously from inside the
//! controller's critical section: `pre_change` (cancellable) and
//! `post_change` (informational). Subscriber callbacks are untrusted — a
//! panic in a pre-change handler becomes a cancellation, while a panic in a
//! post-change handler is logged and swallowed, since a post-change
//! notification cannot roll back a change that already committed.

use broker_control_domain::events::{ConfigurationChanged, ConfigurationChanging, PreChangeVote};
use parking_lot::Mutex;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

type PreChangeHandler = Arc<dyn Fn(&ConfigurationChanging, &mut PreChangeVote) + Send + Sync>;
type PostChangeHandler = Arc<dyn Fn(&ConfigurationChanged) + Send + Sync>;

#[derive(Clone, Copy, PartialEq, Eq)]
enum SubKind {
    Pre,
    Post,
}

struct Registry {
    pre: Vec<(u64, PreChangeHandler)>,
    post: Vec<(u64, PostChangeHandler)>,
    next_id: u64,
}

/// Ordered pre/post subscriber lists for one controller instance.
pub struct ChangeBus {
    registry: Arc<Mutex<Registry>>,
}

impl Default for ChangeBus {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeBus {
    pub fn new() -> Self {
        Self { registry: Arc::new(Mutex::new(Registry { pre: Vec::new(), post: Vec::new(), next_id: 1 })) }
    }

    pub fn subscribe_pre<F>(&self, handler: F) -> SubscriptionHandle
    where
        F: Fn(&ConfigurationChanging, &mut PreChangeVote) + Send + Sync + 'static,
    {
        let mut registry = self.registry.lock();
        let id = registry.next_id;
        registry.next_id += 1;
        registry.pre.push((id, Arc::new(handler)));
        SubscriptionHandle { id, kind: SubKind::Pre, registry: self.registry.clone() }
    }

    pub fn subscribe_post<F>(&self, handler: F) -> SubscriptionHandle
    where
        F: Fn(&ConfigurationChanged) + Send + Sync + 'static,
    {
        let mut registry = self.registry.lock();
        let id = registry.next_id;
        registry.next_id += 1;
        registry.post.push((id, Arc::new(handler)));
        SubscriptionHandle { id, kind: SubKind::Post, registry: self.registry.clone() }
    }

    /// Runs every pre-change subscriber in registration order, on the
    /// calling context. The first subscriber to cancel sets the reason;
    /// later subscribers still run (they may need to observe the attempt)
    /// but cannot override an already-set reason. A panicking subscriber is
    /// treated as that subscriber cancelling with its panic message.
    pub fn fire_pre_change(&self, event: &ConfigurationChanging) -> PreChangeVote {
        let handlers: Vec<_> = self.registry.lock().pre.iter().map(|(_, h)| h.clone()).collect();
        let mut vote = PreChangeVote::default();
        for handler in handlers {
            let result = std::panic::catch_unwind(AssertUnwindSafe(|| handler(event, &mut vote)));
            if let Err(panic) = result {
                vote.cancel(panic_message(panic));
            }
        }
        vote
    }

    /// Runs every post-change subscriber in registration order. Failures
    /// (panics) are logged and otherwise ignored — a post-change subscriber
    /// cannot un-apply a change.
    pub fn fire_post_change(&self, event: &ConfigurationChanged) {
        let handlers: Vec<_> = self.registry.lock().post.iter().map(|(_, h)| h.clone()).collect();
        for handler in handlers {
            let result = std::panic::catch_unwind(AssertUnwindSafe(|| handler(event)));
            if let Err(panic) = result {
                tracing::error!(error = %panic_message(panic), "post-change subscriber failed");
            }
        }
    }
}

fn panic_message(panic: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "subscriber panicked".to_string()
    }
}

/// A disposable registration. Dropping this handle does not automatically
/// unsubscribe — call [`Self::unsubscribe`] explicitly, mirroring the
/// controller's own explicit disposal semantics.
pub struct SubscriptionHandle {
    id: u64,
    kind: SubKind,
    registry: Arc<Mutex<Registry>>,
}

impl ChangeBus {
    /// Unregisters every subscriber. Used by the controller's disposal
    /// sequence; registration/unregistration is serialized independently
    /// of mutations and never blocks them.
    pub fn clear(&self) {
        let mut registry = self.registry.lock();
        registry.pre.clear();
        registry.post.clear();
    }
}

impl SubscriptionHandle {
    pub fn unsubscribe(self) {
        let mut registry = self.registry.lock();
        match self.kind {
            SubKind::Pre => registry.pre.retain(|(id, _)| *id != self.id),
            SubKind::Post => registry.post.retain(|(id, _)| *id != self.id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use broker_control_domain::config::BrokerConfiguration;
    use broker_control_domain::diff::diff;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn changing_event() -> ConfigurationChanging {
        let current = BrokerConfiguration::new("a");
        let mut candidate = current.clone();
        candidate.flags.debug = true;
        let d = diff(&current, &candidate);
        ConfigurationChanging { current, candidate, diff: d, warnings: Vec::new() }
    }

    #[test]
    fn first_cancellation_wins_and_fanout_continues() {
        let bus = ChangeBus::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let calls_a = calls.clone();
        bus.subscribe_pre(move |event, vote| {
            calls_a.fetch_add(1, Ordering::SeqCst);
            if event.candidate.flags.debug {
                vote.cancel("policy: debug must stay off");
            }
        });

        let calls_b = calls.clone();
        bus.subscribe_pre(move |_event, vote| {
            calls_b.fetch_add(1, Ordering::SeqCst);
            vote.cancel("a later, irrelevant reason");
        });

        let vote = bus.fire_pre_change(&changing_event());
        assert!(vote.is_cancelled());
        assert_eq!(vote.reason(), Some("policy: debug must stay off"));
        assert_eq!(calls.load(Ordering::SeqCst), 2, "fan-out continues after the first cancellation");
    }

    #[test]
    fn post_change_subscriber_panic_is_logged_not_propagated() {
        let bus = ChangeBus::new();
        bus.subscribe_post(|_event| panic!("boom"));
        let event = ConfigurationChanged { old: None, new: None, diff: None, new_version_id: None };
        // Must not panic the caller.
        bus.fire_post_change(&event);
    }

    #[test]
    fn unsubscribe_removes_handler() {
        let bus = ChangeBus::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();
        let handle = bus.subscribe_pre(move |_e, _v| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
        });
        bus.fire_pre_change(&changing_event());
        handle.unsubscribe();
        bus.fire_pre_change(&changing_event());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
