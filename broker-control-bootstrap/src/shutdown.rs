// /////////////////////////////////////////////////////////////////////////////
// Broker Control Plane
// Copyright (c) 2026 the broker-control contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Shutdown Coordination
//!
//! Bridges OS shutdown signals (SIGTERM/SIGINT/SIGHUP on Unix, Ctrl+C on
//! Windows) to a single `await`able point, so a process embedding the
//! control plane can drive `Controller::dispose` from whichever signal
//! arrives first rather than wiring each platform's signal API by hand.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use tokio::sync::oneshot;

/// Callback type for shutdown notification.
pub type ShutdownCallback = Box<dyn FnOnce() + Send + 'static>;

/// Abstracts platform-specific signal handling so tests can substitute a
/// handler that never fires.
pub trait SystemSignals: Send + Sync {
    fn wait_for_signal(&self, on_shutdown: ShutdownCallback) -> Pin<Box<dyn Future<Output = ()> + Send + '_>>;
}

#[cfg(unix)]
pub struct UnixSignalHandler;

#[cfg(unix)]
impl UnixSignalHandler {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(unix)]
impl Default for UnixSignalHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(unix)]
impl SystemSignals for UnixSignalHandler {
    fn wait_for_signal(&self, on_shutdown: ShutdownCallback) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(async move {
            use tokio::signal::unix::{signal, SignalKind};

            let mut sigterm = signal(SignalKind::terminate()).expect("failed to register SIGTERM handler");
            let mut sigint = signal(SignalKind::interrupt()).expect("failed to register SIGINT handler");
            let mut sighup = signal(SignalKind::hangup()).expect("failed to register SIGHUP handler");

            tokio::select! {
                _ = sigterm.recv() => tracing::info!("received SIGTERM, initiating graceful shutdown"),
                _ = sigint.recv() => tracing::info!("received SIGINT, initiating graceful shutdown"),
                _ = sighup.recv() => tracing::info!("received SIGHUP, initiating graceful shutdown"),
            }

            on_shutdown();
        })
    }
}

#[cfg(windows)]
pub struct WindowsSignalHandler;

#[cfg(windows)]
impl WindowsSignalHandler {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(windows)]
impl Default for WindowsSignalHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(windows)]
impl SystemSignals for WindowsSignalHandler {
    fn wait_for_signal(&self, on_shutdown: ShutdownCallback) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(async move {
            tokio::signal::ctrl_c().await.expect("failed to register Ctrl+C handler");
            tracing::info!("received Ctrl+C, initiating graceful shutdown");
            on_shutdown();
        })
    }
}

/// Never fires. Lets tests drive shutdown explicitly instead of racing a
/// real signal.
pub struct NoOpSignalHandler;

impl NoOpSignalHandler {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NoOpSignalHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemSignals for NoOpSignalHandler {
    fn wait_for_signal(&self, _on_shutdown: ShutdownCallback) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(std::future::pending())
    }
}

fn create_signal_handler() -> Box<dyn SystemSignals> {
    #[cfg(unix)]
    {
        Box::new(UnixSignalHandler::new())
    }
    #[cfg(windows)]
    {
        Box::new(WindowsSignalHandler::new())
    }
    #[cfg(not(any(unix, windows)))]
    {
        Box::new(NoOpSignalHandler::new())
    }
}

/// Waits for the first OS shutdown signal, then hands back control with the
/// drain deadline a caller should honor before forcing the broker adapter
/// down — mirroring `RuntimeSettings::drain_deadline`, which feeds this
/// value when the coordinator is built via [`ShutdownCoordinator::for_platform`].
pub struct ShutdownCoordinator {
    signals: Box<dyn SystemSignals>,
    drain_deadline: Duration,
}

impl ShutdownCoordinator {
    pub fn new(signals: Box<dyn SystemSignals>, drain_deadline: Duration) -> Self {
        Self { signals, drain_deadline }
    }

    /// Builds a coordinator using the OS-appropriate signal handler.
    pub fn for_platform(drain_deadline: Duration) -> Self {
        Self::new(create_signal_handler(), drain_deadline)
    }

    /// A coordinator whose signal never fires, for tests that trigger
    /// shutdown some other way.
    pub fn noop(drain_deadline: Duration) -> Self {
        Self::new(Box::new(NoOpSignalHandler::new()), drain_deadline)
    }

    pub fn drain_deadline(&self) -> Duration {
        self.drain_deadline
    }

    /// Resolves once a shutdown signal has been received.
    pub async fn wait_for_shutdown_signal(&self) {
        let (tx, rx) = oneshot::channel();
        let callback: ShutdownCallback = Box::new(move || {
            let _ = tx.send(());
        });
        self.signals.wait_for_signal(callback).await;
        let _ = rx.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn noop_coordinator_never_resolves_within_a_short_window() {
        let coordinator = ShutdownCoordinator::noop(Duration::from_secs(5));
        tokio::select! {
            _ = coordinator.wait_for_shutdown_signal() => panic!("noop coordinator should never signal"),
            _ = tokio::time::sleep(Duration::from_millis(50)) => {}
        }
    }

    #[test]
    fn drain_deadline_is_preserved() {
        let coordinator = ShutdownCoordinator::noop(Duration::from_secs(30));
        assert_eq!(coordinator.drain_deadline(), Duration::from_secs(30));
    }
}
