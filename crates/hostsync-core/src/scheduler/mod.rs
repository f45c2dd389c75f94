//! Cycle scheduler
//!
//! Drives the [`SyncController`] on a configurable interval and accepts
//! out-of-band triggers (whole fleet or a single host) without ever running
//! two reconciliations concurrently.
//!
//! ## State machine
//!
//! ```text
//!        settings polled here
//!              │
//!              ▼
//!   ┌──────► Idle ───────────┐ timer fired / trigger accepted
//!   │                        ▼
//!   │  cycle finished     Running ──── trigger received ──► rejected ("busy")
//!   └────────────────────────┘
//! ```
//!
//! The interval is re-read from the settings provider at the top of each
//! `Idle` period, so an interval change takes effect with the next wait, not
//! the in-flight one. Triggers are accepted only while `Idle`; a trigger
//! arriving while `Running` is answered with `accepted = false` rather than
//! queued. Shutdown is cooperative and honored at the `Idle` boundary only,
//! never interrupting a cycle in flight.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tracing::{error, info, warn};

use crate::config::Settings;
use crate::controller::SyncController;
use crate::error::Result;
use crate::traits::{HostId, SettingsProvider};

/// What a trigger request asks the scheduler to reconcile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerScope {
    /// Run a full reconciliation cycle
    Fleet,
    /// Update a single host, bypassing the change detection for the rest
    Host(HostId),
}

/// Answer to a trigger request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerReply {
    /// Whether the trigger was accepted for execution
    pub accepted: bool,
    /// Human-readable explanation
    pub message: String,
}

impl TriggerReply {
    fn accepted(message: impl Into<String>) -> Self {
        Self {
            accepted: true,
            message: message.into(),
        }
    }

    fn busy() -> Self {
        Self {
            accepted: false,
            message: "a reconciliation cycle is already running".to_string(),
        }
    }

    fn stopped() -> Self {
        Self {
            accepted: false,
            message: "the scheduler is not running".to_string(),
        }
    }
}

struct TriggerRequest {
    scope: TriggerScope,
}

/// Handle for interacting with a running [`CycleScheduler`]
///
/// Cheap to clone; intended for the management surface (`trigger`) and the
/// daemon's signal handler (`shutdown`).
#[derive(Clone)]
pub struct SchedulerHandle {
    trigger_tx: mpsc::Sender<TriggerRequest>,
    shutdown_tx: Arc<watch::Sender<bool>>,
    busy: Arc<AtomicBool>,
}

impl SchedulerHandle {
    /// Request an immediate reconciliation
    ///
    /// Accepted only while the scheduler is idle; while a cycle is running
    /// the request is rejected with a busy reply instead of being queued, so
    /// at most one reconciliation executes at a time.
    pub fn trigger(&self, scope: TriggerScope) -> TriggerReply {
        if self.busy.load(Ordering::SeqCst) {
            return TriggerReply::busy();
        }

        match self.trigger_tx.try_send(TriggerRequest { scope }) {
            Ok(()) => match scope {
                TriggerScope::Fleet => TriggerReply::accepted("reconciliation triggered"),
                TriggerScope::Host(id) => {
                    TriggerReply::accepted(format!("update triggered for host {}", id))
                }
            },
            Err(mpsc::error::TrySendError::Full(_)) => TriggerReply::busy(),
            Err(mpsc::error::TrySendError::Closed(_)) => TriggerReply::stopped(),
        }
    }

    /// Whether a reconciliation is currently running
    pub fn is_running(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Request a cooperative shutdown, honored at the next idle boundary
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }
}

/// Cycle scheduler
///
/// Owns the single reconciliation worker. Consume it with [`run`](Self::run);
/// interact with it through the [`SchedulerHandle`] returned by
/// [`new`](Self::new).
pub struct CycleScheduler {
    controller: Arc<SyncController>,
    settings: Arc<dyn SettingsProvider>,
    trigger_rx: mpsc::Receiver<TriggerRequest>,
    shutdown_rx: watch::Receiver<bool>,
    busy: Arc<AtomicBool>,
}

enum Work {
    Scheduled,
    Triggered(TriggerScope),
}

impl CycleScheduler {
    /// Create a scheduler and its handle
    pub fn new(
        controller: Arc<SyncController>,
        settings: Arc<dyn SettingsProvider>,
    ) -> (Self, SchedulerHandle) {
        // Capacity 1: while idle at most one trigger can be in flight, and a
        // second caller gets the busy reply instead of a queue slot.
        let (trigger_tx, trigger_rx) = mpsc::channel(1);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let busy = Arc::new(AtomicBool::new(false));

        let scheduler = Self {
            controller,
            settings,
            trigger_rx,
            shutdown_rx,
            busy: Arc::clone(&busy),
        };

        let handle = SchedulerHandle {
            trigger_tx,
            shutdown_tx: Arc::new(shutdown_tx),
            busy,
        };

        (scheduler, handle)
    }

    /// Run the scheduler loop until shutdown is requested
    ///
    /// The timer wait is the sole suspension point and is interruptible by an
    /// incoming trigger, so a trigger never waits for the remainder of the
    /// interval.
    pub async fn run(mut self) -> Result<()> {
        info!("cycle scheduler started");

        loop {
            if *self.shutdown_rx.borrow() {
                break;
            }

            // Idle: poll settings so interval edits apply to the next wait.
            let interval = match self.settings.current().await {
                Ok(settings) => Duration::from_secs(settings.update_interval_secs),
                Err(e) => {
                    warn!(error = %e, "failed to read settings, using default interval");
                    Duration::from_secs(Settings::default().update_interval_secs)
                }
            };

            let work = tokio::select! {
                _ = self.shutdown_rx.changed() => break,
                request = self.trigger_rx.recv() => match request {
                    Some(request) => Work::Triggered(request.scope),
                    None => break,
                },
                _ = tokio::time::sleep(interval) => Work::Scheduled,
            };

            // Running: triggers arriving from here on are rejected as busy.
            self.busy.store(true, Ordering::SeqCst);
            match work {
                Work::Scheduled | Work::Triggered(TriggerScope::Fleet) => {
                    if let Err(e) = self.controller.run_cycle().await {
                        error!(error = %e, "reconciliation cycle failed");
                    }
                }
                Work::Triggered(TriggerScope::Host(host_id)) => {
                    if let Err(e) = self.controller.run_host(host_id).await {
                        warn!(host_id, error = %e, "triggered host update failed");
                    }
                }
            }
            self.busy.store(false, Ordering::SeqCst);
        }

        info!("cycle scheduler stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn busy_reply_is_not_accepted() {
        let reply = TriggerReply::busy();
        assert!(!reply.accepted);
        assert!(reply.message.contains("already running"));
    }

    #[test]
    fn scope_formats_into_reply() {
        let reply = TriggerReply::accepted("update triggered for host 3");
        assert!(reply.accepted);
        assert!(reply.message.contains('3'));
    }
}
