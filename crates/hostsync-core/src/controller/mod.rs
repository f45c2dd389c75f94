//! Reconciliation controller
//!
//! The SyncController is responsible for:
//! - Observing the current public address via AddressSource
//! - Deciding whether synchronization is needed
//! - Applying updates per host via UpdateGateway
//! - Writing results back to StateStore, HostRegistry and HistoryLog
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────┐
//! │ AddressSource │─── AddressObservation ───┐
//! └───────────────┘                          │
//!                                            ▼
//!                                   ┌────────────────┐
//!                                   │ SyncController │
//!                                   └────────────────┘
//!                                            │
//!        ┌──────────────────┬────────────────┼────────────────┬──────────────┐
//!        │                  │                │                │              │
//!        ▼                  ▼                ▼                ▼              ▼
//! ┌────────────┐   ┌───────────────┐  ┌──────────────┐  ┌────────────┐  ┌────────┐
//! │ StateStore │   │ UpdateGateway │  │ HostRegistry │  │ HistoryLog │  │ Events │
//! │ (compare)  │   │ (apply)       │  │ (write-back) │  │ (audit)    │  │(notify)│
//! └────────────┘   └───────────────┘  └──────────────┘  └────────────┘  └────────┘
//! ```
//!
//! ## Cycle algorithm
//!
//! 1. Fetch the current address; on failure the cycle is skipped untouched
//! 2. Compare against the stored address
//! 3. Select hosts: all of them when the address changed, otherwise only
//!    hosts whose last attempt did not succeed
//! 4. Nothing selected: bump `last_check` and return
//! 5. Save the new state; on a change, record the `ip_changed` history entry
//!    before any host update is attempted
//! 6. Apply updates host by host, exhaustively -- a failure never aborts the
//!    remaining hosts
//! 7. The cycle completes regardless of individual host outcomes

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::error::Result;
use crate::traits::{
    AddressSource, HistoryEntry, HistoryLog, HostEntry, HostId, HostRegistry, StateStore,
    UpdateGateway, UpdateOutcome,
};
use crate::Error;

/// Events emitted by the SyncController
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerEvent {
    /// The cycle was skipped because the address lookup failed
    CycleSkipped { reason: String },

    /// A new public address was observed
    AddressChanged {
        previous: Option<String>,
        current: String,
    },

    /// A host record was updated successfully
    HostUpdated { hostname: String, address: String },

    /// A host update attempt failed
    HostFailed { hostname: String, reason: String },

    /// A cycle ran to completion
    CycleCompleted { updated: usize, failed: usize },
}

/// Result of one per-host update within a cycle
#[derive(Debug, Clone)]
pub struct HostOutcome {
    /// The host's registry id
    pub host_id: HostId,
    /// The host's record name
    pub hostname: String,
    /// The classified gateway outcome
    pub outcome: UpdateOutcome,
}

/// Summary of one reconciliation cycle
#[derive(Debug, Clone, Default)]
pub struct CycleReport {
    /// The observed address, if the lookup succeeded
    pub address: Option<String>,
    /// Whether the observation differed from the stored address
    pub address_changed: bool,
    /// Per-host outcomes, in the registry's stored order
    pub outcomes: Vec<HostOutcome>,
    /// Why the cycle was skipped, if it was
    pub skipped: Option<String>,
}

impl CycleReport {
    fn skipped(reason: String) -> Self {
        Self {
            skipped: Some(reason),
            ..Self::default()
        }
    }

    /// Number of hosts updated successfully this cycle
    pub fn updated(&self) -> usize {
        self.outcomes.iter().filter(|o| o.outcome.is_success()).count()
    }

    /// Number of hosts that failed this cycle
    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.updated()
    }
}

/// Credential-free view of a host for status reporting
#[derive(Debug, Clone, Serialize)]
pub struct HostStatus {
    pub id: HostId,
    pub hostname: String,
    pub last_update: Option<DateTime<Utc>>,
    pub last_status: Option<bool>,
    pub last_error: Option<String>,
}

impl From<HostEntry> for HostStatus {
    fn from(host: HostEntry) -> Self {
        Self {
            id: host.id,
            hostname: host.hostname,
            last_update: host.last_update,
            last_status: host.last_status,
            last_error: host.last_error,
        }
    }
}

/// Snapshot of the reconciliation state for the management surface
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub current_address: Option<String>,
    pub last_check: Option<DateTime<Utc>>,
    pub hosts: Vec<HostStatus>,
}

/// Reconciliation controller
///
/// Executes exactly one cycle to completion, idempotently. The controller
/// never raises a cycle-fatal error once the address observation has
/// succeeded: any per-host failure narrows to "this cycle made partial
/// progress" and the next scheduled or triggered cycle re-attempts
/// outstanding work.
///
/// ## Threading
///
/// All cycle work runs on the single scheduler worker; the controller itself
/// is `Send + Sync` and safe to share behind an `Arc` for status queries.
pub struct SyncController {
    /// Address source for public-address lookups
    source: Box<dyn AddressSource>,

    /// Gateway applying per-host updates
    gateway: Box<dyn UpdateGateway>,

    /// Store for the cross-cycle reconciliation state
    state_store: Box<dyn StateStore>,

    /// The managed hosts
    registry: Box<dyn HostRegistry>,

    /// Append-only audit trail
    history: Box<dyn HistoryLog>,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<ControllerEvent>,
}

impl SyncController {
    /// Create a new controller
    ///
    /// # Returns
    ///
    /// A tuple of (controller, event_receiver) where event_receiver yields
    /// controller events for monitoring/logging.
    pub fn new(
        source: Box<dyn AddressSource>,
        gateway: Box<dyn UpdateGateway>,
        state_store: Box<dyn StateStore>,
        registry: Box<dyn HostRegistry>,
        history: Box<dyn HistoryLog>,
        event_capacity: usize,
    ) -> (Self, mpsc::Receiver<ControllerEvent>) {
        let (tx, rx) = mpsc::channel(event_capacity);

        let controller = Self {
            source,
            gateway,
            state_store,
            registry,
            history,
            event_tx: tx,
        };

        (controller, rx)
    }

    /// Execute one reconciliation cycle
    ///
    /// Returns `Err` only for state store or registry access failures; an
    /// address lookup failure produces a skipped report and per-host update
    /// failures are folded into the report's outcomes.
    pub async fn run_cycle(&self) -> Result<CycleReport> {
        debug!("starting reconciliation cycle");

        let observation = match self.source.fetch().await {
            Ok(observation) => observation,
            Err(e) => {
                warn!(
                    source = self.source.source_name(),
                    error = %e,
                    "address lookup failed, skipping cycle"
                );
                self.emit(ControllerEvent::CycleSkipped {
                    reason: e.to_string(),
                });
                return Ok(CycleReport::skipped(e.to_string()));
            }
        };

        let mut state = self.state_store.load().await?;
        let address_changed =
            state.current_address.as_deref() != Some(observation.address.as_str());

        let hosts = self.registry.list().await?;
        let pending: Vec<HostEntry> = if address_changed {
            hosts
        } else {
            hosts.into_iter().filter(HostEntry::needs_update).collect()
        };

        if pending.is_empty() {
            debug!(
                address = %observation.address,
                "address unchanged and no host needs an update"
            );
            state.last_check = Some(observation.observed_at);
            self.state_store.save(&state).await?;
            return Ok(CycleReport {
                address: Some(observation.address),
                ..CycleReport::default()
            });
        }

        let previous = state.current_address.clone();
        state.current_address = Some(observation.address.clone());
        state.last_check = Some(observation.observed_at);
        self.state_store.save(&state).await?;

        if address_changed {
            info!(
                previous = previous.as_deref().unwrap_or("none"),
                current = %observation.address,
                "public address changed"
            );
            // Recorded before the first host update so the history reflects
            // detection even if every subsequent update fails.
            self.history
                .append(HistoryEntry::address_changed(
                    previous.as_deref(),
                    &observation.address,
                ))
                .await?;
            self.emit(ControllerEvent::AddressChanged {
                previous,
                current: observation.address.clone(),
            });
        }

        let mut outcomes = Vec::with_capacity(pending.len());
        for host in &pending {
            let outcome = self.sync_host(host, &observation.address).await;
            outcomes.push(HostOutcome {
                host_id: host.id,
                hostname: host.hostname.clone(),
                outcome,
            });
        }

        let report = CycleReport {
            address: Some(observation.address),
            address_changed,
            outcomes,
            skipped: None,
        };

        info!(
            updated = report.updated(),
            failed = report.failed(),
            "reconciliation cycle completed"
        );
        self.emit(ControllerEvent::CycleCompleted {
            updated: report.updated(),
            failed: report.failed(),
        });

        Ok(report)
    }

    /// Apply one host's update and record the result
    ///
    /// This is the shared per-host unit used by both scheduled cycles and
    /// manual triggers. Bookkeeping failures (registry write-back, history
    /// append) are logged but never abort the remaining hosts of a cycle.
    pub async fn sync_host(&self, host: &HostEntry, address: &str) -> UpdateOutcome {
        debug!(hostname = %host.hostname, %address, "applying host update");

        let outcome = self
            .gateway
            .apply(&host.hostname, &host.credentials, address)
            .await;
        let now = Utc::now();

        match &outcome {
            UpdateOutcome::Success => {
                info!(hostname = %host.hostname, %address, "host record updated");
                self.record_result(host, true, None, now).await;
                self.append_history(HistoryEntry::host_updated(&host.hostname, address))
                    .await;
                self.emit(ControllerEvent::HostUpdated {
                    hostname: host.hostname.clone(),
                    address: address.to_string(),
                });
            }
            UpdateOutcome::Rejected(reason) => {
                error!(hostname = %host.hostname, %reason, "provider rejected host update");
                self.record_result(host, false, Some(reason.clone()), now)
                    .await;
                self.append_history(HistoryEntry::host_failed(&host.hostname, address, reason))
                    .await;
                self.emit(ControllerEvent::HostFailed {
                    hostname: host.hostname.clone(),
                    reason: reason.clone(),
                });
            }
            UpdateOutcome::TransientFailure(reason) => {
                warn!(
                    hostname = %host.hostname,
                    %reason,
                    "host update failed, will retry next cycle"
                );
                self.record_result(host, false, Some(reason.clone()), now)
                    .await;
                self.append_history(HistoryEntry::host_failed(&host.hostname, address, reason))
                    .await;
                self.emit(ControllerEvent::HostFailed {
                    hostname: host.hostname.clone(),
                    reason: reason.clone(),
                });
            }
        }

        outcome
    }

    /// Manually update one host, outside the interval timer
    ///
    /// Reuses the per-host update logic against the host's current hostname
    /// and credentials, with a fresh observation when the lookup succeeds and
    /// the last stored address as fallback. Does not consult or mutate the
    /// address-change bookkeeping of other hosts.
    pub async fn run_host(&self, host_id: HostId) -> Result<UpdateOutcome> {
        let host = self
            .registry
            .list()
            .await?
            .into_iter()
            .find(|h| h.id == host_id)
            .ok_or(Error::HostNotFound(host_id))?;

        let address = match self.source.fetch().await {
            Ok(observation) => observation.address,
            Err(e) => {
                let state = self.state_store.load().await?;
                match state.current_address {
                    Some(address) => {
                        warn!(error = %e, "address lookup failed, using last observed address");
                        address
                    }
                    None => return Err(Error::AddressSource(e)),
                }
            }
        };

        Ok(self.sync_host(&host, &address).await)
    }

    /// Snapshot the current state and per-host status
    pub async fn status(&self) -> Result<StatusReport> {
        let state = self.state_store.load().await?;
        let hosts = self
            .registry
            .list()
            .await?
            .into_iter()
            .map(HostStatus::from)
            .collect();

        Ok(StatusReport {
            current_address: state.current_address,
            last_check: state.last_check,
            hosts,
        })
    }

    async fn record_result(
        &self,
        host: &HostEntry,
        success: bool,
        error: Option<String>,
        timestamp: DateTime<Utc>,
    ) {
        if let Err(e) = self
            .registry
            .record_result(host.id, success, error, timestamp)
            .await
        {
            error!(hostname = %host.hostname, error = %e, "failed to record host result");
        }
    }

    async fn append_history(&self, entry: HistoryEntry) {
        if let Err(e) = self.history.append(entry).await {
            error!(error = %e, "failed to append history entry");
        }
    }

    /// Emit a controller event
    fn emit(&self, event: ControllerEvent) {
        // Send event, logging a warning if the channel is full (backpressure).
        // Dropping is preferable to blocking the reconciliation worker.
        if self.event_tx.try_send(event).is_err() {
            warn!("event channel full, dropping event");
        }
    }
}
