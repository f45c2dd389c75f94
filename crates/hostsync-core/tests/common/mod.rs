//! Test doubles and common utilities for reconciliation contract tests
//!
//! The doubles implement just enough behavior to drive the controller and
//! scheduler through their contracts; no network, no disk.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::{mpsc, Notify};

use hostsync_core::controller::ControllerEvent;
use hostsync_core::traits::{
    AddressObservation, AddressSource, Credentials, SourceError, UpdateGateway, UpdateOutcome,
};
use hostsync_core::{
    MemoryHistoryLog, MemoryHostRegistry, MemoryStateStore, SyncController,
};

/// An address source driven by a scripted sequence of results
///
/// Each `fetch()` consumes the next scripted step; `Ok` steps repeat forever
/// once the script is exhausted via the `steady` fallback, `Err` steps map to
/// `SourceError::Unreachable`.
#[derive(Clone)]
pub struct ScriptedAddressSource {
    script: Arc<Mutex<VecDeque<Result<String, String>>>>,
    steady: Arc<Mutex<Option<String>>>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedAddressSource {
    /// A source that observes the same address on every fetch
    pub fn steady(address: &str) -> Self {
        Self {
            script: Arc::new(Mutex::new(VecDeque::new())),
            steady: Arc::new(Mutex::new(Some(address.to_string()))),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A source that plays back the given results, then keeps repeating the
    /// last successful one
    pub fn sequence(steps: Vec<Result<&str, &str>>) -> Self {
        let script: VecDeque<Result<String, String>> = steps
            .into_iter()
            .map(|step| step.map(str::to_string).map_err(str::to_string))
            .collect();
        Self {
            script: Arc::new(Mutex::new(script)),
            steady: Arc::new(Mutex::new(None)),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of fetches performed so far
    pub fn fetch_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl AddressSource for ScriptedAddressSource {
    async fn fetch(&self) -> Result<AddressObservation, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let step = self.script.lock().unwrap().pop_front();
        match step {
            Some(Ok(address)) => {
                *self.steady.lock().unwrap() = Some(address.clone());
                Ok(AddressObservation::now(address))
            }
            Some(Err(reason)) => Err(SourceError::Unreachable(reason)),
            None => match self.steady.lock().unwrap().clone() {
                Some(address) => Ok(AddressObservation::now(address)),
                None => Err(SourceError::Unreachable("script exhausted".to_string())),
            },
        }
    }

    fn source_name(&self) -> &'static str {
        "scripted"
    }
}

/// A gateway that records every apply and answers with per-host scripted
/// outcomes (default: success)
#[derive(Clone, Default)]
pub struct RecordingGateway {
    outcomes: Arc<Mutex<HashMap<String, UpdateOutcome>>>,
    calls: Arc<Mutex<Vec<(String, String)>>>,
}

impl RecordingGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every apply for `hostname` answer with `outcome` until changed
    pub fn set_outcome(&self, hostname: &str, outcome: UpdateOutcome) {
        self.outcomes
            .lock()
            .unwrap()
            .insert(hostname.to_string(), outcome);
    }

    /// All (hostname, address) pairs applied so far, in call order
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Number of applies for one hostname
    pub fn calls_for(&self, hostname: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(h, _)| h == hostname)
            .count()
    }
}

#[async_trait::async_trait]
impl UpdateGateway for RecordingGateway {
    async fn apply(
        &self,
        hostname: &str,
        _credentials: &Credentials,
        address: &str,
    ) -> UpdateOutcome {
        self.calls
            .lock()
            .unwrap()
            .push((hostname.to_string(), address.to_string()));

        self.outcomes
            .lock()
            .unwrap()
            .get(hostname)
            .cloned()
            .unwrap_or(UpdateOutcome::Success)
    }

    fn gateway_name(&self) -> &'static str {
        "recording"
    }
}

/// A gateway whose apply blocks until released, for exclusivity tests
///
/// `entered` is signalled when an apply starts; the apply then waits for
/// `release` before answering with success.
#[derive(Clone)]
pub struct HoldingGateway {
    pub entered: Arc<Notify>,
    pub release: Arc<Notify>,
}

impl HoldingGateway {
    pub fn new() -> Self {
        Self {
            entered: Arc::new(Notify::new()),
            release: Arc::new(Notify::new()),
        }
    }
}

#[async_trait::async_trait]
impl UpdateGateway for HoldingGateway {
    async fn apply(
        &self,
        _hostname: &str,
        _credentials: &Credentials,
        _address: &str,
    ) -> UpdateOutcome {
        self.entered.notify_one();
        self.release.notified().await;
        UpdateOutcome::Success
    }

    fn gateway_name(&self) -> &'static str {
        "holding"
    }
}

/// A fully wired controller over in-memory collaborators
///
/// The memory stores share their interiors with the boxed copies handed to
/// the controller, so tests can inspect and seed them directly.
pub struct Harness {
    pub controller: Arc<SyncController>,
    pub events: mpsc::Receiver<ControllerEvent>,
    pub hosts: MemoryHostRegistry,
    pub history: MemoryHistoryLog,
    pub state: MemoryStateStore,
}

pub fn harness(
    source: impl AddressSource + 'static,
    gateway: impl UpdateGateway + 'static,
) -> Harness {
    let hosts = MemoryHostRegistry::new();
    let history = MemoryHistoryLog::new();
    let state = MemoryStateStore::new();

    let (controller, events) = SyncController::new(
        Box::new(source),
        Box::new(gateway),
        Box::new(state.clone()),
        Box::new(hosts.clone()),
        Box::new(history.clone()),
        64,
    );

    Harness {
        controller: Arc::new(controller),
        events,
        hosts,
        history,
        state,
    }
}

/// Throwaway credentials for test hosts
pub fn creds() -> Credentials {
    Credentials::new("dynhost-user", "dynhost-secret")
}

/// Poll `condition` until it holds or the timeout elapses
pub async fn wait_until<F>(timeout: std::time::Duration, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    condition()
}
