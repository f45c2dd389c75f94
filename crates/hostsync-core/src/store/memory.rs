// # In-memory collaborators
//
// In-memory implementations of StateStore, HostRegistry, HistoryLog and
// SettingsProvider.
//
// ## Crash Behavior
//
// - All state is lost on restart/crash
// - The first cycle after a restart treats the observed address as new and
//   re-attempts every host (updates are idempotent at the provider)
//
// ## When to Use
//
// - Testing environments
// - Container deployments where a re-sync on restart is acceptable

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::config::Settings;
use crate::traits::{
    Credentials, HistoryEntry, HistoryLog, HostEntry, HostId, HostRegistry, SettingsProvider,
    StateStore, SyncState,
};
use crate::{Error, Result};

/// In-memory state store
#[derive(Debug, Clone, Default)]
pub struct MemoryStateStore {
    inner: Arc<RwLock<SyncState>>,
}

impl MemoryStateStore {
    /// Create a store holding the default (initial) state
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-seeded with a state (for tests)
    pub fn with_state(state: SyncState) -> Self {
        Self {
            inner: Arc::new(RwLock::new(state)),
        }
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn load(&self) -> Result<SyncState> {
        Ok(self.inner.read().await.clone())
    }

    async fn save(&self, state: &SyncState) -> Result<()> {
        *self.inner.write().await = state.clone();
        Ok(())
    }
}

#[derive(Debug, Default)]
struct MemoryHosts {
    hosts: Vec<HostEntry>,
    next_id: HostId,
}

/// In-memory host registry
///
/// Preserves insertion order (the registry's stored order) and assigns ids
/// monotonically, mirroring how the management surface's storage behaves.
#[derive(Debug, Clone, Default)]
pub struct MemoryHostRegistry {
    inner: Arc<RwLock<MemoryHosts>>,
}

impl MemoryHostRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a host, assigning the next id
    pub async fn add(
        &self,
        hostname: impl Into<String>,
        credentials: Credentials,
    ) -> HostEntry {
        let mut guard = self.inner.write().await;
        guard.next_id += 1;
        let host = HostEntry::new(guard.next_id, hostname, credentials);
        guard.hosts.push(host.clone());
        host
    }

    /// Get a host by id
    pub async fn get(&self, id: HostId) -> Option<HostEntry> {
        self.inner
            .read()
            .await
            .hosts
            .iter()
            .find(|h| h.id == id)
            .cloned()
    }

    /// Number of registered hosts
    pub async fn len(&self) -> usize {
        self.inner.read().await.hosts.len()
    }

    /// Whether the registry is empty
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.hosts.is_empty()
    }
}

#[async_trait]
impl HostRegistry for MemoryHostRegistry {
    async fn list(&self) -> Result<Vec<HostEntry>> {
        Ok(self.inner.read().await.hosts.clone())
    }

    async fn record_result(
        &self,
        id: HostId,
        success: bool,
        error: Option<String>,
        timestamp: DateTime<Utc>,
    ) -> Result<()> {
        let mut guard = self.inner.write().await;
        let host = guard
            .hosts
            .iter_mut()
            .find(|h| h.id == id)
            .ok_or(Error::HostNotFound(id))?;

        host.last_status = Some(success);
        if success {
            host.last_error = None;
            host.last_update = Some(timestamp);
        } else {
            host.last_error = error;
        }

        Ok(())
    }
}

/// In-memory history log
///
/// Keeps entries in append order and exposes a snapshot for tests and the
/// management surface's history view.
#[derive(Debug, Clone, Default)]
pub struct MemoryHistoryLog {
    inner: Arc<RwLock<Vec<HistoryEntry>>>,
}

impl MemoryHistoryLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all entries, in append order
    pub async fn entries(&self) -> Vec<HistoryEntry> {
        self.inner.read().await.clone()
    }

    /// Number of entries
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Whether the log is empty
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

#[async_trait]
impl HistoryLog for MemoryHistoryLog {
    async fn append(&self, mut entry: HistoryEntry) -> Result<()> {
        let mut guard = self.inner.write().await;
        entry.id = guard.len() as u64 + 1;
        guard.push(entry);
        Ok(())
    }
}

/// In-memory settings provider
///
/// A shared handle: the management surface keeps one clone and calls
/// [`set`](Self::set); the scheduler reads through the trait once per idle
/// period.
#[derive(Debug, Clone)]
pub struct MemorySettingsProvider {
    inner: Arc<RwLock<Settings>>,
}

impl MemorySettingsProvider {
    /// Create a provider with the given initial settings
    pub fn new(settings: Settings) -> Self {
        Self {
            inner: Arc::new(RwLock::new(settings)),
        }
    }

    /// Replace the settings; takes effect on the scheduler's next idle period
    pub async fn set(&self, settings: Settings) {
        *self.inner.write().await = settings;
    }
}

impl Default for MemorySettingsProvider {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}

#[async_trait]
impl SettingsProvider for MemorySettingsProvider {
    async fn current(&self) -> Result<Settings> {
        Ok(*self.inner.read().await)
    }
}
