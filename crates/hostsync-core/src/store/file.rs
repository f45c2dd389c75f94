// # File-backed collaborators
//
// File-based implementations of StateStore, HostRegistry and HistoryLog with
// crash recovery.
//
// ## Crash Recovery
//
// - Atomic writes: new content goes to a `.tmp` file, then renamed into place
// - Automatic backup: a `.backup` of the last known good file is kept
// - Corruption detection: JSON is validated on load
// - Recovery: falls back to the backup if the main file is corrupted
//
// The history log is append-only JSON-lines; a torn final line is skipped on
// load rather than failing the whole log.
//
// ## File Formats
//
// State (`state.json`):
//
// ```json
// {
//   "version": "1.0",
//   "state": { "current_address": "203.0.113.9", "last_check": "2025-01-09T12:00:00Z" }
// }
// ```
//
// Hosts (`hosts.json`):
//
// ```json
// {
//   "version": "1.0",
//   "hosts": [ { "id": 1, "hostname": "home.example.net", ... } ]
// }
// ```
//
// History (`history.jsonl`): one serialized HistoryEntry per line.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, RwLock};

use crate::traits::{
    Credentials, HistoryEntry, HistoryLog, HostEntry, HostId, HostRegistry, StateStore, SyncState,
};
use crate::{Error, Result};

/// File format version, kept for future migrations
const FILE_VERSION: &str = "1.0";

fn temp_path(path: &Path) -> PathBuf {
    let mut temp = path.to_path_buf();
    temp.set_extension("tmp");
    temp
}

fn backup_path(path: &Path) -> PathBuf {
    let mut backup = path.to_path_buf();
    backup.set_extension("backup");
    backup
}

async fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).await.map_err(|e| {
                Error::config(format!(
                    "failed to create directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
    }
    Ok(())
}

/// Write `json` to `path` atomically, keeping a backup of the previous file
async fn write_atomic(path: &Path, json: &str) -> Result<()> {
    let temp = temp_path(path);
    {
        let mut file = fs::File::create(&temp).await.map_err(|e| {
            Error::state_store(format!("failed to create {}: {}", temp.display(), e))
        })?;
        file.write_all(json.as_bytes()).await.map_err(|e| {
            Error::state_store(format!("failed to write {}: {}", temp.display(), e))
        })?;
        file.flush().await.map_err(|e| {
            Error::state_store(format!("failed to flush {}: {}", temp.display(), e))
        })?;
    }

    if path.exists() {
        if let Err(e) = fs::copy(path, backup_path(path)).await {
            tracing::warn!(path = %path.display(), error = %e, "failed to create backup");
        }
    }

    fs::rename(&temp, path).await.map_err(|e| {
        Error::state_store(format!(
            "failed to rename {} to {}: {}",
            temp.display(),
            path.display(),
            e
        ))
    })?;

    Ok(())
}

/// Load and deserialize `path`, falling back to the `.backup` file when the
/// main file is corrupted. Returns `None` when neither file is usable.
async fn load_with_recovery<T>(path: &Path, what: &str) -> Result<Option<T>>
where
    T: serde::de::DeserializeOwned,
{
    if !path.exists() {
        tracing::debug!(path = %path.display(), "{} file does not exist", what);
        return Ok(None);
    }

    let content = fs::read_to_string(path).await.map_err(|e| {
        Error::state_store(format!("failed to read {}: {}", path.display(), e))
    })?;

    match serde_json::from_str(&content) {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "{} file appears corrupted, attempting recovery from backup",
                what
            );

            let backup = backup_path(path);
            if !backup.exists() {
                tracing::warn!("no backup file found, starting with empty {}", what);
                return Ok(None);
            }

            let backup_content = fs::read_to_string(&backup).await.map_err(|e| {
                Error::state_store(format!("failed to read {}: {}", backup.display(), e))
            })?;

            match serde_json::from_str(&backup_content) {
                Ok(value) => {
                    tracing::info!("recovered {} from backup", what);
                    if let Err(e) = fs::copy(&backup, path).await {
                        tracing::error!(error = %e, "failed to restore {} file from backup", what);
                    }
                    Ok(Some(value))
                }
                Err(backup_err) => {
                    tracing::error!(
                        error = %backup_err,
                        "backup also corrupted, starting with empty {}",
                        what
                    );
                    Ok(None)
                }
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StateFileFormat {
    version: String,
    state: SyncState,
}

/// File-based state store with crash recovery
///
/// Persists the reconciliation state to a JSON file with atomic writes and
/// automatic corruption recovery. The state is cached in memory; every save
/// is written through immediately for durability.
#[derive(Debug)]
pub struct FileStateStore {
    path: PathBuf,
    cached: Arc<RwLock<SyncState>>,
}

impl FileStateStore {
    /// Create or load a file state store
    ///
    /// Loads the existing state file if present, recovering from the backup
    /// on corruption, and starts with the initial state when neither exists.
    /// Parent directories are created as needed.
    pub async fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        ensure_parent_dir(&path).await?;

        let state = match load_with_recovery::<StateFileFormat>(&path, "state").await? {
            Some(file) => {
                if file.version != FILE_VERSION {
                    tracing::warn!(
                        expected = FILE_VERSION,
                        got = %file.version,
                        "state file version mismatch, loading anyway"
                    );
                }
                file.state
            }
            None => SyncState::default(),
        };

        Ok(Self {
            path,
            cached: Arc::new(RwLock::new(state)),
        })
    }
}

#[async_trait]
impl StateStore for FileStateStore {
    async fn load(&self) -> Result<SyncState> {
        Ok(self.cached.read().await.clone())
    }

    async fn save(&self, state: &SyncState) -> Result<()> {
        let file = StateFileFormat {
            version: FILE_VERSION.to_string(),
            state: state.clone(),
        };
        let json = serde_json::to_string_pretty(&file)
            .map_err(|e| Error::state_store(format!("failed to serialize state: {}", e)))?;

        write_atomic(&self.path, &json).await?;
        *self.cached.write().await = state.clone();

        tracing::trace!(path = %self.path.display(), "state written to file");
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct HostsFileFormat {
    version: String,
    hosts: Vec<HostEntry>,
}

#[derive(Debug)]
struct FileHosts {
    hosts: Vec<HostEntry>,
    next_id: HostId,
}

/// File-based host registry
///
/// The host list lives in a single JSON document; the management surface and
/// the controller both write through this type, which rewrites the file
/// atomically on every mutation.
#[derive(Debug)]
pub struct FileHostRegistry {
    path: PathBuf,
    inner: Arc<RwLock<FileHosts>>,
}

impl FileHostRegistry {
    /// Create or load a file host registry
    pub async fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        ensure_parent_dir(&path).await?;

        let hosts = match load_with_recovery::<HostsFileFormat>(&path, "hosts").await? {
            Some(file) => {
                if file.version != FILE_VERSION {
                    tracing::warn!(
                        expected = FILE_VERSION,
                        got = %file.version,
                        "hosts file version mismatch, loading anyway"
                    );
                }
                file.hosts
            }
            None => Vec::new(),
        };

        let next_id = hosts.iter().map(|h| h.id).max().unwrap_or(0);
        tracing::debug!(count = hosts.len(), path = %path.display(), "loaded host registry");

        Ok(Self {
            path,
            inner: Arc::new(RwLock::new(FileHosts { hosts, next_id })),
        })
    }

    /// Add a host, assigning the next id, and persist the registry
    pub async fn add(
        &self,
        hostname: impl Into<String>,
        credentials: Credentials,
    ) -> Result<HostEntry> {
        let mut guard = self.inner.write().await;
        guard.next_id += 1;
        let host = HostEntry::new(guard.next_id, hostname, credentials);
        guard.hosts.push(host.clone());
        Self::persist(&self.path, &guard.hosts).await?;
        Ok(host)
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

    async fn persist(path: &Path, hosts: &[HostEntry]) -> Result<()> {
        let file = HostsFileFormat {
            version: FILE_VERSION.to_string(),
            hosts: hosts.to_vec(),
        };
        let json = serde_json::to_string_pretty(&file)
            .map_err(|e| Error::host_registry(format!("failed to serialize hosts: {}", e)))?;
        write_atomic(path, &json)
            .await
            .map_err(|e| Error::host_registry(e.to_string()))
    }
}

#[async_trait]
impl HostRegistry for FileHostRegistry {
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

        Self::persist(&self.path, &guard.hosts).await
    }
}

/// Append-only JSON-lines history log
///
/// Each entry is serialized to one line and appended; the file is never
/// rewritten. The sequence counter continues from the existing file so ids
/// stay monotonic across restarts.
#[derive(Debug)]
pub struct FileHistoryLog {
    path: PathBuf,
    next_id: Arc<Mutex<u64>>,
}

impl FileHistoryLog {
    /// Create or open a file history log
    pub async fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        ensure_parent_dir(&path).await?;

        let next_id = if path.exists() {
            let content = fs::read_to_string(&path).await.map_err(|e| {
                Error::history_log(format!("failed to read {}: {}", path.display(), e))
            })?;
            let mut max_id = 0u64;
            for line in content.lines() {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                match serde_json::from_str::<HistoryEntry>(line) {
                    Ok(entry) => max_id = max_id.max(entry.id),
                    // A torn final line from a crash mid-append is expected.
                    Err(e) => {
                        tracing::warn!(error = %e, "skipping unparsable history line");
                    }
                }
            }
            max_id
        } else {
            0
        };

        Ok(Self {
            path,
            next_id: Arc::new(Mutex::new(next_id)),
        })
    }

    /// Read back all parsable entries, in file order (for tests and the
    /// management surface's history view)
    pub async fn entries(&self) -> Result<Vec<HistoryEntry>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&self.path).await.map_err(|e| {
            Error::history_log(format!("failed to read {}: {}", self.path.display(), e))
        })?;
        Ok(content
            .lines()
            .filter(|l| !l.trim().is_empty())
            .filter_map(|l| serde_json::from_str(l).ok())
            .collect())
    }
}

#[async_trait]
impl HistoryLog for FileHistoryLog {
    async fn append(&self, mut entry: HistoryEntry) -> Result<()> {
        let mut next_id = self.next_id.lock().await;
        *next_id += 1;
        entry.id = *next_id;

        let mut line = serde_json::to_string(&entry)
            .map_err(|e| Error::history_log(format!("failed to serialize entry: {}", e)))?;
        line.push('\n');

        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| {
                Error::history_log(format!("failed to open {}: {}", self.path.display(), e))
            })?;
        file.write_all(line.as_bytes()).await.map_err(|e| {
            Error::history_log(format!("failed to append to {}: {}", self.path.display(), e))
        })?;
        file.flush().await.map_err(|e| {
            Error::history_log(format!("failed to flush {}: {}", self.path.display(), e))
        })?;

        Ok(())
    }
}
