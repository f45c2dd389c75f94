// # History Log Trait
//
// Defines the interface for the append-only audit trail.
//
// ## Contract
//
// Entries are immutable once appended and grow monotonically; the core never
// mutates, deletes or reads them back (reading is a management-surface
// concern). An `AddressChanged` entry is always recorded before the host
// update entries of the same cycle, so the history reflects detection even
// when every subsequent update fails.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What a history entry records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryAction {
    /// The observed public address changed
    IpChanged,
    /// A host record was successfully updated
    HostUpdated,
    /// A host update attempt failed
    HostFailed,
}

/// One immutable audit record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Log-assigned sequence number (0 until appended)
    #[serde(default)]
    pub id: u64,
    /// The address involved, if any
    pub address: Option<String>,
    /// When the event happened
    pub timestamp: DateTime<Utc>,
    /// What happened
    pub action: HistoryAction,
    /// The host involved, for per-host entries
    pub hostname: Option<String>,
    /// Human-readable description
    pub details: String,
}

impl HistoryEntry {
    /// Entry for an observed address change (`previous` is `None` before the
    /// first observation)
    pub fn address_changed(previous: Option<&str>, current: &str) -> Self {
        Self {
            id: 0,
            address: Some(current.to_string()),
            timestamp: Utc::now(),
            action: HistoryAction::IpChanged,
            hostname: None,
            details: format!(
                "address changed from {} to {}",
                previous.unwrap_or("none"),
                current
            ),
        }
    }

    /// Entry for a successful host update
    pub fn host_updated(hostname: &str, address: &str) -> Self {
        Self {
            id: 0,
            address: Some(address.to_string()),
            timestamp: Utc::now(),
            action: HistoryAction::HostUpdated,
            hostname: Some(hostname.to_string()),
            details: "DNS update successful".to_string(),
        }
    }

    /// Entry for a failed host update attempt
    pub fn host_failed(hostname: &str, address: &str, reason: &str) -> Self {
        Self {
            id: 0,
            address: Some(address.to_string()),
            timestamp: Utc::now(),
            action: HistoryAction::HostFailed,
            hostname: Some(hostname.to_string()),
            details: reason.to_string(),
        }
    }
}

/// Trait for history log implementations
///
/// Implementations must be thread-safe and usable across async tasks. They
/// assign the entry's sequence number on append; no read contract is required
/// by the core.
#[async_trait]
pub trait HistoryLog: Send + Sync {
    /// Append one entry to the log
    async fn append(&self, entry: HistoryEntry) -> crate::Result<()>;
}
