// # Host Registry Trait
//
// Defines the interface to the set of managed hosts.
//
// ## Ownership split
//
// Hosts are created, edited and deleted by the management surface (outside
// this crate). The controller only reads the list and writes back the
// per-host result fields (`last_update`, `last_status`, `last_error`) after
// an update attempt.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::traits::update_gateway::Credentials;

/// Identifier for a managed host
pub type HostId = i64;

/// A single externally managed DNS record with its own credentials and
/// update status
///
/// Invariant: `last_status == Some(true)` implies `last_error == None`, and
/// `last_update` moves only on a successful attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostEntry {
    /// Registry-assigned identifier
    pub id: HostId,
    /// The DNS record name (unique within the registry)
    pub hostname: String,
    /// Provider credentials for this host
    pub credentials: Credentials,
    /// Timestamp of the last successful update, if any
    #[serde(default)]
    pub last_update: Option<DateTime<Utc>>,
    /// Result of the last update attempt (`None` = never attempted)
    #[serde(default)]
    pub last_status: Option<bool>,
    /// Failure reason of the last attempt, if it failed
    #[serde(default)]
    pub last_error: Option<String>,
}

impl HostEntry {
    /// Create a host entry that has never been attempted
    pub fn new(id: HostId, hostname: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            id,
            hostname: hostname.into(),
            credentials,
            last_update: None,
            last_status: None,
            last_error: None,
        }
    }

    /// Whether this host is due for an update even when the address has not
    /// changed: a host whose last attempt did not succeed (including one
    /// never attempted) is retried every cycle.
    pub fn needs_update(&self) -> bool {
        self.last_status != Some(true)
    }
}

/// Trait for host registry implementations
///
/// Implementations must be thread-safe and usable across async tasks.
#[async_trait]
pub trait HostRegistry: Send + Sync {
    /// List the managed hosts in their stored order
    async fn list(&self) -> crate::Result<Vec<HostEntry>>;

    /// Record the result of an update attempt for one host
    ///
    /// Implementations must clear `last_error` and set `last_update` to
    /// `timestamp` when `success` is true, and must leave `last_update`
    /// untouched when it is false.
    async fn record_result(
        &self,
        id: HostId,
        success: bool,
        error: Option<String>,
        timestamp: DateTime<Utc>,
    ) -> crate::Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host(status: Option<bool>) -> HostEntry {
        let mut h = HostEntry::new(1, "home.example.net", Credentials::new("u", "p"));
        h.last_status = status;
        h
    }

    #[test]
    fn never_attempted_host_needs_update() {
        assert!(host(None).needs_update());
    }

    #[test]
    fn failed_host_needs_update() {
        assert!(host(Some(false)).needs_update());
    }

    #[test]
    fn succeeded_host_is_left_alone() {
        assert!(!host(Some(true)).needs_update());
    }
}
