// # State Store Trait
//
// Defines the interface for persisting the reconciliation state across
// cycles (and across process restarts, for durable implementations).
//
// ## Ownership
//
// The state is a single value owned by the controller: it is loaded at the
// start of a cycle, mutated according to the cycle algorithm, and saved back.
// No ambient global is needed because only one worker ever runs a cycle.
// Status-reporting collaborators may read it through the controller's
// `status()` surface.
//
// ## Implementations
//
// - In-memory: testing and ephemeral deployments
// - File-based: JSON with atomic writes and backup recovery

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The reconciliation state shared across cycles
///
/// `current_address` is `None` only before the first successful observation;
/// once set it changes only when a new, different, non-empty observation is
/// obtained. `last_check` advances on every completed cycle, including cycles
/// that found nothing to do.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncState {
    /// Last observed public address, if any
    pub current_address: Option<String>,
    /// Timestamp of the last completed observation
    pub last_check: Option<DateTime<Utc>>,
}

impl SyncState {
    /// True before the first successful observation
    pub fn is_initial(&self) -> bool {
        self.current_address.is_none()
    }
}

/// Trait for state store implementations
///
/// Implementations must be thread-safe and usable across async tasks, and
/// must return a default (empty) state when nothing has been persisted yet.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Load the persisted state, or the default state if none exists
    async fn load(&self) -> crate::Result<SyncState>;

    /// Persist the state
    ///
    /// Durable implementations should write atomically so a crash never
    /// leaves a half-written state behind.
    async fn save(&self, state: &SyncState) -> crate::Result<()>;
}

/// Helper trait for constructing state stores from configuration
#[async_trait]
pub trait StateStoreFactory: Send + Sync {
    /// Create a StateStore instance from configuration
    async fn create(
        &self,
        config: &crate::config::StateStoreConfig,
    ) -> crate::Result<Box<dyn StateStore>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_state_is_initial() {
        let state = SyncState::default();
        assert!(state.is_initial());
        assert_eq!(state.current_address, None);
        assert_eq!(state.last_check, None);
    }

    #[test]
    fn state_round_trips_through_json() {
        let state = SyncState {
            current_address: Some("198.51.100.4".into()),
            last_check: Some(Utc::now()),
        };
        let json = serde_json::to_string(&state).unwrap();
        let back: SyncState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
    }
}
