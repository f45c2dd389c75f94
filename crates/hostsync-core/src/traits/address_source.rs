// # Address Source Trait
//
// Defines the interface for looking up the operator's current public address.
//
// ## Implementations
//
// - HTTP lookup services (ipify-style): `hostsync-source-http` crate
// - Future: STUN, router UPnP queries, platform-specific APIs
//
// ## Contract
//
// A successful fetch returns a non-empty address string. Addresses are opaque
// to the core: the controller only ever compares them for equality, so an
// IPv6 literal works exactly like an IPv4 one. A failed fetch means "no
// observation this cycle" -- the controller must not treat it as a change and
// must not overwrite its stored address.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Why an address lookup produced no usable observation
#[derive(Debug, Error)]
pub enum SourceError {
    /// The lookup service could not be reached (network failure, timeout,
    /// or a non-success HTTP status)
    #[error("lookup service unreachable: {0}")]
    Unreachable(String),

    /// The lookup service answered, but the response could not be parsed
    /// as an address
    #[error("malformed lookup response: {0}")]
    MalformedResponse(String),
}

/// One successful observation of the public address
///
/// Observations are never persisted raw; the controller folds them into the
/// [`SyncState`](crate::traits::state_store::SyncState) it owns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressObservation {
    /// The observed address (non-empty, compared as an opaque string)
    pub address: String,
    /// When the observation was made
    pub observed_at: DateTime<Utc>,
}

impl AddressObservation {
    /// Create an observation stamped with the current time
    pub fn now(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            observed_at: Utc::now(),
        }
    }
}

/// Trait for address source implementations
///
/// Implementations must be thread-safe and usable across async tasks. A
/// source performs exactly one lookup per `fetch()` call and presents a
/// synchronous result (or a bounded-timeout failure) to the controller; it
/// never retries on its own and never caches across calls -- scheduling is
/// owned by the [`CycleScheduler`](crate::scheduler::CycleScheduler).
#[async_trait]
pub trait AddressSource: Send + Sync {
    /// Look up the current public address
    ///
    /// # Returns
    ///
    /// - `Ok(AddressObservation)`: a non-empty address and its timestamp
    /// - `Err(SourceError)`: the lookup failed; the cycle is skipped
    async fn fetch(&self) -> Result<AddressObservation, SourceError>;

    /// Get the source name (for logging/debugging)
    fn source_name(&self) -> &'static str;
}

/// Helper trait for constructing address sources from configuration
pub trait AddressSourceFactory: Send + Sync {
    /// Create an AddressSource instance from configuration
    fn create(
        &self,
        config: &crate::config::AddressSourceConfig,
    ) -> crate::Result<Box<dyn AddressSource>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn observation_now_is_stamped() {
        let before = Utc::now();
        let obs = AddressObservation::now("203.0.113.7");
        assert_eq!(obs.address, "203.0.113.7");
        assert!(obs.observed_at >= before);
    }

    #[test]
    fn source_error_messages() {
        let e = SourceError::Unreachable("connect timeout".into());
        assert!(e.to_string().contains("unreachable"));

        let e = SourceError::MalformedResponse("empty body".into());
        assert!(e.to_string().contains("malformed"));
    }
}
