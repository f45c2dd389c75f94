// # Update Gateway Trait
//
// Defines the interface for applying a single host's address update against
// the external DNS provider's update protocol.
//
// ## Implementations
//
// - dyndns2 protocol (OVH DynHost and compatible): `hostsync-gateway-dynhost` crate
// - Future: RFC 2136 dynamic updates, provider REST APIs
//
// ## Outcome classification
//
// The gateway classifies every attempt into a three-way [`UpdateOutcome`]:
// `Rejected` means the provider declared the request invalid (bad
// credentials, unknown hostname, abuse throttling); `TransientFailure` covers
// network errors, timeouts and provider 5xx responses. The controller's retry
// decision is a pure function of the variant -- both failure kinds are
// retried on the next cycle, they differ only in the message recorded.
//
// ## Trust rules
//
// Gateways are isolated, stateless, single-shot components:
// - one protocol exchange per `apply()` call
// - no retry or backoff logic (owned by the controller/scheduler)
// - no access to state, registry or history (owned by the controller)
// - transport errors are folded into `TransientFailure`, never panics

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Per-host credentials for the provider's update protocol
///
/// The secret is redacted from `Debug` output so host entries can be logged
/// safely.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Username the provider issued for this host
    pub username: String,
    /// Update secret/password for this host
    pub secret: String,
}

impl Credentials {
    /// Create credentials from username and secret
    pub fn new(username: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            secret: secret.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Classified result of one update attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The provider accepted the update (or confirmed the record already
    /// carries the address)
    Success,

    /// The provider declared the request invalid: bad credentials, unknown
    /// hostname, abuse throttling. Terminal for this cycle; retried on the
    /// normal schedule like any other failure.
    Rejected(String),

    /// Network failure, timeout or provider-side 5xx. Retried on the next
    /// cycle.
    TransientFailure(String),
}

impl UpdateOutcome {
    /// Whether the attempt succeeded
    pub fn is_success(&self) -> bool {
        matches!(self, UpdateOutcome::Success)
    }

    /// The failure reason, if any
    pub fn reason(&self) -> Option<&str> {
        match self {
            UpdateOutcome::Success => None,
            UpdateOutcome::Rejected(reason) | UpdateOutcome::TransientFailure(reason) => {
                Some(reason)
            }
        }
    }
}

/// Trait for update gateway implementations
///
/// Implementations must be thread-safe and usable across async tasks.
#[async_trait]
pub trait UpdateGateway: Send + Sync {
    /// Apply one host's address update against the provider
    ///
    /// Performs exactly one protocol exchange. Transport-level errors must be
    /// mapped into [`UpdateOutcome::TransientFailure`] rather than surfaced
    /// as a separate error channel, so the controller's handling stays a pure
    /// function of the outcome variant.
    ///
    /// # Parameters
    ///
    /// - `hostname`: the DNS record to update
    /// - `credentials`: the host's provider credentials
    /// - `address`: the address to publish (opaque string)
    async fn apply(
        &self,
        hostname: &str,
        credentials: &Credentials,
        address: &str,
    ) -> UpdateOutcome;

    /// Get the gateway name (for logging/debugging)
    fn gateway_name(&self) -> &'static str;
}

/// Helper trait for constructing update gateways from configuration
pub trait UpdateGatewayFactory: Send + Sync {
    /// Create an UpdateGateway instance from configuration
    fn create(&self, config: &crate::config::GatewayConfig)
    -> crate::Result<Box<dyn UpdateGateway>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_is_redacted_in_debug() {
        let creds = Credentials::new("dyn-user", "s3cret-value");
        let debug = format!("{:?}", creds);
        assert!(debug.contains("dyn-user"));
        assert!(!debug.contains("s3cret-value"));
    }

    #[test]
    fn outcome_reason() {
        assert_eq!(UpdateOutcome::Success.reason(), None);
        assert_eq!(
            UpdateOutcome::Rejected("badauth".into()).reason(),
            Some("badauth")
        );
        assert_eq!(
            UpdateOutcome::TransientFailure("timeout".into()).reason(),
            Some("timeout")
        );
        assert!(UpdateOutcome::Success.is_success());
        assert!(!UpdateOutcome::Rejected("x".into()).is_success());
    }
}
