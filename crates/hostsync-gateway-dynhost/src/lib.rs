// # DynHost Update Gateway
//
// This crate provides a dyndns2-protocol update gateway for the hostsync
// system, targeting OVH DynHost and compatible providers.
//
// ## Protocol
//
// One update is one GET against the provider's `nic/update` endpoint with
// HTTP Basic auth and three query parameters:
//
// ```text
// GET /nic/update?system=dyndns&hostname=<host>&myip=<address>
// Authorization: Basic <username:secret>
// ```
//
// The provider answers with a short status word, optionally followed by the
// address (`good 203.0.113.9`).
//
// ## Outcome classification
//
// | Response                | Outcome            |
// |-------------------------|--------------------|
// | `good`, `nochg`         | Success            |
// | `badauth`               | Rejected           |
// | `nohost`, `notfqdn`     | Rejected           |
// | `badagent`, `abuse`     | Rejected           |
// | `!donator`              | Rejected           |
// | `dnserr`, `911`         | TransientFailure   |
// | HTTP 401/403            | Rejected           |
// | other HTTP 4xx          | Rejected           |
// | HTTP 5xx                | TransientFailure   |
// | transport error/timeout | TransientFailure   |
// | unrecognized body       | TransientFailure   |
//
// `nochg` is a success: the record already carries the address, which is the
// expected answer for retried or manually triggered updates.

use std::fmt;
use std::time::Duration;

use hostsync_core::config::GatewayConfig;
use hostsync_core::traits::{Credentials, UpdateGateway, UpdateGatewayFactory, UpdateOutcome};
use hostsync_core::{ComponentRegistry, Error, Result};
use reqwest::StatusCode;

/// OVH's DynHost update endpoint
pub const OVH_DYNHOST_ENDPOINT: &str = "https://www.ovh.com/nic/update";

/// Default request timeout
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// dyndns2-protocol update gateway
pub struct DynHostGateway {
    /// The provider's update endpoint
    endpoint: String,

    /// HTTP client
    client: reqwest::Client,
}

impl fmt::Debug for DynHostGateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynHostGateway")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

impl DynHostGateway {
    /// Create a gateway with the default timeout
    ///
    /// # Parameters
    ///
    /// - `endpoint`: update endpoint (e.g., [`OVH_DYNHOST_ENDPOINT`])
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self::with_timeout(endpoint, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Create a gateway with a custom request timeout
    pub fn with_timeout(endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            endpoint: endpoint.into(),
            client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
        }
    }

    /// Classify a complete provider response (status + body)
    ///
    /// Pure function so the protocol mapping is testable without a network.
    fn classify_response(status: StatusCode, body: &str) -> UpdateOutcome {
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return UpdateOutcome::Rejected(format!("authentication refused (HTTP {})", status));
        }
        if status.is_client_error() {
            return UpdateOutcome::Rejected(format!("provider refused request (HTTP {})", status));
        }
        if status.is_server_error() {
            return UpdateOutcome::TransientFailure(format!("provider error (HTTP {})", status));
        }

        Self::classify_body(body)
    }

    /// Classify a dyndns2 response body
    fn classify_body(body: &str) -> UpdateOutcome {
        // Responses look like "good 203.0.113.9"; only the first word is the
        // status code.
        let word = body.trim().split_whitespace().next().unwrap_or("");

        match word {
            "good" | "nochg" => UpdateOutcome::Success,
            "badauth" => UpdateOutcome::Rejected("invalid credentials".to_string()),
            "nohost" => {
                UpdateOutcome::Rejected("hostname not registered with this account".to_string())
            }
            "notfqdn" => {
                UpdateOutcome::Rejected("hostname is not a fully qualified domain name".to_string())
            }
            "badagent" => UpdateOutcome::Rejected("user agent blocked by provider".to_string()),
            "abuse" => UpdateOutcome::Rejected("hostname blocked for abuse".to_string()),
            "!donator" => {
                UpdateOutcome::Rejected("feature not available on this account".to_string())
            }
            "dnserr" => UpdateOutcome::TransientFailure("provider-side DNS error".to_string()),
            "911" => UpdateOutcome::TransientFailure("provider maintenance".to_string()),
            other => UpdateOutcome::TransientFailure(format!(
                "unrecognized provider response: {:?}",
                other
            )),
        }
    }
}

#[async_trait::async_trait]
impl UpdateGateway for DynHostGateway {
    async fn apply(
        &self,
        hostname: &str,
        credentials: &Credentials,
        address: &str,
    ) -> UpdateOutcome {
        let request = self
            .client
            .get(&self.endpoint)
            .basic_auth(&credentials.username, Some(&credentials.secret))
            .query(&[
                ("system", "dyndns"),
                ("hostname", hostname),
                ("myip", address),
            ]);

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                return UpdateOutcome::TransientFailure(format!("request failed: {}", e));
            }
        };

        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                return UpdateOutcome::TransientFailure(format!(
                    "failed to read response: {}",
                    e
                ));
            }
        };

        tracing::debug!(%hostname, %status, body = %body.trim(), "provider answered");
        Self::classify_response(status, &body)
    }

    fn gateway_name(&self) -> &'static str {
        "dynhost"
    }
}

/// Factory for creating DynHost gateways
pub struct DynHostFactory;

impl UpdateGatewayFactory for DynHostFactory {
    fn create(&self, config: &GatewayConfig) -> Result<Box<dyn UpdateGateway>> {
        match config {
            GatewayConfig::DynHost {
                endpoint,
                timeout_secs,
            } => {
                let timeout = Duration::from_secs(timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS));
                Ok(Box::new(DynHostGateway::with_timeout(endpoint, timeout)))
            }
            _ => Err(Error::config("invalid config for DynHost gateway")),
        }
    }
}

/// Register the DynHost gateway with a registry
pub fn register(registry: &ComponentRegistry) {
    registry.register_gateway("dynhost", Box::new(DynHostFactory));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn good_and_nochg_are_success() {
        assert!(DynHostGateway::classify_body("good 203.0.113.9").is_success());
        assert!(DynHostGateway::classify_body("nochg 203.0.113.9").is_success());
        assert!(DynHostGateway::classify_body("good").is_success());
    }

    #[test]
    fn permanent_protocol_errors_are_rejected() {
        for body in ["badauth", "nohost", "notfqdn", "badagent", "abuse", "!donator"] {
            assert!(
                matches!(
                    DynHostGateway::classify_body(body),
                    UpdateOutcome::Rejected(_)
                ),
                "{} should be rejected",
                body
            );
        }
    }

    #[test]
    fn provider_side_errors_are_transient() {
        for body in ["dnserr", "911"] {
            assert!(
                matches!(
                    DynHostGateway::classify_body(body),
                    UpdateOutcome::TransientFailure(_)
                ),
                "{} should be transient",
                body
            );
        }
    }

    #[test]
    fn unknown_body_is_transient() {
        assert!(matches!(
            DynHostGateway::classify_body("wat"),
            UpdateOutcome::TransientFailure(_)
        ));
        assert!(matches!(
            DynHostGateway::classify_body(""),
            UpdateOutcome::TransientFailure(_)
        ));
    }

    #[test]
    fn auth_statuses_are_rejected_before_body() {
        let outcome = DynHostGateway::classify_response(StatusCode::UNAUTHORIZED, "");
        assert!(matches!(outcome, UpdateOutcome::Rejected(_)));

        let outcome = DynHostGateway::classify_response(StatusCode::FORBIDDEN, "good 1.2.3.4");
        assert!(matches!(outcome, UpdateOutcome::Rejected(_)));
    }

    #[test]
    fn server_errors_are_transient() {
        let outcome =
            DynHostGateway::classify_response(StatusCode::INTERNAL_SERVER_ERROR, "anything");
        assert!(matches!(outcome, UpdateOutcome::TransientFailure(_)));

        let outcome = DynHostGateway::classify_response(StatusCode::SERVICE_UNAVAILABLE, "");
        assert!(matches!(outcome, UpdateOutcome::TransientFailure(_)));
    }

    #[test]
    fn ok_status_defers_to_body() {
        let outcome = DynHostGateway::classify_response(StatusCode::OK, "nochg 203.0.113.9");
        assert!(outcome.is_success());

        let outcome = DynHostGateway::classify_response(StatusCode::OK, "badauth");
        assert!(matches!(outcome, UpdateOutcome::Rejected(_)));
    }

    #[test]
    fn factory_creates_from_dynhost_config() {
        let factory = DynHostFactory;
        let config = GatewayConfig::DynHost {
            endpoint: OVH_DYNHOST_ENDPOINT.to_string(),
            timeout_secs: None,
        };
        assert!(factory.create(&config).is_ok());
    }

    #[test]
    fn factory_rejects_custom_config() {
        let factory = DynHostFactory;
        let config = GatewayConfig::Custom {
            factory: "rfc2136".to_string(),
            config: serde_json::json!({"server": "ns1.example.net"}),
        };
        assert!(factory.create(&config).is_err());
    }
}
