// # HTTP Address Source
//
// This crate provides an HTTP lookup-service address source for the hostsync
// system.
//
// ## Purpose
//
// Queries a public "what is my IP" service (e.g., api.ipify.org) that echoes
// the caller's public address as plain text. This is the observation side of
// the reconciliation loop: one GET per cycle, no polling of its own.
//
// ## Contract
//
// - Exactly one request per `fetch()` call; scheduling belongs to the
//   scheduler, not the source
// - Transport failures, timeouts and non-success statuses map to
//   `SourceError::Unreachable`
// - An empty or unparsable body maps to `SourceError::MalformedResponse`
// - IPv4 and IPv6 literals are both accepted; the address is handed to the
//   core as a string

use std::net::IpAddr;
use std::time::Duration;

use hostsync_core::config::AddressSourceConfig;
use hostsync_core::traits::{AddressObservation, AddressSource, AddressSourceFactory, SourceError};
use hostsync_core::{ComponentRegistry, Error, Result};

/// Default request timeout
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Well-known plain-text lookup services
///
/// All of these answer a bare GET with the caller's address and nothing else.
pub const WELL_KNOWN_SERVICES: &[&str] = &[
    "https://api.ipify.org",  // returns plain text IP, free tier is generous
    "https://ifconfig.me/ip", // no rate limit documented
    "https://icanhazip.com",  // no rate limit documented
];

/// HTTP lookup-service address source
#[derive(Debug, Clone)]
pub struct HttpAddressSource {
    /// URL of the lookup service
    url: String,

    /// HTTP client
    client: reqwest::Client,
}

impl HttpAddressSource {
    /// Create a source with the default timeout
    ///
    /// # Parameters
    ///
    /// - `url`: lookup service URL (e.g., "https://api.ipify.org")
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_timeout(url, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Create a source with a custom request timeout
    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
        }
    }

    /// Parse a lookup-service response body into an address string
    ///
    /// The body must be a single IP literal (IPv4 or IPv6), optionally
    /// surrounded by whitespace. The parsed value is returned as the trimmed
    /// string so the core can keep treating addresses opaquely.
    fn parse_body(body: &str) -> std::result::Result<String, SourceError> {
        let trimmed = body.trim();
        if trimmed.is_empty() {
            return Err(SourceError::MalformedResponse(
                "empty response body".to_string(),
            ));
        }

        trimmed.parse::<IpAddr>().map_err(|_| {
            SourceError::MalformedResponse(format!("not an IP address: {:?}", trimmed))
        })?;

        Ok(trimmed.to_string())
    }
}

#[async_trait::async_trait]
impl AddressSource for HttpAddressSource {
    async fn fetch(&self) -> std::result::Result<AddressObservation, SourceError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| SourceError::Unreachable(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(SourceError::Unreachable(format!(
                "HTTP {}",
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| SourceError::Unreachable(format!("failed to read response: {}", e)))?;

        let address = Self::parse_body(&body)?;
        tracing::debug!(url = %self.url, %address, "public address observed");

        Ok(AddressObservation::now(address))
    }

    fn source_name(&self) -> &'static str {
        "http"
    }
}

/// Factory for creating HTTP address sources
pub struct HttpSourceFactory;

impl AddressSourceFactory for HttpSourceFactory {
    fn create(&self, config: &AddressSourceConfig) -> Result<Box<dyn AddressSource>> {
        match config {
            AddressSourceConfig::Http { url, timeout_secs } => {
                let timeout =
                    Duration::from_secs(timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS));
                Ok(Box::new(HttpAddressSource::with_timeout(url, timeout)))
            }
            _ => Err(Error::config("invalid config for HTTP address source")),
        }
    }
}

/// Register the HTTP address source with a registry
pub fn register(registry: &ComponentRegistry) {
    registry.register_source("http", Box::new(HttpSourceFactory));
}
