//! Configuration types for the hostsync system
//!
//! This module defines all configuration structures used throughout the crate.

use serde::{Deserialize, Serialize};

/// Lower bound for the update interval (seconds)
pub const MIN_UPDATE_INTERVAL_SECS: u64 = 60;
/// Upper bound for the update interval (seconds)
pub const MAX_UPDATE_INTERVAL_SECS: u64 = 86_400;

/// Main hostsync configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Address source configuration
    pub source: AddressSourceConfig,

    /// Update gateway configuration
    pub gateway: GatewayConfig,

    /// State store configuration
    #[serde(default)]
    pub state_store: StateStoreConfig,

    /// Host registry configuration
    #[serde(default)]
    pub host_registry: HostRegistryConfig,

    /// History log configuration
    #[serde(default)]
    pub history: HistoryConfig,

    /// Initial runtime settings
    #[serde(default)]
    pub settings: Settings,

    /// Capacity of the controller's event channel
    ///
    /// When full, new events are dropped (with a warning log) rather than
    /// blocking the reconciliation worker.
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl SyncConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.source.validate()?;
        self.gateway.validate()?;
        self.settings.validate()?;

        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config(
                "event channel capacity must be > 0",
            ));
        }

        Ok(())
    }
}

/// Address source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AddressSourceConfig {
    /// HTTP lookup service returning the caller's address as plain text
    Http {
        /// URL to fetch the address from (e.g., "https://api.ipify.org")
        url: String,
        /// Request timeout in seconds
        timeout_secs: Option<u64>,
    },

    /// Custom address source
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl AddressSourceConfig {
    /// Validate the address source configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            AddressSourceConfig::Http { url, timeout_secs } => {
                if url.is_empty() {
                    return Err(crate::Error::config("address source URL cannot be empty"));
                }
                if timeout_secs == &Some(0) {
                    return Err(crate::Error::config(
                        "address source timeout must be > 0",
                    ));
                }
                Ok(())
            }
            AddressSourceConfig::Custom { factory, config } => {
                if factory.is_empty() {
                    return Err(crate::Error::config(
                        "custom address source factory cannot be empty",
                    ));
                }
                if config.is_null() {
                    return Err(crate::Error::config(
                        "custom address source config cannot be null",
                    ));
                }
                Ok(())
            }
        }
    }

    /// Get the source type name
    pub fn type_name(&self) -> &str {
        match self {
            AddressSourceConfig::Http { .. } => "http",
            AddressSourceConfig::Custom { factory, .. } => factory,
        }
    }
}

/// Update gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GatewayConfig {
    /// dyndns2-protocol gateway (OVH DynHost and compatible providers)
    DynHost {
        /// Update endpoint (e.g., "https://www.ovh.com/nic/update")
        endpoint: String,
        /// Request timeout in seconds
        timeout_secs: Option<u64>,
    },

    /// Custom gateway
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl GatewayConfig {
    /// Validate the gateway configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            GatewayConfig::DynHost { endpoint, .. } => {
                if endpoint.is_empty() {
                    return Err(crate::Error::config("gateway endpoint cannot be empty"));
                }
                Ok(())
            }
            GatewayConfig::Custom { factory, config } => {
                if factory.is_empty() {
                    return Err(crate::Error::config(
                        "custom gateway factory cannot be empty",
                    ));
                }
                if config.is_null() {
                    return Err(crate::Error::config("custom gateway config cannot be null"));
                }
                Ok(())
            }
        }
    }

    /// Get the gateway type name
    pub fn type_name(&self) -> &str {
        match self {
            GatewayConfig::DynHost { .. } => "dynhost",
            GatewayConfig::Custom { factory, .. } => factory,
        }
    }
}

/// State store configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StateStoreConfig {
    /// File-based state store
    File {
        /// Path to the state file
        path: String,
    },

    /// In-memory state store (not persistent)
    #[default]
    Memory,

    /// Custom state store
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl StateStoreConfig {
    /// Get the store type name
    pub fn type_name(&self) -> &str {
        match self {
            StateStoreConfig::File { .. } => "file",
            StateStoreConfig::Memory => "memory",
            StateStoreConfig::Custom { factory, .. } => factory,
        }
    }
}

/// Host registry configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostRegistryConfig {
    /// JSON host file on disk
    File {
        /// Path to the hosts file
        path: String,
    },

    /// In-memory registry (not persistent)
    #[default]
    Memory,
}

/// History log configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HistoryConfig {
    /// JSON-lines file, one entry per line
    File {
        /// Path to the history file
        path: String,
    },

    /// In-memory log (not persistent)
    #[default]
    Memory,
}

/// Runtime settings, re-read by the scheduler at the top of each idle period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Seconds between scheduled reconciliation cycles
    #[serde(default = "default_update_interval_secs")]
    pub update_interval_secs: u64,

    /// Log level for the daemon
    #[serde(default)]
    pub log_level: LogLevel,
}

impl Settings {
    /// Validate the settings
    pub fn validate(&self) -> Result<(), crate::Error> {
        if !(MIN_UPDATE_INTERVAL_SECS..=MAX_UPDATE_INTERVAL_SECS)
            .contains(&self.update_interval_secs)
        {
            return Err(crate::Error::config(format!(
                "update interval must be between {} and {} seconds, got {}",
                MIN_UPDATE_INTERVAL_SECS, MAX_UPDATE_INTERVAL_SECS, self.update_interval_secs
            )));
        }
        Ok(())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            update_interval_secs: default_update_interval_secs(),
            log_level: LogLevel::default(),
        }
    }
}

/// Log level setting
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            other => Err(crate::Error::config(format!(
                "'{}' is not a valid log level (trace, debug, info, warn, error)",
                other
            ))),
        }
    }
}

fn default_update_interval_secs() -> u64 {
    300
}

fn default_event_channel_capacity() -> usize {
    256
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal() -> SyncConfig {
        SyncConfig {
            source: AddressSourceConfig::Http {
                url: "https://api.ipify.org".into(),
                timeout_secs: None,
            },
            gateway: GatewayConfig::DynHost {
                endpoint: "https://www.ovh.com/nic/update".into(),
                timeout_secs: None,
            },
            state_store: StateStoreConfig::Memory,
            host_registry: HostRegistryConfig::Memory,
            history: HistoryConfig::Memory,
            settings: Settings::default(),
            event_channel_capacity: 256,
        }
    }

    #[test]
    fn minimal_config_is_valid() {
        assert!(minimal().validate().is_ok());
    }

    #[test]
    fn default_interval_is_in_range() {
        let settings = Settings::default();
        assert_eq!(settings.update_interval_secs, 300);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn interval_bounds_are_enforced() {
        let mut settings = Settings::default();

        settings.update_interval_secs = MIN_UPDATE_INTERVAL_SECS - 1;
        assert!(settings.validate().is_err());

        settings.update_interval_secs = MIN_UPDATE_INTERVAL_SECS;
        assert!(settings.validate().is_ok());

        settings.update_interval_secs = MAX_UPDATE_INTERVAL_SECS;
        assert!(settings.validate().is_ok());

        settings.update_interval_secs = MAX_UPDATE_INTERVAL_SECS + 1;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn empty_source_url_is_rejected() {
        let mut config = minimal();
        config.source = AddressSourceConfig::Http {
            url: String::new(),
            timeout_secs: None,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn empty_gateway_endpoint_is_rejected() {
        let mut config = minimal();
        config.gateway = GatewayConfig::DynHost {
            endpoint: String::new(),
            timeout_secs: None,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn log_level_parses_case_insensitively() {
        assert_eq!("INFO".parse::<LogLevel>().unwrap(), LogLevel::Info);
        assert_eq!("warn".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert!("verbose".parse::<LogLevel>().is_err());
    }

    #[test]
    fn config_round_trips_through_json() {
        let config = minimal();
        let json = serde_json::to_string(&config).unwrap();
        let back: SyncConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.source.type_name(), "http");
        assert_eq!(back.gateway.type_name(), "dynhost");
    }
}
