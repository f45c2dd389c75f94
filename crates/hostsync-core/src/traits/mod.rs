//! Core traits for the hostsync system
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`AddressSource`]: Look up the current public address
//! - [`UpdateGateway`]: Apply host updates via a provider's update protocol
//! - [`StateStore`]: Persist the reconciliation state across cycles
//! - [`HostRegistry`]: Provide the managed hosts and accept per-host results
//! - [`HistoryLog`]: Append-only audit trail of changes and update attempts
//! - [`SettingsProvider`]: Runtime settings, polled once per idle period

pub mod address_source;
pub mod history_log;
pub mod host_registry;
pub mod settings;
pub mod state_store;
pub mod update_gateway;

pub use address_source::{AddressObservation, AddressSource, AddressSourceFactory, SourceError};
pub use history_log::{HistoryAction, HistoryEntry, HistoryLog};
pub use host_registry::{HostEntry, HostId, HostRegistry};
pub use settings::SettingsProvider;
pub use state_store::{StateStore, StateStoreFactory, SyncState};
pub use update_gateway::{Credentials, UpdateGateway, UpdateGatewayFactory, UpdateOutcome};
