//! Plugin-based component registry
//!
//! The registry allows address sources, update gateways and state stores to
//! be registered dynamically at runtime, avoiding hardcoded if-else chains.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use hostsync_core::registry::ComponentRegistry;
//! use hostsync_core::config::GatewayConfig;
//!
//! // Create a registry
//! let registry = ComponentRegistry::new();
//!
//! // Register components
//! registry.register_gateway("dynhost", Box::new(dynhost_factory));
//!
//! // Create a gateway from config
//! let config = GatewayConfig::DynHost { ... };
//! let gateway = registry.create_gateway(&config)?;
//! ```
//!
//! ## Registration
//!
//! Implementations should register themselves during initialization:
//!
//! ```rust,ignore
//! # use hostsync_core::registry::ComponentRegistry;
//!
//! // In hostsync-gateway-dynhost crate
//! pub fn register(registry: &ComponentRegistry) {
//!     registry.register_gateway("dynhost", Box::new(DynHostFactory));
//! }
//! ```

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::config::{AddressSourceConfig, GatewayConfig, StateStoreConfig};
use crate::error::{Error, Result};
use crate::traits::{
    AddressSource, AddressSourceFactory, StateStore, StateStoreFactory, UpdateGateway,
    UpdateGatewayFactory,
};

/// Component registry for plugin-based collaborator creation
///
/// The registry maintains maps from component type names to factory objects,
/// allowing dynamic instantiation based on configuration.
///
/// ## Thread Safety
///
/// The registry uses interior mutability with RwLock, allowing concurrent
/// reads and exclusive writes. The locks are never held across `.await`
/// points, so poisoning only occurs if a registration itself panics; in that
/// case we propagate the panic rather than run with a half-built registry.
#[derive(Default)]
pub struct ComponentRegistry {
    /// Registered address source factories
    sources: RwLock<HashMap<String, Box<dyn AddressSourceFactory>>>,

    /// Registered update gateway factories
    gateways: RwLock<HashMap<String, Box<dyn UpdateGatewayFactory>>>,

    /// Registered state store factories (Arc: creation is async, so the
    /// factory is cloned out before the lock is released)
    state_stores: RwLock<HashMap<String, Arc<dyn StateStoreFactory>>>,
}

impl ComponentRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an address source factory
    ///
    /// # Parameters
    ///
    /// - `name`: Source type name (e.g., "http")
    /// - `factory`: Factory object for creating source instances
    pub fn register_source(&self, name: impl Into<String>, factory: Box<dyn AddressSourceFactory>) {
        let name = name.into();
        let mut sources = self.sources.write().unwrap_or_else(|e| e.into_inner());
        sources.insert(name, factory);
    }

    /// Register an update gateway factory
    ///
    /// # Parameters
    ///
    /// - `name`: Gateway type name (e.g., "dynhost")
    /// - `factory`: Factory object for creating gateway instances
    pub fn register_gateway(&self, name: impl Into<String>, factory: Box<dyn UpdateGatewayFactory>) {
        let name = name.into();
        let mut gateways = self.gateways.write().unwrap_or_else(|e| e.into_inner());
        gateways.insert(name, factory);
    }

    /// Register a state store factory
    ///
    /// # Parameters
    ///
    /// - `name`: State store type name (e.g., "file", "memory")
    /// - `factory`: Factory object for creating state store instances
    pub fn register_state_store(
        &self,
        name: impl Into<String>,
        factory: Box<dyn StateStoreFactory>,
    ) {
        let name = name.into();
        let mut stores = self.state_stores.write().unwrap_or_else(|e| e.into_inner());
        stores.insert(name, Arc::from(factory));
    }

    /// Create an address source from configuration
    ///
    /// # Returns
    ///
    /// - `Ok(Box<dyn AddressSource>)`: created source instance
    /// - `Err(Error)`: if the source type is not registered or creation fails
    pub fn create_source(&self, config: &AddressSourceConfig) -> Result<Box<dyn AddressSource>> {
        let source_type = config.type_name();
        let sources = self.sources.read().unwrap_or_else(|e| e.into_inner());

        let factory = sources.get(source_type).ok_or_else(|| {
            Error::config(format!("unknown address source type: {}", source_type))
        })?;

        factory.create(config)
    }

    /// Create an update gateway from configuration
    ///
    /// # Returns
    ///
    /// - `Ok(Box<dyn UpdateGateway>)`: created gateway instance
    /// - `Err(Error)`: if the gateway type is not registered or creation fails
    pub fn create_gateway(&self, config: &GatewayConfig) -> Result<Box<dyn UpdateGateway>> {
        let gateway_type = config.type_name();
        let gateways = self.gateways.read().unwrap_or_else(|e| e.into_inner());

        let factory = gateways
            .get(gateway_type)
            .ok_or_else(|| Error::config(format!("unknown gateway type: {}", gateway_type)))?;

        factory.create(config)
    }

    /// Create a state store from configuration
    ///
    /// # Returns
    ///
    /// - `Ok(Box<dyn StateStore>)`: created store instance
    /// - `Err(Error)`: if the store type is not registered or creation fails
    pub async fn create_state_store(
        &self,
        config: &StateStoreConfig,
    ) -> Result<Box<dyn StateStore>> {
        let store_type = config.type_name().to_string();

        // Clone the factory out so the lock is not held across the await.
        let factory = {
            let stores = self.state_stores.read().unwrap_or_else(|e| e.into_inner());
            stores
                .get(store_type.as_str())
                .ok_or_else(|| Error::config(format!("unknown state store type: {}", store_type)))?
                .clone()
        };

        factory.create(config).await
    }

    /// List all registered address source types
    pub fn list_sources(&self) -> Vec<String> {
        let sources = self.sources.read().unwrap_or_else(|e| e.into_inner());
        sources.keys().cloned().collect()
    }

    /// List all registered gateway types
    pub fn list_gateways(&self) -> Vec<String> {
        let gateways = self.gateways.read().unwrap_or_else(|e| e.into_inner());
        gateways.keys().cloned().collect()
    }

    /// List all registered state store types
    pub fn list_state_stores(&self) -> Vec<String> {
        let stores = self.state_stores.read().unwrap_or_else(|e| e.into_inner());
        stores.keys().cloned().collect()
    }

    /// Check if an address source type is registered
    pub fn has_source(&self, name: &str) -> bool {
        let sources = self.sources.read().unwrap_or_else(|e| e.into_inner());
        sources.contains_key(name)
    }

    /// Check if a gateway type is registered
    pub fn has_gateway(&self, name: &str) -> bool {
        let gateways = self.gateways.read().unwrap_or_else(|e| e.into_inner());
        gateways.contains_key(name)
    }

    /// Check if a state store type is registered
    pub fn has_state_store(&self, name: &str) -> bool {
        let stores = self.state_stores.read().unwrap_or_else(|e| e.into_inner());
        stores.contains_key(name)
    }
}
