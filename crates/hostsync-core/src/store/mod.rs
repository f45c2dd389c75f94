//! Built-in collaborator implementations
//!
//! In-memory variants for tests and ephemeral deployments, file-backed
//! variants for durable single-instance deployments.

pub mod file;
pub mod memory;

pub use file::{FileHistoryLog, FileHostRegistry, FileStateStore};
pub use memory::{
    MemoryHistoryLog, MemoryHostRegistry, MemorySettingsProvider, MemoryStateStore,
};

use crate::config::StateStoreConfig;
use crate::registry::ComponentRegistry;
use crate::traits::{StateStore, StateStoreFactory};
use crate::{Error, Result};
use async_trait::async_trait;

/// Factory for the built-in file state store
pub struct FileStateStoreFactory;

#[async_trait]
impl StateStoreFactory for FileStateStoreFactory {
    async fn create(&self, config: &StateStoreConfig) -> Result<Box<dyn StateStore>> {
        match config {
            StateStoreConfig::File { path } => {
                Ok(Box::new(FileStateStore::new(path).await?))
            }
            _ => Err(Error::config("invalid config for file state store")),
        }
    }
}

/// Factory for the built-in memory state store
pub struct MemoryStateStoreFactory;

#[async_trait]
impl StateStoreFactory for MemoryStateStoreFactory {
    async fn create(&self, config: &StateStoreConfig) -> Result<Box<dyn StateStore>> {
        match config {
            StateStoreConfig::Memory => Ok(Box::new(MemoryStateStore::new())),
            _ => Err(Error::config("invalid config for memory state store")),
        }
    }
}

/// Register the built-in state store factories with a registry
pub fn register_builtin(registry: &ComponentRegistry) {
    registry.register_state_store("file", Box::new(FileStateStoreFactory));
    registry.register_state_store("memory", Box::new(MemoryStateStoreFactory));
}
