// # Settings Provider Trait
//
// The scheduler polls settings once per idle period, so an interval change
// takes effect starting with the next wait, never the in-flight one.

use async_trait::async_trait;

use crate::config::Settings;

/// Trait for settings provider implementations
///
/// Settings are owned and written by the management surface; the core only
/// reads them.
#[async_trait]
pub trait SettingsProvider: Send + Sync {
    /// Get the current settings
    async fn current(&self) -> crate::Result<Settings>;
}
