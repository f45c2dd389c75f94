// # hostsync-core
//
// Core library for the hostsync DNS record reconciliation system.
//
// ## Architecture Overview
//
// This library provides the core functionality for keeping externally managed
// DNS host records synchronized with the operator's public address:
// - **AddressSource**: Trait for looking up the current public address
// - **UpdateGateway**: Trait for applying per-host updates via a provider API
// - **StateStore**: Trait for persisting the reconciliation state
// - **HostRegistry**: Trait exposing the managed hosts and their update status
// - **HistoryLog**: Trait for the append-only audit trail
// - **SyncController**: Executes one reconciliation cycle to completion
// - **CycleScheduler**: Drives the controller on an interval with manual triggers
// - **ComponentRegistry**: Plugin-based registry for sources, gateways and stores
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Orchestration is separate from implementations
// 2. **Single Worker**: At most one reconciliation cycle runs at a time
// 3. **Exhaustive Cycles**: One host's failure never aborts the remaining hosts
// 4. **Auditable**: Every observed change and update attempt leaves a history entry

pub mod config;
pub mod controller;
pub mod error;
pub mod registry;
pub mod scheduler;
pub mod store;
pub mod traits;

// Re-export core types for convenience
pub use config::{Settings, SyncConfig};
pub use controller::{ControllerEvent, CycleReport, StatusReport, SyncController};
pub use error::{Error, Result};
pub use registry::ComponentRegistry;
pub use scheduler::{CycleScheduler, SchedulerHandle, TriggerReply, TriggerScope};
pub use store::{
    FileHistoryLog, FileHostRegistry, FileStateStore, MemoryHistoryLog, MemoryHostRegistry,
    MemorySettingsProvider, MemoryStateStore,
};
pub use traits::{
    AddressSource, HistoryLog, HostRegistry, SettingsProvider, StateStore, UpdateGateway,
};
