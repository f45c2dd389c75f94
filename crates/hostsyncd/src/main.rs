// # hostsyncd - Host Reconciliation Daemon
//
// The hostsyncd daemon is a thin integration layer. It is responsible for:
// 1. Reading configuration from environment variables
// 2. Initializing the runtime and tracing
// 3. Registering address sources, gateways and state stores
// 4. Wiring the controller to the scheduler and running until a signal
//
// All reconciliation logic lives in hostsync-core.
//
// ## Configuration
//
// All configuration is done via environment variables:
//
// ### Address source
// - `HOSTSYNC_SOURCE_URL`: lookup service URL (default: https://api.ipify.org)
// - `HOSTSYNC_SOURCE_TIMEOUT_SECS`: lookup timeout in seconds (optional)
//
// ### Update gateway
// - `HOSTSYNC_GATEWAY_ENDPOINT`: dyndns2 update endpoint
//   (default: https://www.ovh.com/nic/update)
// - `HOSTSYNC_GATEWAY_TIMEOUT_SECS`: update timeout in seconds (optional)
//
// ### Storage
// - `HOSTSYNC_STATE_PATH`: path to the state file (omit for in-memory)
// - `HOSTSYNC_HOSTS_PATH`: path to the hosts file (omit for in-memory)
// - `HOSTSYNC_HISTORY_PATH`: path to the history file (omit for in-memory)
//
// ### Scheduling
// - `HOSTSYNC_UPDATE_INTERVAL_SECS`: seconds between cycles (default: 300)
//
// ### Logging
// - `HOSTSYNC_LOG_LEVEL`: trace, debug, info, warn, error (default: info)
//
// ## Example
//
// ```bash
// export HOSTSYNC_STATE_PATH=/var/lib/hostsync/state.json
// export HOSTSYNC_HOSTS_PATH=/var/lib/hostsync/hosts.json
// export HOSTSYNC_HISTORY_PATH=/var/lib/hostsync/history.jsonl
// export HOSTSYNC_UPDATE_INTERVAL_SECS=300
//
// hostsyncd
// ```

use std::env;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use hostsync_core::config::{
    AddressSourceConfig, GatewayConfig, HistoryConfig, HostRegistryConfig, Settings,
    StateStoreConfig, SyncConfig,
};
use hostsync_core::traits::{HistoryLog, HostRegistry, SettingsProvider};
use hostsync_core::{
    ComponentRegistry, ControllerEvent, CycleScheduler, FileHistoryLog, FileHostRegistry,
    MemoryHistoryLog, MemoryHostRegistry, MemorySettingsProvider, SyncController,
};

#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};

/// Default lookup service
const DEFAULT_SOURCE_URL: &str = "https://api.ipify.org";

/// Default dyndns2 endpoint (OVH DynHost)
const DEFAULT_GATEWAY_ENDPOINT: &str = "https://www.ovh.com/nic/update";

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum DaemonExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<DaemonExitCode> for ExitCode {
    fn from(code: DaemonExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration, assembled from the environment
struct Config {
    sync: SyncConfig,
    hosts_path: Option<String>,
    history_path: Option<String>,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        let source = AddressSourceConfig::Http {
            url: env::var("HOSTSYNC_SOURCE_URL")
                .unwrap_or_else(|_| DEFAULT_SOURCE_URL.to_string()),
            timeout_secs: parse_env_u64("HOSTSYNC_SOURCE_TIMEOUT_SECS")?,
        };

        let gateway = GatewayConfig::DynHost {
            endpoint: env::var("HOSTSYNC_GATEWAY_ENDPOINT")
                .unwrap_or_else(|_| DEFAULT_GATEWAY_ENDPOINT.to_string()),
            timeout_secs: parse_env_u64("HOSTSYNC_GATEWAY_TIMEOUT_SECS")?,
        };

        let state_store = match env::var("HOSTSYNC_STATE_PATH") {
            Ok(path) if !path.is_empty() => StateStoreConfig::File { path },
            _ => StateStoreConfig::Memory,
        };

        let hosts_path = env::var("HOSTSYNC_HOSTS_PATH").ok().filter(|p| !p.is_empty());
        let history_path = env::var("HOSTSYNC_HISTORY_PATH")
            .ok()
            .filter(|p| !p.is_empty());

        let host_registry = match &hosts_path {
            Some(path) => HostRegistryConfig::File { path: path.clone() },
            None => HostRegistryConfig::Memory,
        };
        let history = match &history_path {
            Some(path) => HistoryConfig::File { path: path.clone() },
            None => HistoryConfig::Memory,
        };

        let mut settings = Settings::default();
        if let Some(interval) = parse_env_u64("HOSTSYNC_UPDATE_INTERVAL_SECS")? {
            settings.update_interval_secs = interval;
        }
        let log_level = env::var("HOSTSYNC_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        settings.log_level = log_level.parse()?;

        Ok(Self {
            sync: SyncConfig {
                source,
                gateway,
                state_store,
                host_registry,
                history,
                settings,
                event_channel_capacity: 256,
            },
            hosts_path,
            history_path,
            log_level,
        })
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        self.sync.validate()?;
        Ok(())
    }
}

fn parse_env_u64(name: &str) -> Result<Option<u64>> {
    match env::var(name) {
        Ok(value) => {
            let parsed = value
                .parse::<u64>()
                .map_err(|_| anyhow::anyhow!("{} must be an integer, got: {}", name, value))?;
            Ok(Some(parsed))
        }
        Err(_) => Ok(None),
    }
}

fn main() -> ExitCode {
    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return DaemonExitCode::ConfigError.into();
        }
    };

    // Validate configuration
    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return DaemonExitCode::ConfigError.into();
    }

    // Initialize tracing
    let log_level = match config.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DaemonExitCode::ConfigError.into();
    }

    info!("Starting hostsyncd daemon");

    // Enter tokio runtime
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DaemonExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        if let Err(e) = run_daemon(config).await {
            error!("Daemon error: {}", e);
            DaemonExitCode::RuntimeError
        } else {
            DaemonExitCode::CleanShutdown
        }
    });

    result.into()
}

/// Run the daemon
async fn run_daemon(config: Config) -> Result<()> {
    // Create component registry and register built-ins
    let registry = ComponentRegistry::new();
    hostsync_core::store::register_builtin(&registry);

    #[cfg(feature = "http-source")]
    {
        info!("Registering HTTP address source");
        hostsync_source_http::register(&registry);
    }

    #[cfg(feature = "dynhost")]
    {
        info!("Registering DynHost gateway");
        hostsync_gateway_dynhost::register(&registry);
    }

    // Create collaborators from configuration
    let source = registry.create_source(&config.sync.source)?;
    let gateway = registry.create_gateway(&config.sync.gateway)?;
    let state_store = registry.create_state_store(&config.sync.state_store).await?;

    let host_registry: Box<dyn HostRegistry> = match &config.hosts_path {
        Some(path) => {
            info!(%path, "Using file host registry");
            Box::new(FileHostRegistry::new(path).await?)
        }
        None => {
            warn!("No HOSTSYNC_HOSTS_PATH set, using empty in-memory host registry");
            Box::new(MemoryHostRegistry::new())
        }
    };

    let history: Box<dyn HistoryLog> = match &config.history_path {
        Some(path) => {
            info!(%path, "Using file history log");
            Box::new(FileHistoryLog::new(path).await?)
        }
        None => Box::new(MemoryHistoryLog::new()),
    };

    let settings: Arc<dyn SettingsProvider> =
        Arc::new(MemorySettingsProvider::new(config.sync.settings));

    info!(
        source = config.sync.source.type_name(),
        gateway = config.sync.gateway.type_name(),
        state_store = config.sync.state_store.type_name(),
        interval_secs = config.sync.settings.update_interval_secs,
        "Configuration loaded"
    );

    // Wire controller and scheduler
    let (controller, mut events) = SyncController::new(
        source,
        gateway,
        state_store,
        host_registry,
        history,
        config.sync.event_channel_capacity,
    );
    let controller = Arc::new(controller);

    // Drain controller events into the log
    let event_task = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event {
                ControllerEvent::CycleSkipped { reason } => {
                    warn!(%reason, "cycle skipped");
                }
                ControllerEvent::AddressChanged { previous, current } => {
                    info!(
                        previous = previous.as_deref().unwrap_or("none"),
                        %current,
                        "address changed"
                    );
                }
                ControllerEvent::HostUpdated { hostname, address } => {
                    info!(%hostname, %address, "host updated");
                }
                ControllerEvent::HostFailed { hostname, reason } => {
                    warn!(%hostname, %reason, "host update failed");
                }
                ControllerEvent::CycleCompleted { updated, failed } => {
                    info!(updated, failed, "cycle completed");
                }
            }
        }
    });

    let (scheduler, handle) = CycleScheduler::new(Arc::clone(&controller), settings);
    let scheduler_task = tokio::spawn(scheduler.run());

    info!("Daemon initialized, reconciliation scheduler running");

    // Wait for shutdown signal
    let signal_name = wait_for_shutdown().await?;
    info!("Received {}, shutting down", signal_name);

    // Cooperative shutdown: honored at the scheduler's next idle boundary.
    handle.shutdown();
    match scheduler_task.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!(error = %e, "scheduler exited with error"),
        Err(e) => error!(error = %e, "scheduler task panicked"),
    }
    event_task.abort();

    info!("Shutdown complete");
    Ok(())
}

/// Wait for shutdown signals (SIGTERM, SIGINT)
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    let name = tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    };

    Ok(name)
}

/// Wait for shutdown signals (CTRL-C only)
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}
