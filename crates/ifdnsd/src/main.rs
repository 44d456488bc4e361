// # ifdnsd - Interface DNS Daemon
//
// Thin integration layer: all address tracking and DNS logic lives in
// ifdns-core. The daemon is responsible for:
// 1. Reading its settings from environment variables
// 2. Loading the YAML configuration file
// 3. Building the Route 53 client and dropping privileges
// 4. Wiring Watcher -> Orchestrator -> Converger and running until signalled
//
// ## Environment
//
// - `IFDNS_CONFIG`: Path to the configuration file (default /etc/ifdns.yaml)
// - `IFDNS_LOG_LEVEL`: trace, debug, info, warn or error (default info)
// - `IFDNS_MODE`: `dry-run` to resolve zones without submitting changes
//
// AWS credentials and region are taken from the usual AWS environment
// variables or shared configuration.
//
// ## Example
//
// ```bash
// export IFDNS_CONFIG=/etc/ifdns.yaml
// export AWS_ACCESS_KEY_ID=...
// export AWS_SECRET_ACCESS_KEY=...
//
// ifdnsd
// ```

mod lockdown;

use anyhow::{Context, Result};
use ifdns_core::{AddressListener, Config, Converger, Orchestrator, Watcher, ZoneService};
use ifdns_ifaddrs::IfAddrsSource;
use ifdns_provider_route53::Route53Service;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

const DEFAULT_CONFIG_PATH: &str = "/etc/ifdns.yaml";

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IfdnsExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<IfdnsExitCode> for ExitCode {
    fn from(code: IfdnsExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Process settings taken from the environment
#[derive(Debug, Clone, PartialEq, Eq)]
struct Settings {
    config_path: PathBuf,
    log_level: Level,
    dry_run: bool,
}

impl Settings {
    /// Load settings from environment variables
    fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let config_path = lookup("IFDNS_CONFIG")
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

        let log_level = lookup("IFDNS_LOG_LEVEL").unwrap_or_else(|| "info".to_string());
        let log_level = match log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => anyhow::bail!(
                "IFDNS_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                log_level
            ),
        };

        let dry_run = ifdns_provider_route53::is_dry_run_mode(
            lookup(ifdns_provider_route53::MODE_ENV).as_deref(),
        );

        Ok(Self {
            config_path: PathBuf::from(config_path),
            log_level,
            dry_run,
        })
    }
}

fn main() -> ExitCode {
    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return IfdnsExitCode::ConfigError.into();
        }
    };

    let config = match Config::load(&settings.config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "error loading configuration {}: {}",
                settings.config_path.display(),
                e
            );
            return IfdnsExitCode::ConfigError.into();
        }
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(settings.log_level)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return IfdnsExitCode::ConfigError.into();
    }

    info!("Starting ifdnsd");
    info!(
        "Configuration loaded from {}: {} {} record(s) on {} across {} zone(s)",
        settings.config_path.display(),
        config.targets.iter().map(|t| t.names.len()).sum::<usize>(),
        config.record_type,
        config.interface,
        config.targets.len()
    );

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return IfdnsExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        let watcher = match start(&config, settings.dry_run).await {
            Ok(watcher) => watcher,
            Err(e) => {
                error!("Startup error: {:#}", e);
                return IfdnsExitCode::ConfigError;
            }
        };

        match run_daemon(&watcher).await {
            Ok(()) => IfdnsExitCode::CleanShutdown,
            Err(e) => {
                error!("Daemon error: {:#}", e);
                IfdnsExitCode::RuntimeError
            }
        }
    });

    result.into()
}

/// Build every component; any failure here is a startup error
async fn start(config: &Config, dry_run: bool) -> Result<Watcher> {
    // The SDK needs network and file access to resolve its configuration,
    // so it is built before lockdown.
    let service: Arc<dyn ZoneService> =
        Arc::new(Route53Service::from_env(config.retries, dry_run).await);
    info!("Using {} zone service", service.service_name());

    lockdown::lockdown().context("lockdown failed")?;

    let converger = Arc::new(Converger::from_config(service, config));
    let orchestrator: Arc<dyn AddressListener> =
        Arc::new(Orchestrator::new(converger, config.targets.clone()));

    for target in &config.targets {
        info!("Managing {:?}", target.fqdns());
    }

    let watcher = Watcher::from_config(config, Box::new(IfAddrsSource::new()), orchestrator)
        .with_context(|| format!("error watching interface {}", config.interface))?;

    Ok(watcher)
}

/// Run the watcher until SIGTERM or SIGINT
async fn run_daemon(watcher: &Watcher) -> Result<()> {
    tokio::select! {
        _ = watcher.run() => {
            anyhow::bail!("watcher stopped unexpectedly");
        }
        signal = wait_for_shutdown() => {
            let signal = signal?;
            info!("Received shutdown signal: {}", signal);
            info!("Shutting down daemon");
        }
    }

    Ok(())
}

/// Wait for shutdown signals (SIGTERM, SIGINT)
///
/// # Returns
///
/// Returns the name of the signal received.
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

/// Wait for shutdown signals (SIGINT only)
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}
