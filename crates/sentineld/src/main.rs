// # sentineld - IP Sentinel Daemon
//
// The sentineld daemon is responsible for:
// 1. Reading configuration from environment variables
// 2. Initializing the runtime and tracing
// 3. Wiring the resolver, store, monitor, notifier, and scheduler
// 4. Serving the HTTP control surface
//
// This is a thin integration layer: all monitoring logic lives in
// sentinel-core, the provider chain in sentinel-ip-http, and the
// notification channels in sentinel-notify.
//
// ## Configuration
//
// All configuration is done via environment variables:
//
// - `PORT`: HTTP listen port (default 7450)
// - `SENTINEL_DATA_DIR`: directory for persisted state (default "data")
// - `SENTINEL_LOG_LEVEL`: trace|debug|info|warn|error (default info)
// - `HOST_IP`: display hint for the startup banner, not behavioural
// - `ENABLE_AGENT` / `AGENT_INTERVAL`: reserved for an autonomous
//   polling mode; parsed and logged but not yet behavioural
//
// ## Example
//
// ```bash
// export PORT=7450
// export SENTINEL_DATA_DIR=/var/lib/sentinel
//
// sentineld
// ```

mod api;

use anyhow::Result;
use sentinel_core::{ChangeStore, ChannelRegistry, Monitor, Notifier, Scheduler};
use sentinel_ip_http::HttpResolver;
use std::env;
use std::net::IpAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum SentinelExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<SentinelExitCode> for ExitCode {
    fn from(code: SentinelExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration
struct Config {
    port: u16,
    data_dir: String,
    log_level: String,
    host_ip: Option<String>,
    enable_agent: bool,
    agent_interval: u64,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        let port = match env::var("PORT") {
            Ok(value) => value
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT '{}' is not a valid port number", value))?,
            Err(_) => 7450,
        };

        Ok(Self {
            port,
            data_dir: env::var("SENTINEL_DATA_DIR").unwrap_or_else(|_| "data".to_string()),
            log_level: env::var("SENTINEL_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            host_ip: env::var("HOST_IP").ok(),
            enable_agent: env::var("ENABLE_AGENT")
                .map(|v| v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
            agent_interval: env::var("AGENT_INTERVAL")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(300),
        })
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        if self.data_dir.is_empty() {
            anyhow::bail!("SENTINEL_DATA_DIR cannot be empty");
        }

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "SENTINEL_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        Ok(())
    }
}

fn main() -> ExitCode {
    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return SentinelExitCode::ConfigError.into();
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return SentinelExitCode::ConfigError.into();
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
        return SentinelExitCode::ConfigError.into();
    }

    // Enter tokio runtime
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return SentinelExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        if let Err(e) = run_daemon(config).await {
            error!("Daemon error: {}", e);
            SentinelExitCode::RuntimeError
        } else {
            SentinelExitCode::CleanShutdown
        }
    });

    result.into()
}

/// Run the daemon
async fn run_daemon(config: Config) -> Result<()> {
    let data_dir = PathBuf::from(&config.data_dir);
    tokio::fs::create_dir_all(&data_dir).await?;

    // Register the built-in notification channels
    let registry = ChannelRegistry::new();
    sentinel_notify::register(&registry);

    let store = ChangeStore::new(&data_dir);
    let monitor = Arc::new(Monitor::new(Box::new(HttpResolver::new()), store).await);
    let notifier = Arc::new(Notifier::load(data_dir.join("notifications.json"), registry).await);
    let scheduler = Arc::new(
        Scheduler::load(
            monitor.clone(),
            notifier.clone(),
            data_dir.join("schedule_config.json"),
        )
        .await,
    );

    scheduler.start().await;

    if config.enable_agent {
        info!(
            "Agent mode requested (interval {}s); reserved for a future autonomous poller",
            config.agent_interval
        );
    }

    let state = api::AppState {
        monitor,
        scheduler: scheduler.clone(),
        notifier,
    };

    let listener =
        tokio::net::TcpListener::bind((std::net::Ipv4Addr::UNSPECIFIED, config.port)).await?;

    info!("IP Sentinel is running");
    info!("Local access:  http://localhost:{}", config.port);
    info!(
        "Network:       http://{}:{}",
        display_host(config.host_ip.as_deref()),
        config.port
    );

    axum::serve(listener, api::router(state))
        .with_graceful_shutdown(wait_for_shutdown())
        .await?;

    info!("Shutting down daemon");
    scheduler.stop().await;

    Ok(())
}

/// Pick a human-readable bind address for the startup banner
///
/// Display hint only: `HOST_IP` wins, Docker falls back to localhost,
/// otherwise the UDP-connect trick reveals the outbound interface.
fn display_host(host_ip: Option<&str>) -> String {
    if let Some(host) = host_ip {
        return host.to_string();
    }

    if std::path::Path::new("/.dockerenv").exists() {
        return "localhost".to_string();
    }

    match local_ip() {
        Some(ip) if !is_docker_bridge(&ip) => ip.to_string(),
        _ => "localhost".to_string(),
    }
}

/// Address of the interface used to reach the internet
fn local_ip() -> Option<IpAddr> {
    let socket = std::net::UdpSocket::bind("0.0.0.0:0").ok()?;
    socket.connect(("8.8.8.8", 80)).ok()?;
    Some(socket.local_addr().ok()?.ip())
}

fn is_docker_bridge(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            let octets = v4.octets();
            octets[0] == 172 && (17..=19).contains(&octets[1])
        }
        IpAddr::V6(_) => false,
    }
}

/// Wait for shutdown signals (SIGTERM, SIGINT)
#[cfg(unix)]
async fn wait_for_shutdown() {
    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(stream) => stream,
        Err(e) => {
            error!("Failed to setup SIGTERM handler: {}", e);
            return;
        }
    };
    let mut sigint = match signal(SignalKind::interrupt()) {
        Ok(stream) => stream,
        Err(e) => {
            error!("Failed to setup SIGINT handler: {}", e);
            return;
        }
    };

    tokio::select! {
        _ = sigterm.recv() => info!("Received SIGTERM"),
        _ = sigint.recv() => info!("Received SIGINT"),
    }
}

/// Wait for shutdown (CTRL-C only on non-Unix platforms)
#[cfg(not(unix))]
async fn wait_for_shutdown() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to wait for CTRL-C: {}", e);
    }
}
