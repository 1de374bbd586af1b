//! Upstream gateway
//!
//! Serves the provider routes over HTTP and forwards each call to its
//! third-party API with server-side credentials.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http (request id, trace, timeout, body limit)
//!                         │
//!                         ▼
//!                     providers (validate parameters)
//!                         │
//!                         ▼
//!                     gateway (credential → request → sign → execute)
//!                         │
//!                         ▼
//!                     third-party API
//!                         │
//!     Client Response     ▼
//!     ◀────────────── relay or projection
//! ```
//!
//! Startup order: `.env`, config file, environment overrides, CLI overrides,
//! validation, logging, metrics, credentials, listener.

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use upstream_gateway::config::{apply_env_overrides, load_config, validate_config, ConfigError, GatewayConfig};
use upstream_gateway::gateway::Credentials;
use upstream_gateway::http::HttpServer;
use upstream_gateway::lifecycle::{signals, Shutdown};
use upstream_gateway::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "upstream-gateway")]
#[command(about = "HTTP gateway to movie, news, chat and image recognition APIs", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address (host:port).
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };
    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }
    validate_config(&config).map_err(ConfigError::Validation)?;

    logging::init(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "upstream-gateway starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        metrics_enabled = config.observability.metrics_enabled,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let credentials = Credentials::from_env();
    credentials.log_summary();

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    signals::spawn_signal_listener(shutdown.clone());

    let server = HttpServer::new(config, credentials)?;
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
