//! Charset proxy (v1)
//!
//! A reverse proxy that rewrites legacy-charset upstream responses to UTF-8.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌───────────────────────────────────────────────────────┐
//!                    │                    CHARSET PROXY                      │
//!                    │                                                       │
//!  Client Request    │  ┌─────────┐    ┌─────────┐    ┌──────────┐           │
//!  ──────────────────┼─▶│  http   │───▶│ routing │───▶│ upstream │───────────┼──▶ Upstream
//!                    │  │ server  │    │         │    │ forward  │           │
//!                    │  └─────────┘    └─────────┘    └────┬─────┘           │
//!                    │                                     │                 │
//!  Client Response   │  ┌──────────────────────────────────▼──────────────┐  │
//!  ◀─────────────────┼──│ filter: capture → Content-Type → charset → write│  │
//!                    │  └─────────────────────────────────────────────────┘  │
//!                    │                                                       │
//!                    │  config · observability · lifecycle                   │
//!                    └───────────────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use charset_proxy::config::{load_config, validate_config, ConfigError, ProxyConfig};
use charset_proxy::lifecycle::{signals, Shutdown};
use charset_proxy::observability::{logging, metrics};
use charset_proxy::HttpServer;

#[derive(Parser)]
#[command(name = "charset-proxy")]
#[command(about = "Reverse proxy that transcodes legacy-charset responses to UTF-8", long_about = None)]
struct Cli {
    /// Configuration file (.toml or .json). Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ProxyConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }
    validate_config(&config).map_err(ConfigError::Validation)?;

    logging::init(&config.observability);
    tracing::info!("charset-proxy v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        routes = config.routes.len(),
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    signals::spawn_signal_listener(shutdown.clone());

    let server = HttpServer::new(config);
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
