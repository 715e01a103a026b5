//! Catalog API server.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ security (CORS, headers, rate limit, size)
//!                        │
//!                        ▼
//!                     validation gate ──▶ 400 envelope
//!                        │
//!                        ▼
//!                     api handlers ──▶ domain services ──▶ store
//!                        │
//!                        ▼
//!     Client Response ◀── error normalizer / envelope
//! ```

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use catalog_api::config::load_config;
use catalog_api::lifecycle::shutdown::Drain;
use catalog_api::lifecycle::{signals, startup, Shutdown};
use catalog_api::observability::logging;
use catalog_api::HttpServer;

#[derive(Parser, Debug)]
#[command(name = "catalog-api", version, about = "Users and products REST API")]
struct Cli {
    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listen port
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    logging::init(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "catalog-api starting");
    tracing::info!(
        bind_address = %config.bind_address(),
        environment = %config.server.environment,
        request_timeout_secs = config.timeouts.request_secs,
        rate_limit_enabled = config.rate_limit.enabled,
        "Configuration loaded"
    );

    let listener = startup::prepare(&config).await?;
    let grace = Duration::from_secs(config.timeouts.shutdown_grace_secs);

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config);
    let mut serving = tokio::spawn(server.run(listener, shutdown.subscribe()));

    tokio::select! {
        finished = &mut serving => {
            // The server stopped on its own; nothing left to drain.
            finished??;
            return Ok(());
        }
        signal = signals::shutdown_signal() => {
            tracing::info!(signal, "Shutdown signal received");
        }
    }

    match shutdown.drain(&mut serving, grace).await {
        Drain::Completed(finished) => finished??,
        Drain::TimedOut => serving.abort(),
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
