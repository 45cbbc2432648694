//! Bracket validation service.
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌──────────────────────────────────────────────────┐
//!                     │               BRACKET SERVICE                    │
//!                     │                                                  │
//!   POST /validate ───┼─▶ http ──▶ brackets (format → balance) ──┐       │
//!                     │               │                          │       │
//!                     │               └──▶ stats queue ──▶ stats worker ─┼──▶ cache
//!                     │                                                  │   cluster
//!   GET /status ──────┼─▶ http ──▶ health (ping fan-out, quorum) ────────┼──▶ (nodes)
//!   GET /stats ───────┼─▶ http ──▶ stats recorder ───────────────────────┼──▶
//!                     │                                                  │
//!                     │  config · observability · lifecycle              │
//!                     └──────────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;
use tokio::net::TcpListener;

use bracket_service::config::load_config;
use bracket_service::lifecycle::{wait_for_signal, Shutdown};
use bracket_service::observability::{logging, metrics};
use bracket_service::HttpServer;

#[derive(Parser, Debug)]
#[command(name = "bracket-service", version, about = "Bracket validation service")]
struct Args {
    /// Path to a TOML configuration file.
    #[arg(short, long, env = "BRACKET_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;

    logging::init_logging(&config.observability, &config.app);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "bracket-service starting");
    tracing::info!(
        environment = ?config.app.environment,
        bind_address = %config.listener.bind_address,
        backend = ?config.cache.backend,
        nodes = config.cache.nodes.len(),
        quorum = config.cache.quorum,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if !config.cache.quorum_is_majority() {
        tracing::warn!(
            quorum = config.cache.quorum,
            nodes = config.cache.nodes.len(),
            "Quorum is not a majority of nodes; a minority partition will report connected"
        );
    }

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            wait_for_signal().await;
            shutdown.trigger();
        }
    });

    HttpServer::new(config).run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
