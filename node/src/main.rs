// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # KasGate Node
//!
//! Entry point for the `kasgate-node` binary. Parses CLI arguments,
//! initializes logging and metrics, wires the indexer client into the
//! transfer engine, and serves the HTTP API.
//!
//! The binary supports three subcommands:
//!
//! - `run`: start the gateway
//! - `address`: print the address of a key, or of a freshly generated one
//! - `version`: print build version information

mod api;
mod cli;
mod logging;
mod metrics;

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use zeroize::Zeroizing;

use kasgate_protocol::address::Prefix;
use kasgate_protocol::crypto::SigningKey;
use kasgate_protocol::indexer::{HttpIndexer, IndexerConfig};
use kasgate_protocol::transfer::TransferEngine;

use cli::{Commands, KasGateCli};
use metrics::NodeMetrics;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = KasGateCli::parse();

    match cli.command {
        Commands::Run(args) => run_node(args).await,
        Commands::Address(args) => print_address(args),
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Starts the gateway: API server and metrics endpoint.
async fn run_node(args: cli::RunArgs) -> Result<()> {
    logging::init_logging(&args.log_level, args.log_format);

    let network = Prefix::from(args.network);
    tracing::info!(
        port = args.port,
        metrics_port = args.metrics_port,
        api_url = %args.api_url,
        network = %network,
        "starting kasgate-node"
    );

    // --- Default signing key ---
    let default_private_key = match args.private_key {
        Some(hex) => {
            let hex = Zeroizing::new(hex);
            let key =
                SigningKey::from_hex(&hex).context("KASGATE_PRIVATE_KEY is not a valid key")?;
            tracing::info!(address = %key.address(network), "default signing key loaded");
            Some(Arc::new(hex))
        }
        None => None,
    };

    // --- Indexer + engine ---
    let indexer = HttpIndexer::new(IndexerConfig {
        base_url: args.api_url.clone(),
        timeout: Duration::from_secs(args.upstream_timeout_secs),
    })
    .with_context(|| format!("failed to build indexer client for {}", args.api_url))?;
    let engine = TransferEngine::new(Arc::new(indexer), network);

    // --- Metrics ---
    let node_metrics = Arc::new(
        NodeMetrics::new().map_err(|e| anyhow::anyhow!("failed to register metrics: {e}"))?,
    );

    // --- Application state ---
    let app_state = api::AppState {
        version: env!("CARGO_PKG_VERSION").to_string(),
        engine,
        default_private_key,
        metrics: Arc::clone(&node_metrics),
    };

    // --- API server ---
    let api_router = api::create_router(app_state);
    let api_addr = format!("0.0.0.0:{}", args.port);
    let api_listener = tokio::net::TcpListener::bind(&api_addr)
        .await
        .with_context(|| format!("failed to bind API listener on {}", api_addr))?;
    tracing::info!("API server listening on {}", api_addr);

    // --- Metrics server ---
    let metrics_router = axum::Router::new()
        .route("/metrics", axum::routing::get(metrics::metrics_handler))
        .with_state(Arc::clone(&node_metrics));
    let metrics_addr = format!("0.0.0.0:{}", args.metrics_port);
    let metrics_listener = tokio::net::TcpListener::bind(&metrics_addr)
        .await
        .with_context(|| format!("failed to bind metrics listener on {}", metrics_addr))?;
    tracing::info!("Metrics server listening on {}", metrics_addr);

    let api_server = axum::serve(api_listener, api_router);
    let metrics_server = axum::serve(metrics_listener, metrics_router);

    tokio::select! {
        result = api_server => {
            result.context("API server exited")?;
        }
        result = metrics_server => {
            result.context("metrics server exited")?;
        }
        _ = shutdown_signal() => {
            tracing::info!("shutdown signal received, stopping");
        }
    }

    tracing::info!("kasgate-node stopped");
    Ok(())
}

/// Prints the address of a key on the chosen network. Generates a key if
/// none is given, in which case the private key is printed too.
fn print_address(args: cli::AddressArgs) -> Result<()> {
    let prefix = Prefix::from(args.network);
    match args.private_key {
        Some(hex) => {
            let hex = Zeroizing::new(hex);
            let key = SigningKey::from_hex(&hex).context("invalid private key")?;
            println!("{}", key.address(prefix));
        }
        None => {
            let key = SigningKey::generate();
            println!("address     {}", key.address(prefix));
            println!("public key  {}", key.public_key().to_hex());
            println!("private key {}", key.secret_hex().as_str());
        }
    }
    Ok(())
}

/// Prints version information to stdout.
fn print_version() {
    println!("kasgate-node {}", env!("CARGO_PKG_VERSION"));
    println!("rustc        {}", rustc_version());
}

/// Returns the Rust compiler version used to build this binary.
fn rustc_version() -> &'static str {
    option_env!("RUSTC_VERSION").unwrap_or("unknown")
}

/// Waits for SIGINT (Ctrl+C) or SIGTERM, whichever comes first.
///
/// If a handler cannot be installed, that signal is logged and ignored.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
