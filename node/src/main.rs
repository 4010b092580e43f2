// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Ledger Node
//!
//! Entry point for the `ledger-node` binary. Parses CLI arguments, initializes
//! logging and metrics, builds the ledger engine, and serves the HTTP API.
//!
//! The binary supports three subcommands:
//!
//! - `run`     — start the node
//! - `status`  — query a running node's chain
//! - `version` — print build version information

mod api;
mod cli;
mod logging;
mod metrics;

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;

use ledger_protocol::{ChainResponse, Difficulty, Ledger, LedgerConfig};

use cli::{Commands, LedgerNodeCli};
use metrics::NodeMetrics;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = LedgerNodeCli::parse();

    match cli.command {
        Commands::Run(args) => run_node(args).await,
        Commands::Status(args) => query_status(args).await,
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Starts the node: API server and metrics endpoint.
async fn run_node(args: cli::RunArgs) -> Result<()> {
    logging::init_logging(logging::DEFAULT_FILTER, args.log_format);

    let difficulty: Difficulty = args
        .difficulty
        .parse()
        .with_context(|| format!("invalid difficulty {:?}", args.difficulty))?;

    let config = LedgerConfig {
        difficulty,
        peer_timeout: Duration::from_millis(args.peer_timeout_ms),
    };
    let node_id = api::new_node_id();

    tracing::info!(
        port = args.port,
        metrics_port = args.metrics_port,
        difficulty = %config.difficulty,
        peer_timeout_ms = args.peer_timeout_ms,
        node_id = %node_id,
        "starting ledger-node"
    );

    // --- Ledger ---
    let ledger = Arc::new(Ledger::with_http_client(config));
    for peer in &args.peers {
        ledger
            .register_node(peer)
            .with_context(|| format!("failed to register initial peer {:?}", peer))?;
    }

    // --- Metrics ---
    let node_metrics = Arc::new(NodeMetrics::new().context("failed to create metrics registry")?);

    // --- Application state ---
    let app_state = api::AppState {
        ledger,
        node_id,
        metrics: Arc::clone(&node_metrics),
        mining_timeout: args.mining_timeout_ms.map(Duration::from_millis),
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

    // --- Serve ---
    tokio::select! {
        res = axum::serve(api_listener, api_router) => {
            if let Err(e) = res {
                tracing::error!("API server error: {}", e);
            }
        }
        res = axum::serve(metrics_listener, metrics_router) => {
            if let Err(e) = res {
                tracing::error!("Metrics server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            tracing::info!("shutdown signal received, draining connections");
        }
    }

    tracing::info!("ledger-node stopped");
    Ok(())
}

/// Fetches a running node's chain and prints a summary.
async fn query_status(args: cli::StatusArgs) -> Result<()> {
    let url = format!("{}/chain", args.rpc_url.trim_end_matches('/'));
    let response = reqwest::get(&url)
        .await
        .with_context(|| format!("failed to reach {}", url))?
        .error_for_status()
        .with_context(|| format!("{} answered with an error", url))?;
    let body: ChainResponse = response
        .json()
        .await
        .with_context(|| format!("{} did not return a chain", url))?;

    println!("Node           : {}", args.rpc_url);
    println!("Chain length   : {}", body.length);
    if let Some(tip) = body.chain.last() {
        println!("Tip index      : {}", tip.index);
        println!("Tip proof      : {}", tip.proof);
        println!("Tip hash       : {}", Ledger::hash(tip));
        println!("Tip txs        : {}", tip.tx_count());
    }
    Ok(())
}

/// Prints version information to stdout.
fn print_version() {
    println!("ledger-node {}", env!("CARGO_PKG_VERSION"));
    println!("protocol    {}", ledger_protocol::config::PROTOCOL_VERSION);
    println!("rustc       {}", rustc_version());
}

/// Returns the Rust compiler version used to build this binary.
fn rustc_version() -> &'static str {
    option_env!("RUSTC_VERSION").unwrap_or("unknown")
}

/// Waits for SIGINT (Ctrl+C) or SIGTERM, whichever comes first.
///
/// On non-Unix platforms, only Ctrl+C is supported. If a handler cannot be
/// installed, that signal is simply never observed.
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
