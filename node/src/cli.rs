//! # CLI Interface
//!
//! Defines the command-line argument structure for `ledger-node` using
//! `clap` derive. Supports three subcommands: `run`, `status`, and
//! `version`.

use clap::{Parser, Subcommand};

use ledger_protocol::config::{DEFAULT_DIFFICULTY_SUFFIX, DEFAULT_HTTP_PORT, DEFAULT_METRICS_PORT};

use crate::logging::LogFormat;

/// Replicated proof-of-work ledger node.
///
/// Keeps a chain of blocks in memory, accepts transfers, mines blocks on
/// request, and converges with its peers on the longest valid chain.
#[derive(Parser, Debug)]
#[command(
    name = "ledger-node",
    about = "Replicated proof-of-work ledger node",
    version,
    propagate_version = true
)]
pub struct LedgerNodeCli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands for the ledger node binary.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the node.
    Run(RunArgs),
    /// Query the chain of a running node.
    Status(StatusArgs),
    /// Print version information and exit.
    Version,
}

/// Arguments for the `run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Port for the HTTP API.
    #[arg(long, short = 'p', env = "LEDGER_PORT", default_value_t = DEFAULT_HTTP_PORT)]
    pub port: u16,

    /// Port for the Prometheus metrics endpoint.
    #[arg(long, env = "LEDGER_METRICS_PORT", default_value_t = DEFAULT_METRICS_PORT)]
    pub metrics_port: u16,

    /// Hex suffix a proof digest must end with.
    ///
    /// Every node of a network must use the same value or they will reject
    /// each other's chains.
    #[arg(long, env = "LEDGER_DIFFICULTY", default_value = DEFAULT_DIFFICULTY_SUFFIX)]
    pub difficulty: String,

    /// Per-peer timeout for chain fetches during conflict resolution.
    #[arg(long, env = "LEDGER_PEER_TIMEOUT_MS", default_value_t = 5_000)]
    pub peer_timeout_ms: u64,

    /// Give up on a `/mine` request after this many milliseconds.
    #[arg(long, env = "LEDGER_MINING_TIMEOUT_MS")]
    pub mining_timeout_ms: Option<u64>,

    /// Peer to register at startup. Repeatable.
    #[arg(long = "peer", env = "LEDGER_PEERS", value_delimiter = ',')]
    pub peers: Vec<String>,

    /// Log output format.
    #[arg(long, env = "LEDGER_LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,
}

/// Arguments for the `status` subcommand.
#[derive(Parser, Debug)]
pub struct StatusArgs {
    /// Base URL of the running node.
    #[arg(long, default_value = "http://127.0.0.1:3001")]
    pub rpc_url: String,
}
