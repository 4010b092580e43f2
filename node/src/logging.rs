//! Tracing setup for the node binary.
//!
//! Logs go to stderr. `status` and `version` print their results on stdout,
//! which stays pipeable.

use clap::ValueEnum;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Directives applied when `RUST_LOG` is unset. HTTP request spans come from
/// `tower_http`.
pub const DEFAULT_FILTER: &str = "ledger_node=info,ledger_protocol=info,tower_http=debug";

/// How log lines are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Multi-field human output with source locations.
    Pretty,
    /// One JSON object per event, including the current span.
    Json,
}

/// `RUST_LOG` if it is set and parses, `fallback` otherwise.
fn env_filter(fallback: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback))
}

/// Installs the global subscriber. Panics if one is already installed, so
/// call it once from `main`.
pub fn init_logging(fallback_filter: &str, format: LogFormat) {
    let subscriber = tracing_subscriber::registry().with(env_filter(fallback_filter));

    match format {
        LogFormat::Pretty => subscriber
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_file(true)
                    .with_line_number(true),
            )
            .init(),
        LogFormat::Json => subscriber
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_writer(std::io::stderr),
            )
            .init(),
    }

    tracing::debug!(?format, "tracing subscriber installed");
}
