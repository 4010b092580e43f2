//! # Prometheus Metrics
//!
//! Exposes operational metrics for the ledger node. Scraped by Prometheus
//! at the `/metrics` HTTP endpoint on the configured metrics port.
//!
//! All metrics are registered in a dedicated [`prometheus::Registry`] so they
//! do not collide with any default global registry consumers.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use prometheus::core::Collector;
use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, IntGauge, Registry, TextEncoder};
use std::sync::Arc;

/// Holds all Prometheus metric handles for the node.
///
/// Clone-friendly (prometheus handles are `Arc`s internally) so it can be
/// shared across request handlers.
#[derive(Clone)]
pub struct NodeMetrics {
    /// Prometheus registry that owns all metrics below.
    registry: Registry,
    /// Blocks forged by this node through `/mine`.
    pub blocks_mined_total: IntCounter,
    /// Transactions accepted into the pending pool.
    pub transactions_staged_total: IntCounter,
    /// Current number of transactions waiting for the next block.
    pub pending_transactions: IntGauge,
    /// Number of blocks in the local chain, genesis included.
    pub chain_length: IntGauge,
    /// Number of registered peers.
    pub registered_nodes: IntGauge,
    /// Conflict resolution rounds that replaced the local chain.
    pub chain_replacements_total: IntCounter,
    /// Conflict resolution rounds run.
    pub resolutions_total: IntCounter,
    /// Time spent searching for a proof, in seconds.
    pub mining_duration_seconds: Histogram,
}

impl NodeMetrics {
    /// Creates and registers all metrics. Call once at startup.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new_custom(Some("ledger".into()), None)?;

        let blocks_mined_total = register(
            &registry,
            IntCounter::new("blocks_mined_total", "Total number of blocks forged by this node")?,
        )?;
        let transactions_staged_total = register(
            &registry,
            IntCounter::new(
                "transactions_staged_total",
                "Total number of transactions accepted into the pending pool",
            )?,
        )?;
        let pending_transactions = register(
            &registry,
            IntGauge::new(
                "pending_transactions",
                "Current number of transactions waiting for the next block",
            )?,
        )?;
        let chain_length = register(
            &registry,
            IntGauge::new("chain_length", "Number of blocks in the local chain")?,
        )?;
        let registered_nodes = register(
            &registry,
            IntGauge::new("registered_nodes", "Number of registered peers")?,
        )?;
        let chain_replacements_total = register(
            &registry,
            IntCounter::new(
                "chain_replacements_total",
                "Conflict resolutions that replaced the local chain",
            )?,
        )?;
        let resolutions_total = register(
            &registry,
            IntCounter::new("resolutions_total", "Conflict resolution rounds run")?,
        )?;
        let mining_duration_seconds = register(
            &registry,
            Histogram::with_opts(
                HistogramOpts::new(
                    "mining_duration_seconds",
                    "Wall-clock time of a /mine request's proof search",
                )
                .buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
            )?,
        )?;

        Ok(Self {
            registry,
            blocks_mined_total,
            transactions_staged_total,
            pending_transactions,
            chain_length,
            registered_nodes,
            chain_replacements_total,
            resolutions_total,
            mining_duration_seconds,
        })
    }

    /// Encodes all registered metrics into the Prometheus text exposition format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

fn register<C>(registry: &Registry, collector: C) -> Result<C, prometheus::Error>
where
    C: Collector + Clone + 'static,
{
    registry.register(Box::new(collector.clone()))?;
    Ok(collector)
}

/// Shared metrics state passed to axum handlers.
pub type SharedMetrics = Arc<NodeMetrics>;

/// Axum handler that renders `/metrics` in Prometheus text format.
///
/// Returns HTTP 500 if encoding fails.
pub async fn metrics_handler(
    axum::extract::State(metrics): axum::extract::State<SharedMetrics>,
) -> impl IntoResponse {
    match metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("failed to encode metrics: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "metrics encoding failed").into_response()
        }
    }
}
