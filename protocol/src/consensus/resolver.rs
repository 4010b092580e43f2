//! Longest-valid-chain conflict resolution.
//!
//! Every registered peer is asked for its chain concurrently. Nothing is
//! aggregated while fetches are in flight: once all of them have finished,
//! a single pass picks the candidate. A peer's chain is a candidate when
//!
//! 1. its reported `length` is strictly greater than the best length seen so
//!    far (starting from the local length),
//! 2. the reported length matches the number of blocks it actually sent, and
//! 3. it passes [`is_valid_chain_with`].
//!
//! Failed, slow, malformed and invalid peers are skipped. Resolution itself
//! never fails.

use std::collections::BTreeSet;
use std::time::Duration;

use futures::future::join_all;

use crate::consensus::pow::Difficulty;
use crate::consensus::validator::is_valid_chain_with;
use crate::network::transport::{ChainResponse, PeerClient, TransportError};
use crate::storage::block::Block;

/// A peer chain that beat the local one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Canonical host that served the chain.
    pub host: String,
    /// The full chain.
    pub chain: Vec<Block>,
}

/// Queries `peers` through `client` and returns the longest valid chain that
/// is strictly longer than `local_len`, if any.
///
/// Peer order only matters for ties between peers: the first peer in the
/// set's order reporting the winning length is kept. The local chain always
/// wins ties against peers.
pub async fn find_longest_chain(
    client: &dyn PeerClient,
    peers: &BTreeSet<String>,
    local_len: usize,
    difficulty: &Difficulty,
    timeout: Duration,
) -> Option<Candidate> {
    let fetches = peers.iter().map(|host| async move {
        tracing::info!(node = %host, "checking peer chain");
        (host, fetch_with_timeout(client, host, timeout).await)
    });
    let responses = join_all(fetches).await;

    let mut best_len = local_len as u64;
    let mut best: Option<Candidate> = None;

    for (host, result) in responses {
        let response = match result {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(node = %host, error = %e, "skipping peer");
                continue;
            }
        };

        if response.length <= best_len {
            tracing::debug!(node = %host, length = response.length, best_len, "peer chain not longer");
            continue;
        }
        if response.length != response.chain.len() as u64 {
            tracing::warn!(
                node = %host,
                reported = response.length,
                actual = response.chain.len(),
                "peer misreported its chain length"
            );
            continue;
        }
        if !is_valid_chain_with(&response.chain, difficulty) {
            tracing::warn!(node = %host, length = response.length, "peer chain is invalid");
            continue;
        }

        tracing::info!(node = %host, length = response.length, "found longer chain");
        best_len = response.length;
        best = Some(Candidate {
            host: host.clone(),
            chain: response.chain,
        });
    }

    best
}

async fn fetch_with_timeout(
    client: &dyn PeerClient,
    host: &str,
    timeout: Duration,
) -> Result<ChainResponse, TransportError> {
    match tokio::time::timeout(timeout, client.fetch_chain(host)).await {
        Ok(result) => result,
        Err(_) => Err(TransportError::Timeout {
            host: host.to_string(),
            timeout_ms: timeout.as_millis() as u64,
        }),
    }
}
