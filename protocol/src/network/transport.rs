//! Peer chain transport.
//!
//! Conflict resolution needs exactly one thing from the network: a peer's
//! full chain. [`PeerClient`] is that seam. The engine only depends on the
//! trait, so tests plug in an in-memory client and the node plugs in
//! [`HttpPeerClient`].
//!
//! ## Wire contract
//!
//! ```text
//! GET http://{host}/chain
//! 200 OK
//! { "chain": [Block, ...], "length": <integer> }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{CHAIN_PATH, PEER_REQUEST_TIMEOUT};
use crate::storage::block::Block;

// ---------------------------------------------------------------------------
// ChainResponse
// ---------------------------------------------------------------------------

/// Body of a peer's `GET /chain` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainResponse {
    /// Every block the peer holds, genesis first.
    pub chain: Vec<Block>,
    /// Length the peer reports for its chain.
    pub length: u64,
}

impl ChainResponse {
    /// Builds a response whose `length` matches `chain`.
    pub fn new(chain: Vec<Block>) -> Self {
        let length = chain.len() as u64;
        Self { chain, length }
    }
}

// ---------------------------------------------------------------------------
// TransportError
// ---------------------------------------------------------------------------

/// Why a chain fetch failed. Conflict resolution treats every variant the
/// same way (skip the peer); the distinction exists for logs.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection refused, DNS failure, reset, etc.
    #[error("request to {host} failed: {reason}")]
    Request { host: String, reason: String },

    /// The peer answered with a non-success status.
    #[error("peer {host} answered with status {status}")]
    Status { host: String, status: u16 },

    /// The body was not a valid [`ChainResponse`].
    #[error("peer {host} sent an undecodable chain: {reason}")]
    Decode { host: String, reason: String },

    /// No answer within the per-peer timeout.
    #[error("peer {host} did not answer within {timeout_ms}ms")]
    Timeout { host: String, timeout_ms: u64 },
}

// ---------------------------------------------------------------------------
// PeerClient
// ---------------------------------------------------------------------------

/// Fetches a peer's chain snapshot.
#[async_trait]
pub trait PeerClient: Send + Sync {
    /// Fetch the full chain of the peer at canonical `host[:port]`.
    async fn fetch_chain(&self, host: &str) -> Result<ChainResponse, TransportError>;
}

// ---------------------------------------------------------------------------
// HttpPeerClient
// ---------------------------------------------------------------------------

/// [`PeerClient`] over plain HTTP using `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpPeerClient {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpPeerClient {
    /// Client with the default per-request timeout.
    pub fn new() -> Self {
        Self::with_timeout(PEER_REQUEST_TIMEOUT)
    }

    /// Client whose requests give up after `timeout`.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            timeout,
        }
    }

    /// URL the chain of `host` is served on.
    pub fn chain_url(host: &str) -> String {
        format!("http://{}{}", host, CHAIN_PATH)
    }
}

impl Default for HttpPeerClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PeerClient for HttpPeerClient {
    async fn fetch_chain(&self, host: &str) -> Result<ChainResponse, TransportError> {
        let url = Self::chain_url(host);
        tracing::debug!(%url, "fetching peer chain");

        let response = self
            .client
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TransportError::Timeout {
                        host: host.to_string(),
                        timeout_ms: self.timeout.as_millis() as u64,
                    }
                } else {
                    TransportError::Request {
                        host: host.to_string(),
                        reason: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                host: host.to_string(),
                status: status.as_u16(),
            });
        }

        response
            .json::<ChainResponse>()
            .await
            .map_err(|e| TransportError::Decode {
                host: host.to_string(),
                reason: e.to_string(),
            })
    }
}
