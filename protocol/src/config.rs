//! # Protocol Configuration & Constants
//!
//! Every magic number of the ledger lives here. Peers that disagree on any
//! of the genesis or difficulty values below will reject each other's
//! chains, so treat them as part of the wire contract.

use std::time::Duration;

use crate::consensus::pow::Difficulty;

// ---------------------------------------------------------------------------
// Protocol Version
// ---------------------------------------------------------------------------

/// Semantic version of the ledger protocol.
pub const PROTOCOL_VERSION: &str = "0.1.0";

/// Domain tag prefixed to every canonical block encoding. Bump the suffix
/// whenever the encoding in [`crate::storage::block`] changes.
pub const BLOCK_ENCODING_TAG: &[u8] = b"ledger-block-v1";

// ---------------------------------------------------------------------------
// Genesis
// ---------------------------------------------------------------------------

/// Index of the genesis block. Indices are 1-based.
pub const GENESIS_INDEX: u64 = 1;

/// Proof carried by the genesis block.
pub const GENESIS_PROOF: u64 = 100;

/// Sentinel `previousHash` of the genesis block. Not a digest.
pub const GENESIS_PREVIOUS_HASH: &str = "1";

// ---------------------------------------------------------------------------
// Proof of Work
// ---------------------------------------------------------------------------

/// Hex suffix a proof digest must end with. Four zero nibbles means roughly
/// one valid guess in 65 536.
pub const DEFAULT_DIFFICULTY_SUFFIX: &str = "0000";

/// Upper bound on the difficulty suffix length (a SHA-256 hex digest).
pub const MAX_DIFFICULTY_LEN: usize = 64;

/// Number of candidates tried between cancellation/deadline checks in a
/// [`crate::consensus::pow::ProofSearch`].
pub const POW_CHECK_INTERVAL: u64 = 4_096;

// ---------------------------------------------------------------------------
// Mining Reward
// ---------------------------------------------------------------------------

/// Sender recorded on the reward transaction of a mined block. Signals that
/// the coins are newly minted.
pub const MINING_REWARD_SENDER: &str = "0";

/// Amount credited to the miner for each forged block.
pub const MINING_REWARD_AMOUNT: u64 = 1;

// ---------------------------------------------------------------------------
// Networking
// ---------------------------------------------------------------------------

/// Default HTTP port of a ledger node.
pub const DEFAULT_HTTP_PORT: u16 = 3001;

/// Default port of the Prometheus metrics endpoint.
pub const DEFAULT_METRICS_PORT: u16 = 9742;

/// Path a peer serves its full chain on.
pub const CHAIN_PATH: &str = "/chain";

/// How long a single peer chain fetch may take during conflict resolution
/// before that peer is skipped.
pub const PEER_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

// ---------------------------------------------------------------------------
// LedgerConfig
// ---------------------------------------------------------------------------

/// Runtime knobs of a [`crate::ledger::Ledger`] instance.
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// Difficulty every proof is checked against, locally and on peer chains.
    pub difficulty: Difficulty,

    /// Per-peer timeout applied to chain fetches during conflict resolution.
    pub peer_timeout: Duration,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::default(),
            peer_timeout: PEER_REQUEST_TIMEOUT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_genesis_constants() {
        assert_eq!(GENESIS_INDEX, 1);
        assert_eq!(GENESIS_PROOF, 100);
        assert_eq!(GENESIS_PREVIOUS_HASH, "1");
    }

    #[test]
    fn test_default_difficulty_is_four_zero_nibbles() {
        assert_eq!(DEFAULT_DIFFICULTY_SUFFIX, "0000");
        assert!(DEFAULT_DIFFICULTY_SUFFIX.len() <= MAX_DIFFICULTY_LEN);
    }

    #[test]
    fn test_default_ledger_config() {
        let config = LedgerConfig::default();
        assert_eq!(config.difficulty.suffix(), DEFAULT_DIFFICULTY_SUFFIX);
        assert_eq!(config.peer_timeout, PEER_REQUEST_TIMEOUT);
    }

    #[test]
    fn test_chain_path_is_absolute() {
        assert!(CHAIN_PATH.starts_with('/'));
    }
}
