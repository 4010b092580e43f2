//! Whole-chain validity check.
//!
//! Used on every peer chain during conflict resolution. A chain is valid when
//! each block links to the digest of its predecessor and carries a proof that
//! solves the puzzle for the predecessor's proof. The first block is taken as
//! given: peers each stamp their own genesis.

use crate::consensus::pow::Difficulty;
use crate::storage::block::{hash_block, Block};

/// Checks linkage and proof-of-work at the default difficulty.
///
/// Empty and single-block sequences are valid by definition.
pub fn is_valid_chain(chain: &[Block]) -> bool {
    is_valid_chain_with(chain, &Difficulty::default())
}

/// [`is_valid_chain`] against an explicit difficulty.
pub fn is_valid_chain_with(chain: &[Block], difficulty: &Difficulty) -> bool {
    chain.windows(2).all(|pair| {
        let (prev, curr) = (&pair[0], &pair[1]);
        if curr.previous_hash != hash_block(prev) {
            tracing::debug!(index = curr.index, "previous hash mismatch");
            return false;
        }
        if !difficulty.accepts(prev.proof, curr.proof) {
            tracing::debug!(index = curr.index, proof = curr.proof, "invalid proof");
            return false;
        }
        true
    })
}
