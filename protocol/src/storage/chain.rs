//! In-memory block store.
//!
//! The chain is never empty: it is born with a genesis block and can only
//! grow by [`Chain::forge`] or be swapped wholesale by [`Chain::replace`]
//! with another non-empty sequence.

use super::block::{hash_block, Block};
use crate::transaction::Transaction;

/// Ordered, non-empty sequence of committed blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chain {
    blocks: Vec<Block>,
}

impl Chain {
    /// Starts a chain with a genesis block stamped at `genesis_timestamp`.
    pub fn new(genesis_timestamp: u64) -> Self {
        Self {
            blocks: vec![Block::genesis(genesis_timestamp)],
        }
    }

    /// Wraps an existing block sequence. Returns `None` for an empty one,
    /// since a chain without a tip is not representable.
    pub fn from_blocks(blocks: Vec<Block>) -> Option<Self> {
        if blocks.is_empty() {
            None
        } else {
            Some(Self { blocks })
        }
    }

    /// Builds the next block from `transactions` and appends it.
    ///
    /// The index is `len + 1`. When `previous_hash` is `None` it defaults to
    /// the digest of the current tip. Returns a copy of the appended block.
    pub fn forge(
        &mut self,
        proof: u64,
        previous_hash: Option<String>,
        transactions: Vec<Transaction>,
        timestamp: u64,
    ) -> Block {
        let previous_hash = previous_hash.unwrap_or_else(|| hash_block(self.tip()));
        let block = Block {
            index: self.blocks.len() as u64 + 1,
            timestamp,
            transactions,
            proof,
            previous_hash,
        };
        self.blocks.push(block.clone());
        block
    }

    /// Replaces every block with `other`'s. Used by conflict resolution only.
    pub fn replace(&mut self, other: Chain) {
        self.blocks = other.blocks;
    }

    /// Returns the latest block.
    pub fn tip(&self) -> &Block {
        // Non-empty by construction.
        &self.blocks[self.blocks.len() - 1]
    }

    /// Returns the number of blocks, genesis included.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Always `false`; present for API symmetry with slices.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Borrow the blocks in order.
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Index the next forged block will receive.
    pub fn next_index(&self) -> u64 {
        self.tip().index + 1
    }
}
