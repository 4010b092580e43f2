//! # Block Structure
//!
//! A block is the unit of commitment: an ordered batch of transactions, the
//! proof that was mined for it, and the digest of its predecessor.
//!
//! ## Wire Layout
//!
//! ```text
//! {
//!   "index":        u64   (1-based, genesis = 1)
//!   "timestamp":    u64   (milliseconds since the Unix epoch)
//!   "transactions": [{ "sender", "recipient", "amount" }]
//!   "proof":        u64
//!   "previousHash": hex digest of the previous block, "1" for genesis
//! }
//! ```
//!
//! ## Canonical Encoding
//!
//! Block digests are NOT taken over JSON. Two nodes must agree on a block's
//! hash byte for byte, so the hash covers a fixed binary encoding:
//!
//! ```text
//! "ledger-block-v1"                       domain tag
//! u64_be(index)
//! u64_be(timestamp)
//! u32_be(tx_count)
//! tx_count × { str(sender) str(recipient) u64_be(amount) }
//! u64_be(proof)
//! str(previous_hash)
//!
//! str(s) = u32_be(byte_len(s)) || utf8(s)
//! ```
//!
//! The digest is SHA-256 over those bytes, rendered as lowercase hex.

use serde::{Deserialize, Serialize};

use crate::config::{BLOCK_ENCODING_TAG, GENESIS_INDEX, GENESIS_PREVIOUS_HASH, GENESIS_PROOF};
use crate::crypto::hash::sha256_hex;
use crate::transaction::Transaction;

// ---------------------------------------------------------------------------
// Block
// ---------------------------------------------------------------------------

/// A committed (or candidate) ledger block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    /// Position in the chain, starting at 1.
    pub index: u64,
    /// Unix timestamp (milliseconds) when this block was forged.
    pub timestamp: u64,
    /// Ordered transactions included in this block. Duplicates are allowed.
    pub transactions: Vec<Transaction>,
    /// Proof-of-work nonce, valid against the previous block's proof.
    pub proof: u64,
    /// Hex digest of the previous block, or `"1"` for genesis.
    pub previous_hash: String,
}

impl Block {
    /// Construct the genesis block stamped with `timestamp`.
    ///
    /// Index 1, proof 100, previous hash `"1"` and no transactions.
    pub fn genesis(timestamp: u64) -> Self {
        Block {
            index: GENESIS_INDEX,
            timestamp,
            transactions: Vec::new(),
            proof: GENESIS_PROOF,
            previous_hash: GENESIS_PREVIOUS_HASH.to_string(),
        }
    }

    /// Returns `true` if this block has the genesis shape (index, proof and
    /// sentinel previous hash). The timestamp is node-local and not checked.
    pub fn is_genesis(&self) -> bool {
        self.index == GENESIS_INDEX
            && self.proof == GENESIS_PROOF
            && self.previous_hash == GENESIS_PREVIOUS_HASH
            && self.transactions.is_empty()
    }

    /// The canonical byte encoding hashed by [`hash_block`].
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(64 + self.transactions.len() * 48);
        out.extend_from_slice(BLOCK_ENCODING_TAG);
        out.extend_from_slice(&self.index.to_be_bytes());
        out.extend_from_slice(&self.timestamp.to_be_bytes());
        out.extend_from_slice(&(self.transactions.len() as u32).to_be_bytes());
        for tx in &self.transactions {
            put_str(&mut out, &tx.sender);
            put_str(&mut out, &tx.recipient);
            out.extend_from_slice(&tx.amount.to_be_bytes());
        }
        out.extend_from_slice(&self.proof.to_be_bytes());
        put_str(&mut out, &self.previous_hash);
        out
    }

    /// Hex digest of this block. Shorthand for [`hash_block`].
    pub fn hash_hex(&self) -> String {
        hash_block(self)
    }

    /// Return the number of transactions in this block.
    pub fn tx_count(&self) -> usize {
        self.transactions.len()
    }
}

// ---------------------------------------------------------------------------
// Hash Computation
// ---------------------------------------------------------------------------

/// SHA-256 of the block's canonical encoding, as 64 lowercase hex chars.
pub fn hash_block(block: &Block) -> String {
    sha256_hex(&block.canonical_bytes())
}

/// Current wall-clock time in milliseconds since the Unix epoch.
pub fn now_millis() -> u64 {
    chrono::Utc::now().timestamp_millis().max(0) as u64
}

fn put_str(out: &mut Vec<u8>, s: &str) {
    out.extend_from_slice(&(s.len() as u32).to_be_bytes());
    out.extend_from_slice(s.as_bytes());
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::hash::is_hex_digest;

    fn sample_block() -> Block {
        Block {
            index: 2,
            timestamp: 1_700_000_000_000,
            transactions: vec![
                Transaction::new("alice", "bob", 5),
                Transaction::new("bob", "carol", 2),
            ],
            proof: 35_293,
            previous_hash: "ab".repeat(32),
        }
    }

    #[test]
    fn genesis_block_properties() {
        let genesis = Block::genesis(1_000);
        assert_eq!(genesis.index, 1);
        assert_eq!(genesis.proof, 100);
        assert_eq!(genesis.previous_hash, "1");
        assert_eq!(genesis.timestamp, 1_000);
        assert!(genesis.transactions.is_empty());
        assert!(genesis.is_genesis());
    }

    #[test]
    fn hash_is_deterministic() {
        let block = sample_block();
        assert_eq!(hash_block(&block), hash_block(&block));
        assert_eq!(hash_block(&block), hash_block(&block.clone()));
        assert!(is_hex_digest(&hash_block(&block)));
    }

    #[test]
    fn hash_covers_every_field() {
        let base = sample_block();
        let base_hash = hash_block(&base);

        let mut b = base.clone();
        b.index += 1;
        assert_ne!(hash_block(&b), base_hash);

        let mut b = base.clone();
        b.timestamp += 1;
        assert_ne!(hash_block(&b), base_hash);

        let mut b = base.clone();
        b.proof += 1;
        assert_ne!(hash_block(&b), base_hash);

        let mut b = base.clone();
        b.previous_hash = "cd".repeat(32);
        assert_ne!(hash_block(&b), base_hash);

        let mut b = base.clone();
        b.transactions[0].amount += 1;
        assert_ne!(hash_block(&b), base_hash);
    }

    #[test]
    fn hash_is_order_sensitive_over_transactions() {
        let block = sample_block();
        let mut swapped = block.clone();
        swapped.transactions.reverse();
        assert_ne!(hash_block(&block), hash_block(&swapped));
    }

    #[test]
    fn string_fields_are_length_prefixed() {
        // Without length prefixes these two would encode identically.
        let mut a = sample_block();
        a.transactions = vec![Transaction::new("ab", "c", 1)];
        let mut b = sample_block();
        b.transactions = vec![Transaction::new("a", "bc", 1)];
        assert_ne!(a.canonical_bytes(), b.canonical_bytes());
    }

    #[test]
    fn canonical_bytes_layout_of_genesis() {
        let genesis = Block::genesis(7);
        let bytes = genesis.canonical_bytes();

        let mut expected = Vec::new();
        expected.extend_from_slice(b"ledger-block-v1");
        expected.extend_from_slice(&1u64.to_be_bytes());
        expected.extend_from_slice(&7u64.to_be_bytes());
        expected.extend_from_slice(&0u32.to_be_bytes());
        expected.extend_from_slice(&100u64.to_be_bytes());
        expected.extend_from_slice(&1u32.to_be_bytes());
        expected.extend_from_slice(b"1");
        assert_eq!(bytes, expected);
    }

    #[test]
    fn wire_format_uses_previous_hash_camel_case() {
        let genesis = Block::genesis(0);
        let json = serde_json::to_value(&genesis).unwrap();
        assert_eq!(json["previousHash"], "1");
        assert_eq!(json["index"], 1);
        assert_eq!(json["proof"], 100);
        assert_eq!(json["transactions"], serde_json::json!([]));
    }

    #[test]
    fn block_serialization_roundtrip() {
        let block = sample_block();
        let json = serde_json::to_string(&block).expect("serialize");
        let recovered: Block = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(block, recovered);
        assert_eq!(hash_block(&block), hash_block(&recovered));
    }
}
