// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Ledger Protocol — Core Library
//!
//! A small replicated ledger: an append-only chain of blocks, each sealed
//! with a hash-based proof of work, a pool of pending value transfers, and
//! a "longest valid chain wins" rule for agreeing with peers.
//!
//! ## Architecture
//!
//! - **config** — Protocol constants and the engine's tunables.
//! - **crypto** — SHA-256 helpers. Hex in, hex out.
//! - **transaction** — The transfer record carried by blocks.
//! - **storage** — Blocks, their canonical hash, and the in-memory chain.
//! - **consensus** — Proof of work, chain validation, conflict resolution.
//! - **network** — Pending pool, peer registry, peer chain transport.
//! - **ledger** — [`Ledger`], the engine tying all of the above together.
//!
//! Everything is in memory. A restarted node starts from a fresh genesis
//! block and catches up through conflict resolution.
//!
//! ```no_run
//! use ledger_protocol::{Ledger, LedgerConfig, Transaction};
//!
//! let ledger = Ledger::with_http_client(LedgerConfig::default());
//! let index = ledger.create_transaction(Transaction::new("alice", "bob", 5));
//! assert_eq!(index, 2);
//!
//! let proof = ledger.proof_of_work(ledger.last_block().proof);
//! let block = ledger.create_block(proof, None);
//! assert!(ledger.is_valid_chain(&ledger.chain()));
//! # let _ = block;
//! ```

pub mod config;
pub mod consensus;
pub mod crypto;
pub mod ledger;
pub mod network;
pub mod storage;
pub mod transaction;

pub use config::LedgerConfig;
pub use consensus::{Difficulty, MiningError, MiningOptions};
pub use ledger::Ledger;
pub use network::{ChainResponse, RegistryError};
pub use storage::{hash_block, Block};
pub use transaction::Transaction;
