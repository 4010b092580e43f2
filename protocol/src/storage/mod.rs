//! # Storage Module
//!
//! In-memory block storage. There is no persistence: a restarted node starts
//! from a fresh genesis and catches up through conflict resolution.
//!
//! ```text
//! block.rs  — Block structure, genesis, canonical encoding and hash
//! chain.rs  — Non-empty ordered block store
//! ```

pub mod block;
pub mod chain;

pub use block::{hash_block, now_millis, Block};
pub use chain::Chain;
