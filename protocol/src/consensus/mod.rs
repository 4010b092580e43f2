//! # Consensus Module
//!
//! Nakamoto-style agreement in its smallest form: blocks carry a
//! proof-of-work, a chain is valid when every link and every proof checks
//! out, and between valid chains the longest wins.
//!
//! ```text
//! pow.rs       — Difficulty, proof check, plain and cancellable search
//! validator.rs — Whole-chain linkage + proof check
//! resolver.rs  — Concurrent peer fan-out and longest-chain selection
//! ```
//!
//! Fork choice is length only. There is no cumulative-work comparison and
//! no difficulty retargeting.

pub mod pow;
pub mod resolver;
pub mod validator;

pub use pow::{
    is_valid_proof, mine_off_thread, proof_of_work, proof_of_work_with, Difficulty,
    DifficultyError, MiningError, MiningOptions, ProofSearch,
};
pub use resolver::{find_longest_chain, Candidate};
pub use validator::{is_valid_chain, is_valid_chain_with};
