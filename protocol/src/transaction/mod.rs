//! # Transaction Module
//!
//! A transaction is a plain `sender → recipient : amount` record staged in
//! the pool and committed in the next forged block. There is no signing and
//! no balance check at this layer; the ledger only orders and links them.

pub mod types;

pub use types::Transaction;
