//! # Cryptographic Primitives
//!
//! SHA-256 is the only primitive the ledger needs: it links blocks together
//! and drives the proof-of-work puzzle. Everything here is a thin wrapper
//! around the audited `sha2` implementation.

pub mod hash;

pub use hash::{is_hex_digest, sha256, sha256_hex};
