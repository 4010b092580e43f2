//! # Hashing Utilities
//!
//! The ledger uses exactly one digest: SHA-256. Block linkage and the
//! proof-of-work puzzle both depend on it, and both are compared as lowercase
//! hex strings on the wire, so the hex helpers live here too.

use sha2::{Digest, Sha256};

/// Compute the SHA-256 hash of the input data as a fixed-size array.
///
/// # Example
///
/// ```
/// use ledger_protocol::crypto::sha256;
///
/// let hash = sha256(b"ledger");
/// assert_eq!(hash.len(), 32);
/// ```
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}

/// Compute SHA-256 and render it as 64 lowercase hex characters.
///
/// This is the string form used for `previousHash` and for the
/// proof-of-work suffix check.
///
/// ```
/// use ledger_protocol::crypto::sha256_hex;
///
/// let digest = sha256_hex(b"");
/// assert_eq!(
///     digest,
///     "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
/// );
/// ```
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(sha256(data))
}

/// Returns `true` if `s` is exactly 64 lowercase hex characters, i.e. the
/// shape of a digest produced by [`sha256_hex`].
pub fn is_hex_digest(s: &str) -> bool {
    s.len() == 64 && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}
