//! Cryptographic Utilities

use sha2::{Digest, Sha256};

/// Compute SHA-256 hash
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Lowercase hex of the first `len` bytes of the SHA-256 digest.
///
/// Used for short, non-reversible identifiers (e.g. User-Agent buckets).
pub fn sha256_hex_prefix(data: &[u8], len: usize) -> String {
    sha256(data)
        .iter()
        .take(len)
        .map(|b| format!("{:02x}", b))
        .collect()
}
