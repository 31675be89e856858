//! SHA-256 digests of token plaintexts.

use sha2::{Digest, Sha256};

/// Length in bytes of a token hash.
pub const HASH_LEN: usize = 32;

/// Hashes a token plaintext into the form that gets persisted.
///
/// # Examples
///
/// ```rust
/// use latch_auth::sha256::token_hash;
///
/// let hash = token_hash("JBSWY3DPEHPK3PXPJBSWY3DPEH");
/// assert_eq!(hash, token_hash("JBSWY3DPEHPK3PXPJBSWY3DPEH"));
/// assert_ne!(hash, token_hash("JBSWY3DPEHPK3PXPJBSWY3DPEA"));
/// ```
pub fn token_hash(plain_text: &str) -> [u8; HASH_LEN] {
    let mut hasher = Sha256::new();
    hasher.update(plain_text.as_bytes());
    hasher.finalize().into()
}
