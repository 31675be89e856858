//! Password hashing and verification using Argon2.
//!
//! Passwords are never stored or compared in plaintext. The hash string
//! embeds its salt and parameters, so verification only needs the stored
//! string.
//!
//! # Examples
//!
//! ```rust
//! use latch_auth::secret_hash::{hash_password, verify_password};
//!
//! let hash = hash_password("correct horse battery staple").unwrap();
//! assert!(verify_password(&hash, "correct horse battery staple").unwrap());
//! assert!(!verify_password(&hash, "tr0ub4dor&3").unwrap());
//! ```

use std::sync::LazyLock;

use argon2::{
    Argon2, PasswordHasher, PasswordVerifier,
    password_hash::{self, PasswordHashString, SaltString},
};
use rand::rngs::OsRng;

use crate::prelude::*;

/// Hash of a password nobody holds, with the current Argon2 parameters.
static DECOY_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_password("latch decoy password").ok());

/// Hashes a password with a fresh random salt.
///
/// # Arguments
///
/// * `pw` - The plaintext password to hash
///
/// # Returns
///
/// * `Ok(String)` - PHC string embedding salt and parameters, ready for storage
/// * `Err(Error::PasswordHash)` - Argon2 rejected the input
pub fn hash_password(pw: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    Ok(argon2.hash_password(pw.as_bytes(), &salt)?.to_string())
}

/// Verifies a password against a stored hash.
///
/// # Arguments
///
/// * `hash` - The stored PHC string
/// * `pw` - The plaintext password to check
///
/// # Returns
///
/// * `Ok(true)` - Password matches the hash
/// * `Ok(false)` - Password does not match the hash
/// * `Err(Error::PasswordHash)` - `hash` is not a valid PHC string
pub fn verify_password(hash: &str, pw: &str) -> Result<bool> {
    let hash = PasswordHashString::new(hash)?;

    Ok(Argon2::default()
        .verify_password(pw.as_bytes(), &hash.password_hash())
        .is_ok())
}

/// Spends the cost of one verification without an account to check.
///
/// Call this when the account is unknown so that the miss takes as long as
/// a wrong password. Always returns `false`.
pub fn verify_decoy(pw: &str) -> bool {
    if let Some(hash) = DECOY_HASH.as_deref() {
        let _ = verify_password(hash, pw);
    }
    false
}

impl From<password_hash::Error> for Error {
    fn from(value: password_hash::Error) -> Self {
        Self::PasswordHash(value)
    }
}
