//! Authentication error types.
//!
//! Every failure maps to one [`ErrorKind`]. Callers outside this crate should
//! branch on the kind, not on the variant: all authentication failures are
//! reported as [`ErrorKind::AuthFailure`] regardless of which check failed.

use crate::store::StoreError;

/// Authentication and cryptography errors.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The configured cipher key is not 16, 24 or 32 bytes long.
    #[error("Invalid cipher key length {0}, expected 16, 24 or 32 bytes")]
    InvalidKeyLength(usize),

    /// The ciphertext envelope is not valid base64 or is shorter than one IV.
    #[error("Malformed ciphertext")]
    MalformedCiphertext,

    /// The OS random source failed.
    #[error("Cryptographic random source unavailable")]
    CryptoUnavailable,

    /// Token unknown, expired, replaced or tampered with.
    #[error("Unauthenticated")]
    Unauthenticated,

    /// The token store did not answer within the configured timeout.
    #[error("Token store timed out")]
    StoreTimeout,

    /// The token store failed.
    #[error("Token store failure")]
    Store(#[source] StoreError),

    #[error("PasswordHash {0}")]
    PasswordHash(argon2::password_hash::Error),

    /// I/O operation failed.
    #[error(transparent)]
    IO(#[from] std::io::Error),

    /// TOML deserialization failed.
    #[error(transparent)]
    Deserialization(#[from] toml::de::Error),

    /// Missing or unparsable configuration value.
    #[error("Invalid configuration value for {0}")]
    Config(&'static str),
}

/// Closed classification of [`Error`] for boundary code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed input or configuration.
    Input,
    /// Random source or cipher construction failure. Never retried.
    CryptoUnavailable,
    /// Token not found, expired or signature invalid.
    AuthFailure,
    /// Store timeout or outage. Callers may retry or degrade.
    Infrastructure,
}

impl Error {
    /// Classifies this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidKeyLength(_)
            | Error::MalformedCiphertext
            | Error::PasswordHash(_)
            | Error::Deserialization(_)
            | Error::Config(_) => ErrorKind::Input,
            Error::CryptoUnavailable => ErrorKind::CryptoUnavailable,
            Error::Unauthenticated => ErrorKind::AuthFailure,
            Error::StoreTimeout | Error::Store(_) | Error::IO(_) => ErrorKind::Infrastructure,
        }
    }

    /// Check if this is an authentication failure.
    pub fn is_auth_failure(&self) -> bool {
        self.kind() == ErrorKind::AuthFailure
    }
}

impl From<StoreError> for Error {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}
