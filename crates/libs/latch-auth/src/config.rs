//! Secret and token configuration.
//!
//! Secrets are wrapped in [`CipherKey`] and [`SignerSecret`], validated once at
//! startup and then handed to each component. Neither type ever prints its
//! contents.
//!
//! ```toml
//! cipher_key = "0123456789abcdef0123456789abcdef"
//! signer_secret = "a long random signing secret"
//!
//! [tokens]
//! ttl_hours = 24
//! store_timeout_ms = 3000
//! ```

use std::{fmt, path::Path, time::Duration};

use chrono::{TimeDelta, Utc};
use serde::Deserialize;

use crate::prelude::*;

pub const CIPHER_KEY_ENV: &str = "LATCH_CIPHER_KEY";
pub const SIGNER_SECRET_ENV: &str = "LATCH_SIGNER_SECRET";
pub const TOKEN_TTL_HOURS_ENV: &str = "LATCH_TOKEN_TTL_HOURS";
pub const STORE_TIMEOUT_MS_ENV: &str = "LATCH_STORE_TIMEOUT_MS";

/// AES key: 16, 24 or 32 raw bytes.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct CipherKey(Vec<u8>);

impl CipherKey {
    /// Supported key lengths in bytes, for AES-128, AES-192 and AES-256.
    pub const VALID_LENGTHS: [usize; 3] = [16, 24, 32];

    pub fn new(bytes: impl Into<Vec<u8>>) -> Result<Self> {
        let bytes = bytes.into();
        if !Self::VALID_LENGTHS.contains(&bytes.len()) {
            return Err(Error::InvalidKeyLength(bytes.len()));
        }
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl TryFrom<String> for CipherKey {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value.into_bytes())
    }
}

impl fmt::Debug for CipherKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CipherKey(REDACTED)")
    }
}

/// HMAC secret of arbitrary, non-zero length.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct SignerSecret(Vec<u8>);

impl SignerSecret {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Result<Self> {
        let bytes = bytes.into();
        if bytes.is_empty() {
            return Err(Error::Config("signer_secret"));
        }
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl TryFrom<String> for SignerSecret {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value.into_bytes())
    }
}

impl fmt::Debug for SignerSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SignerSecret(REDACTED)")
    }
}

/// Session token lifetime and store limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TokenSettings {
    /// Lifetime of an issued token.
    pub ttl_hours: i64,
    /// Upper bound for a single store operation.
    pub store_timeout_ms: u64,
}

impl TokenSettings {
    pub const DEFAULT_TTL_HOURS: i64 = 24;
    pub const DEFAULT_STORE_TIMEOUT_MS: u64 = 3000;

    /// Lifetime of an issued token.
    ///
    /// # Returns
    ///
    /// * `Ok(TimeDelta)` - A positive lifetime whose expiry fits a timestamp
    /// * `Err(Error::Config)` - `ttl_hours` is zero, negative or too large
    pub fn ttl(&self) -> Result<TimeDelta> {
        TimeDelta::try_hours(self.ttl_hours)
            .filter(|ttl| *ttl > TimeDelta::zero())
            .filter(|ttl| Utc::now().checked_add_signed(*ttl).is_some())
            .ok_or(Error::Config("tokens.ttl_hours"))
    }

    /// Checks that every setting is usable.
    pub fn validate(&self) -> Result<()> {
        self.ttl().map(|_| ())
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }
}

impl Default for TokenSettings {
    fn default() -> Self {
        Self {
            ttl_hours: Self::DEFAULT_TTL_HOURS,
            store_timeout_ms: Self::DEFAULT_STORE_TIMEOUT_MS,
        }
    }
}

/// Process-wide configuration, built once at startup.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LatchConfig {
    pub cipher_key: CipherKey,
    pub signer_secret: SignerSecret,
    #[serde(default)]
    pub tokens: TokenSettings,
}

impl LatchConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(file_path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(file_path)?;
        Self::from_toml(&contents)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(value: &str) -> Result<Self> {
        let config: Self = toml::from_str(value)?;
        config.tokens.validate()?;
        Ok(config)
    }

    /// Build configuration from `LATCH_*` environment variables.
    ///
    /// The two secrets are required; token settings fall back to defaults.
    pub fn from_env() -> Result<Self> {
        let cipher_key = std::env::var(CIPHER_KEY_ENV).map_err(|_| Error::Config(CIPHER_KEY_ENV))?;
        let signer_secret =
            std::env::var(SIGNER_SECRET_ENV).map_err(|_| Error::Config(SIGNER_SECRET_ENV))?;

        let mut tokens = TokenSettings::default();
        if let Some(ttl_hours) = parse_env(TOKEN_TTL_HOURS_ENV)? {
            tokens.ttl_hours = ttl_hours;
        }
        if let Some(store_timeout_ms) = parse_env(STORE_TIMEOUT_MS_ENV)? {
            tokens.store_timeout_ms = store_timeout_ms;
        }
        tokens.validate()?;

        Ok(Self {
            cipher_key: CipherKey::new(cipher_key.into_bytes())?,
            signer_secret: SignerSecret::new(signer_secret.into_bytes())?,
            tokens,
        })
    }
}

impl fmt::Display for LatchConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "REDACTED")
    }
}

fn parse_env<T: std::str::FromStr>(var: &'static str) -> Result<Option<T>> {
    match std::env::var(var) {
        Ok(value) => value.parse().map(Some).map_err(|_| Error::Config(var)),
        Err(_) => Ok(None),
    }
}
