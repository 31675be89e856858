//! Tamper-evident, time-limited URLs.
//!
//! A signed URL is the original URL with a trailing `hash=` parameter:
//!
//! ```text
//! https://example.com/reset?id=42&hash=1760000000000.Jf3k...
//!                                      ^timestamp    ^mac
//! ```
//!
//! The timestamp is the signing time in Unix milliseconds. The MAC is
//! HMAC-SHA256 over everything up to and including `hash=`, a `.`, and the
//! timestamp, encoded as unpadded URL-safe base64. The timestamp can be read
//! back without the secret, which is what [`UrlSigner::expired`] does.
//!
//! # Examples
//!
//! ```rust
//! use latch_auth::{config::SignerSecret, url_signer::UrlSigner};
//!
//! let signer = UrlSigner::new(&SignerSecret::new("s3cret").unwrap()).unwrap();
//! let link = signer.sign("https://example.com/reset?email=jane%40example.com");
//!
//! assert!(signer.verify(&link));
//! assert!(!signer.expired(&link, 60));
//! ```

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, TimeDelta, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::warn;

use crate::{config::SignerSecret, prelude::*};

/// Query parameter carrying the signature.
pub const SIGNATURE_PARAM: &str = "hash=";

const TIMESTAMP_SEPARATOR: char = '.';

type HmacSha256 = Hmac<Sha256>;

/// Signs and checks URLs with a shared secret.
#[derive(Clone)]
pub struct UrlSigner {
    mac: HmacSha256,
}

impl UrlSigner {
    pub fn new(secret: &SignerSecret) -> Result<Self> {
        let mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|_| Error::Config("signer_secret"))?;
        Ok(Self { mac })
    }

    /// Appends a `hash=` signature stamped with the current time.
    pub fn sign(&self, url: &str) -> String {
        self.sign_at(url, Utc::now())
    }

    /// Appends a `hash=` signature stamped with `at`.
    pub fn sign_at(&self, url: &str, at: DateTime<Utc>) -> String {
        let separator = if url.contains('?') { '&' } else { '?' };
        let payload = format!("{url}{separator}{SIGNATURE_PARAM}");
        let timestamp = at.timestamp_millis().to_string();
        let mac = self.compute(&payload, &timestamp);

        format!(
            "{payload}{timestamp}{TIMESTAMP_SEPARATOR}{}",
            URL_SAFE_NO_PAD.encode(mac)
        )
    }

    /// Checks the signature of `signed_url`.
    ///
    /// Malformed input, a different secret and tampering all return `false`.
    /// The reason is logged, never returned.
    pub fn verify(&self, signed_url: &str) -> bool {
        let Some(parts) = SignedParts::parse(signed_url) else {
            warn!("Signed URL rejected: missing or malformed signature");
            return false;
        };
        let Ok(expected) = URL_SAFE_NO_PAD.decode(parts.mac) else {
            warn!("Signed URL rejected: signature is not base64");
            return false;
        };

        let mut mac = self.mac.clone();
        mac.update(parts.payload.as_bytes());
        mac.update(&[TIMESTAMP_SEPARATOR as u8]);
        mac.update(parts.timestamp.as_bytes());
        if mac.verify_slice(&expected).is_err() {
            warn!("Signed URL rejected: signature mismatch");
            return false;
        }
        true
    }

    /// Reports whether `signed_url` is older than `max_age_minutes`.
    ///
    /// The MAC is not checked, call [`UrlSigner::verify`] first. A URL whose
    /// timestamp cannot be read counts as expired.
    pub fn expired(&self, signed_url: &str, max_age_minutes: i64) -> bool {
        expired_at(signed_url, max_age_minutes, Utc::now())
    }

    fn compute(&self, payload: &str, timestamp: &str) -> Vec<u8> {
        let mut mac = self.mac.clone();
        mac.update(payload.as_bytes());
        mac.update(&[TIMESTAMP_SEPARATOR as u8]);
        mac.update(timestamp.as_bytes());
        mac.finalize().into_bytes().to_vec()
    }
}

impl std::fmt::Debug for UrlSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "UrlSigner(REDACTED)")
    }
}

/// Reads the signing time embedded in `signed_url` without checking the MAC.
pub fn signed_at(signed_url: &str) -> Option<DateTime<Utc>> {
    let parts = SignedParts::parse(signed_url)?;
    DateTime::from_timestamp_millis(parts.timestamp.parse().ok()?)
}

/// [`UrlSigner::expired`] against an explicit clock reading.
///
/// A `max_age_minutes` too large for [`TimeDelta`] never expires; one too
/// small to represent always does.
pub fn expired_at(signed_url: &str, max_age_minutes: i64, now: DateTime<Utc>) -> bool {
    let Some(created) = signed_at(signed_url) else {
        return true;
    };
    match TimeDelta::try_minutes(max_age_minutes) {
        Some(max_age) => now.signed_duration_since(created) > max_age,
        None => max_age_minutes < 0,
    }
}

struct SignedParts<'a> {
    /// Everything up to and including `hash=`.
    payload: &'a str,
    timestamp: &'a str,
    mac: &'a str,
}

impl<'a> SignedParts<'a> {
    fn parse(signed_url: &'a str) -> Option<Self> {
        let start = signed_url.rfind(SIGNATURE_PARAM)? + SIGNATURE_PARAM.len();
        let (payload, signature) = signed_url.split_at(start);
        let (timestamp, mac) = signature.split_once(TIMESTAMP_SEPARATOR)?;
        if timestamp.is_empty() || !timestamp.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        Some(Self {
            payload,
            timestamp,
            mac,
        })
    }
}
