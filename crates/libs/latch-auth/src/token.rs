//! Opaque session tokens.
//!
//! A token is 16 random bytes rendered as unpadded base-32, so it fits in an
//! `Authorization` header or a URL without escaping. Only its SHA-256 hash is
//! persisted; the plaintext is returned once, at issuance.
//!
//! [`TokenManager`] keeps at most one live token per principal: issuing a new
//! token replaces every earlier one. Resolution collapses every miss (unknown,
//! tampered, expired, replaced) into [`Error::Unauthenticated`].
//!
//! ```text
//! issued -> valid (now < expiry) -> expired (now >= expiry)
//!                                -> replaced (issue() for same principal)
//! ```

use std::{fmt, future::Future, str::FromStr};

use chrono::{DateTime, TimeDelta, Utc};
use data_encoding::BASE32_NOPAD;
use rand::{RngCore, rngs::OsRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::{
    config::TokenSettings,
    prelude::*,
    sha256::{HASH_LEN, token_hash},
    store::{NewToken, Principal, StoreError, TokenStore},
};

/// Number of random bytes behind every token.
pub const TOKEN_ENTROPY_BYTES: usize = 16;

/// Purpose a token was issued for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenScope {
    /// Session token handed out at login.
    #[default]
    Authentication,
}

impl TokenScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenScope::Authentication => "authentication",
        }
    }
}

impl FromStr for TokenScope {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "authentication" => Ok(TokenScope::Authentication),
            _ => Err(Error::Config("token scope")),
        }
    }
}

impl fmt::Display for TokenScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A freshly generated token.
///
/// Serializes as `{"token": ..., "expiry": ...}`; the hash, owner and scope
/// stay server side.
#[derive(Clone, Serialize)]
pub struct Token {
    #[serde(rename = "token")]
    pub plain_text: String,
    #[serde(skip)]
    pub principal_id: i64,
    #[serde(skip)]
    pub hash: [u8; HASH_LEN],
    pub expiry: DateTime<Utc>,
    #[serde(skip)]
    pub scope: TokenScope,
}

impl Token {
    /// Draws a new token for `principal_id` valid for `ttl`.
    ///
    /// # Arguments
    ///
    /// * `principal_id` - Owner of the token
    /// * `ttl` - Lifetime, counted from now
    /// * `scope` - Purpose tag stored with the token
    ///
    /// # Returns
    ///
    /// * `Ok(Token)` - Fresh token; `plain_text` is never stored anywhere
    /// * `Err(Error::CryptoUnavailable)` - The OS random source failed
    /// * `Err(Error::Config)` - `now + ttl` does not fit a timestamp
    ///
    /// # Example
    ///
    /// ```rust
    /// use chrono::TimeDelta;
    /// use latch_auth::token::{Token, TokenScope};
    ///
    /// let token = Token::generate(7, TimeDelta::hours(24), TokenScope::Authentication).unwrap();
    /// assert_eq!(token.plain_text.len(), 26);
    /// ```
    pub fn generate(principal_id: i64, ttl: TimeDelta, scope: TokenScope) -> Result<Self> {
        let expiry = Utc::now()
            .checked_add_signed(ttl)
            .ok_or(Error::Config("token ttl"))?;

        let mut bytes = [0u8; TOKEN_ENTROPY_BYTES];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|_| Error::CryptoUnavailable)?;
        let plain_text = BASE32_NOPAD.encode(&bytes);
        let hash = token_hash(&plain_text);

        Ok(Self {
            plain_text,
            principal_id,
            hash,
            expiry,
            scope,
        })
    }

    /// Row to persist for this token, stamped with `now`.
    pub fn to_new_token(&self, now: DateTime<Utc>) -> NewToken {
        NewToken {
            principal_id: self.principal_id,
            token_hash: self.hash.to_vec(),
            scope: self.scope,
            expiry: self.expiry,
            created_at: now,
            updated_at: now,
        }
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("plain_text", &"REDACTED")
            .field("principal_id", &self.principal_id)
            .field("expiry", &self.expiry)
            .field("scope", &self.scope)
            .finish()
    }
}

/// Issues and resolves session tokens against a [`TokenStore`].
///
/// Holds no per-request state; every call goes to the store and is bounded
/// by [`TokenSettings::store_timeout`].
#[derive(Debug, Clone)]
pub struct TokenManager<S> {
    store: S,
    settings: TokenSettings,
    scope: TokenScope,
}

impl<S: TokenStore> TokenManager<S> {
    pub fn new(store: S, settings: TokenSettings) -> Self {
        Self {
            store,
            settings,
            scope: TokenScope::Authentication,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn settings(&self) -> &TokenSettings {
        &self.settings
    }

    /// Generates a token with the configured lifetime.
    ///
    /// Fails with [`Error::Config`] if the settings carry an unusable
    /// lifetime, which [`crate::config::LatchConfig`] rejects at load time.
    pub fn generate(&self, principal_id: i64) -> Result<Token> {
        Token::generate(principal_id, self.settings.ttl()?, self.scope)
    }

    /// Persists `token` as the only token of its principal.
    ///
    /// Earlier tokens of the principal stop resolving once this returns.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - The token is stored and every earlier one is gone
    /// * `Err(Error::StoreTimeout)` - The store did not answer in time
    /// * `Err(Error::Store)` - The store failed; nothing is retried
    pub async fn issue(&self, token: &Token) -> Result<()> {
        let row = token.to_new_token(Utc::now());
        self.bounded("replace", self.store.replace_tokens_for(row))
            .await?;
        info!(
            "Issued {} token for principal {}",
            token.scope, token.principal_id
        );
        Ok(())
    }

    /// Generates and issues a token, returning it for the caller to hand out.
    pub async fn login(&self, principal_id: i64) -> Result<Token> {
        let token = self.generate(principal_id)?;
        self.issue(&token).await?;
        Ok(token)
    }

    /// Resolves a presented token to its principal.
    ///
    /// # Returns
    ///
    /// * `Ok(Principal)` - The token is live
    /// * `Err(Error::Unauthenticated)` - Unknown, tampered, replaced or expired
    /// * `Err(Error::StoreTimeout | Error::Store)` - Infrastructure failure
    pub async fn resolve(&self, plain_text: &str) -> Result<Principal> {
        self.resolve_at(plain_text, Utc::now()).await
    }

    /// [`TokenManager::resolve`] against an explicit clock reading.
    ///
    /// Tokens are matched case-insensitively, as the base-32 alphabet is.
    pub async fn resolve_at(&self, plain_text: &str, now: DateTime<Utc>) -> Result<Principal> {
        let hash = token_hash(&plain_text.trim().to_ascii_uppercase());
        match self
            .bounded("lookup", self.store.find_principal_by_token_hash(&hash, now))
            .await?
        {
            Some(principal) => Ok(principal),
            None => {
                debug!("Presented token did not match a live token");
                Err(Error::Unauthenticated)
            }
        }
    }

    /// Deletes expired tokens. Optional, lookups already ignore them.
    pub async fn purge_expired(&self) -> Result<usize> {
        let purged = self
            .bounded("purge", self.store.purge_expired(Utc::now()))
            .await?;
        info!("Purged {purged} expired tokens");
        Ok(purged)
    }

    async fn bounded<T, F>(&self, operation: &'static str, fut: F) -> Result<T>
    where
        F: Future<Output = core::result::Result<T, StoreError>>,
    {
        match tokio::time::timeout(self.settings.store_timeout(), fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => {
                error!("Token store {operation} failed: {err}");
                Err(err.into())
            }
            Err(_) => {
                error!(
                    "Token store {operation} timed out after {:?}",
                    self.settings.store_timeout()
                );
                Err(Error::StoreTimeout)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::HashSet, sync::Arc, time::Duration};

    use async_trait::async_trait;

    use super::*;
    use crate::{
        error::ErrorKind,
        store::{MemoryTokenStore, StoreResult},
    };

    fn jane() -> Principal {
        Principal {
            id: 7,
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
            email: "jane@example.com".to_string(),
        }
    }

    async fn manager() -> TokenManager<Arc<MemoryTokenStore>> {
        let store = Arc::new(MemoryTokenStore::new());
        store.add_principal(jane()).await;
        TokenManager::new(store, TokenSettings::default())
    }

    #[test]
    fn generated_token_matches_its_hash() {
        let token = Token::generate(1, TimeDelta::hours(1), TokenScope::Authentication).unwrap();
        assert_eq!(token_hash(&token.plain_text), token.hash);
        assert_eq!(token.plain_text.len(), 26);
        assert!(
            token
                .plain_text
                .chars()
                .all(|c| c.is_ascii_uppercase() || ('2'..='7').contains(&c))
        );
        assert!(token.expiry > Utc::now());
    }

    #[test]
    fn generated_tokens_are_unique() {
        let tokens: HashSet<String> = (0..100)
            .map(|_| {
                Token::generate(1, TimeDelta::hours(1), TokenScope::Authentication)
                    .unwrap()
                    .plain_text
            })
            .collect();
        assert_eq!(tokens.len(), 100);
    }

    #[test]
    fn serializes_only_public_fields() {
        let token = Token::generate(1, TimeDelta::hours(1), TokenScope::Authentication).unwrap();
        let json = serde_json::to_value(&token).unwrap();
        let object = json.as_object().unwrap();
        assert_eq!(object.len(), 2);
        assert_eq!(object["token"], token.plain_text.as_str());
        assert!(object.contains_key("expiry"));
        assert!(!format!("{token:?}").contains(&token.plain_text));
    }

    #[test]
    fn scope_round_trips_through_str() {
        let scope: TokenScope = "authentication".parse().unwrap();
        assert_eq!(scope, TokenScope::Authentication);
        assert_eq!(scope.to_string(), "authentication");
        assert!("refresh".parse::<TokenScope>().is_err());
    }

    #[tokio::test]
    async fn issued_token_resolves_to_principal() {
        let manager = manager().await;
        let token = manager.login(7).await.unwrap();
        assert_eq!(manager.resolve(&token.plain_text).await.unwrap(), jane());
        assert_eq!(
            manager
                .resolve(&token.plain_text.to_ascii_lowercase())
                .await
                .unwrap(),
            jane()
        );
    }

    #[tokio::test]
    async fn reissue_replaces_previous_token() {
        let manager = manager().await;
        let first = manager.login(7).await.unwrap();
        let second = manager.login(7).await.unwrap();

        let err = manager.resolve(&first.plain_text).await.unwrap_err();
        assert!(err.is_auth_failure());
        assert_eq!(manager.resolve(&second.plain_text).await.unwrap().id, 7);
        assert_eq!(manager.store().token_count(7).await, 1);
    }

    #[tokio::test]
    async fn expired_token_is_unauthenticated() {
        let manager = manager().await;
        let token = manager.login(7).await.unwrap();

        let at_expiry = manager.resolve_at(&token.plain_text, token.expiry).await;
        assert!(matches!(at_expiry, Err(Error::Unauthenticated)));

        let skewed = token.expiry + TimeDelta::seconds(1);
        let err = manager
            .resolve_at(&token.plain_text, skewed)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AuthFailure);
    }

    #[tokio::test]
    async fn unknown_tokens_are_unauthenticated() {
        let manager = manager().await;
        manager.login(7).await.unwrap();

        let never_issued = BASE32_NOPAD.encode(&[0x42; TOKEN_ENTROPY_BYTES]);
        for candidate in [never_issued.as_str(), "", "not a token at all"] {
            let err = manager.resolve(candidate).await.unwrap_err();
            assert!(matches!(err, Error::Unauthenticated));
        }
    }

    #[tokio::test]
    async fn purge_removes_only_expired_rows() {
        let manager = manager().await;
        let stale = Token::generate(8, TimeDelta::seconds(-5), TokenScope::Authentication).unwrap();
        manager.issue(&stale).await.unwrap();
        manager.login(7).await.unwrap();

        assert_eq!(manager.purge_expired().await.unwrap(), 1);
        assert_eq!(manager.store().token_count(8).await, 0);
        assert_eq!(manager.store().token_count(7).await, 1);
    }

    #[test]
    fn unrepresentable_ttl_is_an_error() {
        let settings = TokenSettings {
            ttl_hours: i64::MAX,
            ..TokenSettings::default()
        };
        let manager = TokenManager::new(MemoryTokenStore::new(), settings);
        assert!(matches!(
            manager.generate(1),
            Err(Error::Config("tokens.ttl_hours"))
        ));
    }

    /// Delegates to the default delete-then-insert replace and fails inserts.
    #[derive(Default)]
    struct BrokenInsertStore {
        inner: MemoryTokenStore,
    }

    #[async_trait]
    impl TokenStore for BrokenInsertStore {
        async fn delete_tokens_for(&self, principal_id: i64) -> StoreResult<()> {
            self.inner.delete_tokens_for(principal_id).await
        }

        async fn insert_token(&self, _token: NewToken) -> StoreResult<()> {
            Err(StoreError::new("disk full"))
        }

        async fn find_principal_by_token_hash(
            &self,
            token_hash: &[u8],
            now: DateTime<Utc>,
        ) -> StoreResult<Option<Principal>> {
            self.inner.find_principal_by_token_hash(token_hash, now).await
        }

        async fn purge_expired(&self, now: DateTime<Utc>) -> StoreResult<usize> {
            self.inner.purge_expired(now).await
        }
    }

    #[tokio::test]
    async fn failed_insert_leaves_no_live_token() {
        let store = Arc::new(BrokenInsertStore::default());
        store.inner.add_principal(jane()).await;
        let earlier = Token::generate(7, TimeDelta::hours(1), TokenScope::Authentication).unwrap();
        store
            .inner
            .insert_token(earlier.to_new_token(Utc::now()))
            .await
            .unwrap();

        let manager = TokenManager::new(store.clone(), TokenSettings::default());
        let err = manager.login(7).await.unwrap_err();
        assert!(matches!(err, Error::Store(_)));
        assert_eq!(err.kind(), ErrorKind::Infrastructure);
        assert!(!err.to_string().contains("disk full"));
        assert_eq!(store.inner.token_count(7).await, 0);
    }

    struct StalledStore;

    #[async_trait]
    impl TokenStore for StalledStore {
        async fn delete_tokens_for(&self, _principal_id: i64) -> StoreResult<()> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(())
        }

        async fn insert_token(&self, _token: NewToken) -> StoreResult<()> {
            Ok(())
        }

        async fn find_principal_by_token_hash(
            &self,
            _token_hash: &[u8],
            _now: DateTime<Utc>,
        ) -> StoreResult<Option<Principal>> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(None)
        }

        async fn purge_expired(&self, _now: DateTime<Utc>) -> StoreResult<usize> {
            Ok(0)
        }
    }

    #[tokio::test]
    async fn stalled_store_times_out() {
        let settings = TokenSettings {
            store_timeout_ms: 20,
            ..TokenSettings::default()
        };
        let manager = TokenManager::new(StalledStore, settings);

        let err = manager.login(7).await.unwrap_err();
        assert!(matches!(err, Error::StoreTimeout));

        let err = manager.resolve("ANYTHING").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Infrastructure);
        assert!(!err.is_auth_failure());
    }
}
