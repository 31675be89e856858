//! Persistence capability required by [`crate::token::TokenManager`].
//!
//! The store owns the single-active-token invariant. Implementations with
//! transactions should override [`TokenStore::replace_tokens_for`] so that
//! delete and insert commit together. Without that override two concurrent
//! logins for one principal race and the last writer wins; a failed insert
//! leaves the principal with no token.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::token::TokenScope;

/// The user a token resolves to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

/// A token row as handed to the store. Only the hash of the plaintext.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewToken {
    pub principal_id: i64,
    pub token_hash: Vec<u8>,
    pub scope: TokenScope,
    pub expiry: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Opaque failure reported by a store implementation.
#[derive(Debug, thiserror::Error)]
#[error("token store error: {0}")]
pub struct StoreError(#[source] Box<dyn std::error::Error + Send + Sync>);

impl StoreError {
    pub fn new(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self(err.into())
    }
}

pub type StoreResult<T> = core::result::Result<T, StoreError>;

#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Removes every token belonging to `principal_id`.
    async fn delete_tokens_for(&self, principal_id: i64) -> StoreResult<()>;

    async fn insert_token(&self, token: NewToken) -> StoreResult<()>;

    /// Replaces all tokens of `token.principal_id` with `token`.
    async fn replace_tokens_for(&self, token: NewToken) -> StoreResult<()> {
        self.delete_tokens_for(token.principal_id).await?;
        self.insert_token(token).await
    }

    /// Finds the owner of a token whose hash matches and whose expiry is
    /// strictly after `now`. When several rows match, the latest expiry wins.
    async fn find_principal_by_token_hash(
        &self,
        token_hash: &[u8],
        now: DateTime<Utc>,
    ) -> StoreResult<Option<Principal>>;

    /// Deletes tokens whose expiry is at or before `now`, returning how many.
    async fn purge_expired(&self, now: DateTime<Utc>) -> StoreResult<usize>;
}

#[async_trait]
impl<T: TokenStore + ?Sized> TokenStore for Arc<T> {
    async fn delete_tokens_for(&self, principal_id: i64) -> StoreResult<()> {
        (**self).delete_tokens_for(principal_id).await
    }

    async fn insert_token(&self, token: NewToken) -> StoreResult<()> {
        (**self).insert_token(token).await
    }

    async fn replace_tokens_for(&self, token: NewToken) -> StoreResult<()> {
        (**self).replace_tokens_for(token).await
    }

    async fn find_principal_by_token_hash(
        &self,
        token_hash: &[u8],
        now: DateTime<Utc>,
    ) -> StoreResult<Option<Principal>> {
        (**self).find_principal_by_token_hash(token_hash, now).await
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> StoreResult<usize> {
        (**self).purge_expired(now).await
    }
}

/// In-process store for tests and single-node tools.
///
/// A single lock covers delete and insert, so replacement is atomic.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    state: Mutex<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    principals: HashMap<i64, Principal>,
    tokens: Vec<NewToken>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a principal that tokens may resolve to.
    pub async fn add_principal(&self, principal: Principal) {
        self.state
            .lock()
            .await
            .principals
            .insert(principal.id, principal);
    }

    /// Number of stored rows, expired ones included, for `principal_id`.
    pub async fn token_count(&self, principal_id: i64) -> usize {
        self.state
            .lock()
            .await
            .tokens
            .iter()
            .filter(|t| t.principal_id == principal_id)
            .count()
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn delete_tokens_for(&self, principal_id: i64) -> StoreResult<()> {
        self.state
            .lock()
            .await
            .tokens
            .retain(|t| t.principal_id != principal_id);
        Ok(())
    }

    async fn insert_token(&self, token: NewToken) -> StoreResult<()> {
        self.state.lock().await.tokens.push(token);
        Ok(())
    }

    async fn replace_tokens_for(&self, token: NewToken) -> StoreResult<()> {
        let mut state = self.state.lock().await;
        state.tokens.retain(|t| t.principal_id != token.principal_id);
        state.tokens.push(token);
        Ok(())
    }

    async fn find_principal_by_token_hash(
        &self,
        token_hash: &[u8],
        now: DateTime<Utc>,
    ) -> StoreResult<Option<Principal>> {
        let state = self.state.lock().await;
        Ok(state
            .tokens
            .iter()
            .filter(|t| t.token_hash == token_hash && t.expiry > now)
            .max_by_key(|t| t.expiry)
            .and_then(|t| state.principals.get(&t.principal_id))
            .cloned())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> StoreResult<usize> {
        let mut state = self.state.lock().await;
        let before = state.tokens.len();
        state.tokens.retain(|t| t.expiry > now);
        Ok(before - state.tokens.len())
    }
}
