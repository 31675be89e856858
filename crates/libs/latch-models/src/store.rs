//! PostgreSQL-backed [`TokenStore`].
//!
//! Diesel is synchronous, so every call runs on tokio's blocking pool.
//! The caller's timeout bounds the wait, not the statement itself: a query
//! that outlives it still completes on its blocking thread.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use latch_auth::store::{NewToken, Principal, StoreError, StoreResult, TokenStore};

use crate::{
    auth::token::{TokenRecord, TokenRecordCreate},
    db::connection::DbConnection,
    prelude::*,
};

#[derive(Debug, Clone)]
pub struct PgTokenStore {
    db: DbConnection,
}

impl PgTokenStore {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    pub fn connection(&self) -> &DbConnection {
        &self.db
    }

    async fn blocking<T, F>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&DbConnection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || f(&db))
            .await
            .map_err(StoreError::new)?
            .map_err(StoreError::new)
    }
}

#[async_trait]
impl TokenStore for PgTokenStore {
    async fn delete_tokens_for(&self, principal_id: i64) -> StoreResult<()> {
        self.blocking(move |db| TokenRecord::delete_for_user(principal_id, db))
            .await?;
        Ok(())
    }

    async fn insert_token(&self, token: NewToken) -> StoreResult<()> {
        self.blocking(move |db| TokenRecordCreate::from(token).create(db))
            .await?;
        Ok(())
    }

    async fn replace_tokens_for(&self, token: NewToken) -> StoreResult<()> {
        self.blocking(move |db| TokenRecordCreate::from(token).replace(db))
            .await?;
        Ok(())
    }

    async fn find_principal_by_token_hash(
        &self,
        token_hash: &[u8],
        now: DateTime<Utc>,
    ) -> StoreResult<Option<Principal>> {
        let token_hash = token_hash.to_vec();
        let user = self
            .blocking(move |db| TokenRecord::fetch_user_by_hash(&token_hash, now, db))
            .await?;
        Ok(user.map(Principal::from))
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> StoreResult<usize> {
        self.blocking(move |db| TokenRecord::delete_expired(now, db))
            .await
    }
}
