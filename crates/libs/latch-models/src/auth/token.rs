//! Persisted session tokens, one row per user.

use crate::prelude::*;
use crate::{
    auth::user::User,
    db::connection::DbConnection,
    schema::{tokens::dsl::*, users},
};
use chrono::{DateTime, Utc};
use diesel::{prelude::*, upsert::excluded};
use latch_auth::store::NewToken;

/// A stored token. Holds the SHA-256 of the plaintext, never the plaintext.
#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Associations, PartialEq)]
#[diesel(belongs_to(User))]
#[diesel(table_name = crate::schema::tokens)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TokenRecord {
    pub id: i64,
    pub user_id: i64,
    pub token_hash: Vec<u8>,
    pub scope: String,
    pub expiry: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Data for storing a token.
#[derive(Insertable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::tokens)]
pub struct TokenRecordCreate {
    pub user_id: i64,
    pub token_hash: Vec<u8>,
    pub scope: String,
    pub expiry: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<NewToken> for TokenRecordCreate {
    fn from(token: NewToken) -> Self {
        Self {
            user_id: token.principal_id,
            token_hash: token.token_hash,
            scope: token.scope.as_str().to_string(),
            expiry: token.expiry,
            created_at: token.created_at,
            updated_at: token.updated_at,
        }
    }
}

impl TokenRecordCreate {
    /// Inserts the token. Fails if the user already has one.
    pub fn create(self, connection: &DbConnection) -> Result<TokenRecord> {
        let conn = &mut connection.pool.get()?;

        Ok(diesel::insert_into(tokens)
            .values(self)
            .returning(TokenRecord::as_returning())
            .get_result(conn)?)
    }

    /// Deletes the user's tokens and inserts this one in a single transaction.
    ///
    /// The insert upserts on `user_id`, so two racing replacements for one
    /// user leave exactly one row: the last writer's.
    pub fn replace(self, connection: &DbConnection) -> Result<TokenRecord> {
        let conn = &mut connection.pool.get()?;

        conn.transaction::<_, Error, _>(|conn| {
            diesel::delete(tokens.filter(user_id.eq(self.user_id))).execute(conn)?;

            Ok(diesel::insert_into(tokens)
                .values(&self)
                .on_conflict(user_id)
                .do_update()
                .set((
                    token_hash.eq(excluded(token_hash)),
                    scope.eq(excluded(scope)),
                    expiry.eq(excluded(expiry)),
                    updated_at.eq(excluded(updated_at)),
                ))
                .returning(TokenRecord::as_returning())
                .get_result(conn)?)
        })
    }
}

impl TokenRecord {
    /// Deletes every token of `target`, returning how many rows went.
    pub fn delete_for_user(target: i64, connection: &DbConnection) -> Result<usize> {
        let conn = &mut connection.pool.get()?;

        Ok(diesel::delete(tokens.filter(user_id.eq(target))).execute(conn)?)
    }

    pub fn fetch_by_user(target: i64, connection: &DbConnection) -> Result<Vec<Self>> {
        let conn = &mut connection.pool.get()?;

        Ok(tokens
            .filter(user_id.eq(target))
            .select(TokenRecord::as_select())
            .load(conn)?)
    }

    /// Fetches the owner of a live token with the given hash.
    ///
    /// Expiry must be strictly after `now`. The latest expiry wins if more
    /// than one row matches.
    pub fn fetch_user_by_hash(
        target: &[u8],
        now: DateTime<Utc>,
        connection: &DbConnection,
    ) -> Result<Option<User>> {
        let conn = &mut connection.pool.get()?;

        Ok(tokens
            .inner_join(users::table)
            .filter(token_hash.eq(target))
            .filter(expiry.gt(now))
            .order(expiry.desc())
            .select(User::as_select())
            .first(conn)
            .optional()?)
    }

    /// Deletes tokens that expired at or before `now`.
    pub fn delete_expired(now: DateTime<Utc>, connection: &DbConnection) -> Result<usize> {
        let conn = &mut connection.pool.get()?;

        Ok(diesel::delete(tokens.filter(expiry.le(now))).execute(conn)?)
    }
}
