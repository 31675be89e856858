//! PostgreSQL persistence for the Latch backend.
//!
//! Provides Diesel models for users and session tokens, connection
//! management with embedded migrations, and [`store::PgTokenStore`], the
//! database-backed [`latch_auth::store::TokenStore`].
//!
//! # Usage
//!
//! ```rust,no_run
//! use latch_auth::{config::TokenSettings, token::TokenManager};
//! use latch_models::{
//!     db::{config::DbConfig, connection::DbConnection},
//!     store::PgTokenStore,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = DbConnection::new(&DbConfig::from_env()?)?.setup()?;
//! let tokens = TokenManager::new(PgTokenStore::new(db), TokenSettings::default());
//! let token = tokens.login(1).await?;
//! println!("{}", tokens.resolve(&token.plain_text).await?.email);
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod db;
pub mod error;
pub mod prelude;
mod schema;
pub mod store;
