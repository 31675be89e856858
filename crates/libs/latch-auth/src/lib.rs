//! Authentication primitives for the Latch backend.
//!
//! Three independent components, each built from explicit configuration:
//!
//! - [`token::TokenManager`]: opaque session tokens persisted as hashes,
//!   one live token per principal.
//! - [`cipher::SymmetricCipher`]: AES-CFB encryption of short strings into
//!   URL-safe envelopes. Not authenticated.
//! - [`url_signer::UrlSigner`]: HMAC-SHA256 signed URLs with an embedded
//!   creation time.
//!
//! # Usage
//!
//! ```rust
//! use latch_auth::{
//!     cipher::SymmetricCipher, config::LatchConfig, store::MemoryTokenStore,
//!     token::TokenManager, url_signer::UrlSigner,
//! };
//!
//! let config = LatchConfig::from_toml(
//!     r#"
//!     cipher_key = "0123456789abcdef"
//!     signer_secret = "signing-secret"
//!     "#,
//! )
//! .unwrap();
//!
//! let cipher = SymmetricCipher::new(config.cipher_key.clone());
//! let signer = UrlSigner::new(&config.signer_secret).unwrap();
//! let tokens = TokenManager::new(MemoryTokenStore::new(), config.tokens);
//!
//! let email = cipher.encrypt("jane@example.com").unwrap();
//! let link = signer.sign(&format!("https://example.com/reset?email={email}"));
//! assert!(signer.verify(&link));
//! # let _ = tokens;
//! ```

pub mod auth_body;
pub mod cipher;
pub mod config;
pub mod error;
pub mod prelude;
pub mod secret_hash;
pub mod sha256;
pub mod store;
pub mod token;
pub mod url_signer;

pub const CONNECTION_TOKEN_TYPE: &str = "Bearer";
pub const AUTH_HEADER: &str = "Authorization";
pub const AUTH_HEADER_PREFIX: &str = "Bearer ";
