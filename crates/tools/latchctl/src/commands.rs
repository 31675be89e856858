use std::path::Path;

use latch_auth::{
    auth_body::{AuthBody, bearer_token},
    cipher::SymmetricCipher,
    config::LatchConfig,
    token::TokenManager,
    url_signer::UrlSigner,
};
use latch_models::{
    auth::user::{User, UserCreate},
    db::{config::DbConfig, connection::DbConnection},
    store::PgTokenStore,
};
use rand::{Rng, distributions::Alphanumeric, rngs::OsRng};
use tracing::info;

use crate::{
    cli::{CreateUserArgs, LoginArgs},
    prelude::*,
};

pub fn load_config(path: Option<&Path>) -> Result<LatchConfig> {
    let config = match path {
        Some(path) => LatchConfig::from_file(path)?,
        None => LatchConfig::from_env()?,
    };
    Ok(config)
}

fn connect() -> Result<DbConnection> {
    Ok(DbConnection::new(&DbConfig::from_env()?)?.setup()?)
}

fn token_manager(config: &LatchConfig) -> Result<TokenManager<PgTokenStore>> {
    Ok(TokenManager::new(PgTokenStore::new(connect()?), config.tokens))
}

/// Runs diesel queries and Argon2 on tokio's blocking pool.
async fn blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await?
}

pub fn handle_gen_key(length: usize) -> Result<()> {
    let secret: String = OsRng
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect();
    println!("{secret}");
    Ok(())
}

pub fn handle_encrypt(config: &LatchConfig, plaintext: &str) -> Result<()> {
    let cipher = SymmetricCipher::new(config.cipher_key.clone());
    println!("{}", cipher.encrypt(plaintext)?);
    Ok(())
}

pub fn handle_decrypt(config: &LatchConfig, envelope: &str) -> Result<()> {
    let cipher = SymmetricCipher::new(config.cipher_key.clone());
    println!("{}", cipher.decrypt(envelope)?);
    Ok(())
}

pub fn handle_sign(config: &LatchConfig, url: &str) -> Result<()> {
    let signer = UrlSigner::new(&config.signer_secret)?;
    println!("{}", signer.sign(url));
    Ok(())
}

pub fn handle_verify(config: &LatchConfig, signed_url: &str) -> Result<()> {
    let signer = UrlSigner::new(&config.signer_secret)?;
    if !signer.verify(signed_url) {
        return Err(Error::InvalidSignature);
    }
    println!("valid");
    Ok(())
}

pub fn handle_expired(config: &LatchConfig, signed_url: &str, max_age_minutes: i64) -> Result<()> {
    let signer = UrlSigner::new(&config.signer_secret)?;
    if signer.expired(signed_url, max_age_minutes) {
        return Err(Error::Expired);
    }
    println!("fresh");
    Ok(())
}

pub fn handle_create_user(args: CreateUserArgs) -> Result<()> {
    info!("Creating user");
    let db = connect()?;
    let user = UserCreate::from(args).create(&db)?;
    println!("{}", serde_json::to_string_pretty(&user)?);
    Ok(())
}

pub async fn handle_token_issue(config: &LatchConfig, credentials: LoginArgs) -> Result<()> {
    info!("Issuing token");
    let manager = token_manager(config)?;
    let db = manager.store().connection().clone();
    let user = blocking(move || {
        Ok(User::authenticate(
            &credentials.email,
            &credentials.password,
            &db,
        )?)
    })
    .await?;
    let token = manager.login(user.id).await?;
    println!("{}", serde_json::to_string_pretty(&AuthBody::from(&token))?);
    Ok(())
}

pub async fn handle_token_resolve(config: &LatchConfig, token: &str) -> Result<()> {
    let manager = token_manager(config)?;
    let token = bearer_token(token).unwrap_or(token);
    let principal = manager.resolve(token).await?;
    println!("{}", serde_json::to_string_pretty(&principal)?);
    Ok(())
}

pub async fn handle_token_purge(config: &LatchConfig) -> Result<()> {
    let manager = token_manager(config)?;
    let purged = manager.purge_expired().await?;
    println!("{purged}");
    Ok(())
}
