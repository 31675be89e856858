//! Latch command line tool.
//!
//! Secrets come from `--config <file.toml>` or the `LATCH_CIPHER_KEY` and
//! `LATCH_SIGNER_SECRET` environment variables. User and token commands also
//! need `DATABASE_URL`.
//!
//! ```bash
//! export LATCH_CIPHER_KEY=$(latchctl gen-key --length 32)
//! export LATCH_SIGNER_SECRET=$(latchctl gen-key)
//! latchctl sign "https://example.com/reset?id=42"
//! ```

mod cli;
mod commands;
mod error;
mod prelude;

use std::path::Path;

use clap::Parser;
use cli::{Cli, Commands, TokenCommands, UserCommands};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::{commands::*, prelude::*};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "{}=info,latch_auth=info,latch_models=info",
                    env!("CARGO_CRATE_NAME")
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let result = run(cli.command, cli.config.as_deref()).await;

    if let Err(ref e) = result {
        tracing::error!("Error: {}", e);
    }

    result
}

async fn run(command: Commands, config_path: Option<&Path>) -> Result<()> {
    match command {
        Commands::GenKey { length } => handle_gen_key(length),
        Commands::Encrypt { plaintext } => handle_encrypt(&load_config(config_path)?, &plaintext),
        Commands::Decrypt { envelope } => handle_decrypt(&load_config(config_path)?, &envelope),
        Commands::Sign { url } => handle_sign(&load_config(config_path)?, &url),
        Commands::Verify { signed_url } => handle_verify(&load_config(config_path)?, &signed_url),
        Commands::Expired {
            signed_url,
            max_age_minutes,
        } => handle_expired(&load_config(config_path)?, &signed_url, max_age_minutes),
        Commands::User {
            command: UserCommands::Create { user },
        } => handle_create_user(user),
        Commands::Token { command } => {
            let config = load_config(config_path)?;
            match command {
                TokenCommands::Issue { credentials } => handle_token_issue(&config, credentials).await,
                TokenCommands::Resolve { token } => handle_token_resolve(&config, &token).await,
                TokenCommands::Purge => handle_token_purge(&config).await,
            }
        }
    }
}
