use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use latch_models::auth::user::UserCreate;

#[derive(Parser)]
#[command(name = "latchctl")]
#[command(about = "Latch - session tokens, field encryption and signed URLs")]
pub struct Cli {
    /// Path to a TOML config file. Falls back to LATCH_* environment variables
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print a random alphanumeric secret, usable as cipher key or signer secret
    GenKey {
        /// Secret length in bytes (cipher keys need 16, 24 or 32)
        #[arg(long, default_value_t = 32)]
        length: usize,
    },

    /// Encrypt a value into a URL-safe envelope
    Encrypt { plaintext: String },

    /// Decrypt an envelope produced by `encrypt`
    Decrypt { envelope: String },

    /// Append a timestamped signature to a URL
    Sign { url: String },

    /// Check the signature of a signed URL
    Verify { signed_url: String },

    /// Check whether a signed URL is older than the given age
    Expired {
        signed_url: String,

        /// Maximum age in minutes
        #[arg(long, default_value_t = 60)]
        max_age_minutes: i64,
    },

    /// Manage users
    User {
        #[command(subcommand)]
        command: UserCommands,
    },

    /// Manage session tokens
    Token {
        #[command(subcommand)]
        command: TokenCommands,
    },
}

#[derive(Subcommand)]
pub enum UserCommands {
    /// Create a new user
    Create {
        #[command(flatten)]
        user: CreateUserArgs,
    },
}

#[derive(Subcommand)]
pub enum TokenCommands {
    /// Log in and issue a session token, replacing any earlier one
    Issue {
        #[command(flatten)]
        credentials: LoginArgs,
    },

    /// Resolve a token (or "Bearer <token>") to its user
    Resolve { token: String },

    /// Delete expired tokens
    Purge,
}

#[derive(Args)]
pub struct CreateUserArgs {
    #[arg(long)]
    pub first_name: String,

    #[arg(long)]
    pub last_name: String,

    #[arg(long)]
    pub email: String,

    #[arg(long)]
    pub password: String,
}

impl From<CreateUserArgs> for UserCreate {
    fn from(value: CreateUserArgs) -> Self {
        Self {
            first_name: value.first_name,
            last_name: value.last_name,
            email: value.email,
            password: value.password,
        }
    }
}

#[derive(Args)]
pub struct LoginArgs {
    #[arg(long)]
    pub email: String,

    #[arg(long)]
    pub password: String,
}
