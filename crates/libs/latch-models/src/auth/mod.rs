//! Users and their session tokens.

pub mod token;
pub mod user;
