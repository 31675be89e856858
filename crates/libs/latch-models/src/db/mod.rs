//! Connection configuration and pooling.

pub mod config;
pub mod connection;
