#![allow(dead_code)]

use latch_models::{
    auth::user::{User, UserCreate},
    db::{config::DbConfig, connection::DbConnection},
};

pub mod db_test_context;

pub fn from_env(var: &str) -> String {
    std::env::var(var).unwrap_or_else(|_| panic!("Env Variable '{}' missing", var))
}

pub fn pool() -> DbConnection {
    DbConnection::new(&DbConfig::new(from_env("DATABASE_URL"))).expect("Failed to build pool")
}

pub fn create_user(db: &DbConnection, email: &str, password: &str) -> User {
    UserCreate {
        first_name: "Jane".to_string(),
        last_name: "Doe".to_string(),
        email: email.to_string(),
        password: password.to_string(),
    }
    .create(db)
    .expect("Failed to create user")
}
