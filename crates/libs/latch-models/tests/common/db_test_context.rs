use diesel::prelude::*;
use diesel_migrations::MigrationHarness;
use latch_models::db::connection::MIGRATIONS;

use super::from_env;

/// Applies migrations on creation and reverts them on drop.
pub struct DBTestContext {
    pub conn: PgConnection,
}

impl DBTestContext {
    pub fn new(url: &str) -> Self {
        let mut conn = PgConnection::establish(url).expect("Cannot connect to database");
        conn.run_pending_migrations(MIGRATIONS)
            .expect("Failed to run database migrations");

        Self { conn }
    }

    pub fn from_env() -> Self {
        Self::new(&from_env("DATABASE_URL"))
    }
}

impl Drop for DBTestContext {
    fn drop(&mut self) {
        self.conn
            .revert_all_migrations(MIGRATIONS)
            .expect("Failed to revert changes to db");
    }
}
