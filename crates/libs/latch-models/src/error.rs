//! Database error types.

/// Database operation errors.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Database connection pool error.
    #[error(transparent)]
    R2D2(#[from] diesel::r2d2::PoolError),

    /// Diesel ORM operation error.
    #[error(transparent)]
    Diesel(#[from] diesel::result::Error),

    /// Pending migrations could not be applied.
    #[error("Migration failed: {0}")]
    Migration(Box<dyn std::error::Error + Send + Sync>),

    /// Password hashing or verification failed.
    #[error(transparent)]
    Auth(#[from] latch_auth::error::Error),

    /// Unknown email or wrong password. Deliberately indistinguishable.
    #[error("Wrong Credentials")]
    WrongCredentials,

    /// Required environment variable missing.
    #[error("Env Variable '{0}' missing")]
    MissingEnv(&'static str),
}
