#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Auth(#[from] latch_auth::error::Error),

    #[error(transparent)]
    Models(#[from] latch_models::error::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Join(#[from] tokio::task::JoinError),

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Signed URL expired")]
    Expired,
}
