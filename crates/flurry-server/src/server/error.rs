//! Request-level errors and their HTTP mapping.
//!
//! Generation failures are logged in full and answered with a fixed message:
//! clock readings and sequence state never leave the process.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

pub type Result<T> = core::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The generator refused to produce an ID.
    #[error("ID generation failed: {0}")]
    IdGeneration(#[from] flurry::Error),

    /// The blocking generation task panicked or was cancelled.
    #[error("Generation task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// The client sent something that is not a valid ID.
    #[error("Invalid id {raw:?}: {reason}")]
    InvalidId { raw: String, reason: &'static str },
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Self::IdGeneration(_) | Self::Task(_) => {
                tracing::error!(error = %self, "Failed to serve ID");
                (StatusCode::INTERNAL_SERVER_ERROR, "ID generation failed").into_response()
            }
            Self::InvalidId { .. } => (StatusCode::BAD_REQUEST, self.to_string()).into_response(),
        }
    }
}
