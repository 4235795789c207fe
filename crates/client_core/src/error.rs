use shared::{
    error::{ApiError, ErrorCode},
    reorder::ReconcileError,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid server url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server answered {status}: {}", .error.message)]
    Api { status: u16, error: ApiError },
    #[error("server answered {0} without an error body")]
    Status(u16),
    #[error("drag could not be reconciled: {0}")]
    Reconcile(#[from] ReconcileError),
}

impl ClientError {
    /// The server already holds the same operation for its next flush.
    pub fn is_already_queued(&self) -> bool {
        matches!(
            self,
            ClientError::Api {
                error: ApiError {
                    code: ErrorCode::AlreadyQueued,
                    ..
                },
                ..
            }
        )
    }
}
