//! Query backend error types.

use idler_core::{HttpError, StatusCode};
use thiserror::Error;

/// Errors returned by a query backend fetch.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("query request failed: {0}")]
    Transport(#[from] HttpError),

    #[error("unexpected status from query backend {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("failed to decode query response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("query backend returned {status}: {message}")]
    Backend { status: String, message: String },
}
