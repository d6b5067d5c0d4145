//! Gateway client error types.

use idler_core::{HttpError, StatusCode};
use thiserror::Error;

/// Why a single gateway call failed.
#[derive(Debug, Error)]
pub enum CallError {
    #[error(transparent)]
    Transport(#[from] HttpError),

    #[error("unexpected status {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Errors returned by gateway reads.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("failed to list functions: {0}")]
    List(#[source] CallError),

    #[error("failed to look up function {name}: {source}")]
    Lookup {
        name: String,
        #[source]
        source: CallError,
    },
}
