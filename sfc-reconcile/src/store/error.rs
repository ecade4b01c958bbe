//! Store error types.

use thiserror::Error;

/// Errors reported by a remote store.
///
/// The reconciliation engine never interprets these; they are carried
/// verbatim to the caller.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Object not found where one was required (update/delete by ID).
    #[error("not found: {0}")]
    NotFound(String),

    /// More than one object matches, or the store rejected a duplicate.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The API answered with a non-success status.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The request never got an answer.
    #[error("transport: {0}")]
    Transport(String),

    /// The response body could not be decoded.
    #[error("decode: {0}")]
    Decode(String),

    /// Internal error.
    #[error("internal: {0}")]
    Internal(String),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
