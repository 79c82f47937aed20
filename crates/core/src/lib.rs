//! Shared primitives for all Rust crates in Permwatch.

#![forbid(unsafe_code)]

use thiserror::Error;

/// Result type used across Permwatch crates.
pub type AppResult<T> = Result<T, AppError>;

/// Common application error categories.
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid input or violated invariant.
    #[error("validation error: {0}")]
    Validation(String),

    /// Embedded payload could not be decoded into UTF-8 text.
    #[error("decode error: {0}")]
    Decode(String),

    /// Request body or decoded payload is not valid JSON.
    #[error("error decoding JSON: {0}")]
    Json(String),

    /// Audit log entry is missing a required field or has an unrecognized shape.
    #[error("malformed audit log entry: {0}")]
    MalformedLog(String),

    /// Webhook delivery failed at the transport level.
    #[error("webhook transport error: {0}")]
    Transport(String),

    /// Internal unexpected error.
    #[error("internal error: {0}")]
    Internal(String),
}
