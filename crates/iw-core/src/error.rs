//! # AppError
//!
//! Centralized error handling for the Inkwell ecosystem.
//! Maps domain-specific failures to actionable error types.

use thiserror::Error;

/// The primary error type for all iw-core operations.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (e.g., Group, Post, User)
    #[error("{0} not found: {1}")]
    NotFound(&'static str, String),

    /// Validation failure (e.g., empty post text, unknown group id)
    #[error("validation error: {0}")]
    Validation(String),

    /// Actor is not the owner of the resource being mutated
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Anonymous actor attempted a protected action
    #[error("authentication required")]
    AuthenticationRequired,

    /// The `page` query parameter was not a positive integer
    #[error("invalid page number: {0:?}")]
    InvalidPage(String),

    /// Infrastructure failure (e.g., DB down, media store unwritable)
    #[error("internal service error: {0}")]
    Internal(String),
}

impl AppError {
    /// Wraps an infrastructure failure from a port.
    pub fn internal(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

/// A specialized Result type for Inkwell logic.
pub type Result<T> = std::result::Result<T, AppError>;
