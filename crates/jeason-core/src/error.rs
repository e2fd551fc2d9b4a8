//! # Error Module
//!
//! The single error type returned by every core operation.

use crate::validation::FieldErrors;
use thiserror::Error;

/// Errors produced by the core services.
#[derive(Debug, Error)]
pub enum CoreError {
    /// One or more form fields failed validation. Nothing was written.
    #[error("validation failed: {0}")]
    Validation(FieldErrors),

    /// The addressed record does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// The record exists but is not in a state that allows the change.
    #[error("{0}")]
    Conflict(String),

    /// Missing, expired or wrong credentials.
    #[error("{0}")]
    Unauthorized(String),

    /// Authenticated but not allowed.
    #[error("{0}")]
    Forbidden(String),

    /// Storage backend failure.
    #[error("storage error: {0}")]
    Storage(String),

    /// A stored record could not be encoded or decoded.
    #[error("format error: {0}")]
    Format(String),
}

impl CoreError {
    /// Shorthand for a single-field validation failure.
    #[must_use]
    pub fn field(field: &str, message: &str) -> Self {
        let mut errors = FieldErrors::new();
        errors.add(field, message);
        CoreError::Validation(errors)
    }

    pub(crate) fn not_found(what: impl Into<String>) -> Self {
        CoreError::NotFound(what.into())
    }

    pub(crate) fn storage(err: impl std::fmt::Display) -> Self {
        CoreError::Storage(err.to_string())
    }
}
