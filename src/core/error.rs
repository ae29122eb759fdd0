/// Lorekeeper Error Module
///
/// This module defines the error taxonomy for the data-access layer. Every
/// fallible operation returns [`Result`], so callers can tell a malformed
/// filter apart from a missing row or a failing store.
use thiserror::Error;

/// Error type for the lorekeeper data-access layer.
///
/// The variants map onto the caller-visible categories:
/// - malformed condition/column/join specifications (`Validation`)
/// - single-row lookups that matched nothing (`NotFound`)
/// - registration of an already-taken unique key (`Duplicate`)
/// - failures reported by SQLite itself (`Storage`)
///
/// Value coercion never fails, so it has no variant here.
#[derive(Error, Debug)]
pub enum LoreError {
    /// Malformed specification shape, rejected before anything is executed
    #[error("Validation error: {0}")]
    Validation(String),

    /// A lookup that must return a row returned none
    #[error("Not found: {0}")]
    NotFound(String),

    /// A unique key that already exists in the store
    #[error("Duplicate: {0}")]
    Duplicate(String),

    /// Errors from SQLite, propagated unchanged
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// Configuration loading and validation errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File system and I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Failures reported by the credential hasher
    #[error("Credential error: {0}")]
    Credential(String),
}

impl LoreError {
    /// Shorthand for building a [`LoreError::Validation`].
    pub fn validation(msg: impl Into<String>) -> Self {
        LoreError::Validation(msg.into())
    }

    /// Returns true when the underlying SQLite error is a UNIQUE constraint violation.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            LoreError::Storage(rusqlite::Error::SqliteFailure(err, _)) => {
                err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
            }
            _ => false,
        }
    }
}

/// Type alias for Result to use LoreError as the error type.
pub type Result<T> = std::result::Result<T, LoreError>;
