//! Error types for Rollbook
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using RollbookError
pub type Result<T> = std::result::Result<T, RollbookError>;

/// Unified error type for Rollbook operations
#[derive(Debug, Error)]
pub enum RollbookError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Record Errors
    // -------------------------------------------------------------------------
    #[error("Validation failed for `{field}`: {message}")]
    Validation { field: String, message: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Cannot derive roll number from `{field}`: {message}")]
    Derivation { field: String, message: String },

    // -------------------------------------------------------------------------
    // Store Errors
    // -------------------------------------------------------------------------
    #[error("Student document is corrupt: {0}")]
    StoreCorrupt(String),

    // -------------------------------------------------------------------------
    // Attachment Errors
    // -------------------------------------------------------------------------
    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("Payload too large: {size} bytes (limit {limit})")]
    PayloadTooLarge { size: usize, limit: usize },

    #[error("Attachment reference escapes the upload root: {0}")]
    PathTraversalRejected(String),

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Network Errors
    // -------------------------------------------------------------------------
    #[error("Network error: {0}")]
    Network(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Secret key missing or invalid")]
    Unauthorized,

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    // -------------------------------------------------------------------------
    // Concurrency Errors
    // -------------------------------------------------------------------------
    #[error("Lock poisoned: {0}")]
    LockPoisoned(String),
}

impl RollbookError {
    /// Shorthand for a field-level validation failure
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Shorthand for a derivation precondition failure
    pub fn derivation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Derivation {
            field: field.into(),
            message: message.into(),
        }
    }
}
