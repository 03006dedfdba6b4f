//! Shared Error Types
//!
//! This module defines error types that are shared between the server and
//! its clients. These errors represent input that fails validation before it
//! ever reaches a store.
//!
//! # Usage
//!
//! ```rust
//! use calsync::shared::error::SharedError;
//!
//! let error = SharedError::validation("title", "Event title cannot be empty");
//! ```
use thiserror::Error;

/// Shared error types
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SharedError {
    /// Data validation error
    #[error("Validation error in field '{field}': {message}")]
    ValidationError {
        /// The field that failed validation
        field: String,
        /// Human-readable error message
        message: String,
    },
}

impl SharedError {
    /// Create a new validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }
}
