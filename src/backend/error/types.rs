/**
 * Backend Error Types
 *
 * This module defines error types specific to the backend server.
 * These errors are returned by services and HTTP handlers and can be
 * converted to HTTP responses.
 *
 * # Error Categories
 *
 * ## Access Errors
 *
 * - `Unauthorized` - missing, malformed, expired or unknown credential
 * - `Forbidden` - authenticated, but not a member of the project (or not
 *   the owner for owner-only actions)
 *
 * ## Lookup and Concurrency Errors
 *
 * - `NotFound` - no project, event or user with that identifier
 * - `VersionConflict` - the caller presented a stale event version; the
 *   client should refetch and retry rather than treat it as a hard failure
 * - `Conflict` - duplicate account or duplicate membership
 *
 * ## Infrastructure Errors
 *
 * - `Broker` - the pub/sub broker could not be reached at startup
 * - `Internal` - hashing or token signing failed
 */

use thiserror::Error;
use axum::http::StatusCode;
use crate::backend::sync::broker::BrokerError;
use crate::shared::{EventId, SharedError};

/// Backend-specific error types
///
/// # Usage
///
/// ```rust
/// use calsync::backend::error::BackendError;
///
/// let err = BackendError::forbidden("Not a member of this project");
/// let err = BackendError::not_found("event");
/// let err = BackendError::version_conflict(4, 1, 2);
/// ```
#[derive(Debug, Error)]
pub enum BackendError {
    /// Missing or invalid credential
    #[error("Unauthorized: {message}")]
    Unauthorized {
        /// Human-readable error message
        message: String,
    },

    /// Authenticated but not allowed to act on the resource
    #[error("Forbidden: {message}")]
    Forbidden {
        /// Human-readable error message
        message: String,
    },

    /// No record with the requested identifier
    #[error("{resource} not found")]
    NotFound {
        /// Kind of record that was looked up (project, event, user)
        resource: String,
    },

    /// Stale optimistic-concurrency token
    #[error("Version conflict on event {event_id}: expected {expected}, current is {current}")]
    VersionConflict {
        event_id: EventId,
        /// Version presented by the caller
        expected: u64,
        /// Version currently stored
        current: u64,
    },

    /// The record already exists
    #[error("Conflict: {message}")]
    Conflict {
        /// Human-readable error message
        message: String,
    },

    /// Validation error from the shared module
    #[error(transparent)]
    SharedError(#[from] SharedError),

    /// Pub/sub broker error
    #[error(transparent)]
    Broker(#[from] BrokerError),

    /// Unexpected internal failure
    #[error("Internal error: {message}")]
    Internal {
        /// Human-readable error message
        message: String,
    },
}

impl BackendError {
    /// Create a new unauthorized error
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    /// Create a new forbidden error
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    /// Create a new not-found error for the given kind of resource
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    /// Create a new version conflict error
    pub fn version_conflict(event_id: EventId, expected: u64, current: u64) -> Self {
        Self::VersionConflict {
            event_id,
            expected,
            current,
        }
    }

    /// Create a new conflict error
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Create a new internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Get the HTTP status code for this error
    ///
    /// # Status Code Mapping
    ///
    /// - `Unauthorized` - 401
    /// - `Forbidden` - 403
    /// - `NotFound` - 404
    /// - `VersionConflict`, `Conflict` - 409
    /// - `SharedError` - 400
    /// - `Internal` - 500
    /// - `Broker` - 503
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Self::Forbidden { .. } => StatusCode::FORBIDDEN,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::VersionConflict { .. } | Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::SharedError(_) => StatusCode::BAD_REQUEST,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Broker(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Machine-readable code so clients can branch without parsing messages
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unauthorized { .. } => "unauthorized",
            Self::Forbidden { .. } => "forbidden",
            Self::NotFound { .. } => "not_found",
            Self::VersionConflict { .. } => "version_conflict",
            Self::Conflict { .. } => "conflict",
            Self::SharedError(_) => "validation",
            Self::Internal { .. } => "internal",
            Self::Broker(_) => "broker_unavailable",
        }
    }

    /// Get the error message
    pub fn message(&self) -> String {
        match self {
            Self::Unauthorized { message }
            | Self::Forbidden { message }
            | Self::Conflict { message }
            | Self::Internal { message } => message.clone(),
            other => other.to_string(),
        }
    }
}
