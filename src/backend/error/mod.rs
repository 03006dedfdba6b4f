//! Backend Error Module
//!
//! This module defines error types specific to the backend server.
//! These errors are used by services and HTTP handlers and can be converted
//! to HTTP responses.
//!
//! # Module Structure
//!
//! ```text
//! error/
//! ├── mod.rs        - Module exports and documentation
//! ├── types.rs      - Error type definitions
//! └── conversion.rs - IntoResponse implementation
//! ```
//!
//! # Error Types
//!
//! - `Unauthorized` / `Forbidden` - access failures
//! - `NotFound` - unknown project, event or user
//! - `VersionConflict` - stale optimistic-concurrency token
//! - `Conflict` - duplicate account or membership
//! - `SharedError` - validation errors from the shared module
//! - `Broker` - pub/sub broker unavailable
//!
//! Broker delivery failures after a committed mutation are never surfaced
//! through this type; they are logged by the publisher task.

/// Error type definitions
pub mod types;

/// Error conversion implementations
pub mod conversion;

// Re-export commonly used types
pub use types::BackendError;
