//! Shared Module
//!
//! This module contains types and data structures that are shared between
//! the server and its clients. These types are used for serialization over
//! the HTTP API, the live websocket channel and the pub/sub broker.
//!
//! # Overview
//!
//! The shared module provides platform-agnostic types that carry no server
//! dependencies. All types are designed for serialization and transmission.

/// Project, membership and event models
pub mod project;

/// Change notifications published after every committed mutation
pub mod event;

/// Shared error types
pub mod error;

/// Re-export commonly used types for convenience
pub use project::{EventId, Membership, Project, ProjectEvent, ProjectId, Role, UserId};
pub use event::{ChangeKind, ChangeRecord};
pub use error::SharedError;
