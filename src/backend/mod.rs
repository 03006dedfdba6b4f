//! Backend Module
//!
//! This module contains all server-side code for calsync: an Axum HTTP
//! server with a JSON API for accounts, projects and events, plus a
//! WebSocket endpoint that streams every committed change of a project's
//! events to the project's live connections.
//!
//! This module is only compiled when the `ssr` feature is enabled.
//!
//! # Architecture
//!
//! - **`server`** - Configuration, application state, initialization
//! - **`routes`** - Route configuration and router assembly
//! - **`auth`** - Accounts, JWT tokens, `require_user`
//! - **`middleware`** - `AuthUser` extractor
//! - **`projects`** - `MembershipGuard` and project/member handlers
//! - **`events`** - `EventStore` (versioned mutations) and event handlers
//! - **`sync`** - Broker, publisher, listener, connection registry, gateway
//! - **`error`** - Backend-specific error types
//!
//! # Module Structure
//!
//! ```text
//! backend/
//! ├── mod.rs          - Module exports and documentation
//! ├── main.rs         - Server binary
//! ├── server/         - Server initialization and state
//! ├── routes/         - Route configuration
//! ├── auth/           - Authentication
//! ├── middleware/     - Request extractors
//! ├── projects/       - Projects and memberships
//! ├── events/         - Project events
//! ├── sync/           - Live synchronization
//! └── error/          - Error types
//! ```
//!
//! # Change Flow
//!
//! ```text
//! PUT /api/projects/1/events/4
//!   → AuthUser → EventStore::update (membership, version check, commit)
//!   → ChangePublisher → ChangeBroker ("project-events")
//!   → ChangeListener (every process) → ConnectionRegistry::broadcast
//!   → GatewaySession → WebSocket text frame
//! ```
//!
//! Broker and delivery failures never fail the mutating request; they are
//! logged and only cost real-time freshness.

/// Server initialization and state
pub mod server;

/// Route configuration
pub mod routes;

/// Authentication
pub mod auth;

/// Request extractors
pub mod middleware;

/// Projects and memberships
pub mod projects;

/// Project events
pub mod events;

/// Live synchronization
pub mod sync;

/// Backend-specific error types
pub mod error;

pub use error::BackendError;
pub use server::{create_app, AppState, ServerConfig};
