//! Calsync - Main Library
//!
//! Calsync is a collaborative scheduling backend built with Rust. Users
//! group into projects, share calendar events inside those projects, and
//! receive every change to a project's events live over a websocket.
//!
//! # Overview
//!
//! This library provides:
//! - Account signup/login with JWT session tokens
//! - Projects with an owner and members
//! - Project events guarded by optimistic concurrency (per-event versions)
//! - Live synchronization: committed changes are published to a pub/sub
//!   broker and fanned out to every connection in the project's room, on
//!   every backend process
//!
//! # Module Structure
//!
//! - **`shared`** - Types shared between the server and its clients
//!   - Project, membership and event models
//!   - The `ChangeRecord` wire format
//!   - Validation errors
//!
//! - **`backend`** - Server-side code (only compiled with `ssr` feature)
//!   - Axum HTTP server and websocket gateway
//!   - Event store, membership guard, connection registry
//!   - Change broker (in-memory or Redis)
//!
//! # Feature Flags
//!
//! - **`ssr`** (default) - Enables the backend modules and the server binary
//! - **`redis-broker`** - Enables the Redis pub/sub broker for multi-process
//!   deployments
//!
//! # Usage
//!
//! ```rust,no_run
//! use calsync::backend::server::{create_app, ServerConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ServerConfig::from_env()?;
//! let app = create_app(config).await?;
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Thread Safety
//!
//! - Every service is an explicitly owned object behind `Arc`, each guarding
//!   its own tables with its own lock
//! - The connection registry never holds its lock across a network write

/// Shared types and data structures
pub mod shared;

/// Backend server-side code
#[cfg(feature = "ssr")]
pub mod backend;
