//! Server Module
//!
//! This module contains all server-side code for initializing and configuring
//! the Axum HTTP server.
//!
//! # Architecture
//!
//! - **`state`** - Application state structure and `FromRef` implementations
//! - **`config`** - Configuration loading and validation
//! - **`init`** - Server initialization and app creation
//!
//! # Module Structure
//!
//! ```text
//! server/
//! ├── mod.rs          - Module exports and documentation
//! ├── state.rs        - AppState and FromRef implementations
//! ├── config.rs       - ServerConfig (env, builder, validation)
//! └── init.rs         - Broker selection, background tasks, app creation
//! ```
//!
//! # Initialization Flow
//!
//! 1. **Configuration Loading**: `ServerConfig::from_env()`
//! 2. **Broker**: Redis if `BROKER_URL` is set and compiled in, otherwise in-process
//! 3. **Services**: users, sessions, memberships, events, connection registry
//! 4. **Background Tasks**: change publisher and change listener
//! 5. **Router Creation**: all routes plus tracing and CORS layers
//!
//! # Example
//!
//! ```rust,no_run
//! use calsync::backend::server::{create_app, ServerConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let app = create_app(ServerConfig::from_env()?).await?;
//! # Ok(())
//! # }
//! ```

/// Application state management
pub mod state;

/// Server configuration loading
pub mod config;

/// Server initialization
pub mod init;

pub use config::{ConfigError, ServerConfig, ServerConfigBuilder};
pub use init::{build_app, connect_broker, create_app};
pub use state::AppState;
