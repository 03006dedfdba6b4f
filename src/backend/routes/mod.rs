//! Route Configuration Module
//!
//! This module configures all HTTP routes for the backend server.
//!
//! # Module Structure
//!
//! ```text
//! routes/
//! ├── mod.rs          - Module exports and documentation
//! ├── router.rs       - Main router creation, layers, fallback
//! ├── api_routes.rs   - JSON API (auth, projects, events)
//! └── sync_routes.rs  - Live sync WebSocket endpoint
//! ```

pub mod router;

pub mod api_routes;

pub mod sync_routes;

pub use api_routes::configure_api_routes;
pub use router::create_router;
pub use sync_routes::configure_sync_routes;
