//! Events Module
//!
//! Project events with optimistic concurrency.
//!
//! # Module Structure
//!
//! ```text
//! events/
//! ├── mod.rs       - Module exports and documentation
//! ├── store.rs     - EventStore (version-checked mutations, change publishing)
//! └── handlers.rs  - HTTP handlers
//! ```

pub mod store;

pub mod handlers;

pub use handlers::{
    create_event, delete_event, list_events, update_event, CreateEventRequest, UpdateEventRequest,
};
pub use store::EventStore;
