//! Live Sync Module
//!
//! Keeps every connected client of a project up to date with the project's
//! events, across any number of backend processes.
//!
//! # Architecture
//!
//! ```text
//! EventStore ──publish──> ChangePublisher ──> ChangeBroker ──> ChangeListener (one per process)
//!                                                                   │
//!                                                         ConnectionRegistry::broadcast
//!                                                                   │
//!                                          GatewaySession ──ws──> client (one per socket)
//! ```
//!
//! A process's own changes take the same route through the broker as
//! everyone else's; nothing is delivered locally first.
//!
//! # Module Structure
//!
//! ```text
//! sync/
//! ├── mod.rs        - Module exports and documentation
//! ├── broker.rs     - ChangeBroker trait, MemoryBroker
//! ├── redis.rs      - RedisBroker (feature `redis-broker`)
//! ├── publisher.rs  - ChangePublisher and its drainer task
//! ├── listener.rs   - ChangeListener, broker → rooms
//! ├── registry.rs   - ConnectionRegistry, per-project rooms
//! └── gateway.rs    - WebSocket endpoint and GatewaySession
//! ```

pub mod broker;

#[cfg(feature = "redis-broker")]
pub mod redis;

pub mod publisher;

pub mod listener;

pub mod registry;

pub mod gateway;

pub use broker::{BrokerError, BrokerSubscription, ChangeBroker, MemoryBroker, DEFAULT_CHANNEL};
#[cfg(feature = "redis-broker")]
pub use self::redis::RedisBroker;
pub use publisher::ChangePublisher;
pub use listener::{dispatch_payload, ChangeListener};
pub use registry::{ConnectionId, ConnectionRegistry, DeliveryReport, LiveConnection, Outbound};
pub use gateway::{handle_project_socket, GatewaySession, GatewayState, SocketParams};
