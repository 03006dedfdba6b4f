/**
 * Application State Management
 *
 * This module defines the application state structure and implements
 * the necessary `FromRef` traits for Axum state extraction.
 *
 * # Architecture
 *
 * `AppState` is a bundle of `Arc` handles to explicitly owned services.
 * Each service guards its own data:
 * - `UserStore`, `MembershipGuard`, `EventStore` - `tokio::sync::RwLock`
 * - `ConnectionRegistry` - `std::sync::Mutex`, never held across `.await`
 *
 * Two `AppState`s built over one shared broker behave like two backend
 * processes.
 *
 * # State Extraction
 *
 * The `FromRef` implementations let handlers extract just the service they
 * need, e.g. `State(events): State<Arc<EventStore>>`.
 */

use axum::extract::FromRef;
use std::sync::Arc;

use crate::backend::auth::sessions::SessionManager;
use crate::backend::auth::users::UserStore;
use crate::backend::events::store::EventStore;
use crate::backend::projects::membership::MembershipGuard;
use crate::backend::server::config::ServerConfig;
use crate::backend::sync::registry::ConnectionRegistry;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub users: Arc<UserStore>,
    /// Token issue/verification, the `require_user` collaborator
    pub sessions: Arc<SessionManager>,
    pub membership: Arc<MembershipGuard>,
    pub events: Arc<EventStore>,
    /// Live connections of this process only
    pub registry: Arc<ConnectionRegistry>,
}

impl FromRef<AppState> for Arc<ServerConfig> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.config.clone()
    }
}

impl FromRef<AppState> for Arc<UserStore> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.users.clone()
    }
}

impl FromRef<AppState> for Arc<SessionManager> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.sessions.clone()
    }
}

impl FromRef<AppState> for Arc<MembershipGuard> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.membership.clone()
    }
}

impl FromRef<AppState> for Arc<EventStore> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.events.clone()
    }
}

impl FromRef<AppState> for Arc<ConnectionRegistry> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.registry.clone()
    }
}
