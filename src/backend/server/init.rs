/**
 * Server Initialization
 *
 * This module handles the initialization and setup of the Axum HTTP server,
 * including broker selection, service creation, background tasks and route
 * configuration.
 *
 * # Initialization Process
 *
 * 1. Connect the configured broker (or fall back to the in-process one)
 * 2. Create the services (users, sessions, memberships, registry)
 * 3. Start the publisher task and build the event store on top of it
 * 4. Start this process's change listener
 * 5. Create and configure the router
 */

use axum::Router;
use std::sync::Arc;

use crate::backend::auth::sessions::SessionManager;
use crate::backend::auth::users::UserStore;
use crate::backend::error::BackendError;
use crate::backend::events::store::EventStore;
use crate::backend::projects::membership::MembershipGuard;
use crate::backend::routes::router::create_router;
use crate::backend::server::config::ServerConfig;
use crate::backend::server::state::AppState;
use crate::backend::sync::broker::{ChangeBroker, MemoryBroker};
use crate::backend::sync::listener::ChangeListener;
use crate::backend::sync::publisher::ChangePublisher;
use crate::backend::sync::registry::ConnectionRegistry;

/// Pick the broker named by `BROKER_URL`
///
/// Without a URL the in-process broker is used, which is only correct for a
/// single backend process.
pub async fn connect_broker(config: &ServerConfig) -> Result<Arc<dyn ChangeBroker>, BackendError> {
    match &config.broker_url {
        Some(url) => connect_external_broker(url).await,
        None => {
            tracing::info!("[Broker] BROKER_URL not set, using in-process broker");
            Ok(Arc::new(MemoryBroker::new()))
        }
    }
}

#[cfg(feature = "redis-broker")]
async fn connect_external_broker(url: &str) -> Result<Arc<dyn ChangeBroker>, BackendError> {
    let broker = crate::backend::sync::redis::RedisBroker::connect(url).await?;
    Ok(Arc::new(broker))
}

#[cfg(not(feature = "redis-broker"))]
async fn connect_external_broker(url: &str) -> Result<Arc<dyn ChangeBroker>, BackendError> {
    tracing::warn!(
        "[Broker] BROKER_URL={} ignored: built without the `redis-broker` feature; using in-process broker",
        url
    );
    Ok(Arc::new(MemoryBroker::new()))
}

/// Build services, start background tasks and create the router over `broker`
///
/// Returns the state as well so callers can reach the services directly.
pub async fn build_app(
    config: ServerConfig,
    broker: Arc<dyn ChangeBroker>,
) -> Result<(Router<()>, AppState), BackendError> {
    config
        .validate()
        .map_err(|e| BackendError::internal(e.to_string()))?;
    let config = Arc::new(config);

    let users = Arc::new(UserStore::new(config.bcrypt_cost));
    let sessions = Arc::new(SessionManager::new(&config.jwt_secret, config.token_ttl_secs, users.clone()));
    let membership = Arc::new(MembershipGuard::new());
    let registry = Arc::new(ConnectionRegistry::new());

    let (publisher, _publisher_task) = ChangePublisher::start(broker.clone(), config.broker_channel.clone());
    let events = Arc::new(EventStore::new(membership.clone(), publisher));

    let _listener_task = ChangeListener::start(broker.clone(), config.broker_channel.clone(), registry.clone()).await?;

    let app_state = AppState {
        config,
        users,
        sessions,
        membership,
        events,
        registry,
    };

    let app = create_router(app_state.clone());
    tracing::info!("[Server] Application initialized with {} broker", broker.name());

    Ok((app, app_state))
}

/// Create and configure the Axum application
pub async fn create_app(config: ServerConfig) -> Result<Router<()>, BackendError> {
    tracing::info!("Initializing calsync backend server");

    let broker = connect_broker(&config).await?;
    let (app, _state) = build_app(config, broker).await?;
    Ok(app)
}
