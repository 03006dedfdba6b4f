/**
 * Router Configuration
 *
 * This module provides the main router creation function that combines
 * all route configurations into a single Axum router.
 *
 * # Route Order
 *
 * 1. API routes (auth, projects, events)
 * 2. Live sync routes (WebSocket)
 * 3. Fallback handler (404)
 *
 * Every request runs through a `TraceLayer` span and a permissive CORS
 * layer.
 */

use axum::{http::StatusCode, response::Json, Router};
use serde_json::json;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::backend::routes::api_routes::configure_api_routes;
use crate::backend::routes::sync_routes::configure_sync_routes;
use crate::backend::server::state::AppState;

/// Create the Axum router with all routes configured
pub fn create_router(app_state: AppState) -> Router<()> {
    let router = Router::new();

    let router = configure_api_routes(router);
    let router = configure_sync_routes(router);

    // Fallback handler for 404
    let router = router.fallback(|| async {
        (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Not Found", "status": 404, "code": "not_found" })),
        )
    });

    router
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(app_state)
}
