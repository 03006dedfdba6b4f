/**
 * API Route Configuration
 *
 * # Routes
 *
 * ## Authentication
 * - `POST /api/auth/signup` - User registration
 * - `POST /api/auth/login` - User login
 * - `GET /api/auth/me` - Current user (requires authentication)
 *
 * ## Projects (require authentication)
 * - `POST /api/projects`, `GET /api/projects`
 * - `GET /api/projects/{project_id}/members`, `POST /api/projects/{project_id}/members`
 * - `GET /api/projects/{project_id}/presence`
 *
 * ## Events (require authentication and membership)
 * - `GET /api/projects/{project_id}/events`, `POST /api/projects/{project_id}/events`
 * - `PUT /api/projects/{project_id}/events/{event_id}`
 * - `DELETE /api/projects/{project_id}/events/{event_id}`
 */

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::backend::auth::{get_me, login, signup};
use crate::backend::events::{create_event, delete_event, list_events, update_event};
use crate::backend::projects::{add_member, create_project, list_members, list_projects, presence};
use crate::backend::server::state::AppState;

/// Add the JSON API routes to `router`
pub fn configure_api_routes(router: Router<AppState>) -> Router<AppState> {
    router
        // Authentication routes
        .route("/api/auth/signup", post(signup))
        .route("/api/auth/login", post(login))
        .route("/api/auth/me", get(get_me))
        // Project routes
        .route("/api/projects", post(create_project).get(list_projects))
        .route(
            "/api/projects/{project_id}/members",
            get(list_members).post(add_member),
        )
        .route("/api/projects/{project_id}/presence", get(presence))
        // Event routes
        .route(
            "/api/projects/{project_id}/events",
            get(list_events).post(create_event),
        )
        .route(
            "/api/projects/{project_id}/events/{event_id}",
            put(update_event).delete(delete_event),
        )
}
