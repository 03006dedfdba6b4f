/**
 * Live Sync Route Configuration
 *
 * - `GET /ws/projects/{project_id}?token=...` - WebSocket upgrade; the
 *   socket then receives a JSON change record for every committed mutation
 *   of the project's events
 */

use axum::{routing::get, Router};

use crate::backend::server::state::AppState;
use crate::backend::sync::gateway::handle_project_socket;

pub fn configure_sync_routes(router: Router<AppState>) -> Router<AppState> {
    router.route("/ws/projects/{project_id}", get(handle_project_socket))
}
