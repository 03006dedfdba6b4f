/**
 * Login Handler
 *
 * POST /api/auth/login. Unknown usernames and wrong passwords both return
 * 401 with the same message.
 */

use axum::{extract::State, response::Json};
use std::sync::Arc;

use crate::backend::auth::handlers::types::{AuthResponse, LoginRequest, UserResponse};
use crate::backend::auth::sessions::SessionManager;
use crate::backend::auth::users::UserStore;
use crate::backend::error::BackendError;

pub async fn login(
    State(users): State<Arc<UserStore>>,
    State(sessions): State<Arc<SessionManager>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, BackendError> {
    tracing::info!("[Auth] Login request for username: {}", request.username);

    let user = users.verify_credentials(&request.username, &request.password).await?;
    let token = sessions.issue(&user.username)?;

    Ok(Json(AuthResponse {
        token,
        user: UserResponse {
            username: user.username,
            created_at: user.created_at.to_rfc3339(),
        },
    }))
}
