/**
 * Get Current User Handler
 *
 * GET /api/auth/me - returns the account behind the bearer token.
 */

use axum::{extract::State, response::Json};
use std::sync::Arc;

use crate::backend::auth::handlers::types::UserResponse;
use crate::backend::auth::users::UserStore;
use crate::backend::error::BackendError;
use crate::backend::middleware::AuthUser;

pub async fn get_me(
    AuthUser(username): AuthUser,
    State(users): State<Arc<UserStore>>,
) -> Result<Json<UserResponse>, BackendError> {
    let user = users
        .get_user(&username)
        .await
        .ok_or_else(|| BackendError::not_found("User"))?;

    Ok(Json(UserResponse {
        username: user.username,
        created_at: user.created_at.to_rfc3339(),
    }))
}
