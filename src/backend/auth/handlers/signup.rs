/**
 * Signup Handler
 *
 * This module implements the user registration handler for POST /api/auth/signup.
 *
 * # Registration Process
 *
 * 1. Validate username format and password length
 * 2. Hash password using bcrypt and store the account
 * 3. Generate JWT token
 * 4. Return token and user info
 */

use axum::{extract::State, http::StatusCode, response::Json};
use std::sync::Arc;

use crate::backend::auth::handlers::types::{AuthResponse, SignupRequest, UserResponse};
use crate::backend::auth::sessions::SessionManager;
use crate::backend::auth::users::UserStore;
use crate::backend::error::BackendError;

/// Sign up handler
///
/// # Errors
///
/// * `400 Bad Request` - invalid username or password too short
/// * `409 Conflict` - username already taken
/// * `500 Internal Server Error` - hashing or token signing failed
///
/// # Example Request
///
/// ```http
/// POST /api/auth/signup HTTP/1.1
/// Content-Type: application/json
///
/// { "username": "alice", "password": "securepassword123" }
/// ```
pub async fn signup(
    State(users): State<Arc<UserStore>>,
    State(sessions): State<Arc<SessionManager>>,
    Json(request): Json<SignupRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), BackendError> {
    tracing::info!("[Auth] Signup request for username: {}", request.username);

    let user = users.create_user(&request.username, &request.password).await?;
    let token = sessions.issue(&user.username)?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: UserResponse {
                username: user.username,
                created_at: user.created_at.to_rfc3339(),
            },
        }),
    ))
}
