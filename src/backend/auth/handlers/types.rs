/**
 * Authentication Handler Types
 *
 * Request and response bodies shared by the signup, login and me handlers.
 */

use serde::{Deserialize, Serialize};

/// Sign up request
#[derive(Deserialize, Serialize, Debug)]
pub struct SignupRequest {
    /// Chosen username (3-30 chars, alphanumeric + underscore)
    pub username: String,
    /// Password (hashed before storage)
    pub password: String,
}

/// Login request
#[derive(Deserialize, Serialize, Debug)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Auth response
///
/// Returned by signup and login. The token goes into
/// `Authorization: Bearer` for API calls and `?token=` for the live socket.
#[derive(Serialize, Deserialize, Debug)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserResponse,
}

/// User response (without sensitive data)
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct UserResponse {
    pub username: String,
    /// RFC 3339 creation timestamp
    pub created_at: String,
}
