/**
 * Session Management and JWT Tokens
 *
 * This module handles JWT token generation and validation for user
 * sessions. `require_user` is the single entry point every other
 * component uses to turn a presented token into a username.
 */

use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::backend::auth::users::UserStore;
use crate::backend::error::BackendError;
use crate::shared::UserId;

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Username
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
    /// Issued at time (Unix timestamp)
    pub iat: u64,
}

pub struct SessionManager {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl_secs: u64,
    users: Arc<UserStore>,
}

fn now_secs() -> u64 {
    u64::try_from(Utc::now().timestamp()).unwrap_or_default()
}

impl SessionManager {
    /// Create a session manager signing HS256 tokens with `secret`
    pub fn new(secret: &str, ttl_secs: u64, users: Arc<UserStore>) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::default(),
            ttl_secs,
            users,
        }
    }

    /// Issue a token for `username`
    pub fn issue(&self, username: &str) -> Result<String, BackendError> {
        let iat = now_secs();
        let claims = Claims {
            sub: username.to_string(),
            exp: iat.saturating_add(self.ttl_secs),
            iat,
        };
        self.sign(&claims)
    }

    fn sign(&self, claims: &Claims) -> Result<String, BackendError> {
        encode(&Header::default(), claims, &self.encoding).map_err(|e| {
            tracing::error!("[Auth] Failed to sign token: {:?}", e);
            BackendError::internal("Failed to create token")
        })
    }

    /// Verify signature and expiry of a token
    pub fn verify_token(&self, token: &str) -> Result<Claims, BackendError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!("[Auth] Rejected token: {}", e);
                BackendError::unauthorized("Invalid or expired token")
            })
    }

    /// Resolve a presented token to a registered user
    ///
    /// Fails with `Unauthorized` when the token is absent, malformed,
    /// expired or names a user that does not exist.
    pub async fn require_user(&self, token: Option<&str>) -> Result<UserId, BackendError> {
        let token = token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| BackendError::unauthorized("Missing token"))?;
        let claims = self.verify_token(token)?;

        if !self.users.exists(&claims.sub).await {
            tracing::warn!("[Auth] Token for unknown user {}", claims.sub);
            return Err(BackendError::unauthorized("Unknown user"));
        }
        Ok(claims.sub)
    }
}
