/**
 * User Accounts
 *
 * In-memory account table. Usernames are the user identifiers used
 * everywhere else (memberships, event owners, tokens).
 */

use bcrypt::{hash, verify};
use chrono::{DateTime, Utc};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::backend::error::BackendError;
use crate::shared::{SharedError, UserId};

/// Minimum password length accepted at signup
pub const MIN_PASSWORD_LEN: usize = 8;

/// A registered user
#[derive(Debug, Clone)]
pub struct User {
    /// Unique username (3-30 chars, alphanumeric + underscore)
    pub username: UserId,
    /// Hashed password (bcrypt)
    pub password_hash: String,
    /// Created at timestamp
    pub created_at: DateTime<Utc>,
}

/// Validate username format
///
/// Usernames must be:
/// - 3-30 characters long
/// - Contain only alphanumeric characters and underscores
/// - Start with a letter
pub fn is_valid_username(username: &str) -> bool {
    if username.len() < 3 || username.len() > 30 {
        return false;
    }

    let mut chars = username.chars();

    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }

    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

pub struct UserStore {
    users: RwLock<HashMap<UserId, User>>,
    bcrypt_cost: u32,
}

impl UserStore {
    pub fn new(bcrypt_cost: u32) -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
            bcrypt_cost,
        }
    }

    /// Register a new account
    ///
    /// # Errors
    ///
    /// * `SharedError` (400) - invalid username or short password
    /// * `Conflict` (409) - username already taken
    pub async fn create_user(&self, username: &str, password: &str) -> Result<User, BackendError> {
        if !is_valid_username(username) {
            return Err(SharedError::validation(
                "username",
                "Username must be 3-30 chars, start with a letter, and contain only letters, numbers, and underscores",
            )
            .into());
        }
        if password.len() < MIN_PASSWORD_LEN {
            return Err(SharedError::validation("password", "Password must be at least 8 characters").into());
        }
        if self.exists(username).await {
            return Err(BackendError::conflict("Username already taken"));
        }

        // hashing is slow; keep it outside the lock
        let password_hash = hash(password, self.bcrypt_cost).map_err(|e| {
            tracing::error!("[Auth] Failed to hash password: {:?}", e);
            BackendError::internal("Failed to hash password")
        })?;

        let mut users = self.users.write().await;
        match users.entry(username.to_string()) {
            Entry::Occupied(_) => Err(BackendError::conflict("Username already taken")),
            Entry::Vacant(slot) => {
                let user = User {
                    username: username.to_string(),
                    password_hash,
                    created_at: Utc::now(),
                };
                slot.insert(user.clone());
                tracing::info!("[Auth] Registered user {}", username);
                Ok(user)
            }
        }
    }

    pub async fn get_user(&self, username: &str) -> Option<User> {
        self.users.read().await.get(username).cloned()
    }

    pub async fn exists(&self, username: &str) -> bool {
        self.users.read().await.contains_key(username)
    }

    pub async fn count(&self) -> usize {
        self.users.read().await.len()
    }

    /// Check a username/password pair
    ///
    /// Unknown users and wrong passwords produce the same error.
    pub async fn verify_credentials(&self, username: &str, password: &str) -> Result<User, BackendError> {
        let invalid = || BackendError::unauthorized("Invalid username or password");

        let user = self.get_user(username).await.ok_or_else(invalid)?;
        let matches = verify(password, &user.password_hash).map_err(|e| {
            tracing::error!("[Auth] Failed to verify password hash: {:?}", e);
            BackendError::internal("Failed to verify password")
        })?;

        if matches {
            Ok(user)
        } else {
            tracing::warn!("[Auth] Failed login for {}", username);
            Err(invalid())
        }
    }
}
