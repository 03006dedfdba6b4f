//! Authentication Module
//!
//! This module handles user registration, login and token verification.
//! The rest of the backend only depends on `SessionManager::require_user`,
//! which turns a presented token into a username or fails with
//! `Unauthorized`.
//!
//! # Architecture
//!
//! - **`users`** - In-memory account table with bcrypt password hashes
//! - **`sessions`** - JWT token issue and verification
//! - **`handlers`** - HTTP handlers for authentication endpoints
//!
//! # Module Structure
//!
//! ```text
//! auth/
//! ├── mod.rs          - Module exports and documentation
//! ├── users.rs        - UserStore
//! ├── sessions.rs     - SessionManager
//! └── handlers/       - HTTP handlers
//! ```
//!
//! # Authentication Flow
//!
//! 1. **Signup**: username and password → account created → JWT token returned
//! 2. **Login**: username and password → credentials verified → JWT token returned
//! 3. **Get Me**: JWT token → token verified → user info returned
//!
//! # Security
//!
//! - Passwords are hashed using bcrypt before storage
//! - Tokens expire after the configured TTL (30 days by default)
//! - Invalid credentials return 401 (no information leakage)

/// User accounts
pub mod users;

/// JWT token generation and validation
pub mod sessions;

/// HTTP handlers for authentication endpoints
pub mod handlers;

pub use handlers::types::{AuthResponse, LoginRequest, SignupRequest, UserResponse};
pub use handlers::{get_me, login, signup};
pub use sessions::{Claims, SessionManager};
pub use users::{User, UserStore};
