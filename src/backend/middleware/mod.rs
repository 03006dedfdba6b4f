//! Middleware Module
//!
//! Request processing shared by the HTTP handlers.
//!
//! # Architecture
//!
//! - **`auth`** - `AuthUser` extractor for routes that require a signed-in user
//!
//! # Example
//!
//! ```rust,no_run
//! use calsync::backend::middleware::AuthUser;
//!
//! async fn handler(AuthUser(username): AuthUser) -> String {
//!     format!("hello {username}")
//! }
//! ```

pub mod auth;

pub use auth::{bearer_token, AuthUser};
