//! Projects Module
//!
//! Shared project spaces and their memberships.
//!
//! # Module Structure
//!
//! ```text
//! projects/
//! ├── mod.rs          - Module exports and documentation
//! ├── membership.rs   - MembershipGuard (projects + member roles)
//! └── handlers.rs     - HTTP handlers
//! ```
//!
//! Every project-scoped operation in the backend, including joining a live
//! room, goes through `MembershipGuard::require_member` first.

pub mod membership;

pub mod handlers;

pub use handlers::{
    add_member, create_project, list_members, list_projects, presence, AddMemberRequest,
    CreateProjectRequest, PresenceResponse, ProjectSummary,
};
pub use membership::MembershipGuard;
