/**
 * Project Handlers
 *
 * # Routes
 *
 * - `POST /api/projects` - create a project (caller becomes owner)
 * - `GET /api/projects` - projects the caller belongs to
 * - `GET /api/projects/{project_id}/members` - member list (members only)
 * - `POST /api/projects/{project_id}/members` - add a member (owner only)
 * - `GET /api/projects/{project_id}/presence` - users with a live socket
 *   to the project on this process
 */

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::backend::auth::users::UserStore;
use crate::backend::error::BackendError;
use crate::backend::middleware::AuthUser;
use crate::backend::projects::membership::MembershipGuard;
use crate::backend::sync::registry::ConnectionRegistry;
use crate::shared::{Membership, Project, ProjectId, Role, UserId};

#[derive(Deserialize, Serialize, Debug)]
pub struct CreateProjectRequest {
    pub name: String,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct AddMemberRequest {
    pub username: String,
}

/// A project as seen by one of its members
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ProjectSummary {
    #[serde(flatten)]
    pub project: Project,
    /// Role of the requesting user
    pub role: Role,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct PresenceResponse {
    pub project_id: ProjectId,
    /// Distinct usernames, sorted
    pub online: Vec<UserId>,
    /// Open sockets, counting several tabs of one user separately
    pub connections: usize,
}

pub async fn create_project(
    AuthUser(username): AuthUser,
    State(membership): State<Arc<MembershipGuard>>,
    Json(request): Json<CreateProjectRequest>,
) -> Result<(StatusCode, Json<Project>), BackendError> {
    let project = membership.create_project(&request.name, &username).await?;
    Ok((StatusCode::CREATED, Json(project)))
}

pub async fn list_projects(
    AuthUser(username): AuthUser,
    State(membership): State<Arc<MembershipGuard>>,
) -> Json<Vec<ProjectSummary>> {
    let projects = membership
        .projects_for(&username)
        .await
        .into_iter()
        .map(|(project, role)| ProjectSummary { project, role })
        .collect();
    Json(projects)
}

pub async fn list_members(
    AuthUser(username): AuthUser,
    Path(project_id): Path<ProjectId>,
    State(membership): State<Arc<MembershipGuard>>,
) -> Result<Json<Vec<Membership>>, BackendError> {
    let members = membership.members(project_id, &username).await?;
    Ok(Json(members))
}

/// Add a registered user to the project
///
/// # Errors
///
/// * `403 Forbidden` - caller is not the owner
/// * `404 Not Found` - unknown project or unknown username
/// * `409 Conflict` - user already holds a role in the project
pub async fn add_member(
    AuthUser(username): AuthUser,
    Path(project_id): Path<ProjectId>,
    State(membership): State<Arc<MembershipGuard>>,
    State(users): State<Arc<UserStore>>,
    Json(request): Json<AddMemberRequest>,
) -> Result<(StatusCode, Json<Membership>), BackendError> {
    membership.require_owner(project_id, &username).await?;

    let invitee = request.username.trim();
    if !users.exists(invitee).await {
        return Err(BackendError::not_found("User"));
    }

    let added = membership.add_member(project_id, &username, invitee).await?;
    Ok((StatusCode::CREATED, Json(added)))
}

pub async fn presence(
    AuthUser(username): AuthUser,
    Path(project_id): Path<ProjectId>,
    State(membership): State<Arc<MembershipGuard>>,
    State(registry): State<Arc<ConnectionRegistry>>,
) -> Result<Json<PresenceResponse>, BackendError> {
    membership.require_member(project_id, &username).await?;

    Ok(Json(PresenceResponse {
        project_id,
        online: registry.online_users(project_id),
        connections: registry.room_size(project_id),
    }))
}
