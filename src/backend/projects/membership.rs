/**
 * Membership Guard
 *
 * Owns projects and their member lists, and answers the one question every
 * other component asks: may this user act on this project?
 *
 * Reads always see the latest committed membership; there is no cache.
 */

use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

use crate::backend::error::BackendError;
use crate::shared::project::normalize_project_name;
use crate::shared::{Membership, Project, ProjectId, Role, UserId};

#[derive(Default)]
struct ProjectTables {
    next_id: ProjectId,
    projects: BTreeMap<ProjectId, Project>,
    members: HashMap<ProjectId, BTreeMap<UserId, Role>>,
}

pub struct MembershipGuard {
    tables: RwLock<ProjectTables>,
}

impl Default for MembershipGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl MembershipGuard {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(ProjectTables {
                next_id: 1,
                ..ProjectTables::default()
            }),
        }
    }

    /// Create a project; `owner` becomes its only owner
    pub async fn create_project(&self, name: &str, owner: &str) -> Result<Project, BackendError> {
        let name = normalize_project_name(name)?;

        let mut tables = self.tables.write().await;
        let id = tables.next_id;
        tables.next_id += 1;

        let project = Project {
            id,
            name,
            owner: owner.to_string(),
            created_at: Utc::now(),
        };
        tables.projects.insert(id, project.clone());
        tables
            .members
            .entry(id)
            .or_default()
            .insert(owner.to_string(), Role::Owner);

        tracing::info!("[Projects] {} created project {} ({})", owner, id, project.name);
        Ok(project)
    }

    pub async fn is_member(&self, project_id: ProjectId, user: &str) -> bool {
        self.role_of(project_id, user).await.is_some()
    }

    pub async fn role_of(&self, project_id: ProjectId, user: &str) -> Option<Role> {
        self.tables
            .read()
            .await
            .members
            .get(&project_id)
            .and_then(|members| members.get(user))
            .copied()
    }

    /// Gate for every project-scoped operation
    ///
    /// `NotFound` if the project does not exist, `Forbidden` if `user` holds
    /// no role in it.
    pub async fn require_member(&self, project_id: ProjectId, user: &str) -> Result<Role, BackendError> {
        let tables = self.tables.read().await;
        if !tables.projects.contains_key(&project_id) {
            return Err(BackendError::not_found("Project"));
        }
        tables
            .members
            .get(&project_id)
            .and_then(|members| members.get(user))
            .copied()
            .ok_or_else(|| {
                tracing::warn!("[Projects] {} is not a member of project {}", user, project_id);
                BackendError::forbidden("Not a member of this project")
            })
    }

    pub async fn require_owner(&self, project_id: ProjectId, user: &str) -> Result<(), BackendError> {
        let role = self.require_member(project_id, user).await?;
        if role.can_manage_members() {
            Ok(())
        } else {
            Err(BackendError::forbidden("Only the project owner can do this"))
        }
    }

    /// Add `user` as a member; only the owner may do this
    ///
    /// The caller is responsible for checking that `user` is a registered
    /// account.
    pub async fn add_member(
        &self,
        project_id: ProjectId,
        actor: &str,
        user: &str,
    ) -> Result<Membership, BackendError> {
        let mut tables = self.tables.write().await;
        if !tables.projects.contains_key(&project_id) {
            return Err(BackendError::not_found("Project"));
        }

        let members = tables.members.entry(project_id).or_default();
        match members.get(actor) {
            Some(role) if role.can_manage_members() => {}
            _ => {
                tracing::warn!("[Projects] {} may not add members to project {}", actor, project_id);
                return Err(BackendError::forbidden("Only the project owner can add members"));
            }
        }
        if members.contains_key(user) {
            return Err(BackendError::conflict(format!("{user} is already a member of this project")));
        }

        members.insert(user.to_string(), Role::Member);
        tracing::info!("[Projects] {} added {} to project {}", actor, user, project_id);

        Ok(Membership {
            project_id,
            user_id: user.to_string(),
            role: Role::Member,
        })
    }

    /// Member list, visible to members only
    pub async fn members(&self, project_id: ProjectId, caller: &str) -> Result<Vec<Membership>, BackendError> {
        self.require_member(project_id, caller).await?;

        let tables = self.tables.read().await;
        let members = tables
            .members
            .get(&project_id)
            .map(|members| {
                members
                    .iter()
                    .map(|(user, role)| Membership {
                        project_id,
                        user_id: user.clone(),
                        role: *role,
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(members)
    }

    /// Projects `user` belongs to, with the role held in each
    pub async fn projects_for(&self, user: &str) -> Vec<(Project, Role)> {
        let tables = self.tables.read().await;
        tables
            .projects
            .values()
            .filter_map(|project| {
                tables
                    .members
                    .get(&project.id)
                    .and_then(|members| members.get(user))
                    .map(|role| (project.clone(), *role))
            })
            .collect()
    }
}
