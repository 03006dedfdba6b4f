/**
 * Project Data Model
 *
 * Projects are shared spaces owned by one user. Members of a project see
 * and edit the project's events. Every event carries a version counter that
 * doubles as its optimistic-concurrency token: it starts at 1 and grows by
 * exactly one on every successful update.
 */
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::error::SharedError;

/// Project identifier, assigned monotonically starting at 1
pub type ProjectId = u64;

/// Event identifier, unique across all projects
pub type EventId = u64;

/// Users are identified by their unique username
pub type UserId = String;

/// Role a user holds inside a project
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Creator of the project; the only role allowed to add members
    Owner,
    /// Regular member
    Member,
}

impl Role {
    /// Whether this role may add members to the project
    pub fn can_manage_members(self) -> bool {
        matches!(self, Role::Owner)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Owner => f.write_str("owner"),
            Role::Member => f.write_str("member"),
        }
    }
}

/// A shared project space
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Project {
    /// Unique project ID
    pub id: ProjectId,
    /// Display name
    pub name: String,
    /// Username of the creator (holds the owner role)
    pub owner: UserId,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// A (project, user, role) triple
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Membership {
    pub project_id: ProjectId,
    pub user_id: UserId,
    pub role: Role,
}

/// A calendar event that belongs to exactly one project
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProjectEvent {
    /// Unique event ID
    pub id: EventId,
    /// Owning project (never changes)
    pub project_id: ProjectId,
    /// Event title
    pub title: String,
    /// Calendar date, no time of day
    pub date: NaiveDate,
    /// Username of the creator (never re-assigned)
    pub owner: UserId,
    /// Concurrency token, starts at 1
    pub version: u64,
}

impl ProjectEvent {
    /// Create a fresh event at version 1
    pub fn new(
        id: EventId,
        project_id: ProjectId,
        title: String,
        date: NaiveDate,
        owner: UserId,
    ) -> Self {
        Self {
            id,
            project_id,
            title,
            date,
            owner,
            version: 1,
        }
    }

    /// Replace the mutable fields and advance the version by one
    pub fn apply_update(&mut self, title: String, date: NaiveDate) {
        self.title = title;
        self.date = date;
        self.version += 1;
    }
}

/// Trim and validate an event title
pub fn normalize_title(title: &str) -> Result<String, SharedError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(SharedError::validation("title", "Event title cannot be empty"));
    }
    if title.chars().count() > 200 {
        return Err(SharedError::validation("title", "Event title must be at most 200 characters"));
    }
    Ok(title.to_string())
}

/// Trim and validate a project name
pub fn normalize_project_name(name: &str) -> Result<String, SharedError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(SharedError::validation("name", "Project name cannot be empty"));
    }
    if name.chars().count() > 100 {
        return Err(SharedError::validation("name", "Project name must be at most 100 characters"));
    }
    Ok(name.to_string())
}
