/**
 * Event Store
 *
 * Authoritative in-memory table of project events.
 *
 * # Consistency
 *
 * - Membership is checked before anything else, so a non-member gets
 *   `Forbidden` (or `NotFound` for an unknown project) without learning
 *   whether an event exists.
 * - `update` compares the presented version and applies the change under a
 *   single write-lock acquisition: of several callers presenting the same
 *   version, exactly one wins and the version grows by exactly one.
 * - Every successful mutation hands one `ChangeRecord` to the publisher
 *   after the table has changed and before the write lock is released, so
 *   notifications leave in commit order and never describe a change that
 *   did not happen.
 */

use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::backend::error::BackendError;
use crate::backend::projects::membership::MembershipGuard;
use crate::backend::sync::publisher::ChangePublisher;
use crate::shared::project::normalize_title;
use crate::shared::{ChangeRecord, EventId, ProjectEvent, ProjectId};

struct EventTable {
    next_id: EventId,
    events: BTreeMap<EventId, ProjectEvent>,
}

impl EventTable {
    fn lookup_mut(&mut self, project_id: ProjectId, event_id: EventId) -> Result<&mut ProjectEvent, BackendError> {
        self.events
            .get_mut(&event_id)
            .filter(|event| event.project_id == project_id)
            .ok_or_else(|| BackendError::not_found("Event"))
    }
}

pub struct EventStore {
    table: RwLock<EventTable>,
    membership: Arc<MembershipGuard>,
    publisher: ChangePublisher,
}

impl EventStore {
    pub fn new(membership: Arc<MembershipGuard>, publisher: ChangePublisher) -> Self {
        Self {
            table: RwLock::new(EventTable {
                next_id: 1,
                events: BTreeMap::new(),
            }),
            membership,
            publisher,
        }
    }

    /// Create an event at version 1
    pub async fn create(
        &self,
        project_id: ProjectId,
        title: &str,
        date: NaiveDate,
        caller: &str,
    ) -> Result<ProjectEvent, BackendError> {
        self.membership.require_member(project_id, caller).await?;
        let title = normalize_title(title)?;

        let mut table = self.table.write().await;
        let id = table.next_id;
        table.next_id += 1;

        let event = ProjectEvent::new(id, project_id, title, date, caller.to_string());
        table.events.insert(id, event.clone());
        self.publisher.publish(ChangeRecord::created(&event));

        tracing::info!("[Events] {} created event {} in project {}", caller, id, project_id);
        Ok(event)
    }

    /// Replace title and date if `expected_version` is still current
    ///
    /// # Errors
    ///
    /// * `NotFound` - unknown project, or no such event in the project
    /// * `Forbidden` - caller is not a member
    /// * `VersionConflict` - the event changed since `expected_version`
    pub async fn update(
        &self,
        project_id: ProjectId,
        event_id: EventId,
        title: &str,
        date: NaiveDate,
        expected_version: u64,
        caller: &str,
    ) -> Result<ProjectEvent, BackendError> {
        self.membership.require_member(project_id, caller).await?;
        let title = normalize_title(title)?;

        let mut table = self.table.write().await;
        let event = table.lookup_mut(project_id, event_id)?;
        if event.version != expected_version {
            tracing::debug!(
                "[Events] Stale update of event {} by {}: expected {}, current {}",
                event_id,
                caller,
                expected_version,
                event.version
            );
            return Err(BackendError::version_conflict(event_id, expected_version, event.version));
        }

        event.apply_update(title, date);
        let updated = event.clone();
        self.publisher.publish(ChangeRecord::updated(&updated));

        tracing::info!(
            "[Events] {} updated event {} in project {} to version {}",
            caller,
            event_id,
            project_id,
            updated.version
        );
        Ok(updated)
    }

    /// Remove an event; no version check
    pub async fn delete(&self, project_id: ProjectId, event_id: EventId, caller: &str) -> Result<(), BackendError> {
        self.membership.require_member(project_id, caller).await?;

        let mut table = self.table.write().await;
        table.lookup_mut(project_id, event_id)?;
        table.events.remove(&event_id);
        self.publisher.publish(ChangeRecord::deleted(project_id, event_id));

        tracing::info!("[Events] {} deleted event {} in project {}", caller, event_id, project_id);
        Ok(())
    }

    /// Events of a project ordered by date, then id
    pub async fn list(&self, project_id: ProjectId, caller: &str) -> Result<Vec<ProjectEvent>, BackendError> {
        self.membership.require_member(project_id, caller).await?;

        let table = self.table.read().await;
        let mut events: Vec<ProjectEvent> = table
            .events
            .values()
            .filter(|event| event.project_id == project_id)
            .cloned()
            .collect();
        events.sort_by(|a, b| a.date.cmp(&b.date).then(a.id.cmp(&b.id)));
        Ok(events)
    }

    pub async fn get(
        &self,
        project_id: ProjectId,
        event_id: EventId,
        caller: &str,
    ) -> Result<ProjectEvent, BackendError> {
        self.membership.require_member(project_id, caller).await?;

        let table = self.table.read().await;
        table
            .events
            .get(&event_id)
            .filter(|event| event.project_id == project_id)
            .cloned()
            .ok_or_else(|| BackendError::not_found("Event"))
    }
}
