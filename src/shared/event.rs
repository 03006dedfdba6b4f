/**
 * Change Records
 *
 * A `ChangeRecord` is published once for every committed create, update or
 * delete of a project event. It travels through the pub/sub broker and is
 * delivered verbatim to every live connection in the project's room.
 *
 * # Wire Format
 *
 * Records are flat JSON objects tagged by `type`:
 *
 * ```json
 * {"type": "created", "project_id": 1,
 *  "event": {"id": 4, "project_id": 1, "title": "Sync", "date": "2024-02-01",
 *            "owner": "alice", "version": 1}}
 * {"type": "updated", "project_id": 1, "event_id": 4}
 * {"type": "deleted", "project_id": 1, "event_id": 4}
 * ```
 *
 * Update notifications carry only the event id; clients refetch the event
 * to see the new field values.
 */
use serde::{Deserialize, Serialize};

use crate::shared::project::{EventId, ProjectEvent, ProjectId};

/// Kind of change carried by a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    Updated,
    Deleted,
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChangeKind::Created => f.write_str("created"),
            ChangeKind::Updated => f.write_str("updated"),
            ChangeKind::Deleted => f.write_str("deleted"),
        }
    }
}

/// Immutable notification of a committed event mutation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChangeRecord {
    /// A new event, carried in full
    Created {
        project_id: ProjectId,
        event: ProjectEvent,
    },
    /// An event's title/date changed
    Updated {
        project_id: ProjectId,
        event_id: EventId,
    },
    /// An event was removed
    Deleted {
        project_id: ProjectId,
        event_id: EventId,
    },
}

impl ChangeRecord {
    /// Record for a newly created event
    pub fn created(event: &ProjectEvent) -> Self {
        Self::Created {
            project_id: event.project_id,
            event: event.clone(),
        }
    }

    /// Record for an updated event
    pub fn updated(event: &ProjectEvent) -> Self {
        Self::Updated {
            project_id: event.project_id,
            event_id: event.id,
        }
    }

    /// Record for a deleted event
    pub fn deleted(project_id: ProjectId, event_id: EventId) -> Self {
        Self::Deleted {
            project_id,
            event_id,
        }
    }

    /// Project whose room receives this record
    pub fn project_id(&self) -> ProjectId {
        match self {
            Self::Created { project_id, .. }
            | Self::Updated { project_id, .. }
            | Self::Deleted { project_id, .. } => *project_id,
        }
    }

    /// Event the record refers to
    pub fn event_id(&self) -> EventId {
        match self {
            Self::Created { event, .. } => event.id,
            Self::Updated { event_id, .. } | Self::Deleted { event_id, .. } => *event_id,
        }
    }

    pub fn kind(&self) -> ChangeKind {
        match self {
            Self::Created { .. } => ChangeKind::Created,
            Self::Updated { .. } => ChangeKind::Updated,
            Self::Deleted { .. } => ChangeKind::Deleted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample_event() -> ProjectEvent {
        ProjectEvent::new(
            4,
            1,
            "Sync".to_string(),
            NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            "alice".to_string(),
        )
    }

    #[test]
    fn test_created_record_carries_full_event() {
        let record = ChangeRecord::created(&sample_event());
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["type"], "created");
        assert_eq!(json["project_id"], 1);
        assert_eq!(json["event"]["title"], "Sync");
        assert_eq!(json["event"]["version"], 1);
        assert!(json.get("event_id").is_none());
    }

    #[test]
    fn test_updated_record_carries_only_event_id() {
        let record = ChangeRecord::updated(&sample_event());
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["type"], "updated");
        assert_eq!(json["project_id"], 1);
        assert_eq!(json["event_id"], 4);
        assert!(json.get("event").is_none());
    }

    #[test]
    fn test_deleted_record_shape() {
        let record = ChangeRecord::deleted(9, 12);
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json, serde_json::json!({"type": "deleted", "project_id": 9, "event_id": 12}));
        assert_eq!(record.kind(), ChangeKind::Deleted);
        assert_eq!(record.project_id(), 9);
        assert_eq!(record.event_id(), 12);
    }

    #[test]
    fn test_decode_broker_payload() {
        let payload = r#"{"type":"updated","project_id":3,"event_id":8}"#;
        let record: ChangeRecord = serde_json::from_str(payload).unwrap();
        assert_eq!(record, ChangeRecord::Updated { project_id: 3, event_id: 8 });
    }

    #[test]
    fn test_decode_rejects_unknown_type() {
        let payload = r#"{"type":"renamed","project_id":3,"event_id":8}"#;
        assert!(serde_json::from_str::<ChangeRecord>(payload).is_err());
    }
}
