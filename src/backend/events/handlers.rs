/**
 * Event Handlers
 *
 * # Routes
 *
 * - `GET /api/projects/{project_id}/events` - list, ordered by date then id
 * - `POST /api/projects/{project_id}/events` - create (version 1)
 * - `PUT /api/projects/{project_id}/events/{event_id}` - update; the body
 *   carries the version the client last saw
 * - `DELETE /api/projects/{project_id}/events/{event_id}` - delete
 *
 * A stale version yields 409 with `code: "version_conflict"` and the
 * `current_version`, so the client can refetch and retry.
 */

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::backend::error::BackendError;
use crate::backend::events::store::EventStore;
use crate::backend::middleware::AuthUser;
use crate::shared::{EventId, ProjectEvent, ProjectId};

#[derive(Deserialize, Serialize, Debug)]
pub struct CreateEventRequest {
    pub title: String,
    /// ISO calendar date (`YYYY-MM-DD`)
    pub date: NaiveDate,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct UpdateEventRequest {
    pub title: String,
    pub date: NaiveDate,
    /// Version the client last observed
    pub version: u64,
}

pub async fn list_events(
    AuthUser(username): AuthUser,
    Path(project_id): Path<ProjectId>,
    State(events): State<Arc<EventStore>>,
) -> Result<Json<Vec<ProjectEvent>>, BackendError> {
    Ok(Json(events.list(project_id, &username).await?))
}

pub async fn create_event(
    AuthUser(username): AuthUser,
    Path(project_id): Path<ProjectId>,
    State(events): State<Arc<EventStore>>,
    Json(request): Json<CreateEventRequest>,
) -> Result<(StatusCode, Json<ProjectEvent>), BackendError> {
    let event = events
        .create(project_id, &request.title, request.date, &username)
        .await?;
    Ok((StatusCode::CREATED, Json(event)))
}

pub async fn update_event(
    AuthUser(username): AuthUser,
    Path((project_id, event_id)): Path<(ProjectId, EventId)>,
    State(events): State<Arc<EventStore>>,
    Json(request): Json<UpdateEventRequest>,
) -> Result<Json<ProjectEvent>, BackendError> {
    let event = events
        .update(project_id, event_id, &request.title, request.date, request.version, &username)
        .await?;
    Ok(Json(event))
}

pub async fn delete_event(
    AuthUser(username): AuthUser,
    Path((project_id, event_id)): Path<(ProjectId, EventId)>,
    State(events): State<Arc<EventStore>>,
) -> Result<StatusCode, BackendError> {
    events.delete(project_id, event_id, &username).await?;
    Ok(StatusCode::NO_CONTENT)
}
