/**
 * Error Conversion
 *
 * This module provides conversion implementations for backend errors,
 * allowing them to be returned directly from Axum handlers.
 *
 * # Response Format
 *
 * Error responses are returned as JSON with the following structure:
 * ```json
 * {
 *   "error": "Error message",
 *   "status": 409,
 *   "code": "version_conflict",
 *   "current_version": 3
 * }
 * ```
 *
 * `current_version` is only present for version conflicts.
 */

use axum::{
    response::{IntoResponse, Json, Response},
};
use crate::backend::error::types::BackendError;

impl IntoResponse for BackendError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!("[Error] {} ({})", self, status);
        } else {
            tracing::debug!("[Error] {} ({})", self, status);
        }

        let mut body = serde_json::json!({
            "error": self.message(),
            "status": status.as_u16(),
            "code": self.code(),
        });

        if let BackendError::VersionConflict { current, .. } = &self {
            body["current_version"] = serde_json::json!(current);
        }

        (status, Json(body)).into_response()
    }
}
