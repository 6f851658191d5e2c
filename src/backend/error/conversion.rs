/**
 * Error Conversion
 *
 * Conversions of backend errors into the two shapes clients see:
 * - HTTP responses (handshake rejections, diagnostic routes)
 * - `error` socket events (everything after the upgrade)
 *
 * # Response Format
 *
 * ```json
 * {
 *   "error": "Error message",
 *   "status": 429
 * }
 * ```
 */

use axum::{
    response::{IntoResponse, Response},
    Json,
};

use crate::backend::error::types::BackendError;
use crate::shared::ServerEvent;

impl IntoResponse for BackendError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = serde_json::json!({
            "error": self.message(),
            "status": status.as_u16(),
        });

        (status, Json(body)).into_response()
    }
}

impl From<&BackendError> for ServerEvent {
    fn from(err: &BackendError) -> Self {
        ServerEvent::error(err.message())
    }
}
