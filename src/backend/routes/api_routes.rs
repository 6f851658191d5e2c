/**
 * API Route Handlers
 *
 * Read-only HTTP endpoints next to the WebSocket transport.
 *
 * # Routes
 *
 * - `GET /health` - Liveness probe
 * - `GET /api/notebooks/{id}/presence` - Current room members and typists
 */

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::backend::presence::PresenceRegistry;
use crate::backend::server::state::AppState;
use crate::shared::{NotebookId, PresenceUser};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthResponse {
    pub status: String,
}

/// Snapshot of one notebook room
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PresenceResponse {
    pub notebook_id: NotebookId,
    pub members: Vec<PresenceUser>,
    /// Presence keys of identities currently typing
    pub typing: Vec<String>,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

pub async fn notebook_presence(
    State(presence): State<Arc<PresenceRegistry>>,
    Path(notebook_id): Path<NotebookId>,
) -> Json<PresenceResponse> {
    Json(PresenceResponse {
        notebook_id,
        members: presence.room_members(notebook_id),
        typing: presence.typing_in(notebook_id),
    })
}

/// Add the API routes to `router`
pub fn configure_api_routes(router: Router<AppState>) -> Router<AppState> {
    router
        .route("/health", get(health))
        .route("/api/notebooks/{id}/presence", get(notebook_presence))
}
