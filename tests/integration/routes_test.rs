//! HTTP route tests

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use notecollab::backend::routes::api_routes::{HealthResponse, PresenceResponse};
use notecollab::backend::routes::create_router;
use notecollab::shared::NotebookRecord;
use pretty_assertions::assert_eq;
use tower::ServiceExt;

use crate::common::{user, TestApp};

async fn get(app: &TestApp, uri: &str) -> (StatusCode, Vec<u8>) {
    let response = create_router(app.state.clone())
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, body.to_vec())
}

#[tokio::test]
async fn test_health() {
    let app = TestApp::new();
    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    let health: HealthResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(health.status, "ok");
}

#[tokio::test]
async fn test_presence_snapshot() {
    let app = TestApp::new();
    let id = app.seed(NotebookRecord::new("alice", "Plan")).await;
    let (alice, _rx) = app.connect(user("alice"));
    app.state.collab.join_notebook(alice, id).await.unwrap();
    app.state.presence.start_typing(alice, id).unwrap();

    let (status, body) = get(&app, &format!("/api/notebooks/{}/presence", id)).await;
    assert_eq!(status, StatusCode::OK);

    let snapshot: PresenceResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(snapshot.notebook_id, id);
    assert_eq!(snapshot.members.len(), 1);
    assert_eq!(snapshot.members[0].id, "alice");
    assert_eq!(snapshot.typing, vec!["alice".to_string()]);
}

#[tokio::test]
async fn test_presence_of_empty_room() {
    let app = TestApp::new();
    let (status, body) = get(&app, &format!("/api/notebooks/{}/presence", uuid::Uuid::new_v4())).await;
    assert_eq!(status, StatusCode::OK);
    let snapshot: PresenceResponse = serde_json::from_slice(&body).unwrap();
    assert!(snapshot.members.is_empty());
    assert!(snapshot.typing.is_empty());
}

#[tokio::test]
async fn test_bad_notebook_id_and_unknown_path() {
    let app = TestApp::new();
    let (status, _) = get(&app, "/api/notebooks/not-a-uuid/presence").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = get(&app, "/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
