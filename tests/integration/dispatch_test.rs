//! Client event dispatch tests

use assert_matches::assert_matches;
use notecollab::backend::error::BackendError;
use notecollab::backend::realtime::dispatch;
use notecollab::shared::{ClientEvent, NotebookRecord, Permission, ServerEvent};
use serde_json::json;

use crate::common::{drain, drain_names, guest, user, TestApp};

#[tokio::test]
async fn test_events_before_join_are_rejected() {
    let app = TestApp::new();
    let id = app.seed(NotebookRecord::new("alice", "Plan")).await;
    let (alice, _rx) = app.connect(user("alice"));

    for event in [
        ClientEvent::Typing { notebook_id: id },
        ClientEvent::StopTyping { notebook_id: id },
        ClientEvent::CursorPosition {
            notebook_id: id,
            position: json!({"line": 1}),
        },
        ClientEvent::LeaveNotebook { notebook_id: id },
    ] {
        assert_matches!(
            dispatch(&app.state, alice, event).await,
            Err(BackendError::NotJoined { .. })
        );
    }
}

#[tokio::test]
async fn test_full_session_flow() {
    let app = TestApp::new();
    let id = app
        .seed(
            NotebookRecord::new("alice", "Plan")
                .with_permissions(Permission::Everyone)
                .with_content("hello"),
        )
        .await;
    let (alice, mut alice_rx) = app.connect(user("alice"));
    let (visitor, mut visitor_rx) = app.connect(guest("g-7", "Sam"));

    dispatch(&app.state, alice, ClientEvent::JoinNotebook { notebook_id: id })
        .await
        .unwrap();
    dispatch(&app.state, visitor, ClientEvent::JoinNotebook { notebook_id: id })
        .await
        .unwrap();
    assert_eq!(drain_names(&mut visitor_rx), vec!["joinedNotebook"]);
    assert_eq!(drain_names(&mut alice_rx), vec!["joinedNotebook", "userJoined"]);

    dispatch(
        &app.state,
        visitor,
        ClientEvent::CursorPosition {
            notebook_id: id,
            position: json!({"line": 3, "ch": 9}),
        },
    )
    .await
    .unwrap();
    assert_matches!(
        drain(&mut alice_rx).as_slice(),
        [ServerEvent::UserCursorPosition { user, position, .. }]
            if user.id == "g-7" && position["ch"] == 9
    );

    dispatch(
        &app.state,
        visitor,
        ClientEvent::UpdateNotebook {
            notebook_id: id,
            title: None,
            content: Some("hello world".to_string()),
            version: Some(1),
        },
    )
    .await
    .unwrap();
    assert_eq!(drain_names(&mut visitor_rx), vec!["updateConfirmed"]);
    assert_matches!(
        drain(&mut alice_rx).as_slice(),
        [ServerEvent::NotebookUpdated { version: 2, content, updated_by, .. }]
            if content == "hello world" && updated_by.kind == "guest"
    );

    dispatch(&app.state, visitor, ClientEvent::LeaveNotebook { notebook_id: id })
        .await
        .unwrap();
    assert_eq!(drain_names(&mut visitor_rx), vec!["leftNotebook"]);
    assert_matches!(
        drain(&mut alice_rx).as_slice(),
        [ServerEvent::UserLeft { reason: Some(reason), .. }] if reason == "left"
    );
}

#[tokio::test]
async fn test_anonymous_may_read_public_notebook_but_not_private() {
    let app = TestApp::new();
    let public = app
        .seed(NotebookRecord::new("alice", "Public").with_permissions(Permission::Everyone))
        .await;
    let private = app.seed(NotebookRecord::new("alice", "Private")).await;
    let (anon, _rx) = app.connect(notecollab::shared::Identity::Anonymous);

    assert!(dispatch(&app.state, anon, ClientEvent::JoinNotebook { notebook_id: public })
        .await
        .is_ok());
    assert_matches!(
        dispatch(&app.state, anon, ClientEvent::JoinNotebook { notebook_id: private }).await,
        Err(BackendError::AccessDenied { .. })
    );
    // a refused join does not drop the current room
    assert_eq!(
        app.state.presence.session(anon).unwrap().current_room,
        Some(public)
    );
}

#[tokio::test]
async fn test_errors_map_to_error_events() {
    let err = BackendError::NotJoined {
        notebook_id: uuid::Uuid::nil(),
    };
    assert_matches!(ServerEvent::from(&err), ServerEvent::Error { message } if !message.is_empty());
}
