//! WebSocket round trips against a server on 127.0.0.1:0

use std::time::Duration;

use assert_matches::assert_matches;
use notecollab::shared::{ClientEvent, NotebookRecord, Permission, ServerEvent};
use pretty_assertions::assert_eq;

use crate::common::{handshake_status, token_for, TestServer, WsClient};

#[tokio::test]
async fn test_join_edit_conflict_round_trip() {
    let server = TestServer::start(10).await;
    let id = server
        .app
        .seed(
            NotebookRecord::new("alice", "Shared")
                .with_content("draft")
                .with_version(3)
                .with_collaborator("bob"),
        )
        .await;

    let mut alice = WsClient::connect(&server.ws_url(&format!("token={}", token_for("alice"))))
        .await
        .unwrap();
    let mut bob = WsClient::connect(&server.ws_url(&format!("token={}", token_for("bob"))))
        .await
        .unwrap();

    alice.send(&ClientEvent::JoinNotebook { notebook_id: id }).await;
    assert_matches!(
        alice.recv().await,
        ServerEvent::JoinedNotebook { current_users, .. } if current_users.len() == 1
    );

    bob.send(&ClientEvent::JoinNotebook { notebook_id: id }).await;
    assert_matches!(
        bob.recv().await,
        ServerEvent::JoinedNotebook { current_users, .. } if current_users.len() == 2
    );
    assert_matches!(alice.recv().await, ServerEvent::UserJoined { user, .. } if user.id == "bob");

    alice
        .send(&ClientEvent::UpdateNotebook {
            notebook_id: id,
            title: None,
            content: Some("alice wins".to_string()),
            version: Some(3),
        })
        .await;
    assert_matches!(alice.recv().await, ServerEvent::UpdateConfirmed { version: 4, .. });
    assert_matches!(
        bob.recv().await,
        ServerEvent::NotebookUpdated { version: 4, content, .. } if content == "alice wins"
    );

    bob.send(&ClientEvent::UpdateNotebook {
        notebook_id: id,
        title: None,
        content: Some("bob was late".to_string()),
        version: Some(3),
    })
    .await;
    assert_matches!(
        bob.recv().await,
        ServerEvent::ConflictDetected(record)
            if record.server_version == 4 && record.server_content == "alice wins"
    );

    bob.close().await;
    assert_matches!(
        alice.recv_named("userLeft").await,
        ServerEvent::UserLeft { user, reason: Some(_), .. } if user.id == "bob"
    );
}

#[tokio::test]
async fn test_typing_relay_between_guests() {
    let server = TestServer::start(10).await;
    let id = server
        .app
        .seed(NotebookRecord::new("alice", "Open").with_permissions(Permission::Everyone))
        .await;

    let mut one = WsClient::connect(&server.ws_url("guestId=g1&guestName=One")).await.unwrap();
    let mut two = WsClient::connect(&server.ws_url("guestId=g2&guestName=Two")).await.unwrap();
    one.send(&ClientEvent::JoinNotebook { notebook_id: id }).await;
    one.recv_named("joinedNotebook").await;
    two.send(&ClientEvent::JoinNotebook { notebook_id: id }).await;
    two.recv_named("joinedNotebook").await;
    one.recv_named("userJoined").await;

    one.send(&ClientEvent::Typing { notebook_id: id }).await;
    one.send(&ClientEvent::Typing { notebook_id: id }).await;
    one.send(&ClientEvent::StopTyping { notebook_id: id }).await;

    assert_matches!(two.recv().await, ServerEvent::UserTyping { user, .. } if user.name == "One");
    assert_matches!(two.recv().await, ServerEvent::UserStoppedTyping { user, .. } if user.id == "g1");
}

#[tokio::test]
async fn test_malformed_frame_yields_error_and_keeps_connection() {
    let server = TestServer::start(10).await;
    let id = server
        .app
        .seed(NotebookRecord::new("alice", "Open").with_permissions(Permission::Everyone))
        .await;

    let mut client = WsClient::connect(&server.ws_url("")).await.unwrap();
    client.send_raw("{\"event\":\"teleport\",\"data\":{}}").await;
    assert_matches!(client.recv().await, ServerEvent::Error { message } if message.starts_with("Malformed frame"));

    client
        .send_raw(&format!(
            "{{\"event\":\"updateNotebook\",\"data\":{{\"notebookId\":\"{}\",\"version\":1}}}}",
            id
        ))
        .await;
    assert_matches!(client.recv().await, ServerEvent::Error { message } if message.contains("Invalid field 'content'"));

    client.send(&ClientEvent::Typing { notebook_id: id }).await;
    assert_matches!(client.recv().await, ServerEvent::Error { message } if message.contains("Not joined"));

    client.send(&ClientEvent::JoinNotebook { notebook_id: id }).await;
    assert_matches!(client.recv().await, ServerEvent::JoinedNotebook { .. });
}

#[tokio::test]
async fn test_bad_token_is_rejected_with_401() {
    let server = TestServer::start(10).await;
    let err = WsClient::connect(&server.ws_url("token=not-a-jwt"))
        .await
        .err()
        .expect("handshake should fail");
    assert_eq!(handshake_status(&err), Some(401));

    // the refused handshake gave its slot back
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(server.app.state.admission.tracked_addresses(), 0);
}

#[tokio::test]
async fn test_eleventh_connection_is_refused() {
    let server = TestServer::start(10).await;
    let mut clients = Vec::new();
    for _ in 0..10 {
        clients.push(WsClient::connect(&server.ws_url("")).await.unwrap());
    }

    let err = WsClient::connect(&server.ws_url(""))
        .await
        .err()
        .expect("eleventh handshake should fail");
    assert_eq!(handshake_status(&err), Some(429));

    // closing one frees a slot
    let first = clients.remove(0);
    first.close().await;
    let mut freed = false;
    for _ in 0..50 {
        tokio::time::sleep(Duration::from_millis(20)).await;
        if server.app.state.presence.session_count() == 9 {
            freed = true;
            break;
        }
    }
    assert!(freed);
    assert!(WsClient::connect(&server.ws_url("")).await.is_ok());
}
