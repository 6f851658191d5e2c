//! Optimistic concurrency integration tests

use std::sync::Arc;

use assert_matches::assert_matches;
use notecollab::backend::collab::{NotebookStore, UpdateOutcome, UpdateRequest};
use notecollab::shared::{ConflictRecord, NotebookId, NotebookRecord, ServerEvent};
use pretty_assertions::assert_eq;

use crate::common::{drain, user, TestApp};

fn content_update(notebook_id: NotebookId, content: &str, version: i64) -> UpdateRequest {
    UpdateRequest {
        notebook_id,
        title: None,
        content: Some(content.to_string()),
        client_version: Some(version),
    }
}

#[tokio::test]
async fn test_stale_writer_receives_authoritative_copy() {
    let app = TestApp::new();
    let id = app
        .seed(
            NotebookRecord::new("a", "Minutes")
                .with_content("v3 text")
                .with_version(3)
                .with_collaborator("b")
                .with_collaborator("c"),
        )
        .await;
    let (a, mut a_rx) = app.connect(user("a"));
    let (b, mut b_rx) = app.connect(user("b"));
    let (c, mut c_rx) = app.connect(user("c"));
    for session in [a, b, c] {
        app.state.collab.join_notebook(session, id).await.unwrap();
    }
    drain(&mut a_rx);
    drain(&mut b_rx);
    drain(&mut c_rx);

    let outcome = app
        .state
        .collab
        .submit_update(a, content_update(id, "A's text", 3))
        .await
        .unwrap();
    assert_matches!(outcome, UpdateOutcome::Applied { version: 4, .. });

    // everyone but the writer sees the new copy
    for rx in [&mut b_rx, &mut c_rx] {
        assert_matches!(
            drain(rx).as_slice(),
            [ServerEvent::NotebookUpdated { version: 4, updated_by, .. }] if updated_by.id == "a"
        );
    }
    assert_matches!(drain(&mut a_rx).as_slice(), [ServerEvent::UpdateConfirmed { version: 4, .. }]);

    let outcome = app
        .state
        .collab
        .submit_update(b, content_update(id, "B's text", 3))
        .await
        .unwrap();
    let expected = ConflictRecord {
        server_version: 4,
        server_content: "A's text".to_string(),
        server_title: "Minutes".to_string(),
    };
    assert_eq!(outcome, UpdateOutcome::Conflict(expected.clone()));
    assert_eq!(drain(&mut b_rx), vec![ServerEvent::ConflictDetected(expected)]);
    assert!(drain(&mut a_rx).is_empty());
    assert!(drain(&mut c_rx).is_empty());

    let stored = app.store.get_notebook(id).await.unwrap().unwrap();
    assert_eq!(stored.version, 4);
    assert_eq!(stored.content, "A's text");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_writers_on_same_version_have_one_winner() {
    let app = Arc::new(TestApp::new());
    let mut record = NotebookRecord::new("owner", "Race").with_version(10);
    for i in 0..8 {
        record = record.with_collaborator(format!("w{}", i));
    }
    let id = app.seed(record).await;

    let mut sessions = Vec::new();
    for i in 0..8 {
        let (session, rx) = app.connect(user(&format!("w{}", i)));
        app.state.collab.join_notebook(session, id).await.unwrap();
        sessions.push((session, rx));
    }

    let handles: Vec<_> = sessions
        .iter()
        .enumerate()
        .map(|(i, (session, _))| {
            let app = app.clone();
            let session = *session;
            tokio::spawn(async move {
                app.state
                    .collab
                    .submit_update(session, content_update(id, &format!("writer {}", i), 10))
                    .await
                    .unwrap()
            })
        })
        .collect();

    let mut applied = 0;
    for handle in handles {
        match handle.await.unwrap() {
            UpdateOutcome::Applied { version, .. } => {
                assert_eq!(version, 11);
                applied += 1;
            }
            UpdateOutcome::Conflict(record) => assert_eq!(record.server_version, 11),
        }
    }

    assert_eq!(applied, 1);
    assert_eq!(app.store.get_notebook(id).await.unwrap().unwrap().version, 11);
}

#[tokio::test]
async fn test_sequential_saves_increment_by_one() {
    let app = TestApp::new();
    let id = app.seed(NotebookRecord::new("a", "Log")).await;
    let (a, _rx) = app.connect(user("a"));
    app.state.collab.join_notebook(a, id).await.unwrap();

    for expected in 2..=6 {
        let outcome = app
            .state
            .collab
            .submit_update(a, content_update(id, &format!("entry {}", expected), expected - 1))
            .await
            .unwrap();
        assert_matches!(outcome, UpdateOutcome::Applied { version, .. } if version == expected);
    }
}
