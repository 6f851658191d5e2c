//! In-process application fixtures

use std::sync::Arc;

use notecollab::backend::collab::{InMemoryNotebookStore, NotebookStore};
use notecollab::backend::presence::SessionId;
use notecollab::backend::server::{AppState, ServerConfig};
use notecollab::shared::{Identity, NotebookId, NotebookRecord, ServerEvent};
use tokio::sync::mpsc;

use super::auth_helpers::TEST_SECRET;

pub fn test_config(max_connections: usize) -> ServerConfig {
    ServerConfig::builder()
        .jwt_secret(TEST_SECRET)
        .port(0)
        .max_connections_per_address(max_connections)
        .build()
        .expect("test config is valid")
}

/// Application state over an in-memory store
pub struct TestApp {
    pub state: AppState,
    pub store: Arc<InMemoryNotebookStore>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_max_connections(10)
    }

    pub fn with_max_connections(max_connections: usize) -> Self {
        let store = Arc::new(InMemoryNotebookStore::new());
        let state = AppState::new(test_config(max_connections), store.clone());
        Self { state, store }
    }

    pub async fn seed(&self, record: NotebookRecord) -> NotebookId {
        let id = record.id;
        self.store
            .insert_notebook(record)
            .await
            .expect("Failed to seed notebook");
        id
    }

    /// Register a session as the socket layer would
    pub fn connect(&self, identity: Identity) -> (SessionId, mpsc::UnboundedReceiver<ServerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.state.presence.register(identity, None, tx);
        (id, rx)
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything queued for a session so far
pub fn drain(rx: &mut mpsc::UnboundedReceiver<ServerEvent>) -> Vec<ServerEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Wire names of everything queued for a session so far
pub fn drain_names(rx: &mut mpsc::UnboundedReceiver<ServerEvent>) -> Vec<&'static str> {
    drain(rx).iter().map(ServerEvent::name).collect()
}
