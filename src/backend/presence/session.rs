/**
 * Live Session State
 *
 * One `Session` exists per live connection. It is owned by the
 * `PresenceRegistry` and destroyed on disconnect. Outbound events are
 * pushed into the session's queue and written to the socket by a dedicated
 * writer task, which keeps per-sender order intact.
 */

use std::collections::HashSet;
use std::net::IpAddr;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::shared::{Identity, NotebookId, PresenceUser, ServerEvent};

pub type SessionId = Uuid;

/// Queue feeding a connection's writer task
pub type Outbox = mpsc::UnboundedSender<ServerEvent>;

#[derive(Debug, Clone)]
pub struct Session {
    pub id: SessionId,
    pub identity: Identity,
    /// Source address holding the admission slot, if any
    pub address: Option<IpAddr>,
    pub current_room: Option<NotebookId>,
    /// When the session entered its current room
    pub joined_at: DateTime<Utc>,
    pub connected_at: DateTime<Utc>,
    /// Notebooks whose password challenge this session has answered
    pub unlocked: HashSet<NotebookId>,
    outbox: Outbox,
}

impl Session {
    pub fn new(identity: Identity, address: Option<IpAddr>, outbox: Outbox) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            identity,
            address,
            current_room: None,
            joined_at: now,
            connected_at: now,
            unlocked: HashSet::new(),
            outbox,
        }
    }

    pub fn presence_user(&self) -> PresenceUser {
        PresenceUser::from_identity(&self.identity, self.id, self.joined_at)
    }

    /// Key under which this session's identity appears in typing sets
    pub fn typing_key(&self) -> String {
        self.identity.presence_key(self.id)
    }

    pub fn is_in(&self, notebook_id: NotebookId) -> bool {
        self.current_room == Some(notebook_id)
    }

    /// Queue an event for this connection; false once the writer is gone
    pub fn send(&self, event: ServerEvent) -> bool {
        self.outbox.send(event).is_ok()
    }
}
