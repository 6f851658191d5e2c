/**
 * Socket Event Contract
 *
 * This module defines the events exchanged over the notebook WebSocket.
 * Every frame is a JSON text message of the form
 * `{"event": "<name>", "data": {...}}`, with camelCase event names and
 * payload fields.
 *
 * # Directions
 *
 * - [`ClientEvent`] - sent by editing clients to the server
 * - [`ServerEvent`] - sent by the server to one session or fanned out to a room
 */
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::error::SharedError;
use crate::shared::identity::{Identity, Role};
use crate::shared::notebook::{ConflictRecord, NotebookId};

/// Room member as presented to other clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceUser {
    /// Identity id, or a session-scoped key for anonymous members
    pub id: String,
    pub session_id: Uuid,
    pub name: String,
    /// `authenticated`, `guest` or `anonymous`
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub joined_at: DateTime<Utc>,
}

impl PresenceUser {
    pub fn from_identity(identity: &Identity, session_id: Uuid, joined_at: DateTime<Utc>) -> Self {
        Self {
            id: identity.presence_key(session_id),
            session_id,
            name: identity.display_name().to_string(),
            kind: identity.kind().to_string(),
            role: identity.role(),
            email: identity.email().map(str::to_string),
            joined_at,
        }
    }
}

/// Events sent from a client to the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ClientEvent {
    JoinNotebook {
        notebook_id: NotebookId,
    },
    LeaveNotebook {
        notebook_id: NotebookId,
    },
    /// Answer the password challenge of a protected notebook
    UnlockNotebook {
        notebook_id: NotebookId,
        password: String,
    },
    UpdateNotebook {
        notebook_id: NotebookId,
        #[serde(default)]
        title: Option<String>,
        #[serde(default)]
        content: Option<String>,
        /// Last version the client observed
        #[serde(default)]
        version: Option<i64>,
    },
    Typing {
        notebook_id: NotebookId,
    },
    StopTyping {
        notebook_id: NotebookId,
    },
    CursorPosition {
        notebook_id: NotebookId,
        position: serde_json::Value,
    },
}

impl ClientEvent {
    /// Decode a WebSocket text frame and check its payload
    pub fn from_frame(frame: &str) -> Result<Self, SharedError> {
        let event: Self = serde_json::from_str(frame)?;
        event.validate()?;
        Ok(event)
    }

    /// Reject payloads that parse but cannot be acted on
    pub fn validate(&self) -> Result<(), SharedError> {
        match self {
            ClientEvent::UpdateNotebook {
                title: None,
                content: None,
                ..
            } => Err(SharedError::invalid_field(
                "content",
                "update carries neither title nor content",
            )),
            ClientEvent::UnlockNotebook { password, .. } if password.is_empty() => {
                Err(SharedError::invalid_field("password", "must not be empty"))
            }
            _ => Ok(()),
        }
    }

    pub fn to_frame(&self) -> Result<String, SharedError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn notebook_id(&self) -> NotebookId {
        match self {
            ClientEvent::JoinNotebook { notebook_id }
            | ClientEvent::LeaveNotebook { notebook_id }
            | ClientEvent::UnlockNotebook { notebook_id, .. }
            | ClientEvent::UpdateNotebook { notebook_id, .. }
            | ClientEvent::Typing { notebook_id }
            | ClientEvent::StopTyping { notebook_id }
            | ClientEvent::CursorPosition { notebook_id, .. } => *notebook_id,
        }
    }
}

/// Events sent from the server to clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ServerEvent {
    /// Sent to the joining session only
    JoinedNotebook {
        notebook_id: NotebookId,
        current_users: Vec<PresenceUser>,
    },
    LeftNotebook {
        notebook_id: NotebookId,
    },
    NotebookUnlocked {
        notebook_id: NotebookId,
    },
    UserJoined {
        user: PresenceUser,
        timestamp: DateTime<Utc>,
    },
    UserLeft {
        user: PresenceUser,
        timestamp: DateTime<Utc>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
    /// Fanned out to every room member except the writer
    NotebookUpdated {
        notebook_id: NotebookId,
        title: String,
        content: String,
        version: i64,
        updated_by: PresenceUser,
        timestamp: DateTime<Utc>,
    },
    /// Sent to the writer only
    UpdateConfirmed {
        version: i64,
        timestamp: DateTime<Utc>,
    },
    /// Sent to a stale writer only
    ConflictDetected(ConflictRecord),
    UserTyping {
        user: PresenceUser,
        timestamp: DateTime<Utc>,
    },
    UserStoppedTyping {
        user: PresenceUser,
        timestamp: DateTime<Utc>,
    },
    UserCursorPosition {
        user: PresenceUser,
        position: serde_json::Value,
        timestamp: DateTime<Utc>,
    },
    Error {
        message: String,
    },
}

impl ServerEvent {
    pub fn error(message: impl Into<String>) -> Self {
        ServerEvent::Error {
            message: message.into(),
        }
    }

    /// Wire name of the event, used in logs
    pub fn name(&self) -> &'static str {
        match self {
            ServerEvent::JoinedNotebook { .. } => "joinedNotebook",
            ServerEvent::LeftNotebook { .. } => "leftNotebook",
            ServerEvent::NotebookUnlocked { .. } => "notebookUnlocked",
            ServerEvent::UserJoined { .. } => "userJoined",
            ServerEvent::UserLeft { .. } => "userLeft",
            ServerEvent::NotebookUpdated { .. } => "notebookUpdated",
            ServerEvent::UpdateConfirmed { .. } => "updateConfirmed",
            ServerEvent::ConflictDetected(_) => "conflictDetected",
            ServerEvent::UserTyping { .. } => "userTyping",
            ServerEvent::UserStoppedTyping { .. } => "userStoppedTyping",
            ServerEvent::UserCursorPosition { .. } => "userCursorPosition",
            ServerEvent::Error { .. } => "error",
        }
    }

    pub fn to_frame(&self) -> Result<String, SharedError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_frame(frame: &str) -> Result<Self, SharedError> {
        Ok(serde_json::from_str(frame)?)
    }
}
