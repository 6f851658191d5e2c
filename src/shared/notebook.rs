/**
 * Notebook Model
 *
 * Types describing the shared editable entity as far as the real-time core
 * needs to know about it: sharing permissions, the optional password, the
 * owner/collaborator list and the monotonically increasing version.
 */
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Notebook identifier
pub type NotebookId = Uuid;

/// Who a notebook is shared with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    /// Only the owner
    #[default]
    Private,
    /// Owner plus listed collaborators
    Collaborators,
    /// Anyone who can reach the notebook
    Everyone,
}

impl Permission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::Private => "private",
            Permission::Collaborators => "collaborators",
            Permission::Everyone => "everyone",
        }
    }

    /// Parse the textual form stored in the database
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "private" => Some(Permission::Private),
            "collaborators" => Some(Permission::Collaborators),
            "everyone" => Some(Permission::Everyone),
            _ => None,
        }
    }
}

/// What a caller wants to do with a notebook
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessIntent {
    Read,
    Write,
}

/// Authoritative notebook metadata and content as held by the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotebookRecord {
    pub id: NotebookId,
    pub title: String,
    pub content: String,
    /// Incremented by exactly one on every accepted save
    pub version: i64,
    pub permissions: Permission,
    /// bcrypt hash; `None` when the notebook has no password
    pub password_hash: Option<String>,
    pub owner_id: String,
    pub collaborator_ids: Vec<String>,
    pub updated_at: DateTime<Utc>,
}

impl NotebookRecord {
    /// Create a fresh notebook at version 1
    pub fn new(owner_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            content: String::new(),
            version: 1,
            permissions: Permission::Private,
            password_hash: None,
            owner_id: owner_id.into(),
            collaborator_ids: Vec::new(),
            updated_at: Utc::now(),
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    pub fn with_version(mut self, version: i64) -> Self {
        self.version = version;
        self
    }

    pub fn with_permissions(mut self, permissions: Permission) -> Self {
        self.permissions = permissions;
        self
    }

    pub fn with_password_hash(mut self, hash: impl Into<String>) -> Self {
        self.password_hash = Some(hash.into());
        self
    }

    pub fn with_collaborator(mut self, user_id: impl Into<String>) -> Self {
        self.collaborator_ids.push(user_id.into());
        self
    }

    pub fn has_password(&self) -> bool {
        self.password_hash.is_some()
    }

    pub fn is_owner(&self, user_id: &str) -> bool {
        self.owner_id == user_id
    }

    pub fn is_collaborator(&self, user_id: &str) -> bool {
        self.collaborator_ids.iter().any(|id| id == user_id)
    }

    /// Snapshot handed to a writer whose version is stale
    pub fn conflict_record(&self) -> ConflictRecord {
        ConflictRecord {
            server_version: self.version,
            server_content: self.content.clone(),
            server_title: self.title.clone(),
        }
    }
}

/// Authoritative state returned to a stale writer. Never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictRecord {
    pub server_version: i64,
    pub server_content: String,
    pub server_title: String,
}
