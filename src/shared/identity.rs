//! Connection Identity
//!
//! Every live connection carries exactly one [`Identity`], fixed at handshake
//! time. It is a closed set of variants so that access checks, presence
//! payloads and typing keys handle all three cases explicitly.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role attached to an authenticated account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

/// Who is on the other end of a connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Identity {
    /// Verified account holder (bearer token accepted)
    Authenticated {
        id: String,
        name: String,
        email: String,
        role: Role,
    },
    /// Self-described guest, not verified
    Guest { id: String, name: String },
    /// No credentials at all
    Anonymous,
}

impl Identity {
    /// Stable account/guest id, if the identity has one
    pub fn id(&self) -> Option<&str> {
        match self {
            Identity::Authenticated { id, .. } | Identity::Guest { id, .. } => Some(id),
            Identity::Anonymous => None,
        }
    }

    /// Display name shown to other room members
    pub fn display_name(&self) -> &str {
        match self {
            Identity::Authenticated { name, .. } | Identity::Guest { name, .. } => name,
            Identity::Anonymous => "Anonymous",
        }
    }

    pub fn email(&self) -> Option<&str> {
        match self {
            Identity::Authenticated { email, .. } => Some(email),
            _ => None,
        }
    }

    /// Account role; guests and anonymous connections carry none
    pub fn role(&self) -> Option<Role> {
        match self {
            Identity::Authenticated { role, .. } => Some(*role),
            _ => None,
        }
    }

    /// Short label used in presence payloads
    pub fn kind(&self) -> &'static str {
        match self {
            Identity::Authenticated { .. } => "authenticated",
            Identity::Guest { .. } => "guest",
            Identity::Anonymous => "anonymous",
        }
    }

    /// Key used in per-notebook typing sets.
    ///
    /// Anonymous connections have no id of their own, so they are keyed by
    /// the session that carries them.
    pub fn presence_key(&self, session_id: Uuid) -> String {
        match self.id() {
            Some(id) => id.to_string(),
            None => format!("anonymous:{}", session_id),
        }
    }
}
