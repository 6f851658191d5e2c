//! Shared Module
//!
//! Types shared between the server and editing clients. Everything here is
//! platform-agnostic and designed for transmission over the notebook socket.

/// Connection identity
pub mod identity;

/// Notebook permissions, records and conflict payloads
pub mod notebook;

/// Socket event contract
pub mod event;

/// Shared error types
pub mod error;

/// Re-export commonly used types for convenience
pub use error::SharedError;
pub use event::{ClientEvent, PresenceUser, ServerEvent};
pub use identity::{Identity, Role};
pub use notebook::{AccessIntent, ConflictRecord, NotebookId, NotebookRecord, Permission};
