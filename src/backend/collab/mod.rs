//! Collaborative Editing Module
//!
//! Server-side half of notebook editing. Saves are whole-document writes
//! guarded by optimistic concurrency: every accepted write increments the
//! notebook's version by exactly one, and a writer holding an older version
//! is told about the conflict instead of overwriting.
//!
//! # Architecture
//!
//! - **`store`** - `NotebookStore` trait with in-memory and Postgres backends,
//!   both offering an atomic compare-and-set on the version
//! - **`access`** - Read/write access rules (owner, collaborators, public,
//!   password)
//! - **`service`** - `CollabService`: join, unlock and the conflict-checked
//!   update path with room fan-out
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use notecollab::backend::collab::{CollabService, InMemoryNotebookStore};
//! use notecollab::backend::presence::PresenceRegistry;
//!
//! let service = CollabService::new(
//!     Arc::new(InMemoryNotebookStore::new()),
//!     Arc::new(PresenceRegistry::new()),
//! );
//! ```

/// Access rules
pub mod access;

/// Notebook persistence
pub mod store;

/// Join, unlock and update handling
pub mod service;

pub use access::can_access;
pub use service::{CollabService, UpdateOutcome, UpdateRequest};
pub use store::{CasOutcome, InMemoryNotebookStore, NotebookStore, PgNotebookStore, StoreError};
