//! Backend Module
//!
//! Server side of notebook collaboration: an Axum server that speaks a JSON
//! event protocol over WebSocket, tracks who is in which notebook, relays
//! typing and cursor activity, and serializes saves with optimistic
//! concurrency.
//!
//! This module is only compiled when the `ssr` feature is enabled.
//!
//! # Architecture
//!
//! - **`server`** - Application state, configuration, initialization
//! - **`routes`** - Router assembly and HTTP endpoints
//! - **`realtime`** - WebSocket handshake and event dispatch
//! - **`admission`** - Per-address connection ceiling
//! - **`auth`** - JWT verification and identity resolution
//! - **`presence`** - Sessions, rooms and typing sets
//! - **`collab`** - Access rules, notebook store, conflict-checked updates
//! - **`error`** - Backend error taxonomy
//!
//! # Module Structure
//!
//! ```text
//! backend/
//! ├── mod.rs          - Module exports and documentation
//! ├── main.rs         - notecollab-server binary
//! ├── server/         - Server initialization and state
//! ├── routes/         - Route configuration
//! ├── realtime/       - WebSocket transport
//! ├── admission/      - Connection admission
//! ├── auth/           - Authentication
//! ├── presence/       - Session registry and rooms
//! ├── collab/         - Notebook persistence and updates
//! └── error/          - Error types
//! ```
//!
//! # Concurrency
//!
//! Sessions, rooms, typing sets and admission counters live in sharded
//! maps, so unrelated rooms never contend. Saves are serialized per
//! notebook by the store's compare-and-set, not by an in-process lock.

/// Server setup and configuration
pub mod server;

/// Route configuration
pub mod routes;

/// WebSocket transport
pub mod realtime;

/// Backend error types
pub mod error;

/// Authentication and identity resolution
pub mod auth;

/// Connection admission
pub mod admission;

/// Sessions, rooms and typing
pub mod presence;

/// Notebook persistence and conflict-checked updates
pub mod collab;

pub use error::BackendError;
pub use server::{create_app, AppState, ServerConfig};
