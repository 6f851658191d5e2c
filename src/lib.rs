//! NoteCollab - Main Library
//!
//! NoteCollab is the real-time coordination core of a collaborative notebook
//! application. Several people can open the same notebook, see who else is
//! present, watch each other type, and save edits without silently
//! overwriting one another.
//!
//! # Overview
//!
//! This library provides:
//! - Connection admission (per-address connection ceiling)
//! - Identity resolution (authenticated / guest / anonymous)
//! - Per-notebook room presence and typing indicators
//! - Optimistic-concurrency saves with whole-document conflict detection
//! - A client-side save scheduler with debounce and retry/backoff
//!
//! # Module Structure
//!
//! - **`shared`** - Types shared between server and clients
//!   - Identity, socket event envelopes, conflict records
//!   - Notebook permission model
//!   - Error types
//!
//! - **`backend`** - Server-side code (only compiled with `ssr` feature)
//!   - Axum HTTP server with a WebSocket event endpoint
//!   - Admission control, presence registry, typing tracker
//!   - Access policy, notebook persistence, conflict detection
//!
//! - **`client`** - Editing-client logic
//!   - Debounced save scheduling with exponential backoff
//!   - Conflict state that must be resolved explicitly
//!
//! # Feature Flags
//!
//! - **`ssr`** - Server build (enabled by default)
//!   - Includes Axum, JWT verification, bcrypt, PostgreSQL store
//!
//! # Usage
//!
//! ## Server-Side
//!
//! ```rust,no_run
//! use notecollab::backend::server::config::ServerConfig;
//! use notecollab::backend::server::init::create_app;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ServerConfig::from_env()?;
//! let app = create_app(config).await;
//! # Ok(())
//! # }
//! ```
//!
//! ## Client-Side
//!
//! ```rust,ignore
//! use notecollab::client::{SaveScheduler, SaveSchedulerConfig};
//!
//! let scheduler = SaveScheduler::spawn(transport, notebook_id, 3, "".into(), SaveSchedulerConfig::default());
//! scheduler.edit("hello".to_string());
//! ```
//!
//! # Thread Safety
//!
//! - **Server**: presence state lives in sharded `DashMap`s owned by the
//!   `PresenceRegistry`; each connection drains its own outbound queue.
//! - **Persistence**: the version compare-and-set is the only serialization
//!   point between concurrent writers.
//! - **Client**: each scheduler is one tokio task driven by a command channel.

/// Shared types and data structures
pub mod shared;

/// Backend server-side code
#[cfg(feature = "ssr")]
pub mod backend;

/// Editing-client save scheduling
pub mod client;
