//! Presence Module
//!
//! Session registry, notebook rooms and typing indicators.
//!
//! # Module Structure
//!
//! ```text
//! presence/
//! ├── mod.rs       - Module exports and documentation
//! ├── session.rs   - Per-connection Session state and outbound queue
//! ├── typing.rs    - TypingTracker (ephemeral per-notebook typing sets)
//! └── registry.rs  - PresenceRegistry (sessions, rooms, fan-out)
//! ```
//!
//! # Fan-out
//!
//! Room broadcasts push a copy of the event into each member's outbound
//! queue. Each connection drains its own queue in order, so events from one
//! sender reach every member in the order they were sent. Ordering across
//! rooms is not guaranteed.

/// Per-connection session state
pub mod session;

/// Ephemeral typing sets
pub mod typing;

/// Session and room registry
pub mod registry;

pub use registry::{JoinOutcome, PresenceRegistry};
pub use session::{Outbox, Session, SessionId};
pub use typing::TypingTracker;
