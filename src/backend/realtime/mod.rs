//! Real-time Transport Module
//!
//! WebSocket endpoint that carries the notebook collaboration protocol.
//!
//! # Module Structure
//!
//! ```text
//! realtime/
//! ├── mod.rs     - Module exports and documentation
//! └── socket.rs  - Handshake, per-session reader/writer, event dispatch
//! ```
//!
//! # Events
//!
//! Client to server: `joinNotebook`, `leaveNotebook`, `unlockNotebook`,
//! `updateNotebook`, `typing`, `stopTyping`, `cursorPosition`.
//!
//! Server to client: `joinedNotebook`, `leftNotebook`, `notebookUnlocked`,
//! `userJoined`, `userLeft`, `notebookUpdated`, `updateConfirmed`,
//! `conflictDetected`, `userTyping`, `userStoppedTyping`,
//! `userCursorPosition`, `error`.
//!
//! # Ordering
//!
//! Each session owns an outbound queue drained by its own writer task.
//! Events from one sender therefore reach every room member in send order.

/// WebSocket handshake and session loop
pub mod socket;

pub use socket::{dispatch, handle_socket_upgrade};
