//! Admission Module
//!
//! Bounds concurrent connections per source address. The controller is
//! consulted by the WebSocket handshake before any identity work happens,
//! and released when the connection ends.
//!
//! ```text
//! admission/
//! ├── mod.rs        - Module exports and documentation
//! └── controller.rs - AdmissionController (admit / release / sweep)
//! ```

/// Per-address connection counter
pub mod controller;

pub use controller::AdmissionController;
