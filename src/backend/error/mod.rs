//! Backend Error Module
//!
//! Error types of the real-time core and their conversions.
//!
//! # Module Structure
//!
//! ```text
//! error/
//! ├── mod.rs        - Module exports and documentation
//! ├── types.rs      - Error type definitions
//! └── conversion.rs - IntoResponse and socket event conversions
//! ```
//!
//! Handshake rejections are returned as HTTP responses; once a connection is
//! upgraded, errors are delivered as `error` events to the offending session
//! only.

/// Error type definitions
pub mod types;

/// Error conversion implementations
pub mod conversion;

pub use types::BackendError;
