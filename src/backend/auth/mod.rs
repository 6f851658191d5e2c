//! Authentication Module
//!
//! Turns handshake credentials into a connection [`Identity`](crate::shared::Identity).
//!
//! # Module Structure
//!
//! ```text
//! auth/
//! ├── mod.rs       - Module exports and documentation
//! ├── sessions.rs  - JWT verification (AuthVerifier, JwtVerifier)
//! └── identity.rs  - IdentityResolver and HandshakeCredentials
//! ```
//!
//! # Resolution Order
//!
//! 1. **Token**: bearer header or `?token=`; must verify or the handshake fails
//! 2. **Guest**: `?guestId=&guestName=`, both non-empty
//! 3. **Anonymous**: nothing usable presented

/// JWT token generation and validation
pub mod sessions;

/// Handshake identity resolution
pub mod identity;

pub use identity::{HandshakeCredentials, IdentityResolver};
pub use sessions::{AuthVerifier, JwtVerifier};
