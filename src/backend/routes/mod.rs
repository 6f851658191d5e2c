//! Route Configuration Module
//!
//! Configures all HTTP routes for the backend server.
//!
//! # Module Structure
//!
//! ```text
//! routes/
//! ├── mod.rs          - Module exports and documentation
//! ├── router.rs       - Main router creation
//! └── api_routes.rs   - Health and presence endpoints
//! ```
//!
//! # Routes
//!
//! - `GET /ws` - WebSocket upgrade (see [`crate::backend::realtime`])
//! - `GET /health` - Liveness probe
//! - `GET /api/notebooks/{id}/presence` - Room members and typists

/// Main router creation
pub mod router;

/// API endpoint handlers
pub mod api_routes;

pub use router::create_router;
