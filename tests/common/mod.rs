//! Common test utilities and helpers
//!
//! - Application state and server fixtures
//! - Token and identity helpers
//! - Outbox draining for presence assertions

pub mod auth_helpers;
pub mod fixtures;
pub mod server;

pub use auth_helpers::*;
pub use fixtures::*;
pub use server::*;
