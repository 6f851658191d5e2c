//! End-to-end tests over real WebSocket connections

pub mod socket_suite;
