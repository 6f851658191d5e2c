//! Integration tests against in-process application state

pub mod conflict_test;
pub mod dispatch_test;
pub mod routes_test;
