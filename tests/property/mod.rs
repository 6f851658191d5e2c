//! Property-based tests

#[cfg(feature = "ssr")]
pub mod version_proptest;
pub mod backoff_proptest;
