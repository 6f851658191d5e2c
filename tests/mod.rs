//! Test suite for NoteCollab
//!
//! This module organizes all tests

#[cfg(feature = "ssr")]
pub mod common;
#[cfg(feature = "ssr")]
pub mod e2e;
#[cfg(feature = "ssr")]
pub mod integration;
pub mod property;
