//! Test utilities for Versatile services.
//!
//! Provides `MockAuth` and user fixtures.
//! Import in tests only, never in production code.

pub mod auth;
pub mod fixture;
