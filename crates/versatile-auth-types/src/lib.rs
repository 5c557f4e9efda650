//! Gateway identity and authorization shared across Versatile services.
//!
//! Provides the `RequestContext` extractor, resolved from the headers the auth
//! gateway injects, and the role `Gate` middleware built on top of it.

pub mod context;
pub mod gate;
