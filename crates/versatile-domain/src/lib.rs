//! Domain types shared across Versatile crates.
//!
//! This crate contains only pure types with no framework dependencies.
//! Import in `usecase/` and `domain/` layers; infra adapters convert at the edge.

pub mod dashboard;
pub mod filter;
pub mod role;
pub mod session;
pub mod user;
