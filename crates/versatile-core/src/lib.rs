//! HTTP plumbing shared by Versatile services: tracing setup, request ids,
//! health probes, the error envelope and environment configuration helpers.

pub mod config;
pub mod error;
pub mod health;
pub mod middleware;
pub mod tracing;
