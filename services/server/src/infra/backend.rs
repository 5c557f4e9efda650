//! Transport seams under [`crate::infra::repository::Repository`].
//!
//! Object safe so the repository can hold either the real clients or
//! in-memory fakes.

use bytes::Bytes;
use futures::future::BoxFuture;
use http::{Method, StatusCode};
use serde_json::Value;

use crate::domain::query::Query;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The request never reached the server; safe to retry.
    #[error("transient transport failure: {0:#}")]
    Transient(anyhow::Error),
    #[error("{0:#}")]
    Fatal(anyhow::Error),
}

impl TransportError {
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

/// Only connect failures are retried. A timed out cursor may already have
/// committed an `INSERT` or `REMOVE`.
impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_connect() {
            Self::Transient(e.into())
        } else {
            Self::Fatal(e.into())
        }
    }
}

pub trait DatabaseBackend: Send + Sync {
    /// Runs the query and returns every result row, following cursors.
    fn execute<'a>(&'a self, query: &'a Query) -> BoxFuture<'a, Result<Vec<Value>, TransportError>>;
}

#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub method: Method,
    pub url: String,
    pub auth_payload: String,
    pub body: Option<Value>,
}

#[derive(Debug, Clone)]
pub struct OutboundResponse {
    pub status: StatusCode,
    pub body: Bytes,
}

pub trait HttpBackend: Send + Sync {
    fn execute<'a>(
        &'a self,
        request: &'a OutboundRequest,
    ) -> BoxFuture<'a, Result<OutboundResponse, TransportError>>;
}
