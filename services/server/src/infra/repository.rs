use std::sync::Arc;

use anyhow::Context as _;
use http::{Method, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::domain::query::Query;
use crate::domain::repository::{HttpSender, QueryRunner};
use crate::error::ServerError;
use crate::infra::backend::{DatabaseBackend, HttpBackend, OutboundRequest};
use crate::infra::rate_limit::TokenBucket;
use crate::infra::retry::RetryPolicy;

/// Single choke point to the database and the auth service. Every call is
/// rate limited and retried on transient failures.
///
/// Cheap to clone; the limiter and transports are shared.
#[derive(Clone)]
pub struct Repository {
    pub db: Arc<dyn DatabaseBackend>,
    pub http: Arc<dyn HttpBackend>,
    pub limiter: Arc<TokenBucket>,
    pub retry: RetryPolicy,
}

impl QueryRunner for Repository {
    async fn run<T>(&self, query: &Query) -> Result<Vec<T>, ServerError>
    where
        T: DeserializeOwned + Send,
    {
        let rows = self
            .retry
            .run(move || async move {
                self.limiter.acquire().await;
                self.db.execute(query).await
            })
            .await
            .context("run query")
            .map_err(ServerError::Database)?;

        rows.into_iter()
            .map(|row| {
                serde_json::from_value(row)
                    .context("decode query row")
                    .map_err(ServerError::Decoding)
            })
            .collect()
    }
}

/// Error description returned by the auth service.
#[derive(Deserialize)]
struct UpstreamError {
    #[serde(alias = "message", alias = "error")]
    raw: String,
}

fn carries_body(method: &Method) -> bool {
    *method == Method::POST || *method == Method::PUT || *method == Method::PATCH
}

fn upstream_error(status: StatusCode, body: &[u8]) -> ServerError {
    let description = serde_json::from_slice::<UpstreamError>(body).map(|e| e.raw);
    if status == StatusCode::FORBIDDEN || status == StatusCode::NOT_FOUND {
        return ServerError::NotFound;
    }
    match description {
        Ok(raw) if raw.to_lowercase().contains("not found") => ServerError::NotFound,
        Ok(raw) => ServerError::Service(raw),
        Err(_) => ServerError::Service(format!("auth service returned {status}")),
    }
}

impl HttpSender for Repository {
    async fn send<T>(
        &self,
        auth_payload: &str,
        method: Method,
        url: &str,
        body: Option<&Value>,
    ) -> Result<T, ServerError>
    where
        T: DeserializeOwned + Send,
    {
        let request = OutboundRequest {
            body: body.filter(|_| carries_body(&method)).cloned(),
            method,
            url: url.to_owned(),
            auth_payload: auth_payload.to_owned(),
        };
        let request = &request;
        let response = self
            .retry
            .run(move || async move {
                self.limiter.acquire().await;
                self.http.execute(request).await
            })
            .await
            .with_context(|| format!("{} {}", request.method, request.url))
            .map_err(ServerError::Network)?;

        if !response.status.is_success() {
            return Err(upstream_error(response.status, &response.body));
        }
        let bytes: &[u8] = if response.body.is_empty() {
            b"null"
        } else {
            &response.body
        };
        serde_json::from_slice(bytes)
            .map_err(|e| ServerError::Service(format!("unexpected response body: {e}")))
    }
}
