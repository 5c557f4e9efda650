//! Liveness and readiness probes.

use axum::Json;
use axum::http::StatusCode;
use serde::Serialize;

#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct Readiness {
    pub status: &'static str,
    pub version: &'static str,
}

/// `GET /healthz`: the process is up.
pub async fn healthz() -> StatusCode {
    StatusCode::OK
}

/// `GET /readyz`: the router is built and serving.
pub async fn readyz() -> Json<Readiness> {
    Json(Readiness {
        status: "ready",
        version: env!("CARGO_PKG_VERSION"),
    })
}
