use std::fmt;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use versatile_core::error::ErrorBody;
use versatile_domain::filter::FilterError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationReason {
    Blank,
    Invalid,
}

impl ValidationReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Blank => "BLANK",
            Self::Invalid => "INVALID",
        }
    }
}

impl fmt::Display for ValidationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Server domain error variants.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("the specified resource was not found or you don't have sufficient permissions")]
    NotFound,
    #[error("invalid filter: {0}")]
    InvalidFilter(String),
    #[error("invalid value for {field}: {reason}")]
    Validation {
        field: &'static str,
        reason: ValidationReason,
    },
    #[error("could not decode filter: {0}")]
    FilterDecoding(String),
    #[error("could not decode body: {0}")]
    BodyDecoding(String),
    #[error("unauthorized")]
    Unauthorized,
    #[error("forbidden")]
    Forbidden,
    #[error("database error")]
    Database(#[source] anyhow::Error),
    #[error("could not decode database result")]
    Decoding(#[source] anyhow::Error),
    #[error("auth service unreachable")]
    Network(#[source] anyhow::Error),
    #[error("auth service error: {0}")]
    Service(String),
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl From<FilterError> for ServerError {
    fn from(e: FilterError) -> Self {
        Self::InvalidFilter(e.to_string())
    }
}

impl ServerError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound => "NOT_FOUND",
            Self::InvalidFilter(_) => "INVALID_FILTER",
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::FilterDecoding(_) => "FILTER_DECODING_ERROR",
            Self::BodyDecoding(_) => "BODY_DECODING_ERROR",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Forbidden => "FORBIDDEN",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Decoding(_) => "DECODING_ERROR",
            Self::Network(_) => "NETWORK_ERROR",
            Self::Service(_) => "SERVICE_ERROR",
            Self::Internal(_) => "INTERNAL",
        }
    }

    /// NotFound on a self-service or signin path means the identity is not valid.
    pub fn not_found_as_unauthorized(self) -> Self {
        match self {
            Self::NotFound => Self::Unauthorized,
            other => other,
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::InvalidFilter(_) | Self::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::FilterDecoding(_) | Self::BodyDecoding(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::Database(_)
            | Self::Decoding(_)
            | Self::Network(_)
            | Self::Service(_)
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        // Log 500s only; TraceLayer already records every request.
        match &self {
            Self::Database(e) | Self::Decoding(e) | Self::Network(e) | Self::Internal(e) => {
                tracing::error!(error = %format!("{e:#}"), kind = self.kind(), "request failed");
            }
            Self::Service(message) => {
                tracing::error!(error = %message, kind = self.kind(), "request failed");
            }
            _ => {}
        }
        let mut body = ErrorBody::new(self.kind(), self.to_string());
        if let Self::Validation { field, reason } = &self {
            body = body
                .with_detail("field", *field)
                .with_detail("reason", reason.as_str());
        }
        body.into_response_with(status)
    }
}
