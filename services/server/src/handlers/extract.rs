use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use bytes::Bytes;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use versatile_auth_types::context::RequestContext;
use versatile_domain::filter::Filter;

use crate::domain::types::Caller;
use crate::error::ServerError;

#[derive(Deserialize)]
struct FilterParams {
    filter: Option<String>,
}

/// `?filter=<json>`, empty when absent.
#[derive(Debug, Default)]
pub struct FilterQuery(pub Filter);

fn parse_filter(query: Option<&str>) -> Result<Filter, ServerError> {
    let params: FilterParams = serde_qs::from_str(query.unwrap_or_default())
        .map_err(|e| ServerError::FilterDecoding(e.to_string()))?;
    match params.filter.as_deref() {
        None | Some("") => Ok(Filter::default()),
        Some(raw) => Filter::parse(raw).map_err(|e| ServerError::FilterDecoding(e.to_string())),
    }
}

impl<S> FromRequestParts<S> for FilterQuery
where
    S: Send + Sync,
{
    type Rejection = ServerError;

    fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let result = parse_filter(parts.uri.query()).map(FilterQuery);
        async move { result }
    }
}

/// JSON body decoding that reports failures as `BODY_DECODING_ERROR`.
pub fn decode_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, ServerError> {
    serde_json::from_slice(body).map_err(|e| ServerError::BodyDecoding(e.to_string()))
}

/// Caller identity of an authenticated request.
pub fn caller(ctx: &RequestContext) -> Result<Caller, ServerError> {
    let user = ctx.current_user.as_ref().ok_or(ServerError::Unauthorized)?;
    Ok(Caller::new(
        user.id.clone(),
        ctx.raw_payload.clone().unwrap_or_default(),
    ))
}
