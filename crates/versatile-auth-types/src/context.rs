//! Per-request identity resolved from gateway-injected metadata.

use std::convert::Infallible;

use axum::extract::{FromRequestParts, Query, Request};
use axum::middleware::Next;
use axum::response::Response;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use http::request::Parts;
use http::{HeaderMap, Uri};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use versatile_domain::role::Role;
use versatile_domain::session::Session;
use versatile_domain::user::{AuthServerPayload, User};

/// Base64 JSON `{user, role}` set by the auth gateway.
pub const AUTH_SERVER_PAYLOAD: &str = "auth-server-payload";
/// Raw access token.
pub const AUTH_SERVER_TOKEN: &str = "auth-server-token";
/// Base64 JSON session set by the auth gateway.
pub const AUTH_SERVER_SESSION: &str = "auth-server-session";
/// Query parameter overriding [`AUTH_SERVER_TOKEN`].
pub const ACCESS_TOKEN_PARAM: &str = "accessToken";

/// Identity of the caller, derived once per request.
///
/// Every field is optional: resolution never rejects a request, enforcement
/// is left to [`crate::gate::Gate`].
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub access_token: Option<String>,
    pub current_user: Option<User>,
    pub current_session: Option<Session>,
    /// Undecoded `Auth-Server-Payload` header, forwarded on outbound calls.
    pub raw_payload: Option<String>,
}

#[derive(Deserialize)]
struct AccessTokenQuery {
    #[serde(rename = "accessToken")]
    access_token: Option<String>,
}

impl RequestContext {
    pub fn resolve(headers: &HeaderMap, uri: &Uri) -> Self {
        let raw_payload = header_str(headers, AUTH_SERVER_PAYLOAD).map(str::to_owned);
        let current_user = raw_payload
            .as_deref()
            .and_then(|raw| decode_blob::<AuthServerPayload>(raw, AUTH_SERVER_PAYLOAD))
            .and_then(|payload| payload.user);
        let current_session = header_str(headers, AUTH_SERVER_SESSION)
            .and_then(|raw| decode_blob::<Session>(raw, AUTH_SERVER_SESSION));

        let header_token = header_str(headers, AUTH_SERVER_TOKEN).map(str::to_owned);
        let query_token = Query::<AccessTokenQuery>::try_from_uri(uri)
            .map_err(|e| tracing::debug!(error = %e, "unreadable query string"))
            .ok()
            .and_then(|Query(q)| q.access_token)
            .filter(|t| !t.is_empty());

        Self {
            access_token: query_token.or(header_token),
            current_user,
            current_session,
            raw_payload,
        }
    }

    /// Role of the current session, `Unset` when there is none.
    pub fn role(&self) -> Role {
        self.current_session
            .as_ref()
            .map(|s| s.role)
            .unwrap_or_default()
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
}

fn decode_blob<T: DeserializeOwned>(raw: &str, header: &'static str) -> Option<T> {
    let bytes = match STANDARD.decode(raw) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::debug!(header, error = %e, "header is not valid base64");
            return None;
        }
    };
    match serde_json::from_slice(&bytes) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::debug!(header, error = %e, "header is not valid json");
            None
        }
    }
}

/// Middleware resolving the [`RequestContext`] and storing it in the request
/// extensions. Apply once, outside every gate.
pub async fn resolve_context(mut request: Request, next: Next) -> Response {
    let ctx = RequestContext::resolve(request.headers(), request.uri());
    request.extensions_mut().insert(ctx);
    next.run(request).await
}

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let ctx = parts
            .extensions
            .get::<RequestContext>()
            .cloned()
            .unwrap_or_else(|| RequestContext::resolve(&parts.headers, &parts.uri));
        async move { Ok(ctx) }
    }
}
