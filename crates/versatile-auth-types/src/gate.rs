//! Role-gated authorization middleware.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use http::StatusCode;

use versatile_core::error::ErrorBody;
use versatile_domain::role::Role;

use crate::context::RequestContext;

/// Authorization filter: requires an authenticated caller, then applies a
/// role predicate.
///
/// Compose per route group with
/// `route_layer(middleware::from_fn_with_state(Gate::admin_only(), enforce))`.
#[derive(Clone, Copy)]
pub struct Gate {
    grant: fn(Role) -> bool,
}

fn is_admin(role: Role) -> bool {
    role == Role::Admin
}

fn has_role(role: Role) -> bool {
    !role.is_unset()
}

impl Gate {
    pub fn new(grant: fn(Role) -> bool) -> Self {
        Self { grant }
    }

    pub fn admin_only() -> Self {
        Self::new(is_admin)
    }

    pub fn authenticated_only() -> Self {
        Self::new(has_role)
    }

    /// Checks presence of session role, user and token before consulting the
    /// predicate.
    pub fn check(&self, ctx: &RequestContext) -> Result<(), GateRejection> {
        let role = match &ctx.current_session {
            Some(session) if !session.role.is_unset() => session.role,
            Some(_) => return Err(GateRejection::Unauthorized("session has no role")),
            None => return Err(GateRejection::Unauthorized("missing session")),
        };
        if ctx.current_user.is_none() {
            return Err(GateRejection::Unauthorized("missing user"));
        }
        if ctx.access_token.as_deref().is_none_or(str::is_empty) {
            return Err(GateRejection::Unauthorized("missing access token"));
        }
        if !(self.grant)(role) {
            return Err(GateRejection::Forbidden);
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum GateRejection {
    #[error("unauthorized: {0}")]
    Unauthorized(&'static str),
    #[error("forbidden")]
    Forbidden,
}

impl GateRejection {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Forbidden => "FORBIDDEN",
        }
    }
}

impl IntoResponse for GateRejection {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
        };
        ErrorBody::new(self.kind(), self.to_string()).into_response_with(status)
    }
}

pub async fn enforce(
    State(gate): State<Gate>,
    ctx: RequestContext,
    request: Request,
    next: Next,
) -> Result<Response, GateRejection> {
    gate.check(&ctx)?;
    Ok(next.run(request).await)
}
