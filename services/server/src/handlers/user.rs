use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use serde::Deserialize;

use versatile_auth_types::context::RequestContext;
use versatile_domain::session::Session;
use versatile_domain::user::{Credentials, PasswordChange, User};

use crate::error::ServerError;
use crate::handlers::extract::{FilterQuery, caller, decode_body};
use crate::state::AppState;
use crate::validator::users::{UserInput, UsersValidator};

fn user_id(key: &str) -> String {
    format!("users/{key}")
}

fn output_all(validator: UsersValidator, users: Vec<User>) -> Json<Vec<User>> {
    Json(users.into_iter().map(|u| validator.output(u)).collect())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

// ── POST /users ──────────────────────────────────────────────────────────────

pub async fn create_users(
    ctx: RequestContext,
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Response, ServerError> {
    let caller = caller(&ctx)?;
    let validator = UsersValidator::for_role(ctx.role());
    let usecase = state.create_users();

    match decode_body::<OneOrMany<UserInput>>(&body)? {
        OneOrMany::Many(inputs) => {
            let users = usecase.execute(&caller, validator.create(inputs)?).await?;
            Ok((StatusCode::CREATED, output_all(validator, users)).into_response())
        }
        OneOrMany::One(input) => {
            let user = usecase
                .execute_one(&caller, validator.create_one(input)?)
                .await?;
            Ok((StatusCode::CREATED, Json(validator.output(user))).into_response())
        }
    }
}

// ── GET /users ───────────────────────────────────────────────────────────────

pub async fn find_users(
    ctx: RequestContext,
    State(state): State<AppState>,
    FilterQuery(filter): FilterQuery,
) -> Result<Json<Vec<User>>, ServerError> {
    let caller = caller(&ctx)?;
    let users = state.find_users().execute(&caller, &filter).await?;
    Ok(output_all(UsersValidator::for_role(ctx.role()), users))
}

// ── PUT /users ───────────────────────────────────────────────────────────────

pub async fn update_users(
    ctx: RequestContext,
    State(state): State<AppState>,
    FilterQuery(filter): FilterQuery,
    body: Bytes,
) -> Result<Json<Vec<User>>, ServerError> {
    let caller = caller(&ctx)?;
    let validator = UsersValidator::for_role(ctx.role());
    let patch = validator.update(decode_body(&body)?)?;
    let users = state
        .update_users()
        .execute(&caller, &patch, &filter)
        .await?;
    Ok(output_all(validator, users))
}

// ── DELETE /users ────────────────────────────────────────────────────────────

pub async fn delete_users(
    ctx: RequestContext,
    State(state): State<AppState>,
    FilterQuery(filter): FilterQuery,
) -> Result<Json<Vec<User>>, ServerError> {
    let caller = caller(&ctx)?;
    let users = state.delete_users().execute(&caller, &filter).await?;
    Ok(output_all(UsersValidator::for_role(ctx.role()), users))
}

// ── GET /users/{key} ─────────────────────────────────────────────────────────

pub async fn find_user(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(key): Path<String>,
    FilterQuery(filter): FilterQuery,
) -> Result<Json<User>, ServerError> {
    let caller = caller(&ctx)?;
    let user = state
        .find_users()
        .execute_by_key(&caller, &user_id(&key), filter)
        .await?;
    Ok(Json(UsersValidator::for_role(ctx.role()).output(user)))
}

// ── PUT /users/{key} ─────────────────────────────────────────────────────────

pub async fn update_user(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(key): Path<String>,
    body: Bytes,
) -> Result<Json<User>, ServerError> {
    let caller = caller(&ctx)?;
    let validator = UsersValidator::for_role(ctx.role());
    let patch = validator.update(decode_body(&body)?)?;
    let user = state
        .update_users()
        .execute_by_key(&caller, &user_id(&key), &patch)
        .await?;
    Ok(Json(validator.output(user)))
}

// ── DELETE /users/{key} ──────────────────────────────────────────────────────

pub async fn delete_user(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<User>, ServerError> {
    let caller = caller(&ctx)?;
    let user = state
        .delete_users()
        .execute_by_key(&caller, &user_id(&key))
        .await?;
    Ok(Json(UsersValidator::for_role(ctx.role()).output(user)))
}

// ── POST /users/{key}/password ───────────────────────────────────────────────

pub async fn update_user_password(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(key): Path<String>,
    body: Bytes,
) -> Result<Json<User>, ServerError> {
    let caller = caller(&ctx)?;
    let validator = UsersValidator::for_role(ctx.role());
    let change = validator.update_password(decode_body::<PasswordChange>(&body)?)?;
    let user = state
        .update_password()
        .execute(&caller, &user_id(&key), change.password)
        .await?;
    Ok(Json(validator.output(user)))
}

// ── GET /users/me ────────────────────────────────────────────────────────────

pub async fn get_me(
    ctx: RequestContext,
    State(state): State<AppState>,
    FilterQuery(filter): FilterQuery,
) -> Result<Json<User>, ServerError> {
    let caller = caller(&ctx)?;
    let user = state
        .find_users()
        .execute_by_key(&caller, &caller.id, filter)
        .await
        .map_err(ServerError::not_found_as_unauthorized)?;
    Ok(Json(UsersValidator::for_role(ctx.role()).output(user)))
}

// ── PUT /users/me ────────────────────────────────────────────────────────────

pub async fn update_me(
    ctx: RequestContext,
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<User>, ServerError> {
    let caller = caller(&ctx)?;
    let validator = UsersValidator::for_role(ctx.role());
    let patch = validator.update(decode_body(&body)?)?;
    let user = state
        .update_users()
        .execute_by_key(&caller, &caller.id, &patch)
        .await
        .map_err(ServerError::not_found_as_unauthorized)?;
    Ok(Json(validator.output(user)))
}

// ── DELETE /users/me ─────────────────────────────────────────────────────────

pub async fn delete_me(
    ctx: RequestContext,
    State(state): State<AppState>,
) -> Result<Json<User>, ServerError> {
    let caller = caller(&ctx)?;
    let user = state
        .delete_users()
        .execute_self(&caller)
        .await
        .map_err(ServerError::not_found_as_unauthorized)?;
    Ok(Json(UsersValidator::for_role(ctx.role()).output(user)))
}

// ── GET /users/me/session ────────────────────────────────────────────────────

pub async fn get_my_session(ctx: RequestContext) -> Result<Json<Session>, ServerError> {
    let session = ctx.current_session.ok_or(ServerError::Unauthorized)?;
    Ok(Json(session.redacted()))
}

// ── POST /users/me/signout ───────────────────────────────────────────────────

pub async fn signout(
    ctx: RequestContext,
    State(state): State<AppState>,
) -> Result<Json<Session>, ServerError> {
    let caller = caller(&ctx)?;
    let token = ctx.access_token.as_deref().ok_or(ServerError::Unauthorized)?;
    let session = state.signout().execute(&caller, token).await?;
    Ok(Json(session.redacted()))
}

// ── POST /users/me/password ──────────────────────────────────────────────────

pub async fn update_my_password(
    ctx: RequestContext,
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<User>, ServerError> {
    let caller = caller(&ctx)?;
    let validator = UsersValidator::for_role(ctx.role());
    let change = validator.update_password(decode_body::<PasswordChange>(&body)?)?;
    let user = state
        .update_password()
        .execute(&caller, &caller.id, change.password)
        .await
        .map_err(ServerError::not_found_as_unauthorized)?;
    Ok(Json(validator.output(user)))
}

// ── POST /users/signin ───────────────────────────────────────────────────────

pub async fn signin(
    ctx: RequestContext,
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<Session>), ServerError> {
    let validator = UsersValidator::for_role(ctx.role());
    let credentials = validator.signin(decode_body::<Credentials>(&body)?)?;
    let agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    let session = state
        .signin()
        .execute(&credentials, agent)
        .await
        .map_err(ServerError::not_found_as_unauthorized)?;
    Ok((StatusCode::CREATED, Json(session.redacted())))
}
