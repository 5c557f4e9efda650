use axum::{
    Router, middleware,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use versatile_auth_types::context::resolve_context;
use versatile_auth_types::gate::{Gate, enforce};
use versatile_core::health::{healthz, readyz};
use versatile_core::middleware::{propagate_request_id_layer, request_id_layer};

use crate::handlers::{
    dashboard::find_dashboards,
    user::{
        create_users, delete_me, delete_user, delete_users, find_user, find_users, get_me,
        get_my_session, signin, signout, update_me, update_my_password, update_user,
        update_user_password, update_users,
    },
};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let admin = Router::new()
        .route(
            "/users",
            post(create_users)
                .get(find_users)
                .put(update_users)
                .delete(delete_users),
        )
        .route(
            "/users/{key}",
            get(find_user).put(update_user).delete(delete_user),
        )
        .route("/users/{key}/password", post(update_user_password))
        .route_layer(middleware::from_fn_with_state(Gate::admin_only(), enforce));

    let authenticated = Router::new()
        .route("/users/me", get(get_me).put(update_me).delete(delete_me))
        .route("/users/me/session", get(get_my_session))
        .route("/users/me/signout", post(signout))
        .route("/users/me/password", post(update_my_password))
        .route_layer(middleware::from_fn_with_state(
            Gate::authenticated_only(),
            enforce,
        ));

    let public = Router::new()
        // Health
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // Sessions
        .route("/users/signin", post(signin))
        // Dashboards
        .route("/dashboards", get(find_dashboards));

    Router::new()
        .merge(admin)
        .merge(authenticated)
        .merge(public)
        .layer(middleware::from_fn(resolve_context))
        .layer(TraceLayer::new_for_http())
        .layer(propagate_request_id_layer())
        .layer(request_id_layer())
        .with_state(state)
}
