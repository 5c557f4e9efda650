use serde_json::json;

use versatile_domain::role::Role;
use versatile_testing::auth::MockAuth;

use crate::helpers::{request, send, test_app};

#[tokio::test]
async fn should_reject_admin_routes_without_identity() {
    let app = test_app(vec![]);

    let (status, body) = send(&app, request("GET", "/users", None, None)).await;

    assert_eq!(status, 401);
    assert_eq!(body["kind"], "UNAUTHORIZED");
}

#[tokio::test]
async fn should_forbid_admin_routes_to_members() {
    let app = test_app(vec![]);

    let (status, body) = send(
        &app,
        request("GET", "/users", Some(&MockAuth::new("users/u1", Role::User)), None),
    )
    .await;

    assert_eq!(status, 403);
    assert_eq!(body["kind"], "FORBIDDEN");
}

#[tokio::test]
async fn should_forbid_member_creating_users() {
    let app = test_app(vec![]);

    let (status, _) = send(
        &app,
        request(
            "POST",
            "/users",
            Some(&MockAuth::new("users/u1", Role::Developer)),
            Some(json!({"_key": "x", "email": "x@example.com", "password": "pw", "role": "USER"})),
        ),
    )
    .await;

    assert_eq!(status, 403);
    assert!(app.db.queries.lock().unwrap().is_empty());
}

#[tokio::test]
async fn should_reject_self_routes_without_identity() {
    let app = test_app(vec![]);

    let (status, _) = send(&app, request("GET", "/users/me", None, None)).await;

    assert_eq!(status, 401);
}

#[tokio::test]
async fn should_serve_public_routes_anonymously() {
    let app = test_app(vec![]);

    let (status, body) = send(&app, request("GET", "/dashboards", None, None)).await;
    assert_eq!(status, 200);
    assert_eq!(body, json!({"name": "Name"}));

    let (status, _) = send(&app, request("GET", "/healthz", None, None)).await;
    assert_eq!(status, 200);

    let (status, body) = send(&app, request("GET", "/readyz", None, None)).await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "ready");
}

#[tokio::test]
async fn should_attach_request_id_to_responses() {
    let app = test_app(vec![]);

    let response = tower::ServiceExt::oneshot(
        app.router.clone(),
        request("GET", "/dashboards", None, None),
    )
    .await
    .unwrap();

    assert!(response.headers().contains_key("x-request-id"));
}
