use http::Method;
use serde_json::json;

use versatile_domain::role::Role;
use versatile_domain::user::User;
use versatile_testing::auth::MockAuth;
use versatile_testing::fixture::stored_user;

use crate::helpers::{AUTH_URL, request, send, test_app};

fn signin_user() -> User {
    User {
        password: bcrypt::hash("secret", 4).unwrap(),
        owner_token: "T9".into(),
        ..stored_user("carol", "carol@example.com", Role::User)
    }
}

fn carol() -> MockAuth {
    let mut auth = MockAuth::new("users/carol", Role::User);
    auth.user.owner_token = "T9".into();
    auth
}

// ── POST /users/signin ───────────────────────────────────────────────────────

#[tokio::test]
async fn should_issue_redacted_session_on_signin() {
    let app = test_app(vec![signin_user()]);
    let mut req = request(
        "POST",
        "/users/signin",
        None,
        Some(json!({"email": "carol@example.com", "password": "secret"})),
    );
    req.headers_mut()
        .insert("user-agent", "curl/8".parse().unwrap());

    let (status, body) = send(&app, req).await;

    assert_eq!(status, 201);
    assert_eq!(body["token"], "issued-token");
    assert_eq!(body["agent"], "curl/8");
    assert_eq!(body["role"], "USER");
    assert!(body.get("payload").is_none());
    assert!(body.get("policies").is_none());
    assert!(body.get("ownerToken").is_none());

    let requests = app.auth.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, Method::POST);
    assert_eq!(requests[0].url, format!("{AUTH_URL}/sessions"));
    let sent = requests[0].body.as_ref().unwrap();
    assert_eq!(sent["ownerToken"], "T9");
    assert_eq!(sent["policies"], json!(["versatile"]));
    let payload: serde_json::Value =
        serde_json::from_str(sent["payload"].as_str().unwrap()).unwrap();
    assert_eq!(payload["role"], "USER");
    assert!(payload["user"].get("password").is_none());
}

#[tokio::test]
async fn should_reject_wrong_password_as_unauthorized() {
    let app = test_app(vec![signin_user()]);

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/users/signin",
            None,
            Some(json!({"email": "carol@example.com", "password": "guess"})),
        ),
    )
    .await;

    assert_eq!(status, 401);
    assert_eq!(body["kind"], "UNAUTHORIZED");
    assert!(app.auth.requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn should_reject_unknown_email_as_unauthorized() {
    let app = test_app(vec![]);

    let (status, _) = send(
        &app,
        request(
            "POST",
            "/users/signin",
            None,
            Some(json!({"email": "nobody@example.com", "password": "secret"})),
        ),
    )
    .await;

    assert_eq!(status, 401);
}

#[tokio::test]
async fn should_require_credentials_on_signin() {
    let app = test_app(vec![]);

    let (status, body) = send(
        &app,
        request("POST", "/users/signin", None, Some(json!({"email": "carol@example.com"}))),
    )
    .await;

    assert_eq!(status, 422);
    assert_eq!(body["field"], "password");
}

// ── /users/me ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_return_own_record() {
    let app = test_app(vec![signin_user()]);

    let (status, body) = send(&app, request("GET", "/users/me", Some(&carol()), None)).await;

    assert_eq!(status, 200);
    assert_eq!(body["_key"], "carol");
    assert!(body.get("password").is_none());
}

#[tokio::test]
async fn should_treat_missing_own_record_as_unauthorized() {
    let app = test_app(vec![]);

    let (status, _) = send(&app, request("GET", "/users/me", Some(&carol()), None)).await;

    assert_eq!(status, 401);
}

#[tokio::test]
async fn should_not_let_members_change_their_role() {
    let app = test_app(vec![signin_user()]);

    let (status, body) = send(
        &app,
        request(
            "PUT",
            "/users/me",
            Some(&carol()),
            Some(json!({"lastName": "Danvers", "role": "ADMIN"})),
        ),
    )
    .await;

    assert_eq!(status, 200);
    assert_eq!(body["lastName"], "Danvers");
    assert_eq!(body["role"], "USER");
}

#[tokio::test]
async fn should_delete_self_and_revoke_sessions() {
    let app = test_app(vec![signin_user()]);

    let (status, body) = send(&app, request("DELETE", "/users/me", Some(&carol()), None)).await;

    assert_eq!(status, 200);
    assert_eq!(body["_key"], "carol");
    assert!(app.db.users.lock().unwrap().is_empty());
    let requests = app.auth.requests.lock().unwrap();
    assert!(
        requests
            .iter()
            .any(|r| r.method == Method::DELETE && r.url.contains("ownerTokens"))
    );
}

#[tokio::test]
async fn should_return_current_session_redacted() {
    let app = test_app(vec![]);

    let (status, body) =
        send(&app, request("GET", "/users/me/session", Some(&carol()), None)).await;

    assert_eq!(status, 200);
    assert_eq!(body["token"], "test-access-token");
    assert!(body.get("ownerToken").is_none());
}

#[tokio::test]
async fn should_revoke_current_token_on_signout() {
    let app = test_app(vec![]);

    let (status, body) =
        send(&app, request("POST", "/users/me/signout", Some(&carol()), None)).await;

    assert_eq!(status, 200);
    assert_eq!(body["token"], "revoked-token");
    assert!(body.get("ownerToken").is_none());
    let requests = app.auth.requests.lock().unwrap();
    assert_eq!(requests[0].method, Method::DELETE);
    assert_eq!(
        requests[0].url,
        format!("{AUTH_URL}/sessions/test-access-token")
    );
}

#[tokio::test]
async fn should_keep_signout_scoped_to_one_session() {
    let app = test_app(vec![]);
    let token = "..%2Fsessions%3FownerTokens%3D%5B%22VICTIM%22%5D";

    let (status, _) = send(
        &app,
        request(
            "POST",
            &format!("/users/me/signout?accessToken={token}"),
            Some(&carol()),
            None,
        ),
    )
    .await;

    assert_eq!(status, 200);
    let requests = app.auth.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    let url = reqwest::Url::parse(&requests[0].url).unwrap();
    assert_eq!(url.query(), None);
    assert_eq!(url.path_segments().unwrap().count(), 2);
    assert!(url.path().starts_with("/sessions/..%2Fsessions%3F"));
}

#[tokio::test]
async fn should_change_own_password() {
    let app = test_app(vec![signin_user()]);

    let (status, _) = send(
        &app,
        request(
            "POST",
            "/users/me/password",
            Some(&carol()),
            Some(json!({"password": "rotated"})),
        ),
    )
    .await;

    assert_eq!(status, 200);
    let stored = app.db.users.lock().unwrap();
    assert!(bcrypt::verify("rotated", stored[0]["password"].as_str().unwrap()).unwrap());
}
