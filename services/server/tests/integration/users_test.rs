use http::Method;
use serde_json::json;

use versatile_testing::auth::MockAuth;

use crate::helpers::{managed_user, request, send, test_app};

// ── POST /users ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_create_users_from_array_without_exposing_passwords() {
    let app = test_app(vec![]);
    let admin = MockAuth::admin();

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/users",
            Some(&admin),
            Some(json!([
                {"email": "a@example.com", "password": "pw-a", "role": "USER"},
                {"email": "b@example.com", "password": "pw-b", "role": "USER"},
            ])),
        ),
    )
    .await;

    assert_eq!(status, 201);
    let users = body.as_array().unwrap();
    assert_eq!(users.len(), 2);
    for user in users {
        assert!(user.get("password").is_none());
        assert_eq!(user["role"], "USER");
        assert_eq!(user["createdBy"], "users/admin");
        assert_eq!(user["ownerToken"].as_str().unwrap().len(), 32);
    }
}

#[tokio::test]
async fn should_create_single_user_from_object() {
    let app = test_app(vec![]);

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/users",
            Some(&MockAuth::admin()),
            Some(json!({"email": "c@example.com", "password": "pw", "role": "DEVELOPER"})),
        ),
    )
    .await;

    assert_eq!(status, 201);
    assert!(body.is_object());
    assert_eq!(body["email"], "c@example.com");
    assert_eq!(body["role"], "DEVELOPER");
}

#[tokio::test]
async fn should_reject_blank_role_with_field_name() {
    let app = test_app(vec![]);

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/users",
            Some(&MockAuth::admin()),
            Some(json!({"email": "c@example.com", "password": "pw"})),
        ),
    )
    .await;

    assert_eq!(status, 422);
    assert_eq!(body["kind"], "VALIDATION_ERROR");
    assert_eq!(body["field"], "role");
    assert_eq!(body["reason"], "BLANK");
}

#[tokio::test]
async fn should_reject_unknown_role() {
    let app = test_app(vec![]);

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/users",
            Some(&MockAuth::admin()),
            Some(json!({"email": "c@example.com", "password": "pw", "role": "ROOT"})),
        ),
    )
    .await;

    assert_eq!(status, 422);
    assert_eq!(body["reason"], "INVALID");
}

#[tokio::test]
async fn should_report_malformed_body() {
    let app = test_app(vec![]);
    let admin = MockAuth::admin();
    let mut req = request("POST", "/users", Some(&admin), None);
    *req.body_mut() = axum::body::Body::from("{");

    let (status, body) = send(&app, req).await;

    assert_eq!(status, 400);
    assert_eq!(body["kind"], "BODY_DECODING_ERROR");
}

// ── GET /users ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_list_visible_users() {
    let app = test_app(vec![managed_user("bob", "T1"), managed_user("eve", "T2")]);

    let (status, body) = send(&app, request("GET", "/users", Some(&MockAuth::admin()), None)).await;

    assert_eq!(status, 200);
    assert_eq!(body.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn should_report_malformed_filter() {
    let app = test_app(vec![]);

    let (status, body) = send(
        &app,
        request("GET", "/users?filter=%7Bnope", Some(&MockAuth::admin()), None),
    )
    .await;

    assert_eq!(status, 400);
    assert_eq!(body["kind"], "FILTER_DECODING_ERROR");
}

#[tokio::test]
async fn should_reject_unsupported_filter_operator() {
    let app = test_app(vec![]);
    let filter = "%7B%22where%22%3A%5B%7B%22email%22%3A%7B%22%24regex%22%3A%22.%22%7D%7D%5D%7D";

    let (status, body) = send(
        &app,
        request("GET", &format!("/users?filter={filter}"), Some(&MockAuth::admin()), None),
    )
    .await;

    assert_eq!(status, 422);
    assert_eq!(body["kind"], "INVALID_FILTER");
}

// ── /users/{key} ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_return_not_found_for_unknown_key() {
    let app = test_app(vec![]);

    let (status, body) =
        send(&app, request("GET", "/users/ghost", Some(&MockAuth::admin()), None)).await;

    assert_eq!(status, 404);
    assert_eq!(body["kind"], "NOT_FOUND");
}

#[tokio::test]
async fn should_update_user_by_key_without_touching_protected_fields() {
    let app = test_app(vec![managed_user("bob", "T1")]);

    let (status, body) = send(
        &app,
        request(
            "PUT",
            "/users/bob",
            Some(&MockAuth::admin()),
            Some(json!({"firstName": "Bobby", "ownerToken": "forged", "password": "x"})),
        ),
    )
    .await;

    assert_eq!(status, 200);
    assert_eq!(body["firstName"], "Bobby");
    assert_eq!(body["ownerToken"], "T1");
    assert!(body.get("password").is_none());
}

#[tokio::test]
async fn should_cascade_session_deletion_with_owner_token() {
    let app = test_app(vec![managed_user("bob", "T1")]);

    let (status, body) =
        send(&app, request("DELETE", "/users/bob", Some(&MockAuth::admin()), None)).await;

    assert_eq!(status, 200);
    assert_eq!(body["_key"], "bob");

    let requests = app.auth.requests.lock().unwrap();
    let cascades: Vec<_> = requests
        .iter()
        .filter(|r| r.method == Method::DELETE)
        .collect();
    assert_eq!(cascades.len(), 1);
    let url = reqwest::Url::parse(&cascades[0].url).unwrap();
    assert_eq!(url.path(), "/sessions");
    let owner_tokens = url
        .query_pairs()
        .find(|(name, _)| name == "ownerTokens")
        .map(|(_, value)| value.into_owned())
        .unwrap();
    assert_eq!(owner_tokens, r#"["T1"]"#);

    let queries = app.db.queries.lock().unwrap();
    assert!(queries.iter().any(|q| q.aql.starts_with("FOR e IN @@edges")));
}

#[tokio::test]
async fn should_change_password_by_key() {
    let app = test_app(vec![managed_user("bob", "T1")]);

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/users/bob/password",
            Some(&MockAuth::admin()),
            Some(json!({"password": "new-secret"})),
        ),
    )
    .await;

    assert_eq!(status, 200);
    assert!(body.get("password").is_none());
    let stored = app.db.users.lock().unwrap();
    let hash = stored[0]["password"].as_str().unwrap();
    assert!(bcrypt::verify("new-secret", hash).unwrap());
}

// ── Seed path ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_rehash_seed_path_users_in_background() {
    let app = test_app(vec![]);

    let (status, _) = send(
        &app,
        request(
            "POST",
            "/users",
            Some(&MockAuth::admin()),
            Some(json!({"_key": "seeded", "email": "s@example.com", "password": "pw", "role": "USER"})),
        ),
    )
    .await;
    assert_eq!(status, 201);

    let mut rehashed = false;
    for _ in 0..100 {
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        let queries = app.db.queries.lock().unwrap();
        if queries.iter().any(|q| q.aql.contains("UPDATE u IN users")) {
            rehashed = true;
            break;
        }
    }
    assert!(rehashed);
    let stored = app.db.users.lock().unwrap();
    assert_eq!(stored[0]["_key"], "seeded");
    assert!(bcrypt::verify("pw", stored[0]["password"].as_str().unwrap()).unwrap());
}
