use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, Response, StatusCode};
use bytes::Bytes;
use futures::future::BoxFuture;
use serde_json::{Map, Value, json};
use tower::ServiceExt;

use versatile_domain::role::Role;
use versatile_domain::user::User;
use versatile_server::domain::query::Query;
use versatile_server::domain::types::{HashingPolicy, RehashSettings};
use versatile_server::infra::backend::{
    DatabaseBackend, HttpBackend, OutboundRequest, OutboundResponse, TransportError,
};
use versatile_server::infra::rate_limit::TokenBucket;
use versatile_server::infra::repository::Repository;
use versatile_server::infra::retry::RetryPolicy;
use versatile_server::router::build_router;
use versatile_server::state::AppState;
use versatile_server::usecase::rehash::RehashSupervisor;
use versatile_testing::auth::MockAuth;
use versatile_testing::fixture::stored_user;

pub const AUTH_URL: &str = "http://auth.test";

// ── FakeDatabase ─────────────────────────────────────────────────────────────

/// Understands the handful of query shapes the users resource issues.
#[derive(Default)]
pub struct FakeDatabase {
    pub users: Mutex<Vec<Map<String, Value>>>,
    pub queries: Mutex<Vec<Query>>,
}

impl FakeDatabase {
    pub fn with_users(users: Vec<User>) -> Self {
        let users = users
            .into_iter()
            .filter_map(|u| match serde_json::to_value(u) {
                Ok(Value::Object(map)) => Some(map),
                _ => None,
            })
            .collect();
        Self {
            users: Mutex::new(users),
            queries: Mutex::default(),
        }
    }

    fn answer(&self, query: &Query) -> Vec<Value> {
        let aql = query.aql.as_str();
        let vars = &query.bind_vars;
        let mut users = self.users.lock().unwrap();

        if aql.contains("INSERT u IN users") {
            let inserted: Vec<Map<String, Value>> = vars["users"]
                .as_array()
                .cloned()
                .unwrap_or_default()
                .into_iter()
                .enumerate()
                .filter_map(|(i, u)| u.as_object().cloned().map(|u| (i, u)))
                .map(|(i, mut u)| {
                    let key = u
                        .get("_key")
                        .and_then(Value::as_str)
                        .map(str::to_owned)
                        .unwrap_or_else(|| format!("gen{}{i}", users.len()));
                    u.insert("_key".into(), json!(key));
                    u.insert("_id".into(), json!(format!("users/{key}")));
                    u.insert("_rev".into(), json!("_rev1"));
                    u
                })
                .collect();
            users.extend(inserted.iter().cloned());
            return inserted.into_iter().map(Value::Object).collect();
        }

        if aql.starts_with("FOR u IN @users\nUPDATE u IN users") {
            for patch in vars["users"].as_array().cloned().unwrap_or_default() {
                if let Some(stored) = users.iter_mut().find(|u| u.get("_key") == patch.get("_key")) {
                    if let Some(patch) = patch.as_object() {
                        stored.extend(patch.clone());
                    }
                }
            }
            return vec![];
        }

        if aql.contains("FILTER u.email == @email") {
            return users
                .iter()
                .filter(|u| u.get("email") == vars.get("email"))
                .cloned()
                .map(Value::Object)
                .collect();
        }

        if aql.starts_with("FOR e IN @@edges") {
            return vec![];
        }

        let caller = vars.get("userID");
        let in_scope = |u: &Map<String, Value>| {
            let own = u.get("_id") == caller;
            let created = u.get("createdBy") == caller;
            if aql.contains("FILTER u.createdBy == @userID || u._id == @userID") {
                own || created
            } else if aql.contains("FILTER u.createdBy == @userID") {
                created
            } else {
                own
            }
        };
        let by_id = |u: &Map<String, Value>| {
            !aql.contains("u._id == @f0") || u.get("_id") == vars.get("f0")
        };

        if aql.contains("REMOVE u IN users") {
            let (removed, kept): (Vec<_>, Vec<_>) =
                users.drain(..).partition(|u| in_scope(u) && by_id(u));
            *users = kept;
            return removed.into_iter().map(Value::Object).collect();
        }

        let patch = vars.get("user").and_then(Value::as_object).cloned();
        users
            .iter_mut()
            .filter(|u| in_scope(u) && by_id(u))
            .map(|u| {
                if let Some(patch) = &patch {
                    u.extend(patch.clone());
                }
                Value::Object(u.clone())
            })
            .collect()
    }
}

impl DatabaseBackend for FakeDatabase {
    fn execute<'a>(&'a self, query: &'a Query) -> BoxFuture<'a, Result<Vec<Value>, TransportError>> {
        self.queries.lock().unwrap().push(query.clone());
        let rows = self.answer(query);
        Box::pin(async move { Ok(rows) })
    }
}

// ── FakeAuthService ──────────────────────────────────────────────────────────

/// Records outbound calls and answers like the auth service would.
#[derive(Default)]
pub struct FakeAuthService {
    pub requests: Mutex<Vec<OutboundRequest>>,
}

impl HttpBackend for FakeAuthService {
    fn execute<'a>(
        &'a self,
        request: &'a OutboundRequest,
    ) -> BoxFuture<'a, Result<OutboundResponse, TransportError>> {
        self.requests.lock().unwrap().push(request.clone());
        let body = match &request.body {
            Some(Value::Object(session)) => {
                let mut session = session.clone();
                session.insert("token".into(), json!("issued-token"));
                session.insert("created".into(), json!("2026-01-01T00:00:00Z"));
                Value::Object(session)
            }
            _ => json!({"token": "revoked-token", "ownerToken": "T1"}),
        };
        Box::pin(async move {
            Ok(OutboundResponse {
                status: StatusCode::OK,
                body: Bytes::from(body.to_string()),
            })
        })
    }
}

// ── App ──────────────────────────────────────────────────────────────────────

pub struct TestApp {
    pub router: Router,
    pub db: Arc<FakeDatabase>,
    pub auth: Arc<FakeAuthService>,
}

pub fn test_app(users: Vec<User>) -> TestApp {
    let db = Arc::new(FakeDatabase::with_users(users));
    let auth = Arc::new(FakeAuthService::default());
    let state = AppState {
        repo: Repository {
            db: db.clone(),
            http: auth.clone(),
            limiter: Arc::new(TokenBucket::new(Duration::from_millis(1), 100)),
            retry: RetryPolicy {
                max_attempts: 1,
                base_delay: Duration::from_millis(1),
            },
        },
        rehash: Arc::new(RehashSupervisor::new(RehashSettings {
            batch_size: 10,
            item_delay: Duration::from_millis(1),
            cost: 4,
        })),
        hashing: HashingPolicy {
            seed_cost: 4,
            interactive_cost: 4,
            full_cost: 4,
        },
        policy_name: "versatile".into(),
        auth_server_url: AUTH_URL.into(),
        edge_collections: vec!["owns".into()],
    };
    TestApp {
        router: build_router(state),
        db,
        auth,
    }
}

/// Stored user created by the mock admin.
pub fn managed_user(key: &str, owner_token: &str) -> User {
    User {
        owner_token: owner_token.into(),
        created_by: MockAuth::admin().user.id,
        ..stored_user(key, &format!("{key}@example.com"), Role::User)
    }
}

// ── Requests ─────────────────────────────────────────────────────────────────

pub fn request(method: &str, uri: &str, auth: Option<&MockAuth>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(auth) = auth {
        for (name, value) in auth.headers().iter() {
            builder = builder.header(name, value);
        }
    }
    let body = match body {
        Some(value) => {
            builder = builder.header("content-type", "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };
    builder.body(body).unwrap()
}

pub async fn send(app: &TestApp, request: Request<Body>) -> (StatusCode, Value) {
    let response: Response<Body> = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}
