//! Mock auth helpers for integration tests.
//!
//! Behind the gateway, requests carry `Auth-Server-Payload`, `Auth-Server-Session`
//! and `Auth-Server-Token`. `MockAuth` builds these headers directly so no real
//! auth service is needed.

use axum::http::{HeaderMap, HeaderName, HeaderValue};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use versatile_auth_types::context::{AUTH_SERVER_PAYLOAD, AUTH_SERVER_SESSION, AUTH_SERVER_TOKEN};
use versatile_domain::role::Role;
use versatile_domain::session::Session;
use versatile_domain::user::{AuthServerPayload, User};

/// Configurable identity injected into test requests.
pub struct MockAuth {
    pub user: User,
    pub role: Role,
    pub token: String,
}

impl MockAuth {
    pub fn new(user_id: &str, role: Role) -> Self {
        Self {
            user: User {
                id: user_id.into(),
                role,
                ..Default::default()
            },
            role,
            token: "test-access-token".into(),
        }
    }

    pub fn admin() -> Self {
        Self::new("users/admin", Role::Admin)
    }

    pub fn session(&self) -> Session {
        Session {
            token: self.token.clone(),
            owner_token: self.user.owner_token.clone(),
            role: self.role,
            ..Default::default()
        }
    }

    /// Base64 `Auth-Server-Payload` value.
    pub fn payload(&self) -> String {
        let payload = AuthServerPayload {
            user: Some(self.user.clone()),
            role: self.role,
        };
        STANDARD.encode(serde_json::to_vec(&payload).unwrap())
    }

    /// Return headers as if the gateway injected them.
    pub fn headers(&self) -> HeaderMap {
        let session = STANDARD.encode(serde_json::to_vec(&self.session()).unwrap());
        let mut map = HeaderMap::new();
        map.insert(
            HeaderName::from_static(AUTH_SERVER_PAYLOAD),
            HeaderValue::from_str(&self.payload()).unwrap(),
        );
        map.insert(
            HeaderName::from_static(AUTH_SERVER_SESSION),
            HeaderValue::from_str(&session).unwrap(),
        );
        map.insert(
            HeaderName::from_static(AUTH_SERVER_TOKEN),
            HeaderValue::from_str(&self.token).unwrap(),
        );
        map
    }
}
