use anyhow::{Context as _, anyhow};
use http::Method;
use reqwest::Url;
use serde_json::Value;

use versatile_domain::session::Session;
use versatile_domain::user::User;

use crate::domain::repository::{HttpSender, SessionStore};
use crate::domain::types::Caller;
use crate::error::ServerError;

/// Session lifecycle against the auth service.
#[derive(Clone)]
pub struct SessionsInteractor<H: HttpSender> {
    pub sender: H,
    pub auth_server_url: String,
}

impl<H: HttpSender> SessionsInteractor<H> {
    /// `{auth_server_url}/sessions` followed by `segments`, each encoded as a
    /// single path segment.
    fn sessions_url(&self, segments: &[&str]) -> Result<Url, ServerError> {
        let mut url = Url::parse(&self.auth_server_url).context("parse auth server url")?;
        url.path_segments_mut()
            .map_err(|_| anyhow!("auth server url cannot carry a path"))?
            .pop_if_empty()
            .push("sessions")
            .extend(segments);
        Ok(url)
    }

    fn cascade_url(&self, owner_tokens: &[&str]) -> Result<Url, ServerError> {
        let mut url = self.sessions_url(&[])?;
        let encoded = serde_json::to_string(owner_tokens).context("encode owner tokens")?;
        url.query_pairs_mut().append_pair("ownerTokens", &encoded);
        Ok(url)
    }
}

/// Dot segments are dropped by URL building, which would address the
/// collection instead of one session.
fn is_addressable(token: &str) -> bool {
    !matches!(token, "" | "." | "..")
}

impl<H: HttpSender> SessionStore for SessionsInteractor<H> {
    async fn create(&self, caller: &Caller, session: &Session) -> Result<Session, ServerError> {
        let body = serde_json::to_value(session).context("encode session")?;
        let url = self.sessions_url(&[])?;
        self.sender
            .send(&caller.auth_payload, Method::POST, url.as_str(), Some(&body))
            .await
            .map_err(|e| anyhow!(e).context("create session").into())
    }

    async fn delete(&self, caller: &Caller, token: &str) -> Result<Session, ServerError> {
        if !is_addressable(token) {
            return Err(ServerError::Unauthorized);
        }
        let url = self.sessions_url(&[token])?;
        self.sender
            .send(&caller.auth_payload, Method::DELETE, url.as_str(), None)
            .await
            .map_err(|e| anyhow!(e).context("delete session").into())
    }

    async fn delete_cascade(&self, caller: &Caller, users: &[User]) -> Result<(), ServerError> {
        let mut owner_tokens: Vec<&str> = Vec::with_capacity(users.len());
        for token in users.iter().map(|u| u.owner_token.as_str()) {
            if !token.is_empty() && !owner_tokens.contains(&token) {
                owner_tokens.push(token);
            }
        }
        if owner_tokens.is_empty() {
            return Ok(());
        }

        let url = self.cascade_url(&owner_tokens)?;
        let result: Result<Value, ServerError> = self
            .sender
            .send(&caller.auth_payload, Method::DELETE, url.as_str(), None)
            .await;
        result.map(|_| ()).map_err(|e| {
            tracing::error!(
                error = %e,
                owner_tokens = owner_tokens.len(),
                "session cascade failed"
            );
            ServerError::Service(format!("session cascade failed: {e}"))
        })
    }
}
