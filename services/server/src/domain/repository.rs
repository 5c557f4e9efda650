#![allow(async_fn_in_trait)]

use std::future::Future;

use http::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;

use versatile_domain::session::Session;
use versatile_domain::user::User;

use crate::domain::query::Query;
use crate::domain::types::Caller;
use crate::error::ServerError;

/// Executes parameterized queries against the document store.
///
/// The returned future is `Send` so runners can be moved into background tasks.
pub trait QueryRunner: Send + Sync {
    fn run<T>(&self, query: &Query) -> impl Future<Output = Result<Vec<T>, ServerError>> + Send
    where
        T: DeserializeOwned + Send;
}

/// Issues calls to the auth microservice.
pub trait HttpSender: Send + Sync {
    /// `body` is only attached for methods that carry one.
    async fn send<T>(
        &self,
        auth_payload: &str,
        method: Method,
        url: &str,
        body: Option<&Value>,
    ) -> Result<T, ServerError>
    where
        T: DeserializeOwned + Send;
}

/// Session lifecycle in the auth microservice.
pub trait SessionStore: Send + Sync {
    async fn create(&self, caller: &Caller, session: &Session) -> Result<Session, ServerError>;
    async fn delete(&self, caller: &Caller, token: &str) -> Result<Session, ServerError>;
    /// Invalidates every session correlated to the users' owner tokens.
    async fn delete_cascade(&self, caller: &Caller, users: &[User]) -> Result<(), ServerError>;
}

/// Removes graph relationships of deleted users.
pub trait GraphCascadeDeleter: Send + Sync {
    async fn delete_cascade(&self, users: &[User]) -> Result<(), ServerError>;
}
