//! ArangoDB over its HTTP API: cursor queries plus the administrative calls
//! behind the `database` subcommands.

use anyhow::{Context as _, anyhow};
use futures::future::BoxFuture;
use http::StatusCode;
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::domain::query::Query;
use crate::infra::backend::{DatabaseBackend, TransportError};

const BATCH_SIZE: u32 = 1000;

#[derive(Debug, Clone, Default)]
pub struct BasicAuth {
    pub user: String,
    pub password: String,
}

#[derive(Clone)]
pub struct ArangoClient {
    pub client: Client,
    pub base_url: String,
    pub database: String,
    pub auth: BasicAuth,
}

#[derive(Serialize)]
struct CursorRequest<'a> {
    query: &'a str,
    #[serde(rename = "bindVars")]
    bind_vars: &'a Map<String, Value>,
    #[serde(rename = "batchSize")]
    batch_size: u32,
}

#[derive(Deserialize)]
struct CursorPage {
    #[serde(default)]
    result: Vec<Value>,
    #[serde(rename = "hasMore", default)]
    has_more: bool,
    #[serde(default)]
    id: Option<String>,
}

#[derive(Deserialize)]
struct ArangoFailure {
    #[serde(rename = "errorMessage", default)]
    error_message: String,
    #[serde(rename = "errorNum", default)]
    error_num: i64,
}

impl ArangoClient {
    fn db_url(&self, path: &str) -> String {
        format!("{}/_db/{}{}", self.base_url, self.database, path)
    }

    fn authed(&self, builder: RequestBuilder, auth: &BasicAuth) -> RequestBuilder {
        builder.basic_auth(&auth.user, Some(&auth.password))
    }

    /// Sends the request and returns status plus parsed body. Non-2xx statuses
    /// are returned, not raised; the caller decides which ones are acceptable.
    async fn exchange(&self, builder: RequestBuilder) -> Result<(StatusCode, Value), TransportError> {
        let response = builder.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .context("decode arangodb response")
                .map_err(TransportError::Fatal)?
        };
        Ok((status, body))
    }

    async fn expect_success(&self, builder: RequestBuilder) -> Result<Value, TransportError> {
        let (status, body) = self.exchange(builder).await?;
        if status.is_success() {
            return Ok(body);
        }
        let failure: ArangoFailure = serde_json::from_value(body).unwrap_or(ArangoFailure {
            error_message: String::new(),
            error_num: 0,
        });
        let error = anyhow!(
            "arangodb returned {status} (error {}): {}",
            failure.error_num,
            failure.error_message
        );
        if status == StatusCode::SERVICE_UNAVAILABLE {
            Err(TransportError::Transient(error))
        } else {
            Err(TransportError::Fatal(error))
        }
    }

    async fn cursor(&self, query: &Query) -> Result<Vec<Value>, TransportError> {
        let request = CursorRequest {
            query: &query.aql,
            bind_vars: &query.bind_vars,
            batch_size: BATCH_SIZE,
        };
        let builder = self.authed(
            self.client.post(self.db_url("/_api/cursor")).json(&request),
            &self.auth,
        );
        let mut page: CursorPage = decode_page(self.expect_success(builder).await?)?;
        let mut rows = std::mem::take(&mut page.result);

        while page.has_more {
            let id = page
                .id
                .take()
                .ok_or_else(|| TransportError::Fatal(anyhow!("cursor has more results but no id")))?;
            let builder = self.authed(
                self.client.put(self.db_url(&format!("/_api/cursor/{id}"))),
                &self.auth,
            );
            page = decode_page(self.expect_success(builder).await?)?;
            rows.append(&mut page.result);
        }
        Ok(rows)
    }

    /// Creates the database and grants `self.auth.user` access to it.
    pub async fn create_database(&self, root: &BasicAuth) -> anyhow::Result<()> {
        let body = json!({
            "name": self.database,
            "users": [{"username": self.auth.user, "passwd": self.auth.password, "active": true}],
        });
        let builder = self.authed(
            self.client
                .post(format!("{}/_api/database", self.base_url))
                .json(&body),
            root,
        );
        let (status, body) = self.exchange(builder).await?;
        if status == StatusCode::CONFLICT {
            tracing::info!(database = %self.database, "database already exists");
        } else if !status.is_success() {
            return Err(anyhow!("create database failed with {status}: {body}"));
        }
        Ok(())
    }

    pub async fn drop_database(&self, root: &BasicAuth) -> anyhow::Result<()> {
        let builder = self.authed(
            self.client
                .delete(format!("{}/_api/database/{}", self.base_url, self.database)),
            root,
        );
        let (status, body) = self.exchange(builder).await?;
        if status == StatusCode::NOT_FOUND {
            tracing::info!(database = %self.database, "database does not exist");
        } else if !status.is_success() {
            return Err(anyhow!("drop database failed with {status}: {body}"));
        }
        Ok(())
    }

    pub async fn ensure_collection(&self, name: &str) -> anyhow::Result<()> {
        let builder = self.authed(
            self.client
                .post(self.db_url("/_api/collection"))
                .json(&json!({"name": name})),
            &self.auth,
        );
        let (status, body) = self.exchange(builder).await?;
        if status.is_success() {
            tracing::info!(collection = name, "collection created");
        } else if status != StatusCode::CONFLICT {
            return Err(anyhow!("create collection {name} failed with {status}: {body}"));
        }
        Ok(())
    }

    /// Creating an index that already exists is a no-op in ArangoDB.
    pub async fn ensure_persistent_index(
        &self,
        collection: &str,
        fields: &[&str],
    ) -> anyhow::Result<()> {
        let url = self.db_url(&format!("/_api/index?collection={collection}"));
        let builder = self.authed(
            self.client
                .post(url)
                .json(&json!({"type": "persistent", "fields": fields})),
            &self.auth,
        );
        self.expect_success(builder)
            .await
            .with_context(|| format!("create index on {collection}({})", fields.join(", ")))?;
        Ok(())
    }
}

fn decode_page(body: Value) -> Result<CursorPage, TransportError> {
    serde_json::from_value(body)
        .context("decode cursor page")
        .map_err(TransportError::Fatal)
}

impl DatabaseBackend for ArangoClient {
    fn execute<'a>(&'a self, query: &'a Query) -> BoxFuture<'a, Result<Vec<Value>, TransportError>> {
        Box::pin(self.cursor(query))
    }
}
