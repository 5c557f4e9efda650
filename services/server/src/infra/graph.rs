use serde_json::{Value, json};

use versatile_domain::user::User;

use crate::domain::query::Query;
use crate::domain::repository::{GraphCascadeDeleter, QueryRunner};
use crate::error::ServerError;

const REMOVE_EDGES: &str = "FOR e IN @@edges\n\
    FILTER e._from IN @ids || e._to IN @ids\n\
    REMOVE e IN @@edges";

/// Removes every edge touching the deleted users from the configured edge
/// collections.
#[derive(Clone)]
pub struct ArangoGraphCascade<Q> {
    pub runner: Q,
    pub edge_collections: Vec<String>,
}

impl<Q: QueryRunner> GraphCascadeDeleter for ArangoGraphCascade<Q> {
    async fn delete_cascade(&self, users: &[User]) -> Result<(), ServerError> {
        let ids: Vec<&str> = users
            .iter()
            .map(|u| u.id.as_str())
            .filter(|id| !id.is_empty())
            .collect();
        if ids.is_empty() {
            return Ok(());
        }
        for collection in &self.edge_collections {
            let query = Query::new(REMOVE_EDGES)
                .bind("@edges", collection.as_str())
                .bind("ids", json!(ids));
            let _: Vec<Value> = self.runner.run(&query).await?;
            tracing::debug!(collection = %collection, users = ids.len(), "edges removed");
        }
        Ok(())
    }
}
