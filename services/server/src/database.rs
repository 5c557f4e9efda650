//! `database` subcommands.

use anyhow::Context as _;

use versatile_domain::role::Role;
use versatile_domain::user::User;

use crate::cli::DatabaseAction;
use crate::config::ServerConfig;
use crate::domain::types::{Caller, USERS_COLLECTION};
use crate::infra::arango::{ArangoClient, BasicAuth};
use crate::state::AppState;

pub async fn run(
    action: DatabaseAction,
    config: &ServerConfig,
    arango: &ArangoClient,
    state: &AppState,
) -> anyhow::Result<()> {
    let root = BasicAuth {
        user: config.database_root_user.clone(),
        password: config.database_root_password.clone(),
    };
    match action {
        DatabaseAction::Create => arango.create_database(&root).await,
        DatabaseAction::Drop => arango.drop_database(&root).await,
        DatabaseAction::Migrate => migrate(arango).await,
        DatabaseAction::Seed => seed(state, &config.seed_admin_password).await,
    }
}

async fn migrate(arango: &ArangoClient) -> anyhow::Result<()> {
    arango.ensure_collection(USERS_COLLECTION).await?;
    arango
        .ensure_persistent_index(USERS_COLLECTION, &["email"])
        .await?;
    tracing::info!("migration complete");
    Ok(())
}

/// Inserts the admin through the seed path and waits for its password to be
/// rehashed at full cost.
async fn seed(state: &AppState, password: &str) -> anyhow::Result<()> {
    let admin = User {
        key: "admin".into(),
        first_name: "Admin".into(),
        email: "admin".into(),
        password: password.to_owned(),
        role: Role::Admin,
        ..Default::default()
    };
    let created = state
        .create_users()
        .execute_one(&Caller::anonymous(), admin)
        .await
        .context("seed admin user")?;
    tracing::info!(user = %created.id, "admin user seeded, waiting for rehash");
    state.rehash.wait().await;
    Ok(())
}
