use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use clap::Parser;
use tracing::info;

use versatile_core::tracing::init_tracing;
use versatile_server::cli::{Cli, Command};
use versatile_server::config::ServerConfig;
use versatile_server::database;
use versatile_server::domain::types::{HashingPolicy, RehashSettings};
use versatile_server::infra::arango::{ArangoClient, BasicAuth};
use versatile_server::infra::http::ReqwestBackend;
use versatile_server::infra::rate_limit::TokenBucket;
use versatile_server::infra::repository::Repository;
use versatile_server::infra::retry::RetryPolicy;
use versatile_server::router::build_router;
use versatile_server::state::AppState;
use versatile_server::usecase::rehash::RehashSupervisor;

const LIMITER_INTERVAL: Duration = Duration::from_millis(10);
const LIMITER_CAPACITY: u32 = 10;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = ServerConfig::from_env().context("load configuration")?;

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .context("build http client")?;
    let arango = ArangoClient {
        client: client.clone(),
        base_url: config.database_url.clone(),
        database: config.database_name.clone(),
        auth: BasicAuth {
            user: config.database_user.clone(),
            password: config.database_password.clone(),
        },
    };

    let state = AppState {
        repo: Repository {
            db: Arc::new(arango.clone()),
            http: Arc::new(ReqwestBackend { client }),
            limiter: Arc::new(TokenBucket::new(LIMITER_INTERVAL, LIMITER_CAPACITY)),
            retry: RetryPolicy::default(),
        },
        rehash: Arc::new(RehashSupervisor::new(RehashSettings::default())),
        hashing: HashingPolicy::default(),
        policy_name: config.policy_name.clone(),
        auth_server_url: config.auth_server_url.clone(),
        edge_collections: config.edge_collections.clone(),
    };

    match cli.command {
        Some(Command::Database { action }) => {
            database::run(action, &config, &arango, &state).await?;
            info!(?action, "database command finished");
            Ok(())
        }
        Some(Command::Run) | None => serve(&config, state).await,
    }
}

async fn serve(config: &ServerConfig, state: AppState) -> anyhow::Result<()> {
    let router = build_router(state);
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("bind {addr}"))?;

    info!("versatile server listening on {addr}");
    axum::serve(listener, router)
        .await
        .context("server error")
}
