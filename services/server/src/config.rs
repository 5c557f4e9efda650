use versatile_core::config::{
    ConfigError, list, normalize_url, or_default, parsed_or, required,
};

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP port (default 3000). Env var: `PORT`.
    pub port: u16,
    /// ArangoDB endpoint; `tcp://` is rewritten to `http://`.
    pub database_url: String,
    pub database_name: String,
    pub database_user: String,
    pub database_password: String,
    /// Used only by `database create` and `database drop`.
    pub database_root_user: String,
    pub database_root_password: String,
    /// Base URL of the auth microservice. Required.
    pub auth_server_url: String,
    /// Policy granted to sessions created at signin.
    pub policy_name: String,
    /// Edge collections cleaned when users are deleted.
    pub edge_collections: Vec<String>,
    pub seed_admin_password: String,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            port: parsed_or("PORT", 3000)?,
            database_url: normalize_url(&or_default("DATABASE_URL", "http://localhost:8529")),
            database_name: or_default("DATABASE_NAME", "versatile"),
            database_user: or_default("DATABASE_USER", ""),
            database_password: or_default("DATABASE_PASSWORD", ""),
            database_root_user: or_default("DATABASE_ROOT_USER", "root"),
            database_root_password: or_default("DATABASE_ROOT_PASSWORD", ""),
            auth_server_url: normalize_url(&required("AUTH_SERVER_URL")?),
            policy_name: or_default("POLICY_NAME", "versatile"),
            edge_collections: list("GRAPH_EDGE_COLLECTIONS"),
            seed_admin_password: or_default("SEED_ADMIN_PASSWORD", "admin"),
        })
    }
}
