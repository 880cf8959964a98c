//! ya-note
//!
//! A per-user notes service with:
//! - Session cookie login
//! - Author-scoped note CRUD: other users' notes are simply not found
//! - Named routes with login redirects carrying `next`
//! - Neo4j or in-memory storage

pub mod api;
pub mod auth;
pub mod forms;
pub mod notes;
pub mod store;

#[cfg(test)]
pub(crate) mod test_helpers;

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

// ============================================================================
// YAML config structs (deserialization targets)
// ============================================================================

/// Top-level YAML configuration file structure
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub server: ServerYamlConfig,
    pub storage: StorageYamlConfig,
    pub neo4j: Neo4jYamlConfig,
    pub auth: AuthConfig,
}

/// Server configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerYamlConfig {
    pub port: u16,
    /// Externally visible URL, e.g. "https://notes.example.com"
    pub public_url: Option<String>,
}

impl Default for ServerYamlConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            public_url: None,
        }
    }
}

/// Storage configuration section
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct StorageYamlConfig {
    pub backend: StorageBackend,
}

/// Where users, sessions and notes live
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Process memory; everything is lost on restart
    Memory,
    #[default]
    Neo4j,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "neo4j" => Ok(Self::Neo4j),
            other => anyhow::bail!(
                "Unknown storage backend '{}' (expected memory or neo4j)",
                other
            ),
        }
    }
}

/// Neo4j configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Neo4jYamlConfig {
    pub uri: String,
    pub user: String,
    pub password: String,
}

impl Default for Neo4jYamlConfig {
    fn default() -> Self {
        Self {
            uri: "bolt://localhost:7687".into(),
            user: "neo4j".into(),
            password: "ya-note-dev".into(),
        }
    }
}

/// Authentication configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Session cookie lifetime in seconds (default: 1209600 = 2 weeks).
    /// Must be between 1 and [`MAX_SESSION_EXPIRY_SECS`].
    pub session_expiry_secs: u64,
    /// Where anonymous users are sent; `?next=<path>` is appended
    pub login_url: String,
    /// Where a successful login goes when no usable `next` was given
    pub login_redirect_url: String,
    /// Allow new accounts via /auth/signup/
    pub allow_signup: bool,
    /// bcrypt work factor for new passwords
    pub bcrypt_cost: u32,
}

/// Upper bound for `session_expiry_secs`: 100 years.
pub const MAX_SESSION_EXPIRY_SECS: u64 = 100 * 365 * 24 * 3600;

impl AuthConfig {
    /// Reject settings that would break login at request time.
    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_SESSION_EXPIRY_SECS).contains(&self.session_expiry_secs) {
            anyhow::bail!(
                "auth.session_expiry_secs must be between 1 and {} (got {})",
                MAX_SESSION_EXPIRY_SECS,
                self.session_expiry_secs
            );
        }
        Ok(())
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_expiry_secs: 1_209_600,
            login_url: api::urls::LOGIN.to_string(),
            login_redirect_url: api::urls::HOME.to_string(),
            allow_signup: true,
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }
}

// ============================================================================
// Runtime config (what the application actually uses)
// ============================================================================

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: u16,
    pub public_url: Option<String>,
    pub storage_backend: StorageBackend,
    pub neo4j_uri: String,
    pub neo4j_user: String,
    pub neo4j_password: String,
    pub auth: AuthConfig,
}

impl Config {
    /// Load configuration from `config.yaml` in the working directory (if any)
    /// and the environment.
    pub fn from_env() -> Result<Self> {
        Self::from_yaml_and_env(None)
    }

    /// Load configuration from an optional YAML file, then override with env vars.
    ///
    /// Priority: env var > YAML > default
    ///
    /// If `yaml_path` is None, tries "config.yaml" in CWD. If the file doesn't
    /// exist, falls back to pure env var / defaults.
    pub fn from_yaml_and_env(yaml_path: Option<&Path>) -> Result<Self> {
        let yaml = Self::load_yaml(yaml_path);

        let storage_backend = match std::env::var("STORAGE_BACKEND") {
            Ok(value) => value.parse().context("Invalid STORAGE_BACKEND")?,
            Err(_) => yaml.storage.backend,
        };

        let mut auth = yaml.auth;
        if let Ok(value) = std::env::var("SESSION_EXPIRY_SECS") {
            auth.session_expiry_secs = value.parse().context("Invalid SESSION_EXPIRY_SECS")?;
        }
        auth.validate()?;

        Ok(Self {
            server_port: std::env::var("SERVER_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(yaml.server.port),
            public_url: std::env::var("PUBLIC_URL").ok().or(yaml.server.public_url),
            storage_backend,
            neo4j_uri: std::env::var("NEO4J_URI").unwrap_or(yaml.neo4j.uri),
            neo4j_user: std::env::var("NEO4J_USER").unwrap_or(yaml.neo4j.user),
            neo4j_password: std::env::var("NEO4J_PASSWORD").unwrap_or(yaml.neo4j.password),
            auth,
        })
    }

    /// Try to load and parse a YAML config file. Returns defaults on any failure.
    fn load_yaml(yaml_path: Option<&Path>) -> YamlConfig {
        let default_path = Path::new("config.yaml");
        let path = yaml_path.unwrap_or(default_path);

        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_yaml::from_str(&contents) {
                Ok(config) => {
                    tracing::info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {}. Using defaults.", path.display(), e);
                    YamlConfig::default()
                }
            },
            Err(_) => {
                tracing::debug!(
                    "No config file at {}, using env vars / defaults",
                    path.display()
                );
                YamlConfig::default()
            }
        }
    }
}

// ============================================================================
// Startup
// ============================================================================

/// Open the configured storage backend
pub async fn connect_store(config: &Config) -> Result<Arc<dyn store::NoteStore>> {
    match config.storage_backend {
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage: data is lost on restart");
            Ok(Arc::new(store::MemoryStore::new()))
        }
        StorageBackend::Neo4j => {
            let client = store::Neo4jClient::new(
                &config.neo4j_uri,
                &config.neo4j_user,
                &config.neo4j_password,
            )
            .await?;
            tracing::info!("Connected to Neo4j at {}", config.neo4j_uri);
            Ok(Arc::new(client))
        }
    }
}

/// Run the HTTP server until Ctrl+C
pub async fn start_server(config: Config) -> Result<()> {
    let store = connect_store(&config).await?;
    let port = config.server_port;
    let state = api::handlers::ServerState::new(store, config);
    let app = api::create_router(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

// ============================================================================
// Tests
// ============================================================================
