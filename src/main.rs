//! ya-note - Main Server
//!
//! Per-user notes with session login, backed by Neo4j or memory.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use ya_note::api::auth_handlers::validate_username;
use ya_note::{Config, StorageBackend};

#[derive(Parser)]
#[command(name = "ya-note")]
#[command(about = "Personal notes server")]
struct Cli {
    /// Path to the YAML config file (default: ./config.yaml)
    #[arg(short, long, global = true, env = "YA_NOTE_CONFIG")]
    config: Option<std::path::PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Port to listen on (overrides config.yaml / SERVER_PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Create a user account without going through signup
    CreateUser {
        #[arg(short, long)]
        username: String,

        #[arg(short, long, env = "YA_NOTE_PASSWORD")]
        password: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,ya_note=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    // Load configuration
    let mut config = Config::from_yaml_and_env(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve { port } => {
            if let Some(port) = port {
                config.server_port = port;
            }
            ya_note::start_server(config).await
        }
        Commands::CreateUser { username, password } => {
            run_create_user(config, &username, &password).await
        }
    }
}

async fn run_create_user(config: Config, username: &str, password: &str) -> Result<()> {
    if config.storage_backend == StorageBackend::Memory {
        anyhow::bail!("create-user needs persistent storage; set storage.backend to neo4j");
    }

    let username = username.trim();
    validate_username(username)
        .map_err(|reason| anyhow::anyhow!("Invalid username '{}': {}", username, reason))?;

    let store = ya_note::connect_store(&config).await?;
    let password_hash =
        bcrypt::hash(password, config.auth.bcrypt_cost).context("Failed to hash password")?;
    let user = store.create_user(username, &password_hash).await?;

    tracing::info!("Created user {} ({})", user.username, user.id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ya_note::AuthConfig;

    fn neo4j_config() -> Config {
        Config {
            server_port: 0,
            public_url: None,
            storage_backend: StorageBackend::Neo4j,
            neo4j_uri: "bolt://127.0.0.1:1".to_string(),
            neo4j_user: "neo4j".to_string(),
            neo4j_password: "unused".to_string(),
            auth: AuthConfig::default(),
        }
    }

    #[tokio::test]
    async fn test_create_user_rejects_invalid_username() {
        for username in ["has space", "", "semi;colon"] {
            let err = run_create_user(neo4j_config(), username, "pass12345")
                .await
                .unwrap_err();
            assert!(
                err.to_string().starts_with("Invalid username"),
                "unexpected error for {:?}: {}",
                username,
                err
            );
        }
    }
}
