use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::env;

/// Used when neither the deployment config nor the environment provide a key.
pub const DEV_SEED_KEY: &str = "dev-seed-key";

const DEFAULT_DEPLOYMENT_CONFIG: &str = "seeder";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub seed_key: String,
    pub storage: StorageBackend,
}

#[derive(Debug, Clone, Deserialize)]
pub enum StorageBackend {
    Memory,
    Firestore(FirestoreConfig),
}

impl StorageBackend {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Firestore(_) => "firestore",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FirestoreConfig {
    pub project_id: String,
    pub database_id: String,
    pub access_token: Option<String>,
    /// `host:port` of a local Firestore emulator; requests go over plain HTTP.
    pub emulator_host: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let deployment_path = env::var("SEEDER_CONFIG")
            .unwrap_or_else(|_| DEFAULT_DEPLOYMENT_CONFIG.to_string());

        Ok(Self {
            server_host: env::var("SERVER_HOST")
                .unwrap_or_else(|_| "0.0.0.0".to_string()),
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .context("SERVER_PORT must be a valid port number")?,
            seed_key: resolve_seed_key(
                deployment_seed_key(&deployment_path)?,
                env::var("SEED_KEY").ok(),
            ),
            storage: storage_from_env()?,
        })
    }
}

/// Reads `seed_key` from an optional deployment config file
/// (`seeder.toml`, `seeder.json`, ...).
fn deployment_seed_key(path: &str) -> Result<Option<String>> {
    let settings = ::config::Config::builder()
        .add_source(::config::File::with_name(path).required(false))
        .build()
        .with_context(|| format!("Failed to read deployment config {}", path))?;

    Ok(settings.get_string("seed_key").ok())
}

/// Deployment config wins over the environment, which wins over the
/// development default. Blank values are skipped.
pub fn resolve_seed_key(deployment: Option<String>, environment: Option<String>) -> String {
    deployment
        .into_iter()
        .chain(environment)
        .map(|key| key.trim().to_string())
        .find(|key| !key.is_empty())
        .unwrap_or_else(|| DEV_SEED_KEY.to_string())
}

fn storage_from_env() -> Result<StorageBackend> {
    let backend = env::var("STORAGE_BACKEND").unwrap_or_else(|_| "memory".to_string());

    match backend.to_ascii_lowercase().as_str() {
        "memory" => Ok(StorageBackend::Memory),
        "firestore" => Ok(StorageBackend::Firestore(FirestoreConfig {
            project_id: env::var("FIRESTORE_PROJECT_ID")
                .context("FIRESTORE_PROJECT_ID must be set when STORAGE_BACKEND=firestore")?,
            database_id: env::var("FIRESTORE_DATABASE_ID")
                .unwrap_or_else(|_| "(default)".to_string()),
            access_token: env::var("FIRESTORE_ACCESS_TOKEN").ok(),
            emulator_host: env::var("FIRESTORE_EMULATOR_HOST").ok(),
        })),
        other => bail!("STORAGE_BACKEND must be 'memory' or 'firestore', got '{}'", other),
    }
}
