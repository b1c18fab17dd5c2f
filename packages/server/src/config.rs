use std::collections::HashSet;
use std::path::PathBuf;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub allow_origins: Vec<String>,
    pub max_age: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Root directory for stored blobs.
    pub base_dir: PathBuf,
    /// Comma-separated list of permitted file extensions.
    pub allowed_extensions: String,
    /// Maximum accepted upload size in bytes.
    pub max_upload_size: u64,
}

impl StorageConfig {
    /// Parse the allow-list into a lower-cased set. An empty list rejects
    /// every extension.
    pub fn allowed_extensions(&self) -> HashSet<String> {
        self.allowed_extensions
            .split(',')
            .map(|ext| ext.trim().to_ascii_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect()
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("server.cors.allow_origins", Vec::<String>::new())?
            .set_default("server.cors.max_age", 3600)?
            .set_default("database.url", "sqlite://imgvault.db?mode=rwc")?
            .set_default("storage.base_dir", "./data")?
            .set_default("storage.allowed_extensions", "jpg,png")?
            .set_default("storage.max_upload_size", 32 * 1024 * 1024)?
            // Load from config/config.toml
            .add_source(File::with_name("config/config").required(false))
            // Override from environment (e.g., IMGVAULT__STORAGE__BASE_DIR)
            .add_source(Environment::with_prefix("IMGVAULT").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
