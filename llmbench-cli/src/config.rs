//! Layered configuration: defaults, then an optional TOML file, then the
//! environment.

use std::path::Path;

use anyhow::{Context, Result};
use llmbench_core::SimulatorConfig;
use serde::{Deserialize, Serialize};

/// Database used when `DATABASE_URL` is not set.
pub const DEFAULT_DATABASE_URL: &str = "llmbench.db";

/// Where the relational data and the key-value store live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Local file path, `:memory:`, or a `libsql://` / `https://` URL.
    #[serde(default = "default_database_url")]
    pub url: String,

    /// Auth token for a remote database.
    #[serde(default)]
    pub auth_token: Option<String>,

    /// Separate location for the key-value store. Shares `url` when unset.
    #[serde(default)]
    pub cache_url: Option<String>,
}

fn default_database_url() -> String {
    DEFAULT_DATABASE_URL.to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            auth_token: None,
            cache_url: None,
        }
    }
}

/// Final configuration with defaults applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub simulator: SimulatorConfig,

    #[serde(default)]
    pub database: DatabaseConfig,
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from `path` (if given) and the process environment.
    pub fn load(path: Option<&Path>) -> Result<AppConfig> {
        Self::load_with(path, |key| std::env::var(key).ok())
    }

    /// Load configuration with an injectable environment lookup.
    pub fn load_with<F>(path: Option<&Path>, lookup: F) -> Result<AppConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match path {
            Some(path) => {
                let contents = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read config {}", path.display()))?;
                toml::from_str(&contents)
                    .with_context(|| format!("failed to parse config {}", path.display()))?
            }
            None => AppConfig::default(),
        };

        config.simulator = config.simulator.with_overrides(&lookup)?;
        config.simulator.validate()?;

        if let Some(url) = lookup("DATABASE_URL").filter(|v| !v.is_empty()) {
            config.database.url = url;
        }
        if let Some(token) = lookup("DATABASE_AUTH_TOKEN").filter(|v| !v.is_empty()) {
            config.database.auth_token = Some(token);
        }
        if let Some(url) = lookup("CACHE_URL").filter(|v| !v.is_empty()) {
            config.database.cache_url = Some(url);
        }

        Ok(config)
    }
}
