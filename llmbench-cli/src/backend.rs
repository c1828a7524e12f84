//! Opening the relational store and the key-value store from config.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use llmbench_kv::{KeyValueStore, LibsqlKeyValueStore};
use llmbench_storage::TursoBenchmarkStorage;
use tracing::info;

use crate::config::DatabaseConfig;

/// Parsed database location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location<'a> {
    Memory,
    Local(&'a Path),
    Remote(&'a str),
}

impl<'a> Location<'a> {
    pub fn parse(url: &'a str) -> Self {
        if url == ":memory:" {
            Self::Memory
        } else if ["libsql://", "https://", "http://"]
            .iter()
            .any(|scheme| url.starts_with(scheme))
        {
            Self::Remote(url)
        } else {
            Self::Local(Path::new(url))
        }
    }
}

fn auth_token(config: &DatabaseConfig, url: &str) -> Result<String> {
    match &config.auth_token {
        Some(token) => Ok(token.clone()),
        None => bail!("DATABASE_AUTH_TOKEN is required for remote database {url}"),
    }
}

/// The catalog and sample store.
pub async fn open_storage(config: &DatabaseConfig) -> Result<Arc<TursoBenchmarkStorage>> {
    let storage = match Location::parse(&config.url) {
        Location::Memory => TursoBenchmarkStorage::new_memory().await,
        Location::Local(path) => TursoBenchmarkStorage::new_local(path).await,
        Location::Remote(url) => {
            TursoBenchmarkStorage::new_remote(url, &auth_token(config, url)?).await
        }
    }
    .with_context(|| format!("failed to open database {}", config.url))?;

    info!(url = %config.url, "opened benchmark storage");
    Ok(Arc::new(storage))
}

/// The key-value store for locks, retry counters and cached rankings.
pub async fn open_cache(config: &DatabaseConfig) -> Result<Arc<dyn KeyValueStore>> {
    let url = config.cache_url.as_deref().unwrap_or(&config.url);
    let store = match Location::parse(url) {
        Location::Memory => LibsqlKeyValueStore::new_memory().await,
        Location::Local(path) => LibsqlKeyValueStore::new_local(path).await,
        Location::Remote(remote) => {
            LibsqlKeyValueStore::new_remote(remote, &auth_token(config, remote)?).await
        }
    }
    .with_context(|| format!("failed to open key-value store {url}"))?;

    info!(url, "opened key-value store");
    Ok(Arc::new(store))
}
