//! Turso/libSQL implementation of benchmark storage.
//!
//! This module provides persistent storage using Turso (libSQL).
//! It can connect to:
//! - Remote Turso database (cloud)
//! - Local embedded SQLite file
//! - A private in-memory database (tests)

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use libsql::{Builder, Connection, Database};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::seed::{DEFAULT_METRICS, DEFAULT_MODELS, SeedReport};
use crate::types::{Metric, MetricId, MetricMean, Model, ModelId};
use crate::{Catalog, Error, Result, SampleStore};

/// SQL schema for the models table.
const SCHEMA_MODELS: &str = r#"
CREATE TABLE IF NOT EXISTS models (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    company_key TEXT NOT NULL
)
"#;

/// SQL schema for the metrics table.
const SCHEMA_METRICS: &str = r#"
CREATE TABLE IF NOT EXISTS metrics (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL UNIQUE
)
"#;

/// SQL schema for the samples table.
const SCHEMA_SAMPLES: &str = r#"
CREATE TABLE IF NOT EXISTS samples (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    model_id TEXT NOT NULL REFERENCES models(id),
    metric_id TEXT NOT NULL REFERENCES metrics(id),
    value REAL NOT NULL
)
"#;

const INDEX_SAMPLES_MODEL: &str =
    "CREATE INDEX IF NOT EXISTS ix_samples_model_id ON samples(model_id)";

const INDEX_SAMPLES_METRIC: &str =
    "CREATE INDEX IF NOT EXISTS ix_samples_metric_id ON samples(metric_id)";

/// Turso-backed catalog and sample storage.
#[derive(Clone)]
pub struct TursoBenchmarkStorage {
    _db: Arc<Database>,
    conn: Connection,
}

impl TursoBenchmarkStorage {
    /// Create a new storage instance with a local embedded database.
    pub async fn new_local(path: &Path) -> Result<Self> {
        let db = Builder::new_local(path).build().await?;
        Self::from_database(db).await
    }

    /// Create a new storage instance connected to a remote Turso database.
    pub async fn new_remote(url: &str, token: &str) -> Result<Self> {
        let db = Builder::new_remote(url.to_string(), token.to_string())
            .build()
            .await?;
        Self::from_database(db).await
    }

    /// Create a new in-memory storage instance (for testing).
    pub async fn new_memory() -> Result<Self> {
        let db = Builder::new_local(":memory:").build().await?;
        Self::from_database(db).await
    }

    async fn from_database(db: Database) -> Result<Self> {
        // One connection for the lifetime of the storage; an in-memory
        // database is private to the connection that created it.
        let conn = db.connect()?;
        let storage = Self {
            _db: Arc::new(db),
            conn,
        };
        storage.ensure_schema().await?;
        Ok(storage)
    }

    /// Ensure the database schema exists.
    async fn ensure_schema(&self) -> Result<()> {
        self.conn.execute(SCHEMA_MODELS, ()).await?;
        self.conn.execute(SCHEMA_METRICS, ()).await?;
        self.conn.execute(SCHEMA_SAMPLES, ()).await?;
        self.conn.execute(INDEX_SAMPLES_MODEL, ()).await?;
        self.conn.execute(INDEX_SAMPLES_METRIC, ()).await?;
        Ok(())
    }

    /// Add a model to the catalog.
    pub async fn add_model(&self, name: &str, company_key: &str) -> Result<Model> {
        let id = ModelId::new();
        self.conn
            .execute(
                "INSERT INTO models (id, name, company_key) VALUES (?1, ?2, ?3)",
                libsql::params![id.0.to_string(), name, company_key],
            )
            .await?;
        Ok(Model {
            id,
            name: name.to_string(),
            company_key: company_key.to_string(),
        })
    }

    /// Add a metric to the catalog.
    pub async fn add_metric(&self, name: &str) -> Result<Metric> {
        let id = MetricId::new();
        self.conn
            .execute(
                "INSERT INTO metrics (id, name) VALUES (?1, ?2)",
                libsql::params![id.0.to_string(), name],
            )
            .await?;
        Ok(Metric {
            id,
            name: name.to_string(),
        })
    }

    /// Insert the default catalog into tables that are still empty.
    #[instrument(skip(self))]
    pub async fn seed_defaults(&self) -> Result<SeedReport> {
        let mut report = SeedReport::default();

        if self.count("models").await? > 0 {
            info!("models table is not empty, seeding skipped");
        } else {
            for (name, company_key) in DEFAULT_MODELS {
                self.add_model(name, company_key).await?;
                report.models_inserted += 1;
            }
            info!(count = report.models_inserted, "models seeded");
        }

        if self.count("metrics").await? > 0 {
            info!("metrics table is not empty, seeding skipped");
        } else {
            for name in DEFAULT_METRICS {
                self.add_metric(name).await?;
                report.metrics_inserted += 1;
            }
            info!(count = report.metrics_inserted, "metrics seeded");
        }

        Ok(report)
    }

    /// Number of stored samples.
    pub async fn sample_count(&self) -> Result<usize> {
        self.count("samples").await
    }

    async fn count(&self, table: &'static str) -> Result<usize> {
        let mut rows = self
            .conn
            .query(&format!("SELECT COUNT(*) FROM {table}"), ())
            .await?;
        let count: i64 = match rows.next().await? {
            Some(row) => row.get(0)?,
            None => 0,
        };
        usize::try_from(count).map_err(|_| Error::InvalidData(format!("negative count: {count}")))
    }

    fn parse_uuid(raw: &str) -> Result<Uuid> {
        raw.parse()
            .map_err(|_| Error::InvalidData(format!("invalid id: {raw}")))
    }

    fn parse_model(row: &libsql::Row) -> Result<Model> {
        let id_str: String = row.get(0)?;
        Ok(Model {
            id: ModelId(Self::parse_uuid(&id_str)?),
            name: row.get(1)?,
            company_key: row.get(2)?,
        })
    }

    fn parse_metric(row: &libsql::Row) -> Result<Metric> {
        let id_str: String = row.get(0)?;
        Ok(Metric {
            id: MetricId(Self::parse_uuid(&id_str)?),
            name: row.get(1)?,
        })
    }
}

#[async_trait]
impl Catalog for TursoBenchmarkStorage {
    #[instrument(skip(self), level = "debug")]
    async fn list_models(&self) -> Result<Vec<Model>> {
        let mut rows = self
            .conn
            .query("SELECT id, name, company_key FROM models ORDER BY rowid", ())
            .await?;

        let mut models = Vec::new();
        while let Some(row) = rows.next().await? {
            models.push(Self::parse_model(&row)?);
        }
        Ok(models)
    }

    #[instrument(skip(self), level = "debug")]
    async fn list_metrics(&self) -> Result<Vec<Metric>> {
        let mut rows = self
            .conn
            .query("SELECT id, name FROM metrics ORDER BY rowid", ())
            .await?;

        let mut metrics = Vec::new();
        while let Some(row) = rows.next().await? {
            metrics.push(Self::parse_metric(&row)?);
        }
        Ok(metrics)
    }

    #[instrument(skip(self), level = "debug")]
    async fn get_metric_by_name(&self, name: &str) -> Result<Option<Metric>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, name FROM metrics WHERE name = ?1",
                libsql::params![name],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(Self::parse_metric(&row)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl SampleStore for TursoBenchmarkStorage {
    #[instrument(skip(self), level = "debug")]
    async fn delete_all_samples(&self) -> Result<()> {
        let removed = self.conn.execute("DELETE FROM samples", ()).await?;
        debug!(removed, "cleared samples");
        Ok(())
    }

    #[instrument(skip(self, values), fields(count = values.len()), level = "debug")]
    async fn bulk_insert_samples(
        &self,
        model_id: ModelId,
        metric_id: MetricId,
        values: &[f64],
    ) -> Result<usize> {
        let model_id = model_id.0.to_string();
        let metric_id = metric_id.0.to_string();

        // Dropping the transaction without commit rolls it back.
        let tx = self.conn.transaction().await?;
        for value in values {
            tx.execute(
                "INSERT INTO samples (model_id, metric_id, value) VALUES (?1, ?2, ?3)",
                libsql::params![model_id.as_str(), metric_id.as_str(), *value],
            )
            .await?;
        }
        tx.commit().await?;

        Ok(values.len())
    }

    #[instrument(skip(self), level = "debug")]
    async fn metric_means_by_model(&self, metric_name: &str) -> Result<Vec<MetricMean>> {
        let mut rows = self
            .conn
            .query(
                "SELECT m.name, AVG(s.value) AS mean_value
                 FROM samples s
                 JOIN models m ON s.model_id = m.id
                 JOIN metrics x ON s.metric_id = x.id
                 WHERE x.name = ?1
                 GROUP BY m.name
                 ORDER BY mean_value DESC",
                libsql::params![metric_name],
            )
            .await?;

        let mut means = Vec::new();
        while let Some(row) = rows.next().await? {
            means.push(MetricMean {
                model_name: row.get(0)?,
                mean_value: row.get(1)?,
            });
        }
        Ok(means)
    }
}
