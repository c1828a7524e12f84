//! Shared test utilities for llmbench-core integration tests

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use llmbench_core::SimulatorConfig;
use llmbench_kv::{InMemoryKeyValueStore, KeyValueStore};
use llmbench_storage::{Catalog, Metric, MetricId, MetricMean, Model, ModelId, SampleStore};

/// A side effect observed by the fakes, in the order it happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    DeleteAllSamples,
    Insert {
        model: String,
        metric: String,
        count: usize,
    },
    Set(String),
    SetIfAbsent(String),
    Delete(String),
    DeleteIfEquals(String),
}

impl Event {
    #[allow(dead_code)]
    pub fn insert(model: &str, metric: &str, count: usize) -> Self {
        Self::Insert {
            model: model.to_string(),
            metric: metric.to_string(),
            count,
        }
    }
}

/// Event log shared between the fake storage and the recording store.
#[derive(Clone, Default)]
pub struct Events(Arc<Mutex<Vec<Event>>>);

impl Events {
    fn record(&self, event: Event) {
        self.0.lock().unwrap().push(event);
    }

    #[allow(dead_code)]
    pub fn snapshot(&self) -> Vec<Event> {
        self.0.lock().unwrap().clone()
    }
}

/// Config with defaults except for a short sample series.
#[allow(dead_code)]
pub fn config() -> SimulatorConfig {
    SimulatorConfig::default().with_sample_count(5)
}

/// In-process catalog and sample store that records every mutation.
pub struct FakeStorage {
    events: Events,
    models: Vec<Model>,
    metrics: Vec<Metric>,
    samples: Mutex<Vec<(ModelId, MetricId, f64)>>,
    list_calls: AtomicUsize,
    list_delay: Option<Duration>,
    fail_inserts: bool,
}

#[allow(dead_code)]
impl FakeStorage {
    pub fn new(events: Events) -> Self {
        Self {
            events,
            models: Vec::new(),
            metrics: Vec::new(),
            samples: Mutex::new(Vec::new()),
            list_calls: AtomicUsize::new(0),
            list_delay: None,
            fail_inserts: false,
        }
    }

    pub fn with_model(mut self, name: &str, company_key: &str) -> Self {
        self.models.push(Model {
            id: ModelId::new(),
            name: name.to_string(),
            company_key: company_key.to_string(),
        });
        self
    }

    pub fn with_metric(mut self, name: &str) -> Self {
        self.metrics.push(Metric {
            id: MetricId::new(),
            name: name.to_string(),
        });
        self
    }

    /// Make every catalog listing take `delay`.
    pub fn with_list_delay(mut self, delay: Duration) -> Self {
        self.list_delay = Some(delay);
        self
    }

    /// Make every sample write fail.
    pub fn with_failing_inserts(mut self) -> Self {
        self.fail_inserts = true;
        self
    }

    /// Number of runs that reached the catalog.
    pub fn runs(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn sample_count(&self) -> usize {
        self.samples.lock().unwrap().len()
    }

    fn model_name(&self, id: ModelId) -> String {
        self.models
            .iter()
            .find(|m| m.id == id)
            .map(|m| m.name.clone())
            .unwrap_or_default()
    }

    fn metric_name(&self, id: MetricId) -> String {
        self.metrics
            .iter()
            .find(|m| m.id == id)
            .map(|m| m.name.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Catalog for FakeStorage {
    async fn list_models(&self) -> llmbench_storage::Result<Vec<Model>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.list_delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.models.clone())
    }

    async fn list_metrics(&self) -> llmbench_storage::Result<Vec<Metric>> {
        Ok(self.metrics.clone())
    }

    async fn get_metric_by_name(&self, name: &str) -> llmbench_storage::Result<Option<Metric>> {
        Ok(self.metrics.iter().find(|m| m.name == name).cloned())
    }
}

#[async_trait]
impl SampleStore for FakeStorage {
    async fn delete_all_samples(&self) -> llmbench_storage::Result<()> {
        self.events.record(Event::DeleteAllSamples);
        self.samples.lock().unwrap().clear();
        Ok(())
    }

    async fn bulk_insert_samples(
        &self,
        model_id: ModelId,
        metric_id: MetricId,
        values: &[f64],
    ) -> llmbench_storage::Result<usize> {
        if self.fail_inserts {
            return Err(llmbench_storage::Error::InvalidData("disk full".into()));
        }
        self.events.record(Event::Insert {
            model: self.model_name(model_id),
            metric: self.metric_name(metric_id),
            count: values.len(),
        });
        self.samples
            .lock()
            .unwrap()
            .extend(values.iter().map(|v| (model_id, metric_id, *v)));
        Ok(values.len())
    }

    async fn metric_means_by_model(
        &self,
        metric_name: &str,
    ) -> llmbench_storage::Result<Vec<MetricMean>> {
        let mut sums: HashMap<String, (f64, usize)> = HashMap::new();
        for (model_id, metric_id, value) in self.samples.lock().unwrap().iter() {
            if self.metric_name(*metric_id) == metric_name {
                let entry = sums.entry(self.model_name(*model_id)).or_default();
                entry.0 += value;
                entry.1 += 1;
            }
        }

        let mut means: Vec<MetricMean> = sums
            .into_iter()
            .map(|(model_name, (sum, n))| MetricMean {
                model_name,
                mean_value: sum / n as f64,
            })
            .collect();
        means.sort_by(|a, b| b.mean_value.total_cmp(&a.mean_value));
        Ok(means)
    }
}

/// In-memory key-value store that records every write.
pub struct RecordingStore {
    events: Events,
    inner: InMemoryKeyValueStore,
}

#[allow(dead_code)]
impl RecordingStore {
    pub fn new(events: Events) -> Self {
        Self {
            events,
            inner: InMemoryKeyValueStore::new(),
        }
    }

    /// The wrapped store, for setup and inspection without recording.
    pub fn inner(&self) -> &InMemoryKeyValueStore {
        &self.inner
    }
}

#[async_trait]
impl KeyValueStore for RecordingStore {
    async fn get(&self, key: &str) -> llmbench_kv::Result<Option<String>> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> llmbench_kv::Result<()> {
        self.events.record(Event::Set(key.to_string()));
        self.inner.set(key, value, ttl).await
    }

    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> llmbench_kv::Result<bool> {
        self.events.record(Event::SetIfAbsent(key.to_string()));
        self.inner.set_if_absent(key, value, ttl).await
    }

    async fn delete(&self, key: &str) -> llmbench_kv::Result<bool> {
        self.events.record(Event::Delete(key.to_string()));
        self.inner.delete(key).await
    }

    async fn delete_if_equals(&self, key: &str, expected: &str) -> llmbench_kv::Result<bool> {
        self.events.record(Event::DeleteIfEquals(key.to_string()));
        self.inner.delete_if_equals(key, expected).await
    }
}
