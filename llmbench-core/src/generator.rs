//! Synthetic sample generation.
//!
//! Every provider shares one behaviour: draw uniformly from the metric's
//! range and round to two decimals. Providers differ only in which ranges
//! they use, so they are a key into a [`RangeTable`] rather than separate
//! types.

use std::collections::HashMap;
use std::fmt;

use rand::SeedableRng;
use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use sha2::{Digest, Sha256};

use crate::error::GenerationError;

/// A benchmark metric with a known simulation range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    /// Time to first token, seconds.
    TimeToFirstToken,
    /// Tokens per second.
    TokensPerSecond,
    /// End-to-end request latency, seconds.
    EndToEndLatency,
    /// Requests per second.
    RequestsPerSecond,
}

impl MetricKind {
    pub const ALL: [MetricKind; 4] = [
        Self::TimeToFirstToken,
        Self::TokensPerSecond,
        Self::EndToEndLatency,
        Self::RequestsPerSecond,
    ];

    /// Catalog name of the metric.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TimeToFirstToken => "ttft",
            Self::TokensPerSecond => "tps",
            Self::EndToEndLatency => "e2e_latency",
            Self::RequestsPerSecond => "rps",
        }
    }

    /// Parse a catalog metric name.
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.as_str() == name)
    }

    /// Range shared by every provider unless overridden.
    pub fn default_range(&self) -> MetricRange {
        match self {
            Self::TimeToFirstToken => MetricRange::new(0.05, 2.0),
            Self::TokensPerSecond => MetricRange::new(10.0, 150.0),
            Self::EndToEndLatency => MetricRange::new(0.2, 10.0),
            Self::RequestsPerSecond => MetricRange::new(1.0, 100.0),
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Model provider, parsed from a catalog company key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelKind {
    OpenAi,
    Meta,
    Anthropic,
}

impl ModelKind {
    /// Parse a catalog company key.
    pub fn parse(company_key: &str) -> Option<Self> {
        match company_key {
            "openai" => Some(Self::OpenAi),
            "meta" => Some(Self::Meta),
            "anthropic" => Some(Self::Anthropic),
            _ => None,
        }
    }
}

/// Closed interval values are drawn from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricRange {
    pub min: f64,
    pub max: f64,
}

impl MetricRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }
}

/// Per-provider metric ranges, falling back to [`MetricKind::default_range`].
#[derive(Debug, Clone, Default)]
pub struct RangeTable {
    overrides: HashMap<(ModelKind, MetricKind), MetricRange>,
}

impl RangeTable {
    /// Override the range of one metric for one provider.
    #[must_use]
    pub fn with_range(mut self, kind: ModelKind, metric: MetricKind, range: MetricRange) -> Self {
        self.overrides.insert((kind, metric), range);
        self
    }

    /// Range for a provider and metric.
    pub fn range(&self, kind: ModelKind, metric: MetricKind) -> MetricRange {
        self.overrides
            .get(&(kind, metric))
            .copied()
            .unwrap_or_else(|| metric.default_range())
    }
}

/// Derive the per-(model, metric) RNG seed from the global seed.
///
/// Hashes `"{model}_{metric}_{seed}"` with SHA-256, reads the digest as a
/// big-endian integer and reduces it modulo 2^32, i.e. keeps the last four
/// bytes.
pub fn derive_seed(model_name: &str, metric_name: &str, seed: &str) -> u32 {
    let digest = Sha256::digest(format!("{model_name}_{metric_name}_{seed}").as_bytes());
    let tail: [u8; 4] = [digest[28], digest[29], digest[30], digest[31]];
    u32::from_be_bytes(tail)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Produces bounded sample series for (model, metric) pairs.
#[derive(Debug, Clone)]
pub struct SampleGenerator {
    seed: Option<String>,
    ranges: RangeTable,
    count: usize,
}

impl SampleGenerator {
    /// Series length used when none is configured.
    pub const DEFAULT_COUNT: usize = 1000;

    /// Create an unseeded generator with the default range table.
    pub fn new() -> Self {
        Self {
            seed: None,
            ranges: RangeTable::default(),
            count: Self::DEFAULT_COUNT,
        }
    }

    /// Make output deterministic per (model, metric, seed).
    #[must_use]
    pub fn with_seed(mut self, seed: Option<String>) -> Self {
        self.seed = seed.filter(|s| !s.is_empty());
        self
    }

    /// Replace the range table.
    #[must_use]
    pub fn with_ranges(mut self, ranges: RangeTable) -> Self {
        self.ranges = ranges;
        self
    }

    /// Set the series length used by [`generate_for`](Self::generate_for).
    #[must_use]
    pub fn with_count(mut self, count: usize) -> Self {
        self.count = count;
        self
    }

    /// Generate `count` values uniformly drawn from `[min, max]`, rounded to
    /// two decimals.
    pub fn generate(
        &self,
        min: f64,
        max: f64,
        model_name: &str,
        metric_name: &str,
        count: usize,
    ) -> Result<Vec<f64>, GenerationError> {
        // The span itself must be finite for the uniform sampler.
        if !(min.is_finite() && max.is_finite() && min <= max && (max - min).is_finite()) {
            return Err(GenerationError::InvalidRange { min, max });
        }

        let mut rng = match &self.seed {
            Some(seed) => {
                StdRng::seed_from_u64(u64::from(derive_seed(model_name, metric_name, seed)))
            }
            None => StdRng::from_entropy(),
        };
        let uniform = Uniform::new_inclusive(min, max);

        Ok(uniform
            .sample_iter(&mut rng)
            .take(count)
            .map(|v| round2(v).clamp(min, max))
            .collect())
    }

    /// Generate the configured number of values for a catalog model and metric.
    pub fn generate_for(
        &self,
        company_key: &str,
        model_name: &str,
        metric_name: &str,
    ) -> Result<Vec<f64>, GenerationError> {
        let kind = ModelKind::parse(company_key)
            .ok_or_else(|| GenerationError::UnknownModelKind(company_key.to_string()))?;
        let metric = MetricKind::parse(metric_name)
            .ok_or_else(|| GenerationError::UnknownMetric(metric_name.to_string()))?;
        let range = self.ranges.range(kind, metric);
        self.generate(range.min, range.max, model_name, metric_name, self.count)
    }
}

impl Default for SampleGenerator {
    fn default() -> Self {
        Self::new()
    }
}
