//! Configuration for the simulation pipeline and its scheduler.

use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Shortest lock lifetime handed to the store, used when the configured
/// retry budget multiplies out to less.
pub const MIN_LOCK_TIMEOUT: Duration = Duration::from_secs(1);

/// Configuration for pipeline runs and scheduling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulatorConfig {
    /// Retries after the first attempt for each work item.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Fixed delay between attempts.
    #[serde(default = "default_retry_delay", with = "humantime_serde")]
    pub retry_delay: Duration,

    /// Interval between scheduled runs.
    #[serde(default = "default_schedule_interval", with = "humantime_serde")]
    pub schedule_interval: Duration,

    /// Seed for deterministic generation. `None` draws from entropy.
    #[serde(default)]
    pub seed: Option<String>,

    /// How long a run waits to acquire the pipeline lock.
    #[serde(default = "default_lock_blocking_timeout", with = "humantime_serde")]
    pub lock_blocking_timeout: Duration,

    /// Values generated per (model, metric) pair.
    #[serde(default = "default_sample_count")]
    pub sample_count: usize,

    /// How long shutdown waits for an in-flight run.
    #[serde(default = "default_shutdown_grace", with = "humantime_serde")]
    pub shutdown_grace: Duration,
}

fn default_max_retries() -> u32 {
    2
}

fn default_retry_delay() -> Duration {
    Duration::from_secs(60)
}

fn default_schedule_interval() -> Duration {
    Duration::from_secs(3 * 60)
}

fn default_lock_blocking_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_sample_count() -> usize {
    1000
}

fn default_shutdown_grace() -> Duration {
    Duration::from_secs(10)
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            retry_delay: default_retry_delay(),
            schedule_interval: default_schedule_interval(),
            seed: None,
            lock_blocking_timeout: default_lock_blocking_timeout(),
            sample_count: default_sample_count(),
            shutdown_grace: default_shutdown_grace(),
        }
    }
}

impl SimulatorConfig {
    /// Load defaults overridden by the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self::default().with_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the scheduler and pipeline cannot run with.
    ///
    /// The lock lifetime derived from the retry budget must fit in a
    /// [`Duration`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.schedule_interval.is_zero() {
            return Err(invalid(
                "schedule_interval",
                &format!("{:?}", self.schedule_interval),
                "interval must be positive",
            ));
        }
        if self.sample_count == 0 {
            return Err(invalid("sample_count", "0", "series must not be empty"));
        }
        if self.retry_delay.checked_mul(self.max_retries).is_none() {
            return Err(invalid(
                "retry_delay",
                &format!("{:?}", self.retry_delay),
                &format!("lock lifetime overflows with max_retries = {}", self.max_retries),
            ));
        }
        Ok(())
    }

    /// Apply environment-style overrides from `lookup`.
    ///
    /// Recognized keys: `MAX_RETRIES`, `RETRY_DELAY` (seconds),
    /// `SCHEDULE_INTERVAL` (minutes), `SEED` (empty means unseeded),
    /// `LOCK_BLOCKING_TIMEOUT` (seconds), `SAMPLE_COUNT`,
    /// `SHUTDOWN_GRACE` (seconds).
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = parse_var::<u32>(&lookup, "MAX_RETRIES")? {
            self.max_retries = v;
        }
        if let Some(v) = parse_var::<u64>(&lookup, "RETRY_DELAY")? {
            self.retry_delay = Duration::from_secs(v);
        }
        if let Some(v) = parse_var::<u64>(&lookup, "SCHEDULE_INTERVAL")? {
            if v == 0 {
                return Err(invalid("SCHEDULE_INTERVAL", "0", "interval must be positive"));
            }
            let secs = v.checked_mul(60).ok_or_else(|| {
                invalid("SCHEDULE_INTERVAL", &v.to_string(), "interval is too large")
            })?;
            self.schedule_interval = Duration::from_secs(secs);
        }
        if let Some(seed) = lookup("SEED") {
            self.seed = Some(seed).filter(|s| !s.is_empty());
        }
        if let Some(v) = parse_var::<u64>(&lookup, "LOCK_BLOCKING_TIMEOUT")? {
            self.lock_blocking_timeout = Duration::from_secs(v);
        }
        if let Some(v) = parse_var::<usize>(&lookup, "SAMPLE_COUNT")? {
            self.sample_count = v;
        }
        if let Some(v) = parse_var::<u64>(&lookup, "SHUTDOWN_GRACE")? {
            self.shutdown_grace = Duration::from_secs(v);
        }
        Ok(self)
    }

    /// Set the retry budget.
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the delay between attempts.
    #[must_use]
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Set the scheduling interval.
    #[must_use]
    pub fn with_schedule_interval(mut self, interval: Duration) -> Self {
        self.schedule_interval = interval;
        self
    }

    /// Set the generation seed.
    #[must_use]
    pub fn with_seed(mut self, seed: impl Into<String>) -> Self {
        self.seed = Some(seed.into());
        self
    }

    /// Set how long a run waits for the lock.
    #[must_use]
    pub fn with_lock_blocking_timeout(mut self, timeout: Duration) -> Self {
        self.lock_blocking_timeout = timeout;
        self
    }

    /// Set the series length.
    #[must_use]
    pub fn with_sample_count(mut self, count: usize) -> Self {
        self.sample_count = count;
        self
    }

    /// Lifetime of the pipeline lock: `max_retries × retry_delay`, floored at
    /// [`MIN_LOCK_TIMEOUT`].
    #[must_use]
    pub fn lock_timeout(&self) -> Duration {
        self.retry_delay
            .saturating_mul(self.max_retries)
            .max(MIN_LOCK_TIMEOUT)
    }
}

fn parse_var<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => {
            let trimmed = raw.trim();
            trimmed
                .parse()
                .map(Some)
                .map_err(|e: T::Err| invalid(key, trimmed, &e.to_string()))
        }
    }
}

fn invalid(key: &'static str, value: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        key,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn config_default_values() {
        let config = SimulatorConfig::default();

        assert_eq!(config.max_retries, 2);
        assert_eq!(config.retry_delay, Duration::from_secs(60));
        assert_eq!(config.schedule_interval, Duration::from_secs(180));
        assert_eq!(config.seed, None);
        assert_eq!(config.lock_blocking_timeout, Duration::from_secs(10));
        assert_eq!(config.sample_count, 1000);
        assert_eq!(config.lock_timeout(), Duration::from_secs(120));
    }

    #[test]
    fn env_overrides_use_documented_units() {
        let config = SimulatorConfig::default()
            .with_overrides(lookup_from(&[
                ("MAX_RETRIES", "5"),
                ("RETRY_DELAY", "30"),
                ("SCHEDULE_INTERVAL", "10"),
                ("SEED", "42"),
            ]))
            .unwrap();

        assert_eq!(config.max_retries, 5);
        assert_eq!(config.retry_delay, Duration::from_secs(30));
        assert_eq!(config.schedule_interval, Duration::from_secs(600));
        assert_eq!(config.seed.as_deref(), Some("42"));
        assert_eq!(config.lock_timeout(), Duration::from_secs(150));
    }

    #[test]
    fn empty_seed_means_unseeded() {
        let config = SimulatorConfig::default()
            .with_seed("stale")
            .with_overrides(lookup_from(&[("SEED", "")]))
            .unwrap();

        assert_eq!(config.seed, None);
    }

    #[test]
    fn malformed_values_are_rejected() {
        let err = SimulatorConfig::default()
            .with_overrides(lookup_from(&[("MAX_RETRIES", "two")]))
            .unwrap_err();

        assert!(err.to_string().contains("MAX_RETRIES"));
        assert!(
            SimulatorConfig::default()
                .with_overrides(lookup_from(&[("SCHEDULE_INTERVAL", "0")]))
                .is_err()
        );
    }

    #[test]
    fn oversized_schedule_interval_is_rejected() {
        let err = SimulatorConfig::default()
            .with_overrides(lookup_from(&[("SCHEDULE_INTERVAL", "18446744073709551615")]))
            .unwrap_err();

        assert!(err.to_string().contains("SCHEDULE_INTERVAL"));
    }

    #[test]
    fn validate_accepts_defaults() {
        assert!(SimulatorConfig::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_unrunnable_values() {
        let zero_interval = SimulatorConfig::default().with_schedule_interval(Duration::ZERO);
        let err = zero_interval.validate().unwrap_err();
        assert!(err.to_string().contains("schedule_interval"));

        let empty_series = SimulatorConfig::default().with_sample_count(0);
        assert!(empty_series.validate().is_err());

        let endless_lock = SimulatorConfig::default()
            .with_retry_delay(Duration::MAX)
            .with_max_retries(2);
        let err = endless_lock.validate().unwrap_err();
        assert!(err.to_string().contains("retry_delay"));
    }

    #[test]
    fn lock_timeout_has_a_floor() {
        let config = SimulatorConfig::default().with_max_retries(0);
        assert_eq!(config.lock_timeout(), MIN_LOCK_TIMEOUT);
    }

    #[test]
    fn deserializes_humantime_durations() {
        let config: SimulatorConfig = toml::from_str(
            r#"
            max_retries = 1
            retry_delay = "5s"
            schedule_interval = "1m"
            "#,
        )
        .unwrap();

        assert_eq!(config.max_retries, 1);
        assert_eq!(config.retry_delay, Duration::from_secs(5));
        assert_eq!(config.schedule_interval, Duration::from_secs(60));
        assert_eq!(config.sample_count, 1000);
    }
}
