//! Fixed-delay retry with externally persisted attempt counts.
//!
//! The attempt counter lives in the key-value store rather than in the
//! caller, so it survives restarts and is shared by every instance that
//! works on the same key. Each failure refreshes a fixed expiry on the
//! counter; a key left alone for that long starts over from zero.

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use llmbench_kv::KeyValueStore;
use tracing::{error, info, warn};

/// How long a stored attempt counter survives its last failure.
pub const RETRY_STATE_TTL: Duration = Duration::from_secs(60);

/// Retry budget and spacing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Constant wait between attempts.
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, delay: Duration) -> Self {
        Self { max_retries, delay }
    }
}

/// Runs fallible work with bounded, fixed-delay retries.
pub struct RetryCoordinator {
    store: Arc<dyn KeyValueStore>,
    policy: RetryPolicy,
}

impl RetryCoordinator {
    pub fn new(store: Arc<dyn KeyValueStore>, policy: RetryPolicy) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Run `work` until it succeeds or the budget for `key` is spent.
    ///
    /// Starts from the attempt count already stored under `key`. Returns
    /// `Ok(None)` when attempts are exhausted. The stored counter is left in
    /// place on success; clearing it is up to the caller. Only store
    /// failures are returned as errors.
    pub async fn run<T, E, F, Fut>(&self, key: &str, mut work: F) -> llmbench_kv::Result<Option<T>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let mut attempt = self.stored_attempt(key).await?;

        while attempt <= self.policy.max_retries {
            match work().await {
                Ok(value) => return Ok(Some(value)),
                Err(e) => {
                    let next = attempt + 1;
                    self.store
                        .set(key, &next.to_string(), Some(RETRY_STATE_TTL))
                        .await?;
                    error!(key, attempt = next, error = %e, "attempt failed");

                    attempt = next;
                    if attempt <= self.policy.max_retries {
                        tokio::time::sleep(self.policy.delay).await;
                    }
                }
            }
        }

        info!(key, max_retries = self.policy.max_retries, "max retries reached, skipping");
        Ok(None)
    }

    async fn stored_attempt(&self, key: &str) -> llmbench_kv::Result<u32> {
        let Some(raw) = self.store.get(key).await? else {
            return Ok(0);
        };
        match raw.parse() {
            Ok(attempt) => Ok(attempt),
            Err(_) => {
                warn!(key, value = %raw, "ignoring unreadable retry counter");
                Ok(0)
            }
        }
    }
}
