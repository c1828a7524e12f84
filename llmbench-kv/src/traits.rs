//! Core trait for key-value operations.

use std::time::Duration;

use async_trait::async_trait;

/// A string key-value store where entries may carry an expiry.
///
/// Expired entries behave exactly like absent ones for every operation.
/// `set_if_absent` and `delete_if_equals` must be atomic with respect to
/// every other client of the same backing store.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`.
    async fn get(&self, key: &str) -> crate::Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value and expiry.
    ///
    /// `ttl` of `None` means the entry never expires.
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> crate::Result<()>;

    /// Store `value` under `key` only if no live entry exists.
    ///
    /// Returns `true` if the entry was written.
    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> crate::Result<bool>;

    /// Remove the entry under `key`.
    ///
    /// Returns `true` if a live entry was removed.
    async fn delete(&self, key: &str) -> crate::Result<bool>;

    /// Remove the entry under `key` only if its current value equals `expected`.
    async fn delete_if_equals(&self, key: &str, expected: &str) -> crate::Result<bool>;

    /// Check whether a live entry exists under `key`.
    async fn exists(&self, key: &str) -> crate::Result<bool> {
        Ok(self.get(key).await?.is_some())
    }
}
