//! In-memory KeyValueStore implementation.
//!
//! Entries live in a process-local map, so this store only coordinates
//! tasks inside one process. Expiry is measured with the tokio clock,
//! which lets tests advance time deterministically.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::error::Result;
use crate::traits::KeyValueStore;

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    /// `None` also covers TTLs beyond the clock's range.
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|at| at > now)
    }
}

/// In-memory implementation of KeyValueStore.
#[derive(Debug, Default)]
pub struct InMemoryKeyValueStore {
    entries: Mutex<HashMap<String, Entry>>,
}

impl InMemoryKeyValueStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entries.
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .lock()
            .await
            .values()
            .filter(|e| e.is_live(now))
            .count()
    }

    /// Check if the store holds no live entries.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Remaining time to live for `key`, if it is live and has an expiry.
    pub async fn ttl(&self, key: &str) -> Option<Duration> {
        let now = Instant::now();
        let entries = self.entries.lock().await;
        let entry = entries.get(key).filter(|e| e.is_live(now))?;
        entry.expires_at.map(|at| at - now)
    }
}

#[async_trait]
impl KeyValueStore for InMemoryKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some(entry) if entry.is_live(now) => Ok(Some(entry.value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()> {
        let entry = Entry {
            value: value.to_string(),
            expires_at: ttl.and_then(|ttl| Instant::now().checked_add(ttl)),
        };
        self.entries.lock().await.insert(key.to_string(), entry);
        Ok(())
    }

    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> Result<bool> {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        if entries.get(key).is_some_and(|e| e.is_live(now)) {
            return Ok(false);
        }
        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: now.checked_add(ttl),
            },
        );
        Ok(true)
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let now = Instant::now();
        let removed = self.entries.lock().await.remove(key);
        Ok(removed.is_some_and(|e| e.is_live(now)))
    }

    async fn delete_if_equals(&self, key: &str, expected: &str) -> Result<bool> {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        let matches = entries
            .get(key)
            .is_some_and(|e| e.is_live(now) && e.value == expected);
        if matches {
            entries.remove(key);
        }
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_then_get_returns_value() {
        let store = InMemoryKeyValueStore::new();
        store.set("a", "1", None).await.unwrap();

        assert_eq!(store.get("a").await.unwrap().as_deref(), Some("1"));
        assert!(store.exists("a").await.unwrap());
        assert!(!store.exists("b").await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn entries_expire_after_ttl() {
        let store = InMemoryKeyValueStore::new();
        store
            .set("retry", "1", Some(Duration::from_secs(60)))
            .await
            .unwrap();

        tokio::time::advance(Duration::from_secs(59)).await;
        assert_eq!(store.get("retry").await.unwrap().as_deref(), Some("1"));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(store.get("retry").await.unwrap(), None);
        assert!(store.is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn set_if_absent_respects_live_entries_only() {
        let store = InMemoryKeyValueStore::new();

        assert!(store.set_if_absent("lock", "a", Duration::from_secs(5)).await.unwrap());
        assert!(!store.set_if_absent("lock", "b", Duration::from_secs(5)).await.unwrap());

        tokio::time::advance(Duration::from_secs(5)).await;
        assert!(store.set_if_absent("lock", "b", Duration::from_secs(5)).await.unwrap());
        assert_eq!(store.get("lock").await.unwrap().as_deref(), Some("b"));
    }

    #[tokio::test]
    async fn delete_if_equals_checks_value() {
        let store = InMemoryKeyValueStore::new();
        store.set("lock", "holder-a", None).await.unwrap();

        assert!(!store.delete_if_equals("lock", "holder-b").await.unwrap());
        assert!(store.exists("lock").await.unwrap());

        assert!(store.delete_if_equals("lock", "holder-a").await.unwrap());
        assert!(!store.exists("lock").await.unwrap());
        assert!(!store.delete_if_equals("lock", "holder-a").await.unwrap());
    }

    #[tokio::test]
    async fn delete_reports_missing_keys() {
        let store = InMemoryKeyValueStore::new();
        store.set("k", "v", None).await.unwrap();

        assert!(store.delete("k").await.unwrap());
        assert!(!store.delete("k").await.unwrap());
    }

    #[tokio::test]
    async fn unrepresentable_ttl_never_expires() {
        let store = InMemoryKeyValueStore::new();
        store.set("k", "v", Some(Duration::MAX)).await.unwrap();
        assert!(store.set_if_absent("lock", "a", Duration::MAX).await.unwrap());

        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));
        assert!(!store.set_if_absent("lock", "b", Duration::MAX).await.unwrap());
        assert_eq!(store.ttl("lock").await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn ttl_reports_remaining_time() {
        let store = InMemoryKeyValueStore::new();
        store.set("k", "v", Some(Duration::from_secs(60))).await.unwrap();
        tokio::time::advance(Duration::from_secs(15)).await;

        assert_eq!(store.ttl("k").await, Some(Duration::from_secs(45)));
        assert_eq!(store.ttl("missing").await, None);
    }
}
