//! Distributed mutual exclusion over the shared key-value store.
//!
//! A lock is a store entry whose value is a random holder token and whose
//! expiry bounds how long it can be held. Acquisition is a create-if-absent
//! write; release deletes the entry only while it still carries the
//! holder's token, so a holder whose lock already expired cannot remove a
//! successor's lock. If a holder dies without releasing, the entry expires
//! on its own.

use std::sync::Arc;
use std::time::Duration;

use llmbench_kv::KeyValueStore;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::error::LockError;

/// Pause between acquisition attempts while another holder has the lock.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Identity of one successful acquisition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lock {
    name: String,
    token: String,
}

impl Lock {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

/// Acquires and releases named locks.
#[derive(Clone)]
pub struct LockGateway {
    store: Arc<dyn KeyValueStore>,
    poll_interval: Duration,
}

impl LockGateway {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Acquire `name`, waiting at most `blocking_timeout` for another holder
    /// to let go. The lock expires `timeout` after acquisition.
    ///
    /// Waiters are not served in any particular order.
    pub async fn acquire(
        &self,
        name: &str,
        timeout: Duration,
        blocking_timeout: Duration,
    ) -> Result<LockGuard, LockError> {
        let lock = Lock {
            name: name.to_string(),
            token: Uuid::new_v4().to_string(),
        };
        let deadline = Instant::now() + blocking_timeout;

        loop {
            if self.store.set_if_absent(name, &lock.token, timeout).await? {
                info!(key = name, timeout_secs = timeout.as_secs(), "lock acquired");
                return Ok(LockGuard {
                    gateway: self.clone(),
                    lock: Some(lock),
                });
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(LockError::Timeout {
                    key: name.to_string(),
                    waited: blocking_timeout,
                });
            }
            debug!(key = name, "lock busy, waiting");
            tokio::time::sleep(self.poll_interval.min(deadline - now)).await;
        }
    }

    /// Release `lock` if it is still held under its token.
    ///
    /// Never fails: an expired or already released lock and a store error
    /// are logged. Returns `true` if this call removed the lock.
    pub async fn release(&self, lock: &Lock) -> bool {
        match self.store.delete_if_equals(&lock.name, &lock.token).await {
            Ok(true) => {
                info!(key = %lock.name, "lock released");
                true
            }
            Ok(false) => {
                info!(key = %lock.name, "lock was already released");
                false
            }
            Err(e) => {
                error!(key = %lock.name, error = %e, "failed to release lock, it will expire");
                false
            }
        }
    }
}

/// A held lock.
///
/// Call [`release`](LockGuard::release) on every exit path. A guard dropped
/// while still holding its lock (cancelled task, panic) schedules a release
/// on the current tokio runtime.
pub struct LockGuard {
    gateway: LockGateway,
    lock: Option<Lock>,
}

impl LockGuard {
    /// The acquisition this guard holds, if not yet released.
    pub fn lock(&self) -> Option<&Lock> {
        self.lock.as_ref()
    }

    /// Release the lock. Later calls are no-ops returning `false`.
    pub async fn release(&mut self) -> bool {
        match self.lock.take() {
            Some(lock) => self.gateway.release(&lock).await,
            None => false,
        }
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        let Some(lock) = self.lock.take() else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let gateway = self.gateway.clone();
                handle.spawn(async move {
                    gateway.release(&lock).await;
                });
            }
            Err(_) => {
                warn!(key = %lock.name, "no runtime to release lock, it will expire");
            }
        }
    }
}
