//! An expiring key-value cache for provider results.
//!
//! Entries carry an explicit expiry timestamp and the lookup path takes the
//! current time as a parameter (`get_at`/`put_at`), so tests never depend on
//! the wall clock. Providers use the `get`/`put` wrappers.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// Default time-to-live for cached prices, in seconds.
pub const DEFAULT_TTL_SECS: i64 = 3600;

struct Entry<V> {
    value: V,
    expires_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct Cache<K, V>
where
    K: Eq + Hash + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    inner: Arc<Mutex<HashMap<K, Entry<V>>>>,
    ttl: Duration,
}

impl<K, V> Cache<K, V>
where
    K: Eq + Hash + Send + Sync,
    V: Clone + Send + Sync,
{
    pub fn new(ttl_secs: i64) -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
            ttl: Duration::seconds(ttl_secs),
        }
    }

    pub async fn get(&self, key: &K) -> Option<V> {
        self.get_at(key, Utc::now()).await
    }

    pub async fn get_at(&self, key: &K, now: DateTime<Utc>) -> Option<V> {
        let mut cache = self.inner.lock().await;
        match cache.get(key) {
            Some(entry) if entry.expires_at > now => {
                debug!("Cache HIT");
                Some(entry.value.clone())
            }
            Some(_) => {
                debug!("Cache EXPIRED");
                cache.remove(key);
                None
            }
            None => {
                debug!("Cache MISS");
                None
            }
        }
    }

    pub async fn put(&self, key: K, value: V) {
        self.put_at(key, value, Utc::now()).await
    }

    pub async fn put_at(&self, key: K, value: V, now: DateTime<Utc>) {
        let mut cache = self.inner.lock().await;
        debug!("Cache PUT");
        cache.insert(
            key,
            Entry {
                value,
                expires_at: now + self.ttl,
            },
        );
    }
}

impl<K, V> Default for Cache<K, V>
where
    K: Eq + Hash + Send + Sync,
    V: Clone + Send + Sync,
{
    fn default() -> Self {
        Self::new(DEFAULT_TTL_SECS)
    }
}
