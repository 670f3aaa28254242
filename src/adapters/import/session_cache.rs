//! ImportSessionCache - keyed, time-bounded state for template import sessions.
//!
//! A template import runs across several requests (upload, preview, confirm).
//! Its intermediate state lives here instead of a process-global map: entries
//! expire `ttl` after their last write, and the cache never grows past
//! `capacity` (the entry closest to expiry is evicted first).

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::Instant;

#[derive(Debug, Clone)]
struct Entry<V> {
    value: V,
    expires_at: Instant,
}

/// Configuration for an [`ImportSessionCache`].
#[derive(Debug, Clone)]
pub struct ImportSessionCacheConfig {
    /// How long an entry lives after its last write.
    pub ttl: Duration,

    /// Maximum number of live entries.
    pub capacity: usize,
}

impl Default for ImportSessionCacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(30 * 60),
            capacity: 1_000,
        }
    }
}

impl ImportSessionCacheConfig {
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }
}

#[derive(Debug, Clone)]
pub struct ImportSessionCache<K, V> {
    entries: Arc<RwLock<HashMap<K, Entry<V>>>>,
    config: ImportSessionCacheConfig,
}

impl<K, V> ImportSessionCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(config: ImportSessionCacheConfig) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            config,
        }
    }

    /// Stores a value, refreshing its expiry. Returns the previous live value.
    pub async fn insert(&self, key: K, value: V) -> Option<V> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        entries.retain(|_, e| e.expires_at > now);

        if !entries.contains_key(&key) && entries.len() >= self.config.capacity {
            let oldest = entries
                .iter()
                .min_by_key(|(_, e)| e.expires_at)
                .map(|(k, _)| k.clone());
            if let Some(oldest) = oldest {
                entries.remove(&oldest);
            }
        }

        entries
            .insert(
                key,
                Entry {
                    value,
                    expires_at: now + self.config.ttl,
                },
            )
            .map(|e| e.value)
    }

    /// Returns a live value. Expired entries are dropped on access.
    pub async fn get(&self, key: &K) -> Option<V> {
        let now = Instant::now();
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some(e) if e.expires_at > now => return Some(e.value.clone()),
                None => return None,
                Some(_) => {}
            }
        }
        self.entries.write().await.remove(key);
        None
    }

    /// Removes and returns a live value (e.g. when an import is confirmed).
    pub async fn take(&self, key: &K) -> Option<V> {
        let now = Instant::now();
        self.entries
            .write()
            .await
            .remove(key)
            .filter(|e| e.expires_at > now)
            .map(|e| e.value)
    }

    /// Drops every expired entry. Returns how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, e| e.expires_at > now);
        before - entries.len()
    }

    /// Number of stored entries, including expired ones not yet purged.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache(ttl_secs: u64, capacity: usize) -> ImportSessionCache<String, u32> {
        ImportSessionCache::new(
            ImportSessionCacheConfig::default()
                .with_ttl(Duration::from_secs(ttl_secs))
                .with_capacity(capacity),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn entries_expire_after_ttl() {
        let cache = cache(60, 10);
        cache.insert("upload-1".into(), 7).await;
        assert_eq!(cache.get(&"upload-1".into()).await, Some(7));

        tokio::time::advance(Duration::from_secs(61)).await;

        assert_eq!(cache.get(&"upload-1".into()).await, None);
        assert!(cache.is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn insert_refreshes_expiry() {
        let cache = cache(60, 10);
        cache.insert("s".into(), 1).await;
        tokio::time::advance(Duration::from_secs(45)).await;

        assert_eq!(cache.insert("s".into(), 2).await, Some(1));
        tokio::time::advance(Duration::from_secs(45)).await;

        assert_eq!(cache.get(&"s".into()).await, Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn capacity_evicts_entry_closest_to_expiry() {
        let cache = cache(60, 2);
        cache.insert("a".into(), 1).await;
        tokio::time::advance(Duration::from_secs(1)).await;
        cache.insert("b".into(), 2).await;
        tokio::time::advance(Duration::from_secs(1)).await;
        cache.insert("c".into(), 3).await;

        assert_eq!(cache.len().await, 2);
        assert_eq!(cache.get(&"a".into()).await, None);
        assert_eq!(cache.get(&"c".into()).await, Some(3));
    }

    #[tokio::test(start_paused = true)]
    async fn purge_and_take() {
        let cache = cache(10, 10);
        cache.insert("old".into(), 1).await;
        tokio::time::advance(Duration::from_secs(11)).await;
        cache.insert("new".into(), 2).await;

        // "old" was already dropped by the insert above.
        assert_eq!(cache.purge_expired().await, 0);
        assert_eq!(cache.take(&"new".into()).await, Some(2));
        assert!(cache.is_empty().await);
    }
}
