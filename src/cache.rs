use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use uuid::Uuid;

use crate::models::session::SessionView;

/// Cache key for polled session state: one entry per (session, viewer).
pub type PollKey = (Uuid, Uuid);

/// Short-TTL memoization of orchestrator-reported session state.
pub type PollCache = TtlCache<PollKey, SessionView>;

#[derive(Debug, Clone)]
struct Entry<V> {
    value: V,
    expires_at: Instant,
}

/// Keyed cache with a per-entry TTL and explicit point invalidation.
///
/// Entries past their expiry are treated as misses on the next read, so no
/// background eviction is required for correctness; `spawn_cleanup_task`
/// only bounds memory on keys that are never read again.
#[derive(Debug)]
pub struct TtlCache<K, V> {
    entries: Mutex<HashMap<K, Entry<V>>>,
    cleanup_interval: Duration,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone + Send + 'static,
    V: Clone + Send + 'static,
{
    pub fn new(cleanup_interval: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            cleanup_interval,
        }
    }

    pub async fn get(&self, key: &K) -> Option<V> {
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub async fn set_with_ttl(&self, key: K, value: V, ttl: Duration) {
        let entry = Entry {
            value,
            expires_at: Instant::now() + ttl,
        };
        self.entries.lock().await.insert(key, entry);
    }

    pub async fn invalidate(&self, key: &K) {
        self.entries.lock().await.remove(key);
    }

    pub fn spawn_cleanup_task(self: Arc<Self>) {
        let cleanup_interval = self.cleanup_interval;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(cleanup_interval);
            loop {
                ticker.tick().await;
                let now = Instant::now();
                let mut entries = self.entries.lock().await;
                entries.retain(|_, entry| entry.expires_at > now);
            }
        });
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_then_get_returns_value() {
        let cache: TtlCache<&str, u32> = TtlCache::new(Duration::from_secs(60));
        cache.set_with_ttl("a", 1, Duration::from_secs(60)).await;
        assert_eq!(cache.get(&"a").await, Some(1));
    }

    #[tokio::test]
    async fn expired_entry_is_a_miss() {
        let cache: TtlCache<&str, u32> = TtlCache::new(Duration::from_secs(60));
        cache.set_with_ttl("a", 1, Duration::from_millis(20)).await;
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(cache.get(&"a").await, None);
        // The expired entry is dropped on read, not just skipped.
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test]
    async fn invalidate_removes_entry_before_expiry() {
        let cache: TtlCache<&str, u32> = TtlCache::new(Duration::from_secs(60));
        cache.set_with_ttl("a", 1, Duration::from_secs(60)).await;
        cache.invalidate(&"a").await;
        assert_eq!(cache.get(&"a").await, None);
    }

    #[tokio::test]
    async fn set_overwrites_existing_entry() {
        let cache: TtlCache<&str, u32> = TtlCache::new(Duration::from_secs(60));
        cache.set_with_ttl("a", 1, Duration::from_secs(60)).await;
        cache.set_with_ttl("a", 2, Duration::from_secs(60)).await;
        assert_eq!(cache.get(&"a").await, Some(2));
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn keys_are_independent() {
        let cache: TtlCache<(u8, u8), &str> = TtlCache::new(Duration::from_secs(60));
        cache.set_with_ttl((1, 1), "one", Duration::from_secs(60)).await;
        cache.set_with_ttl((1, 2), "two", Duration::from_secs(60)).await;
        cache.invalidate(&(1, 1)).await;
        assert_eq!(cache.get(&(1, 1)).await, None);
        assert_eq!(cache.get(&(1, 2)).await, Some("two"));
    }
}
