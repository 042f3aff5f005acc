//! Short-lived response caching
//!
//! One `TtlCache` instance per endpoint, each with its own ttl and capacity.
//! Entries expire lazily on read; when full, the oldest-inserted entry is
//! evicted to admit a new one. Payloads are opaque to the cache.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use tokio::sync::Mutex;

/// Time source for expiry checks. Injected so tests can drive expiry
/// without sleeping.
pub trait Clock: Send + Sync {
    fn now_unix(&self) -> u64;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now_unix(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }
}

struct Entry<T> {
    expires_at: u64,
    value: T,
}

struct Inner<T> {
    entries: HashMap<String, Entry<T>>,
    // Insertion order, used for capacity eviction. Keys are removed here
    // whenever they are removed from `entries` so the two stay in sync.
    order: VecDeque<String>,
}

pub struct TtlCache<T> {
    ttl_seconds: u64,
    maxsize: usize,
    clock: Arc<dyn Clock>,
    inner: Mutex<Inner<T>>,
}

impl<T: Clone> TtlCache<T> {
    pub fn new(ttl_seconds: u64, maxsize: usize) -> Self {
        Self::with_clock(ttl_seconds, maxsize, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl_seconds: u64, maxsize: usize, clock: Arc<dyn Clock>) -> Self {
        TtlCache {
            ttl_seconds,
            maxsize,
            clock,
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                order: VecDeque::new(),
            }),
        }
    }

    pub fn ttl_seconds(&self) -> u64 {
        self.ttl_seconds
    }

    /// Returns the cached value if present and unexpired. An expired entry
    /// is removed and reported as a miss.
    pub async fn get(&self, key: &str) -> Option<T> {
        let mut inner = self.inner.lock().await;
        let now = self.clock.now_unix();
        let expired = match inner.entries.get(key) {
            Some(entry) if entry.expires_at > now => return Some(entry.value.clone()),
            Some(_) => true,
            None => false,
        };
        if expired {
            inner.entries.remove(key);
            inner.order.retain(|k| k != key);
        }
        None
    }

    /// Stores a value with expiry = now + ttl. Evicts the oldest-inserted
    /// entry when at capacity. Overwriting an existing key keeps its
    /// original insertion position.
    pub async fn set(&self, key: &str, value: T) {
        let mut inner = self.inner.lock().await;
        let expires_at = self.clock.now_unix() + self.ttl_seconds;
        if let Some(entry) = inner.entries.get_mut(key) {
            entry.expires_at = expires_at;
            entry.value = value;
            return;
        }
        if inner.entries.len() >= self.maxsize {
            if let Some(oldest) = inner.order.pop_front() {
                inner.entries.remove(&oldest);
            }
        }
        inner.entries.insert(key.to_string(), Entry { expires_at, value });
        inner.order.push_back(key.to_string());
    }

    #[cfg(test)]
    async fn len(&self) -> usize {
        self.inner.lock().await.entries.len()
    }
}

/// Canonical query signature: endpoint name plus every resolved parameter,
/// order-independent in the parameter listing.
pub fn signature(endpoint: &str, params: &[(&str, String)]) -> String {
    let mut parts: Vec<String> = params
        .iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect();
    parts.sort();
    format!("{endpoint}?{}", parts.join("&"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    struct ManualClock(AtomicU64);

    impl ManualClock {
        fn advance(&self, secs: u64) {
            self.0.fetch_add(secs, Ordering::Relaxed);
        }
    }

    impl Clock for ManualClock {
        fn now_unix(&self) -> u64 {
            self.0.load(Ordering::Relaxed)
        }
    }

    fn manual_cache(ttl: u64, maxsize: usize) -> (TtlCache<String>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock(AtomicU64::new(1_000)));
        let cache = TtlCache::with_clock(ttl, maxsize, clock.clone());
        (cache, clock)
    }

    #[tokio::test]
    async fn set_then_get_returns_value() {
        let (cache, _) = manual_cache(30, 10);
        cache.set("k", "v".to_string()).await;
        assert_eq!(cache.get("k").await, Some("v".to_string()));
    }

    #[tokio::test]
    async fn entry_expires_after_ttl() {
        let (cache, clock) = manual_cache(30, 10);
        cache.set("k", "v".to_string()).await;
        clock.advance(29);
        assert!(cache.get("k").await.is_some());
        clock.advance(1);
        assert_eq!(cache.get("k").await, None);
        // expired entry is gone, not just hidden
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test]
    async fn capacity_is_never_exceeded() {
        let (cache, _) = manual_cache(30, 3);
        for i in 0..10 {
            cache.set(&format!("k{i}"), format!("v{i}")).await;
        }
        assert_eq!(cache.len().await, 3);
    }

    #[tokio::test]
    async fn eviction_removes_oldest_inserted() {
        let (cache, _) = manual_cache(30, 2);
        cache.set("a", "1".to_string()).await;
        cache.set("b", "2".to_string()).await;
        cache.set("c", "3".to_string()).await;
        assert_eq!(cache.get("a").await, None);
        assert_eq!(cache.get("b").await, Some("2".to_string()));
        assert_eq!(cache.get("c").await, Some("3".to_string()));
    }

    #[tokio::test]
    async fn overwrite_does_not_grow_or_evict() {
        let (cache, _) = manual_cache(30, 2);
        cache.set("a", "1".to_string()).await;
        cache.set("b", "2".to_string()).await;
        cache.set("a", "updated".to_string()).await;
        assert_eq!(cache.len().await, 2);
        assert_eq!(cache.get("a").await, Some("updated".to_string()));
        assert_eq!(cache.get("b").await, Some("2".to_string()));
    }

    #[test]
    fn signature_is_order_independent() {
        let a = signature("pools", &[("version", "3".into()), ("page", "1".into())]);
        let b = signature("pools", &[("page", "1".into()), ("version", "3".into())]);
        assert_eq!(a, b);
        assert!(a.starts_with("pools?"));
    }

    #[test]
    fn signature_distinguishes_endpoints_and_values() {
        let a = signature("pools", &[("page", "1".into())]);
        let b = signature("tokens", &[("page", "1".into())]);
        let c = signature("pools", &[("page", "2".into())]);
        assert_ne!(a, b);
        assert_ne!(a, c);
    }
}
