//! Keyed service lookup shared across agents in a cycle.
//!
//! The service map is the one piece of cross-agent shared mutable state
//! within a cycle. Writes are rare (goal creation) and reads idempotent, so
//! a concurrency-safe map is enough — no extra locking at the call sites.

use dashmap::DashMap;
use std::any::Any;
use std::sync::Arc;

type Service = Arc<dyn Any + Send + Sync>;

/// Concurrency-safe registry of long-lived stateful services (goal tracker,
/// task scheduler), keyed by name and downcast at the point of use.
#[derive(Clone, Default)]
pub struct ServiceMap {
    inner: Arc<DashMap<String, Service>>,
}

impl ServiceMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<T: Any + Send + Sync>(&self, key: impl Into<String>, service: Arc<T>) {
        self.inner.insert(key.into(), service);
    }

    /// Typed lookup. Returns `None` when the key is absent or holds a
    /// different type — agents treat both as "service unavailable".
    pub fn get<T: Any + Send + Sync>(&self, key: &str) -> Option<Arc<T>> {
        let entry = self.inner.get(key)?;
        entry.value().clone().downcast::<T>().ok()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.inner.contains_key(key)
    }
}

impl std::fmt::Debug for ServiceMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let keys: Vec<String> = self.inner.iter().map(|e| e.key().clone()).collect();
        f.debug_struct("ServiceMap").field("keys", &keys).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Counter(std::sync::atomic::AtomicU32);

    #[test]
    fn insert_and_typed_get() {
        let map = ServiceMap::new();
        map.insert("counter", Arc::new(Counter(0.into())));

        let counter: Arc<Counter> = map.get("counter").expect("service present");
        counter.0.fetch_add(1, std::sync::atomic::Ordering::SeqCst);

        let again: Arc<Counter> = map.get("counter").unwrap();
        assert_eq!(again.0.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[test]
    fn wrong_type_returns_none() {
        let map = ServiceMap::new();
        map.insert("counter", Arc::new(Counter(0.into())));
        assert!(map.get::<String>("counter").is_none());
    }

    #[test]
    fn missing_key_returns_none() {
        let map = ServiceMap::new();
        assert!(map.get::<Counter>("absent").is_none());
        assert!(!map.contains("absent"));
    }

    #[test]
    fn clones_share_contents() {
        let map = ServiceMap::new();
        let clone = map.clone();
        map.insert("shared", Arc::new(Counter(0.into())));
        assert!(clone.contains("shared"));
    }
}
