use std::num::NonZeroUsize;

use lru::LruCache;
use parking_lot::Mutex;
use tracing::debug;

use crate::search::SearchHits;

struct Inner {
    entries: LruCache<String, SearchHits>,
    // Bumped by every clear; lets writers detect that the index they
    // searched was replaced underneath them.
    epoch: u64,
}

/// Bounded least-recently-used memo of `query -> ranked hits`.
///
/// Every operation takes the one mutex: a `get` reorders recency just like
/// a `set`, so there is no read-only path worth a shared lock.
pub struct SearchCache {
    inner: Mutex<Inner>,
    capacity: NonZeroUsize,
}

impl SearchCache {
    /// A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        SearchCache {
            inner: Mutex::new(Inner {
                entries: LruCache::new(capacity),
                epoch: 0,
            }),
            capacity,
        }
    }

    /// Look up `key`, promoting it to most recently used on a hit.
    pub fn get(&self, key: &str) -> Option<SearchHits> {
        let mut inner = self.inner.lock();
        let hit = inner.entries.get(key).cloned();
        debug!(query = key, hit = hit.is_some(), "search cache lookup");
        hit
    }

    /// Insert or replace `key`, evicting the least recently used entry when full.
    pub fn set(&self, key: impl Into<String>, value: SearchHits) {
        let mut inner = self.inner.lock();
        Self::insert(&mut inner, key.into(), value);
    }

    /// Like [`SearchCache::set`], but only if no [`SearchCache::clear`] ran
    /// since `epoch` was read. Returns whether the entry was stored.
    pub fn set_if_current(&self, epoch: u64, key: impl Into<String>, value: SearchHits) -> bool {
        let mut inner = self.inner.lock();
        if inner.epoch != epoch {
            debug!(epoch, current = inner.epoch, "dropping stale search result");
            return false;
        }
        Self::insert(&mut inner, key.into(), value);
        true
    }

    fn insert(inner: &mut Inner, key: String, value: SearchHits) {
        if let Some((evicted, _)) = inner.entries.push(key.clone(), value) {
            if evicted != key {
                debug!(query = %evicted, "evicted search cache entry");
            }
        }
    }

    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        inner.epoch += 1;
    }

    pub fn epoch(&self) -> u64 {
        self.inner.lock().epoch
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::index::tests::cmd;
    use crate::model::Command;

    fn hits(names: &[&str]) -> SearchHits {
        names
            .iter()
            .map(|n| Arc::new(cmd(n, "X", "desc", &["linux"])))
            .collect::<Vec<Arc<Command>>>()
            .into()
    }

    fn names(hits: &SearchHits) -> Vec<&str> {
        hits.iter().map(|c| c.name.as_str()).collect()
    }

    #[test]
    fn capacity_one_evicts_previous_key() {
        let cache = SearchCache::new(1);
        cache.set("q", hits(&["ls"]));
        cache.set("q2", hits(&["cat"]));

        assert!(cache.get("q").is_none());
        assert_eq!(names(&cache.get("q2").unwrap()), vec!["cat"]);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn get_promotes_recency() {
        let cache = SearchCache::new(2);
        cache.set("a", hits(&["a"]));
        cache.set("b", hits(&["b"]));
        assert!(cache.get("a").is_some());
        cache.set("c", hits(&["c"]));

        assert!(cache.get("b").is_none());
        assert!(cache.get("a").is_some());
        assert!(cache.get("c").is_some());
    }

    #[test]
    fn set_existing_key_replaces_and_promotes() {
        let cache = SearchCache::new(2);
        cache.set("a", hits(&["old"]));
        cache.set("b", hits(&["b"]));
        cache.set("a", hits(&["new"]));
        cache.set("c", hits(&["c"]));

        assert_eq!(cache.len(), 2);
        assert!(cache.get("b").is_none());
        assert_eq!(names(&cache.get("a").unwrap()), vec!["new"]);
    }

    #[test]
    fn never_exceeds_capacity() {
        let cache = SearchCache::new(3);
        for i in 0..50 {
            cache.set(format!("q{i}"), hits(&["x"]));
            assert!(cache.len() <= 3);
        }
        assert_eq!(cache.len(), 3);
        assert!(cache.get("q49").is_some());
        assert!(cache.get("q46").is_none());
    }

    #[test]
    fn zero_capacity_is_raised_to_one() {
        let cache = SearchCache::new(0);
        assert_eq!(cache.capacity(), 1);
        cache.set("a", hits(&["a"]));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn clear_empties_and_invalidates_epoch() {
        let cache = SearchCache::new(4);
        cache.set("a", hits(&["a"]));
        let epoch = cache.epoch();

        cache.clear();
        assert!(cache.is_empty());

        assert!(!cache.set_if_current(epoch, "stale", hits(&["old"])));
        assert!(cache.get("stale").is_none());
        assert!(cache.set_if_current(cache.epoch(), "fresh", hits(&["new"])));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn concurrent_access_keeps_bound() {
        let cache = Arc::new(SearchCache::new(8));
        let workers: Vec<_> = (0..4)
            .map(|t| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    for i in 0..500 {
                        let key = format!("{t}-{}", i % 16);
                        if cache.get(&key).is_none() {
                            cache.set(key, hits(&["x"]));
                        }
                        assert!(cache.len() <= 8);
                    }
                })
            })
            .collect();
        for w in workers {
            w.join().unwrap();
        }
        assert_eq!(cache.len(), 8);
    }
}
