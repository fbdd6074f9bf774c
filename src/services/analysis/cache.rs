// Result Cache
// Content-addressed memoization for dimension outcomes and comprehensive
// results. Entries expire lazily after a TTL and the map is capped, with
// the oldest entry (by insertion time) evicted on overflow.
//
// The cache is purely an optimization: disabling it must not change any
// score, only timing.

use crate::models::{ComprehensiveResult, DimensionOutcome};
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::debug;

pub const DEFAULT_TTL: Duration = Duration::from_secs(300);
pub const DEFAULT_CAPACITY: usize = 100;

#[derive(Debug, Clone)]
pub enum CachedValue {
    Dimension(DimensionOutcome),
    Comprehensive(ComprehensiveResult),
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: CachedValue,
    created_at: Instant,
}

/// Bounded TTL cache, safe to share across scheduler worker tasks.
pub struct ResultCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    ttl: Duration,
    capacity: usize,
}

impl ResultCache {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            capacity: capacity.max(1),
        }
    }

    /// Cache key: content hash of the text plus an analysis-kind tag.
    pub fn key(text: &str, kind: &str) -> String {
        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        format!("{:016x}:{}", hasher.finish(), kind)
    }

    /// Look up a live entry. Expired entries are removed as a side effect
    /// and reported as absent.
    pub fn get(&self, key: &str) -> Option<CachedValue> {
        let mut entries = self.entries.lock().expect("cache lock poisoned");
        match entries.get(key) {
            Some(entry) if entry.created_at.elapsed() <= self.ttl => Some(entry.value.clone()),
            Some(_) => {
                debug!(key = key, "cache entry expired");
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Insert (or overwrite) an entry, evicting the oldest live entry if
    /// the map would exceed capacity.
    pub fn put(&self, key: String, value: CachedValue) {
        let mut entries = self.entries.lock().expect("cache lock poisoned");

        // Expired entries do not count toward capacity.
        entries.retain(|_, entry| entry.created_at.elapsed() <= self.ttl);

        if !entries.contains_key(&key) && entries.len() >= self.capacity {
            if let Some(oldest) = entries
                .iter()
                .min_by_key(|(_, entry)| entry.created_at)
                .map(|(k, _)| k.clone())
            {
                debug!(key = oldest.as_str(), "cache capacity reached, evicting oldest");
                entries.remove(&oldest);
            }
        }

        entries.insert(
            key,
            CacheEntry {
                value,
                created_at: Instant::now(),
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("cache lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL, DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dim_value(score: f64) -> CachedValue {
        CachedValue::Dimension(DimensionOutcome::scalar(score))
    }

    fn score_of(value: CachedValue) -> f64 {
        match value {
            CachedValue::Dimension(outcome) => outcome.overall_score,
            CachedValue::Comprehensive(result) => result.overall_score,
        }
    }

    #[test]
    fn test_key_is_deterministic_and_kind_scoped() {
        let a = ResultCache::key("some text", "perplexity");
        let b = ResultCache::key("some text", "perplexity");
        let c = ResultCache::key("some text", "burstiness");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_get_after_put() {
        let cache = ResultCache::default();
        cache.put("k1".to_string(), dim_value(0.7));
        let hit = cache.get("k1").expect("expected hit");
        assert_eq!(score_of(hit), 0.7);
    }

    #[test]
    fn test_ttl_expiry_reports_absent_and_frees_capacity() {
        let cache = ResultCache::new(Duration::from_millis(40), 2);
        cache.put("old".to_string(), dim_value(0.1));
        std::thread::sleep(Duration::from_millis(80));

        assert!(cache.get("old").is_none());
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_expired_entries_do_not_count_toward_capacity() {
        let cache = ResultCache::new(Duration::from_millis(40), 2);
        cache.put("stale".to_string(), dim_value(0.1));
        std::thread::sleep(Duration::from_millis(80));

        // Both live entries must fit: the stale one is pruned, not evicted
        // in favor of.
        cache.put("a".to_string(), dim_value(0.2));
        cache.put("b".to_string(), dim_value(0.3));
        assert!(cache.get("a").is_some());
        assert!(cache.get("b").is_some());
        assert!(cache.get("stale").is_none());
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let cache = ResultCache::new(Duration::from_secs(300), 3);
        cache.put("first".to_string(), dim_value(0.1));
        std::thread::sleep(Duration::from_millis(5));
        cache.put("second".to_string(), dim_value(0.2));
        std::thread::sleep(Duration::from_millis(5));
        cache.put("third".to_string(), dim_value(0.3));
        std::thread::sleep(Duration::from_millis(5));

        cache.put("fourth".to_string(), dim_value(0.4));
        assert!(cache.get("first").is_none(), "oldest entry should be evicted");
        assert!(cache.get("second").is_some());
        assert!(cache.get("fourth").is_some());
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn test_overwrite_does_not_evict() {
        let cache = ResultCache::new(Duration::from_secs(300), 2);
        cache.put("a".to_string(), dim_value(0.1));
        cache.put("b".to_string(), dim_value(0.2));
        cache.put("a".to_string(), dim_value(0.9));
        assert_eq!(cache.len(), 2);
        assert_eq!(score_of(cache.get("a").unwrap()), 0.9);
    }
}
