//! Per-id cache of properties already hydrated by polygon searches.
//!
//! Coordinates never change after creation, so cached points are never stale for
//! containment. Other attributes (rent, popularity) can go stale if they are mutated outside
//! this process; nothing here observes such writes.

use crate::metrics::GEO_CACHE_LOOKUPS_TOTAL;
use crate::models::Property;
use lru::LruCache;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::{PoisonError, RwLock};

enum PointStore {
    Unbounded(HashMap<i64, Property>),
    Bounded(LruCache<i64, Property>),
}

pub struct EntityPointCache {
    points: RwLock<PointStore>,
}

impl EntityPointCache {
    /// `capacity == 0` keeps every entry forever; otherwise least recently used entries are
    /// evicted past `capacity`.
    pub fn new(capacity: usize) -> Self {
        let store = match NonZeroUsize::new(capacity) {
            Some(cap) => PointStore::Bounded(LruCache::new(cap)),
            None => PointStore::Unbounded(HashMap::new()),
        };
        Self {
            points: RwLock::new(store),
        }
    }

    pub fn is_bounded(&self) -> bool {
        matches!(
            &*self.points.read().unwrap_or_else(PoisonError::into_inner),
            PointStore::Bounded(_)
        )
    }

    /// Split `ids` into cached records and ids that must be fetched.
    pub fn get_many(&self, ids: &[i64]) -> (HashMap<i64, Property>, Vec<i64>) {
        let mut found = HashMap::with_capacity(ids.len());
        let mut missing = Vec::new();
        let mut split = |id: i64, hit: Option<&Property>| match hit {
            Some(p) => {
                found.insert(id, p.clone());
            }
            None => missing.push(id),
        };

        let bounded = {
            let guard = self.points.read().unwrap_or_else(PoisonError::into_inner);
            match &*guard {
                PointStore::Unbounded(map) => {
                    for id in ids {
                        split(*id, map.get(id));
                    }
                    false
                }
                PointStore::Bounded(_) => true,
            }
        };

        if bounded {
            // recency is updated on hit, which needs the write lock
            let mut guard = self.points.write().unwrap_or_else(PoisonError::into_inner);
            if let PointStore::Bounded(lru) = &mut *guard {
                for id in ids {
                    split(*id, lru.get(id));
                }
            }
        }

        self.record(found.len(), missing.len());
        (found, missing)
    }

    /// Insert or overwrite entries.
    pub fn put_many<I>(&self, records: I)
    where
        I: IntoIterator<Item = Property>,
    {
        let mut guard = self.points.write().unwrap_or_else(PoisonError::into_inner);
        match &mut *guard {
            PointStore::Unbounded(map) => {
                map.extend(records.into_iter().map(|p| (p.id, p)));
            }
            PointStore::Bounded(lru) => {
                for p in records {
                    lru.put(p.id, p);
                }
            }
        }
    }

    pub fn clear(&self) {
        match &mut *self.points.write().unwrap_or_else(PoisonError::into_inner) {
            PointStore::Unbounded(map) => map.clear(),
            PointStore::Bounded(lru) => lru.clear(),
        }
    }

    pub fn len(&self) -> usize {
        match &*self.points.read().unwrap_or_else(PoisonError::into_inner) {
            PointStore::Unbounded(map) => map.len(),
            PointStore::Bounded(lru) => lru.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn record(&self, hits: usize, misses: usize) {
        GEO_CACHE_LOOKUPS_TOTAL
            .with_label_values(&["hit"])
            .inc_by(hits as u64);
        GEO_CACHE_LOOKUPS_TOTAL
            .with_label_values(&["miss"])
            .inc_by(misses as u64);
        tracing::debug!(hits, misses, "Entity point cache lookup");
    }
}

impl std::fmt::Debug for EntityPointCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityPointCache")
            .field("bounded", &self.is_bounded())
            .field("len", &self.len())
            .finish()
    }
}
