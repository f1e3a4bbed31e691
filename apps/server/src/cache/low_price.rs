//! Cheapest-available snapshot per catalog.
//!
//! The published snapshot is an `Arc` swapped under a short write lock: readers clone the
//! `Arc` and never observe a snapshot mid-construction. Patches build a new snapshot and swap
//! it in. The lock is never held across a store round trip.

use crate::error::Result;
use crate::metrics::LOW_PRICE_CACHE_TOTAL;
use crate::models::{price_order, Listing};
use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Immutable list of up to `limit` available items, price ascending, id ascending.
#[derive(Debug, Clone, PartialEq)]
pub struct LowPriceSnapshot<T> {
    items: Vec<T>,
}

impl<T: Listing> LowPriceSnapshot<T> {
    fn from_items(mut items: Vec<T>, limit: usize) -> Self {
        items.retain(Listing::is_available);
        items.sort_by(price_order);
        items.truncate(limit);
        Self { items }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn most_expensive(&self) -> Option<i64> {
        self.items.last().map(Listing::price)
    }
}

#[derive(Debug)]
struct CacheState<T> {
    snapshot: Option<Arc<LowPriceSnapshot<T>>>,
    /// Bumped on every invalidation; a load only publishes if it is unchanged.
    generation: u64,
}

#[derive(Debug)]
pub struct LowPriceCache<T> {
    state: RwLock<CacheState<T>>,
    limit: usize,
}

impl<T: Listing> LowPriceCache<T> {
    pub fn new(limit: usize) -> Self {
        Self {
            state: RwLock::new(CacheState {
                snapshot: None,
                generation: 0,
            }),
            limit,
        }
    }

    /// Published snapshot, if any, without touching the store.
    pub fn current(&self) -> Option<Arc<LowPriceSnapshot<T>>> {
        self.read().snapshot.clone()
    }

    /// Return the published snapshot, or compute one with `load(limit)` and publish it.
    ///
    /// A computed snapshot is discarded instead of published when an invalidation happened
    /// while `load` was in flight; the caller still receives it.
    pub async fn get_or_load<F, Fut>(&self, load: F) -> Result<Arc<LowPriceSnapshot<T>>>
    where
        F: FnOnce(usize) -> Fut,
        Fut: Future<Output = Result<Vec<T>>>,
    {
        let started_at = {
            let state = self.read();
            if let Some(snapshot) = &state.snapshot {
                self.record("hit");
                return Ok(Arc::clone(snapshot));
            }
            state.generation
        };

        let items = load(self.limit).await?;
        let fresh = Arc::new(LowPriceSnapshot::from_items(items, self.limit));

        let mut state = self.write();
        if let Some(existing) = &state.snapshot {
            return Ok(Arc::clone(existing));
        }
        if state.generation == started_at {
            state.snapshot = Some(Arc::clone(&fresh));
            self.record("recompute");
            tracing::debug!(
                catalog = T::CATALOG.as_str(),
                items = fresh.len(),
                "Published low-price snapshot"
            );
        } else {
            tracing::debug!(
                catalog = T::CATALOG.as_str(),
                "Discarded low-price snapshot invalidated during load"
            );
        }
        Ok(fresh)
    }

    /// Invalidate when any newly inserted available item could enter the snapshot.
    pub fn on_insert(&self, inserted: &[T]) {
        let mut state = self.write();
        let Some(snapshot) = &state.snapshot else {
            // a load may be in flight with a pre-insert view
            state.generation += 1;
            return;
        };

        let room = snapshot.len() < self.limit;
        let ceiling = snapshot.most_expensive();
        let qualifies = inserted.iter().filter(|i| i.is_available()).any(|item| {
            room || ceiling.map_or(true, |max| item.price() <= max)
        });

        if qualifies {
            state.snapshot = None;
            state.generation += 1;
            self.record("invalidate");
            tracing::debug!(
                catalog = T::CATALOG.as_str(),
                inserted = inserted.len(),
                "Invalidated low-price snapshot after insert"
            );
        }
    }

    /// Drop the published snapshot regardless of its content.
    pub fn clear(&self) {
        let mut state = self.write();
        state.snapshot = None;
        state.generation += 1;
        self.record("invalidate");
    }

    /// Apply a one-unit decrement of `id` to the published snapshot.
    ///
    /// The entry is patched copy-on-write; if it reaches zero the snapshot is dropped.
    pub fn on_availability_decrement(&self, id: i64) {
        let mut state = self.write();
        let Some(snapshot) = &state.snapshot else {
            state.generation += 1;
            return;
        };
        let Some(pos) = snapshot.items.iter().position(|i| i.id() == id) else {
            return;
        };

        let mut items = snapshot.items.clone();
        let Some(stock) = items[pos].stock_mut() else {
            return;
        };
        *stock -= 1;

        if *stock <= 0 {
            state.snapshot = None;
            state.generation += 1;
            self.record("invalidate");
            tracing::debug!(
                catalog = T::CATALOG.as_str(),
                id,
                "Invalidated low-price snapshot after sell-out"
            );
        } else {
            state.snapshot = Some(Arc::new(LowPriceSnapshot { items }));
            self.record("patch");
        }
    }

    fn record(&self, outcome: &str) {
        LOW_PRICE_CACHE_TOTAL
            .with_label_values(&[T::CATALOG.as_str(), outcome])
            .inc();
    }

    fn read(&self) -> RwLockReadGuard<'_, CacheState<T>> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, CacheState<T>> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}
