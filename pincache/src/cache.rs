// Copyright 2025 pincache Project Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::{
    fmt::Debug,
    sync::{atomic::Ordering, Arc},
};

use parking_lot::{Condvar, Mutex};
use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    metrics::Metrics,
    slot::{Lookup, SlotTable, Unpinned},
    store::Store,
};

/// Configuration for a [`PinCache`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PinCacheConfig {
    /// Maximum number of resources resident or loading at once. `None`
    /// (the default) leaves the cache unbounded.
    pub capacity: Option<usize>,
}

struct Inner<S>
where
    S: Store,
{
    state: Mutex<SlotTable<S::Resource>>,
    /// Signalled whenever a load or an eviction resolves.
    resolved: Condvar,

    capacity: Option<usize>,
    store: S,
    metrics: Metrics,
}

impl<S> Drop for Inner<S>
where
    S: Store,
{
    fn drop(&mut self) {
        // Entries that were never released still get their write-back.
        for resource in self.state.get_mut().drain() {
            self.store.evict(resource);
        }
    }
}

/// A reference-counted resource cache over a [`Store`].
///
/// [`acquire`] borrows the resource for a key, loading it through the store
/// on first access; concurrent acquires of one key share a single load.
/// The resource stays resident until the last holder calls [`release`], at
/// which point it is handed back to the store for write-back. Eviction is
/// purely reference-count triggered; there is no replacement policy, and a
/// bounded cache refuses admission instead of evicting live entries.
///
/// The cache is cheaply cloneable; clones share the same state, so each
/// worker thread can own a handle.
///
/// [`acquire`]: PinCache::acquire
/// [`release`]: PinCache::release
pub struct PinCache<S>
where
    S: Store,
{
    inner: Arc<Inner<S>>,
}

impl<S> Debug for PinCache<S>
where
    S: Store,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PinCache").field("capacity", &self.inner.capacity).finish()
    }
}

impl<S> Clone for PinCache<S>
where
    S: Store,
{
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<S> PinCache<S>
where
    S: Store,
{
    /// Create a cache over `store`.
    pub fn new(config: PinCacheConfig, store: S) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(SlotTable::new()),
                resolved: Condvar::new(),
                capacity: config.capacity,
                store,
                metrics: Metrics::default(),
            }),
        }
    }

    /// Borrow the resource for `key`, loading it on first access.
    ///
    /// If the key is resident, its reference count is bumped and the shared
    /// instance is returned without touching the store. If another caller is
    /// loading or evicting the key, this call blocks until that resolves and
    /// re-evaluates. Otherwise the key is reserved and the store's `load`
    /// runs with no lock held, so loads of different keys proceed
    /// concurrently and a slow load never stalls unrelated operations.
    ///
    /// Every acquire must be matched by exactly one [`release`] of the same
    /// key.
    ///
    /// # Errors
    ///
    /// - [`Error::Full`] if the capacity bound is reached and the key is
    ///   neither resident nor loading. Nothing is evicted to make room.
    /// - [`Error::Load`] if the store fails; the reservation is rolled back
    ///   and a retry will invoke the store afresh.
    ///
    /// [`release`]: PinCache::release
    pub fn acquire(&self, key: u64) -> Result<Arc<S::Resource>> {
        let mut state = self.inner.state.lock();
        loop {
            match state.lookup_pin(key) {
                Lookup::Hit(resource) => {
                    self.inner.metrics.hit.fetch_add(1, Ordering::Relaxed);
                    return Ok(resource);
                }
                Lookup::Pending => {
                    self.inner.metrics.wait.fetch_add(1, Ordering::Relaxed);
                    self.inner.resolved.wait(&mut state);
                }
                Lookup::Absent => {
                    if let Some(capacity) = self.inner.capacity {
                        if state.len() >= capacity {
                            self.inner.metrics.full.fetch_add(1, Ordering::Relaxed);
                            return Err(Error::Full { capacity });
                        }
                    }
                    state.begin_load(key);
                    break;
                }
            }
        }
        drop(state);

        self.inner.metrics.miss.fetch_add(1, Ordering::Relaxed);
        let loaded = self.inner.store.load(key);

        let mut state = self.inner.state.lock();
        let res = match loaded {
            Ok(resource) => {
                self.inner.metrics.load.fetch_add(1, Ordering::Relaxed);
                Ok(state.complete_load(key, resource))
            }
            Err(e) => {
                self.inner.metrics.load_error.fetch_add(1, Ordering::Relaxed);
                state.abort_load(key);
                Err(Error::Load(e))
            }
        };
        drop(state);
        // Wake waiters out of the lock critical section.
        self.inner.resolved.notify_all();
        res
    }

    /// Drop one reference to a resident key.
    ///
    /// When the count reaches zero the store's `evict` runs on this thread
    /// with no lock held; the key stays reserved until it returns, so no
    /// load of the same key can begin mid-eviction.
    ///
    /// # Panics
    ///
    /// Panics if `key` is not resident. An unbalanced release is a bug in
    /// the caller's acquire/release discipline, and carrying on would
    /// corrupt the cache state silently.
    pub fn release(&self, key: u64) {
        self.inner.metrics.release.fetch_add(1, Ordering::Relaxed);
        let mut state = self.inner.state.lock();
        match state.unpin(key) {
            Unpinned::Retained(_) => {}
            Unpinned::Evict(resource) => {
                drop(state);
                self.inner.store.evict(resource);
                self.inner.metrics.evict.fetch_add(1, Ordering::Relaxed);

                let mut state = self.inner.state.lock();
                state.finish_evict(key);
                drop(state);
                self.inner.resolved.notify_all();
            }
        }
    }

    /// Drain the cache, writing back every resident entry exactly once in
    /// no particular order, regardless of its reference count.
    ///
    /// Loads cannot be cancelled, so this call first blocks until no load
    /// or eviction is in flight rather than racing them. Afterwards the
    /// cache is back in its initial empty state; using it concurrently with
    /// or after `close` is outside the acquire/release contract.
    pub fn close(&self) {
        let mut state = self.inner.state.lock();
        while state.has_pending() {
            self.inner.resolved.wait(&mut state);
        }
        let drained = state.drain();
        drop(state);

        for resource in drained {
            self.inner.store.evict(resource);
            self.inner.metrics.evict.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// The configured capacity bound, if any.
    pub fn capacity(&self) -> Option<usize> {
        self.inner.capacity
    }

    /// Resident entries plus slots reserved by outstanding loads.
    pub fn usage(&self) -> usize {
        self.inner.state.lock().len()
    }

    /// Whether `key` is resident.
    pub fn contains(&self, key: u64) -> bool {
        self.inner.state.lock().is_resident(key)
    }

    /// The reference count of `key`, if it is resident.
    pub fn refs(&self, key: u64) -> Option<usize> {
        self.inner.state.lock().refs(key)
    }

    /// The backing store.
    pub fn store(&self) -> &S {
        &self.inner.store
    }

    /// Operation counters.
    pub fn metrics(&self) -> &Metrics {
        &self.inner.metrics
    }
}
