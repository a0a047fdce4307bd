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

use std::sync::Arc;

use hashbrown::HashMap;
use itertools::Itertools;

use crate::{strict_assert, strict_assert_eq};

/// Per-key state.
///
/// A key moves `Loading -> Resident` when its load completes, loops on
/// `Resident` for each extra pin, and passes through `Evicting` while the
/// write-back hook runs outside the lock. A failed load goes straight back
/// to absent.
pub(crate) enum Slot<T> {
    /// A load for the key is outstanding. Occupies a capacity slot.
    Loading,
    /// The resource is cached and pinned by `refs` holders.
    Resident {
        resource: Arc<T>,
        refs: usize,
    },
    /// The last pin was dropped and the evictor is running. The key stays
    /// reserved until the eviction completes, so no load can start for it.
    Evicting,
}

/// Outcome of a pin attempt.
pub(crate) enum Lookup<T> {
    /// Pinned an already resident resource.
    Hit(Arc<T>),
    /// The key has an outstanding load or eviction to wait out.
    Pending,
    /// The key is absent; the caller may reserve it and start a load.
    Absent,
}

/// Outcome of dropping a pin.
pub(crate) enum Unpinned<T> {
    /// Other pins remain; the new reference count is attached.
    Retained(usize),
    /// The last pin was dropped. The slot is now `Evicting` and the caller
    /// must run the evictor, then call [`SlotTable::finish_evict`].
    Evict(Arc<T>),
}

/// The state table: one slot per key.
///
/// The table itself is not synchronized; the cache guards it with its mutex
/// and every method runs inside that critical section.
pub(crate) struct SlotTable<T> {
    slots: HashMap<u64, Slot<T>>,
}

impl<T> SlotTable<T> {
    pub(crate) fn new() -> Self {
        Self { slots: HashMap::new() }
    }

    /// Resident entries plus reserved (loading or evicting) slots. This is
    /// the figure the admission guard compares against the capacity bound.
    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn is_resident(&self, key: u64) -> bool {
        matches!(self.slots.get(&key), Some(Slot::Resident { .. }))
    }

    pub(crate) fn refs(&self, key: u64) -> Option<usize> {
        match self.slots.get(&key) {
            Some(Slot::Resident { refs, .. }) => Some(*refs),
            _ => None,
        }
    }

    /// Whether any slot is waiting on an outstanding load or eviction.
    pub(crate) fn has_pending(&self) -> bool {
        self.slots.values().any(|slot| !matches!(slot, Slot::Resident { .. }))
    }

    /// Pin `key` if it is resident.
    pub(crate) fn lookup_pin(&mut self, key: u64) -> Lookup<T> {
        match self.slots.get_mut(&key) {
            Some(Slot::Resident { resource, refs }) => {
                *refs += 1;
                tracing::trace!("[slot]: pin key {}, refs {}", key, refs);
                Lookup::Hit(resource.clone())
            }
            Some(_) => Lookup::Pending,
            None => Lookup::Absent,
        }
    }

    /// Reserve `key` for a load. The reservation counts against the
    /// capacity bound until the load completes or is aborted.
    pub(crate) fn begin_load(&mut self, key: u64) {
        let prev = self.slots.insert(key, Slot::Loading);
        strict_assert!(prev.is_none());
    }

    /// Install the loaded resource with an initial pin.
    pub(crate) fn complete_load(&mut self, key: u64, resource: T) -> Arc<T> {
        let resource = Arc::new(resource);
        let prev = self.slots.insert(
            key,
            Slot::Resident {
                resource: resource.clone(),
                refs: 1,
            },
        );
        strict_assert!(matches!(prev, Some(Slot::Loading)));
        tracing::trace!("[slot]: install key {}, refs 1", key);
        resource
    }

    /// Roll back a failed load, releasing the reserved slot.
    pub(crate) fn abort_load(&mut self, key: u64) {
        let prev = self.slots.remove(&key);
        strict_assert!(matches!(prev, Some(Slot::Loading)));
        tracing::trace!("[slot]: abort load of key {}", key);
    }

    /// Drop one pin of a resident `key`.
    ///
    /// # Panics
    ///
    /// Panics if `key` is not resident. That is a violated acquire/release
    /// discipline on the caller's side, not a runtime condition.
    pub(crate) fn unpin(&mut self, key: u64) -> Unpinned<T> {
        match self.slots.get_mut(&key) {
            Some(Slot::Resident { refs, .. }) if *refs > 1 => {
                *refs -= 1;
                tracing::trace!("[slot]: unpin key {}, refs {}", key, refs);
                Unpinned::Retained(*refs)
            }
            Some(slot @ Slot::Resident { .. }) => {
                tracing::trace!("[slot]: unpin key {}, refs 0, evicting", key);
                match std::mem::replace(slot, Slot::Evicting) {
                    Slot::Resident { resource, refs } => {
                        strict_assert_eq!(refs, 1);
                        Unpinned::Evict(resource)
                    }
                    _ => unreachable!(),
                }
            }
            _ => panic!("release of key {key} that is not resident"),
        }
    }

    /// Remove an `Evicting` slot once the evictor has returned.
    pub(crate) fn finish_evict(&mut self, key: u64) {
        let prev = self.slots.remove(&key);
        strict_assert!(matches!(prev, Some(Slot::Evicting)));
        tracing::trace!("[slot]: evicted key {}", key);
    }

    /// Empty the table, handing back every resident resource.
    ///
    /// # Panics
    ///
    /// Panics if a load or an eviction is still in flight; callers must
    /// wait those out first.
    pub(crate) fn drain(&mut self) -> Vec<Arc<T>> {
        self.slots
            .drain()
            .map(|(key, slot)| match slot {
                Slot::Resident { resource, .. } => resource,
                _ => panic!("drain with a load or eviction of key {key} in flight"),
            })
            .collect_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_lifecycle() {
        let mut table = SlotTable::new();
        assert_eq!(table.len(), 0);

        table.begin_load(1);
        assert!(matches!(table.lookup_pin(1), Lookup::Pending));
        assert!(table.has_pending());

        let r = table.complete_load(1, "one".to_string());
        assert_eq!(r.as_str(), "one");
        assert!(!table.has_pending());
        assert_eq!(table.refs(1), Some(1));

        let Lookup::Hit(r2) = table.lookup_pin(1) else {
            panic!("expected a hit");
        };
        assert!(Arc::ptr_eq(&r, &r2));
        assert_eq!(table.refs(1), Some(2));

        assert!(matches!(table.unpin(1), Unpinned::Retained(1)));
        let Unpinned::Evict(r3) = table.unpin(1) else {
            panic!("expected an eviction");
        };
        assert!(Arc::ptr_eq(&r, &r3));
        assert!(!table.is_resident(1));
        assert!(matches!(table.lookup_pin(1), Lookup::Pending));

        table.finish_evict(1);
        assert!(matches!(table.lookup_pin(1), Lookup::Absent));
        assert_eq!(table.len(), 0);
    }

    #[test]
    fn test_abort_load_releases_slot() {
        let mut table: SlotTable<String> = SlotTable::new();
        table.begin_load(9);
        assert_eq!(table.len(), 1);
        table.abort_load(9);
        assert_eq!(table.len(), 0);
        assert!(matches!(table.lookup_pin(9), Lookup::Absent));
    }

    #[test]
    #[should_panic(expected = "not resident")]
    fn test_unpin_absent_key_panics() {
        let mut table: SlotTable<String> = SlotTable::new();
        table.unpin(1);
    }

    #[test]
    fn test_drain_returns_residents() {
        let mut table = SlotTable::new();
        for key in 0..3 {
            table.begin_load(key);
            table.complete_load(key, key.to_string());
        }
        let drained = table.drain();
        assert_eq!(drained.len(), 3);
        assert_eq!(table.len(), 0);
    }
}
