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

//! Fuzzy test for the acquire/release protocol under concurrency.

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use itertools::Itertools;
use pincache::{Error, PinCache, PinCacheConfig, Store};
use rand::{rngs::SmallRng, Rng, SeedableRng};

const WORKERS: u64 = 8;
const OPS: usize = 10_000;
const KEYS: u64 = 64;
const MAX_HELD: usize = 4;

#[derive(Debug, Default)]
struct CountingStore {
    loads: AtomicU64,
    evictions: AtomicU64,
}

impl Store for CountingStore {
    type Resource = u64;

    fn load(&self, key: u64) -> anyhow::Result<u64> {
        self.loads.fetch_add(1, Ordering::Relaxed);
        Ok(key.wrapping_mul(31))
    }

    fn evict(&self, resource: Arc<u64>) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
        drop(resource);
    }
}

/// Workers acquire and release random keys, each balancing every acquire
/// with exactly one release. At the end nothing may be resident, and every
/// load must have been matched by one eviction.
fn fuzzy(cache: PinCache<CountingStore>) {
    let handles = (0..WORKERS)
        .map(|i| {
            let c = cache.clone();
            std::thread::spawn(move || {
                let mut rng = SmallRng::seed_from_u64(i);
                let mut held = vec![];
                for _ in 0..OPS {
                    if held.len() >= MAX_HELD || (!held.is_empty() && rng.random_bool(0.4)) {
                        let at = rng.random_range(0..held.len());
                        let key = held.swap_remove(at);
                        c.release(key);
                        continue;
                    }
                    let key = rng.random_range(0..KEYS);
                    match c.acquire(key) {
                        Ok(resource) => {
                            assert_eq!(*resource, key.wrapping_mul(31));
                            held.push(key);
                        }
                        Err(Error::Full { .. }) => {}
                        Err(e) => panic!("unexpected error: {e}"),
                    }
                }
                for key in held {
                    c.release(key);
                }
            })
        })
        .collect_vec();

    handles.into_iter().for_each(|handle| handle.join().unwrap());

    assert_eq!(cache.usage(), 0);
    let loads = cache.store().loads.load(Ordering::Relaxed);
    let evictions = cache.store().evictions.load(Ordering::Relaxed);
    assert_eq!(loads, evictions);

    cache.close();
    assert_eq!(cache.store().evictions.load(Ordering::Relaxed), loads);
}

#[test_log::test]
fn test_pin_cache_fuzzy_unbounded() {
    fuzzy(PinCache::new(PinCacheConfig::default(), CountingStore::default()));
}

#[test_log::test]
fn test_pin_cache_fuzzy_bounded() {
    fuzzy(PinCache::new(
        PinCacheConfig { capacity: Some(16) },
        CountingStore::default(),
    ));
}
