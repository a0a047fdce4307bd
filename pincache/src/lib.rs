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

//! `pincache` is a reference-counted resource cache for storage backends.
//!
//! Callers borrow a resource by key with [`PinCache::acquire`]. The first
//! access loads it through the backing [`Store`] without holding the cache
//! lock, concurrent acquires of the same key share one load, and the
//! resource stays resident until the last holder calls
//! [`PinCache::release`], at which point it is handed back to the store for
//! write-back. Admission is bounded by an optional capacity; eviction is
//! purely reference-count triggered. There is no LRU or other replacement
//! policy, which makes the crate a building block for page, data-item, and
//! transaction-object caches rather than a general-purpose cache.
//!
//! # Example
//!
//! ```
//! use pincache::{FnStore, PinCache, PinCacheConfig};
//!
//! let store = FnStore::new(
//!     // Read the page for a key from the underlying storage.
//!     |key| anyhow::Ok(key.to_le_bytes().to_vec()),
//!     // Write an evicted page back.
//!     |page| drop(page),
//! );
//! let cache = PinCache::new(PinCacheConfig { capacity: Some(64) }, store);
//!
//! let page = cache.acquire(42).unwrap();
//! assert_eq!(&page[..], &42u64.to_le_bytes()[..]);
//! cache.release(42);
//!
//! cache.close();
//! ```

mod assert;
mod cache;
mod error;
mod metrics;
mod slot;
mod store;

pub mod prelude;

pub use crate::{
    cache::{PinCache, PinCacheConfig},
    error::{Error, Result},
    metrics::Metrics,
    store::{FnStore, Store},
};
