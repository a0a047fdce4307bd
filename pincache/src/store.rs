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

use std::{marker::PhantomData, sync::Arc};

/// The backing store a cache is built over.
///
/// The cache owns synchronization and lifecycle; the store supplies the two
/// operations that touch the underlying storage.
pub trait Store: Send + Sync + 'static {
    /// The resource cached under each key.
    type Resource: Send + Sync + 'static;

    /// Load the resource for `key` from the underlying storage.
    ///
    /// Runs without the cache lock held and may block on I/O. The cache
    /// invokes it at most once per key at any time, however many callers
    /// are waiting on that key.
    fn load(&self, key: u64) -> anyhow::Result<Self::Resource>;

    /// Write back and tear down an evicted resource.
    ///
    /// Invoked exactly once per cached resource, on the thread that dropped
    /// its last pin or drained the cache, without the cache lock held. There
    /// is no failure path; a fallible write-back must handle its own errors.
    fn evict(&self, resource: Arc<Self::Resource>);
}

/// A [`Store`] assembled from two closures, for call sites where a full
/// trait implementation is more ceremony than needed.
pub struct FnStore<T, L, E> {
    load: L,
    evict: E,
    _marker: PhantomData<fn() -> T>,
}

impl<T, L, E> FnStore<T, L, E>
where
    T: Send + Sync + 'static,
    L: Fn(u64) -> anyhow::Result<T> + Send + Sync + 'static,
    E: Fn(Arc<T>) + Send + Sync + 'static,
{
    /// Assemble a store from a load closure and an evict closure.
    pub fn new(load: L, evict: E) -> Self {
        Self {
            load,
            evict,
            _marker: PhantomData,
        }
    }
}

impl<T, L, E> Store for FnStore<T, L, E>
where
    T: Send + Sync + 'static,
    L: Fn(u64) -> anyhow::Result<T> + Send + Sync + 'static,
    E: Fn(Arc<T>) + Send + Sync + 'static,
{
    type Resource = T;

    fn load(&self, key: u64) -> anyhow::Result<T> {
        (self.load)(key)
    }

    fn evict(&self, resource: Arc<T>) {
        (self.evict)(resource)
    }
}
