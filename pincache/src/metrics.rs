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

use std::sync::atomic::AtomicU64;

/// Operation counters for a cache.
///
/// Counters are cumulative since the cache was created and are updated with
/// relaxed ordering. They are observability data, not synchronization.
#[derive(Debug, Default)]
pub struct Metrics {
    /// acquires served from a resident slot
    pub hit: AtomicU64,
    /// acquires that found the key absent and started a load
    pub miss: AtomicU64,
    /// waits behind another caller's load or eviction of the same key
    pub wait: AtomicU64,
    /// admission refusals with the capacity bound reached
    pub full: AtomicU64,
    /// completed loads
    pub load: AtomicU64,
    /// failed loads
    pub load_error: AtomicU64,
    /// releases
    pub release: AtomicU64,
    /// evictor invocations
    pub evict: AtomicU64,
}
