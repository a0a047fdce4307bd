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

//! A tiny page cache built on `pincache`.

use std::sync::Arc;

use hashbrown::HashMap;
use parking_lot::Mutex;
use pincache::{PinCache, PinCacheConfig, Store};

const PAGE_SIZE: usize = 4096;

struct Page {
    no: u64,
    data: Mutex<Vec<u8>>,
}

/// A "disk" of pages; eviction writes the page image back.
#[derive(Default)]
struct PageFile {
    disk: Mutex<HashMap<u64, Vec<u8>>>,
}

impl Store for PageFile {
    type Resource = Page;

    fn load(&self, no: u64) -> anyhow::Result<Page> {
        let data = self
            .disk
            .lock()
            .get(&no)
            .cloned()
            .unwrap_or_else(|| vec![0; PAGE_SIZE]);
        Ok(Page {
            no,
            data: Mutex::new(data),
        })
    }

    fn evict(&self, page: Arc<Page>) {
        let data = page.data.lock().clone();
        self.disk.lock().insert(page.no, data);
    }
}

fn main() {
    let cache = PinCache::new(PinCacheConfig { capacity: Some(8) }, PageFile::default());

    // Pin a page, scribble on it, unpin. The last release writes it back.
    let page = cache.acquire(7).unwrap();
    page.data.lock()[0] = 0xAB;
    drop(page);
    cache.release(7);
    assert!(!cache.contains(7));

    // The next acquire reads the written-back image from the "disk".
    let page = cache.acquire(7).unwrap();
    assert_eq!(page.data.lock()[0], 0xAB);
    drop(page);
    cache.release(7);

    cache.close();
}
