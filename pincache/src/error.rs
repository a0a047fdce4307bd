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

/// Cache error.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Admission refused: every capacity slot is taken by a resident or
    /// loading resource. The cache never evicts a live entry to make room;
    /// retry after other keys are released.
    #[error("cache is full ({capacity} resources resident or loading)")]
    Full {
        /// The configured capacity bound.
        capacity: usize,
    },
    /// The store failed to load the requested resource. The reserved slot is
    /// released before the error is returned, so a retry invokes the store
    /// again rather than observing a cached failure.
    #[error("resource load failed")]
    Load(#[source] anyhow::Error),
}

/// Cache result.
pub type Result<T> = std::result::Result<T, Error>;
