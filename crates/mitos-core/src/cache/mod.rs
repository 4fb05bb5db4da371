// Copyright 2025 eraflo
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

//! Version-keyed caches for chain geometry and uploaded GPU buffers.
//!
//! Every key embeds the `(id, version)` stamp of each member strand, so a
//! cached payload can only be returned while the strands it was built from
//! are unchanged. Invalidation is therefore a throughput concern, never a
//! correctness one: a forgotten eviction costs memory, not staleness.

pub mod chain;
pub mod gpu;
pub mod key;

pub use chain::{ChainGeometry, ChainGeometryCache};
pub use gpu::{CachePolicy, GpuBufferCache, ReleaseMode};
pub use key::{BufferKey, GeometryKey};

/// Hit, miss, and eviction counters owned by each cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups that returned a cached payload.
    pub hits: u64,
    /// Lookups that required a rebuild.
    pub misses: u64,
    /// Entries removed, whether by capacity pressure, staleness, or sweeps.
    pub evictions: u64,
}
