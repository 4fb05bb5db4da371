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

//! The GPU buffer (VBO) cache and its eviction policies.
//!
//! Correctness never depends on eviction here: a stale entry is bypassed by
//! key mismatch. The policies only control memory churn. Steady-state keeps
//! the cache tight and releases superseded buffers immediately; drag leaves
//! them allocated so intermediate frames cause no alloc/free storms, and the
//! accumulated garbage is swept when the gesture ends.

use std::borrow::Cow;
use std::collections::HashMap;

use crate::cache::key::BufferKey;
use crate::cache::CacheStats;
use crate::error::RenderError;
use crate::geometry::tube::TubeMesh;
use crate::render::buffer::{BufferDescriptor, BufferUsage, GpuTubeBuffers};
use crate::render::{GraphicsDevice, RenderMode};

/// When superseded buffers are actually released.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseMode {
    /// A newer upload of the same chain destroys the stale entry at once.
    Immediate,
    /// Stale entries stay allocated until a sweep; only capacity overflow
    /// forces a release.
    Deferred,
}

/// Capacity bound plus release behavior, selected by interaction mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    /// Upper bound on resident entries; overflow evicts least-recently-used
    /// first.
    pub capacity: usize,
    /// What to do with entries superseded by a newer key of the same chain.
    pub release: ReleaseMode,
}

impl CachePolicy {
    /// Tight policy for stable frames.
    pub const STEADY: Self = Self {
        capacity: 6,
        release: ReleaseMode::Immediate,
    };

    /// Roomy policy for interactive drags, trading peak memory for the
    /// absence of GPU synchronization stalls from frequent alloc/free.
    pub const DRAG: Self = Self {
        capacity: 30,
        release: ReleaseMode::Deferred,
    };

    /// The policy matching an interaction mode.
    pub fn for_mode(mode: RenderMode) -> Self {
        match mode {
            RenderMode::Steady => Self::STEADY,
            RenderMode::Dragging => Self::DRAG,
        }
    }
}

#[derive(Debug)]
struct BufferEntry {
    buffers: GpuTubeBuffers,
    last_used: u64,
}

/// LRU cache of uploaded tube meshes keyed by [`BufferKey`].
///
/// The recency marker is a monotonic tick advanced on every lookup and
/// insert, so "least recently used" is exact rather than frame-granular.
#[derive(Debug, Default)]
pub struct GpuBufferCache {
    entries: HashMap<BufferKey, BufferEntry>,
    tick: u64,
    stats: CacheStats,
}

impl GpuBufferCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up an uploaded mesh, refreshing its recency on a hit.
    pub fn lookup(&mut self, key: &BufferKey) -> Option<GpuTubeBuffers> {
        self.tick += 1;
        let tick = self.tick;
        match self.entries.get_mut(key) {
            Some(entry) => {
                entry.last_used = tick;
                self.stats.hits += 1;
                Some(entry.buffers)
            }
            None => {
                self.stats.misses += 1;
                None
            }
        }
    }

    /// Returns the uploaded mesh for `key`, building and uploading it on a
    /// miss.
    /// ## Errors
    /// Returns a [`RenderError`] when the device rejects a buffer upload.
    /// A failed upload caches nothing, so the next call simply retries.
    pub fn get_or_build_with<F>(
        &mut self,
        device: &dyn GraphicsDevice,
        policy: CachePolicy,
        key: BufferKey,
        build: F,
    ) -> Result<GpuTubeBuffers, RenderError>
    where
        F: FnOnce() -> TubeMesh,
    {
        if let Some(buffers) = self.lookup(&key) {
            return Ok(buffers);
        }
        let mesh = build();
        self.insert(device, policy, key, &mesh)
    }

    /// Uploads a mesh and caches it under `key`, applying the policy's
    /// release behavior and capacity bound.
    pub fn insert(
        &mut self,
        device: &dyn GraphicsDevice,
        policy: CachePolicy,
        key: BufferKey,
        mesh: &TubeMesh,
    ) -> Result<GpuTubeBuffers, RenderError> {
        let buffers = upload_tube_mesh(device, mesh)?;

        if policy.release == ReleaseMode::Immediate {
            self.purge_same_chain(device, &key);
        }

        self.tick += 1;
        let previous = self.entries.insert(
            key,
            BufferEntry {
                buffers,
                last_used: self.tick,
            },
        );
        if let Some(entry) = previous {
            release_buffers(device, &entry.buffers);
            self.stats.evictions += 1;
        }

        self.enforce_capacity(device, policy.capacity);
        Ok(buffers)
    }

    /// Removes every entry whose key is not in `live`, then trims to
    /// `capacity`. Called once when a drag session's garbage is collected.
    pub fn sweep(&mut self, device: &dyn GraphicsDevice, live: &[BufferKey], capacity: usize) {
        let stale: Vec<BufferKey> = self
            .entries
            .keys()
            .filter(|key| !live.contains(key))
            .cloned()
            .collect();
        if !stale.is_empty() {
            log::debug!("sweeping {} stale tube buffer entries", stale.len());
        }
        for key in stale {
            self.remove_entry(device, &key);
        }
        self.enforce_capacity(device, capacity);
    }

    /// Destroys every cached buffer. Called at teardown.
    pub fn release_all(&mut self, device: &dyn GraphicsDevice) {
        let drained: Vec<BufferEntry> = self.entries.drain().map(|(_, entry)| entry).collect();
        for entry in &drained {
            release_buffers(device, &entry.buffers);
        }
        self.stats.evictions += drained.len() as u64;
    }

    /// Whether an entry exists for `key`, without touching recency.
    pub fn contains(&self, key: &BufferKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of resident entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Hit, miss, and eviction counters.
    #[inline]
    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// Destroys entries superseded by a newer key of the same chain.
    fn purge_same_chain(&mut self, device: &dyn GraphicsDevice, key: &BufferKey) {
        let stale: Vec<BufferKey> = self
            .entries
            .keys()
            .filter(|candidate| candidate.same_chain(key) && *candidate != key)
            .cloned()
            .collect();
        for candidate in stale {
            self.remove_entry(device, &candidate);
        }
    }

    fn remove_entry(&mut self, device: &dyn GraphicsDevice, key: &BufferKey) {
        if let Some(entry) = self.entries.remove(key) {
            release_buffers(device, &entry.buffers);
            self.stats.evictions += 1;
        }
    }

    fn enforce_capacity(&mut self, device: &dyn GraphicsDevice, capacity: usize) {
        while self.entries.len() > capacity {
            let oldest = self
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_used)
                .map(|(key, _)| key.clone());
            match oldest {
                Some(key) => self.remove_entry(device, &key),
                None => break,
            }
        }
    }
}

fn upload_tube_mesh(
    device: &dyn GraphicsDevice,
    mesh: &TubeMesh,
) -> Result<GpuTubeBuffers, RenderError> {
    let usage = BufferUsage::VERTEX | BufferUsage::COPY_DST;

    let vertex_bytes = mesh.vertex_bytes();
    let descriptor = BufferDescriptor {
        label: Some(Cow::Borrowed("strand tube vertices")),
        size: vertex_bytes.len() as u64,
        usage,
        mapped_at_creation: false,
    };
    let vertices = device.create_buffer_with_data(&descriptor, vertex_bytes)?;

    let normal_bytes = mesh.normal_bytes();
    let descriptor = BufferDescriptor {
        label: Some(Cow::Borrowed("strand tube normals")),
        size: normal_bytes.len() as u64,
        usage,
        mapped_at_creation: false,
    };
    let normals = match device.create_buffer_with_data(&descriptor, normal_bytes) {
        Ok(id) => id,
        Err(error) => {
            // Do not leak the first buffer when the second upload fails.
            if let Err(destroy_error) = device.destroy_buffer(vertices) {
                log::warn!("failed to destroy orphaned vertex buffer: {destroy_error:?}");
            }
            return Err(RenderError::from(error));
        }
    };

    Ok(GpuTubeBuffers {
        vertices,
        normals,
        vertex_count: mesh.vertex_count(),
    })
}

fn release_buffers(device: &dyn GraphicsDevice, buffers: &GpuTubeBuffers) {
    if let Err(error) = device.destroy_buffer(buffers.vertices) {
        log::warn!("failed to destroy tube vertex buffer: {error:?}");
    }
    if let Err(error) = device.destroy_buffer(buffers.normals) {
        log::warn!("failed to destroy tube normal buffer: {error:?}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::frames::parallel_transport;
    use crate::geometry::tube::{build_tube, TubeStyle};
    use crate::math::Vec3;
    use crate::render::device::testing::MockGraphicsDevice;
    use crate::strand::StrandId;

    fn test_mesh() -> TubeMesh {
        let points: Vec<Vec3> = (0..4).map(|i| Vec3::new(i as f32, 0.0, 0.0)).collect();
        let frames = parallel_transport(&points);
        build_tube(&points, &frames, &TubeStyle::default(), 6)
    }

    fn chain_key(chain: u32, version: u64) -> BufferKey {
        BufferKey::new(10, 8, vec![(StrandId(chain), version)])
    }

    #[test]
    fn repeat_key_hits_without_a_second_upload() {
        let device = MockGraphicsDevice::new();
        let mut cache = GpuBufferCache::new();

        let first = cache
            .get_or_build_with(&device, CachePolicy::STEADY, chain_key(0, 1), test_mesh)
            .unwrap();
        let second = cache
            .get_or_build_with(&device, CachePolicy::STEADY, chain_key(0, 1), || {
                panic!("a cached key must not rebuild")
            })
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(device.created(), 2);
        assert_eq!(cache.stats().hits, 1);
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn immediate_release_destroys_the_superseded_upload() {
        let device = MockGraphicsDevice::new();
        let mut cache = GpuBufferCache::new();

        cache
            .get_or_build_with(&device, CachePolicy::STEADY, chain_key(0, 1), test_mesh)
            .unwrap();
        cache
            .get_or_build_with(&device, CachePolicy::STEADY, chain_key(0, 2), test_mesh)
            .unwrap();

        assert_eq!(cache.len(), 1);
        assert_eq!(device.destroyed(), 2);
        assert_eq!(cache.stats().evictions, 1);
        assert!(cache.contains(&chain_key(0, 2)));
    }

    #[test]
    fn deferred_release_keeps_stale_entries_allocated() {
        let device = MockGraphicsDevice::new();
        let mut cache = GpuBufferCache::new();

        cache
            .get_or_build_with(&device, CachePolicy::DRAG, chain_key(0, 1), test_mesh)
            .unwrap();
        cache
            .get_or_build_with(&device, CachePolicy::DRAG, chain_key(0, 2), test_mesh)
            .unwrap();

        assert_eq!(cache.len(), 2);
        assert_eq!(device.destroyed(), 0);
        assert_eq!(cache.stats().evictions, 0);
    }

    #[test]
    fn overflow_evicts_least_recently_used_first() {
        let device = MockGraphicsDevice::new();
        let mut cache = GpuBufferCache::new();
        let policy = CachePolicy {
            capacity: 2,
            release: ReleaseMode::Immediate,
        };

        cache
            .get_or_build_with(&device, policy, chain_key(0, 1), test_mesh)
            .unwrap();
        cache
            .get_or_build_with(&device, policy, chain_key(1, 1), test_mesh)
            .unwrap();
        // Touch chain 0 so chain 1 becomes the eviction candidate.
        assert!(cache.lookup(&chain_key(0, 1)).is_some());

        cache
            .get_or_build_with(&device, policy, chain_key(2, 1), test_mesh)
            .unwrap();

        assert_eq!(cache.len(), 2);
        assert!(cache.contains(&chain_key(0, 1)));
        assert!(!cache.contains(&chain_key(1, 1)));
        assert!(cache.contains(&chain_key(2, 1)));
    }

    #[test]
    fn sweep_purges_everything_not_live() {
        let device = MockGraphicsDevice::new();
        let mut cache = GpuBufferCache::new();

        for version in 1..=4 {
            cache
                .get_or_build_with(&device, CachePolicy::DRAG, chain_key(0, version), test_mesh)
                .unwrap();
        }
        assert_eq!(cache.len(), 4);

        let live = vec![chain_key(0, 4)];
        cache.sweep(&device, &live, CachePolicy::STEADY.capacity);

        assert_eq!(cache.len(), 1);
        assert!(cache.contains(&chain_key(0, 4)));
        assert_eq!(device.destroyed(), 6);
    }

    #[test]
    fn release_all_empties_the_cache() {
        let device = MockGraphicsDevice::new();
        let mut cache = GpuBufferCache::new();

        cache
            .get_or_build_with(&device, CachePolicy::STEADY, chain_key(0, 1), test_mesh)
            .unwrap();
        cache
            .get_or_build_with(&device, CachePolicy::STEADY, chain_key(1, 1), test_mesh)
            .unwrap();

        cache.release_all(&device);
        assert!(cache.is_empty());
        assert_eq!(device.live_buffers(), 0);
    }

    #[test]
    fn policies_map_to_interaction_modes() {
        assert_eq!(CachePolicy::for_mode(RenderMode::Steady), CachePolicy::STEADY);
        assert_eq!(CachePolicy::for_mode(RenderMode::Dragging), CachePolicy::DRAG);
        assert_eq!(CachePolicy::STEADY.capacity, 6);
        assert_eq!(CachePolicy::DRAG.capacity, 30);
    }
}
