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

//! The per-frame draw path tying the caches to a [`GraphicsDevice`].

use std::sync::Arc;

use crate::cache::chain::{ChainGeometry, ChainGeometryCache};
use crate::cache::gpu::{CachePolicy, GpuBufferCache};
use crate::cache::key::BufferKey;
use crate::cache::CacheStats;
use crate::error::RenderError;
use crate::geometry::tube::{build_cap, build_tube, TubeStyle};
use crate::geometry::TubeResolution;
use crate::math::{LinearRgba, Vec3};
use crate::render::stats::{FrameStats, RenderStats};
use crate::render::{GraphicsDevice, RenderMode};
use crate::strand::{DirtyWave, StrandSet};

/// Renders every chain in a [`StrandSet`] once per frame, deciding per
/// chain whether to reuse GPU buffers, upload fresh ones, or stream
/// client-side arrays.
///
/// The decision procedure per chain is:
/// 1. Resolve the chain's current key from live strand versions.
/// 2. Ask the [`ChainGeometryCache`] for merged points and frames.
/// 3. In [`RenderMode::Steady`], ask the [`GpuBufferCache`] for uploaded
///    buffers, building and uploading on a miss.
/// 4. In [`RenderMode::Dragging`], reuse uploaded buffers when the key
///    still matches (chains untouched by the gesture), otherwise build the
///    mesh on the CPU and draw it from client-side arrays without
///    uploading. The dragged chain's key changes every frame, so an upload
///    would be garbage by the next one.
///
/// End caps are small and always drawn from client-side arrays.
#[derive(Debug)]
pub struct RenderDispatcher {
    chain_cache: ChainGeometryCache,
    gpu_cache: GpuBufferCache,
    resolution: TubeResolution,
    stats: RenderStats,
    pending_sweep: bool,
}

impl Default for RenderDispatcher {
    fn default() -> Self {
        Self::new(TubeResolution::default())
    }
}

impl RenderDispatcher {
    /// Creates a dispatcher rendering at the given resolution.
    pub fn new(resolution: TubeResolution) -> Self {
        Self {
            chain_cache: ChainGeometryCache::new(),
            gpu_cache: GpuBufferCache::new(),
            resolution,
            stats: RenderStats::default(),
            pending_sweep: false,
        }
    }

    /// Draws every chain in `set` once and reports what the frame cost.
    ///
    /// All dirty-marking for the frame must have happened before this call,
    /// otherwise a key could be computed from a version that is already
    /// stale by the time the frame ends.
    /// ## Errors
    /// Returns a [`RenderError`] when a buffer upload or draw call fails.
    /// Failed uploads cache nothing, so the next frame retries.
    pub fn render_frame(
        &mut self,
        device: &dyn GraphicsDevice,
        set: &mut StrandSet,
        mode: RenderMode,
    ) -> Result<FrameStats, RenderError> {
        let chain_before = self.chain_cache.stats();
        let gpu_before = self.gpu_cache.stats();
        let draws_before = self.stats;

        let roots = set.chain_roots();
        let mut live_keys: Vec<BufferKey> = Vec::with_capacity(roots.len());

        for root in roots {
            let (geometry_key, geometry) =
                self.chain_cache
                    .get_or_build(set, root, self.resolution.curve_segments);

            // The root strand's style and color dress the whole chain.
            let (style, color) = match set.get(root) {
                Some(strand) => (strand.style(), strand.color()),
                None => continue,
            };

            if geometry.is_empty() {
                self.stats.empty_chains += 1;
                continue;
            }

            let buffer_key = BufferKey::from_geometry(&geometry_key, self.resolution.tube_segments);
            live_keys.push(buffer_key.clone());

            match mode {
                RenderMode::Steady => {
                    let tube_segments = self.resolution.tube_segments;
                    let chain = Arc::clone(&geometry);
                    let buffers = self.gpu_cache.get_or_build_with(
                        device,
                        CachePolicy::STEADY,
                        buffer_key,
                        || build_tube(&chain.points, &chain.frames, &style, tube_segments),
                    )?;
                    if buffers.vertex_count > 0 {
                        device.draw_buffers(&buffers, color)?;
                        self.stats.buffer_draws += 1;
                    }
                }
                RenderMode::Dragging => match self.gpu_cache.lookup(&buffer_key) {
                    Some(buffers) => {
                        if buffers.vertex_count > 0 {
                            device.draw_buffers(&buffers, color)?;
                            self.stats.buffer_draws += 1;
                        }
                    }
                    None => {
                        let mesh = build_tube(
                            &geometry.points,
                            &geometry.frames,
                            &style,
                            self.resolution.tube_segments,
                        );
                        if !mesh.is_empty() {
                            device.draw_client_arrays(&mesh.vertices, &mesh.normals, color)?;
                            self.stats.client_draws += 1;
                        }
                    }
                },
            }

            self.draw_caps(device, &geometry, &style, color)?;
        }

        if self.pending_sweep && mode == RenderMode::Steady {
            self.gpu_cache
                .sweep(device, &live_keys, CachePolicy::STEADY.capacity);
            self.pending_sweep = false;
        }

        self.stats.frames += 1;

        let chain_after = self.chain_cache.stats();
        let gpu_after = self.gpu_cache.stats();
        // Every steady miss ends in an upload; drag misses stream instead.
        let buffer_uploads = match mode {
            RenderMode::Steady => (gpu_after.misses - gpu_before.misses) as u32,
            RenderMode::Dragging => 0,
        };
        Ok(FrameStats {
            frame_number: self.stats.frames,
            geometry_hits: (chain_after.hits - chain_before.hits) as u32,
            geometry_builds: (chain_after.misses - chain_before.misses) as u32,
            buffer_hits: (gpu_after.hits - gpu_before.hits) as u32,
            buffer_uploads,
            client_draws: (self.stats.client_draws - draws_before.client_draws) as u32,
            cap_draws: (self.stats.cap_draws - draws_before.cap_draws) as u32,
            evictions: (gpu_after.evictions - gpu_before.evictions) as u32,
        })
    }

    /// Drops the chain cache entry of every chain touched by `wave`.
    ///
    /// Stale GPU entries need no action here; their keys stop matching and
    /// the eviction policy reclaims them on the schedule the current mode
    /// allows.
    pub fn invalidate_wave(&mut self, set: &StrandSet, wave: &DirtyWave) {
        for &id in wave.marked() {
            self.chain_cache.invalidate_root(set.chain_root_of(id));
        }
    }

    /// Records that a drag session ended. The accumulated stale buffers are
    /// swept during the next [`RenderMode::Steady`] frame, which also
    /// restores the steady capacity cap.
    pub fn note_drag_ended(&mut self) {
        self.pending_sweep = true;
    }

    /// Releases every cached GPU buffer and clears the geometry cache.
    pub fn release_all(&mut self, device: &dyn GraphicsDevice) {
        self.gpu_cache.release_all(device);
        self.chain_cache.clear();
    }

    /// Frame and draw-call counters.
    #[inline]
    pub fn stats(&self) -> RenderStats {
        self.stats
    }

    /// Hit/miss/eviction counters of the chain geometry cache.
    #[inline]
    pub fn chain_stats(&self) -> CacheStats {
        self.chain_cache.stats()
    }

    /// Hit/miss/eviction counters of the GPU buffer cache.
    #[inline]
    pub fn gpu_stats(&self) -> CacheStats {
        self.gpu_cache.stats()
    }

    /// The resolution every chain is rendered at.
    #[inline]
    pub fn resolution(&self) -> TubeResolution {
        self.resolution
    }

    /// Changes the rendering resolution. Existing cache entries keep their
    /// old keys and stop matching, so everything rebuilds lazily; the next
    /// steady frame sweeps the leftovers.
    pub fn set_resolution(&mut self, resolution: TubeResolution) {
        if self.resolution != resolution {
            self.resolution = resolution;
            self.pending_sweep = true;
        }
    }

    /// Draws both end caps of a chain from client-side arrays.
    fn draw_caps(
        &mut self,
        device: &dyn GraphicsDevice,
        geometry: &ChainGeometry,
        style: &TubeStyle,
        color: LinearRgba,
    ) -> Result<(), RenderError> {
        let n = geometry.points.len();
        if n < 2 || geometry.frames.len() < n {
            return Ok(());
        }

        // Cap normals face outward, away from the tube body.
        let start_tangent = edge_direction(geometry.points[1], geometry.points[0]);
        let end_tangent = edge_direction(geometry.points[n - 2], geometry.points[n - 1]);
        let caps = [
            (geometry.points[0], start_tangent, geometry.frames[0]),
            (geometry.points[n - 1], end_tangent, geometry.frames[n - 1]),
        ];

        for (position, tangent, frame) in caps {
            let mesh = build_cap(position, tangent, frame, style, self.resolution.cap_segments);
            if mesh.is_empty() {
                continue;
            }
            device.draw_client_arrays(&mesh.vertices, &mesh.normals, color)?;
            self.stats.cap_draws += 1;
        }
        Ok(())
    }
}

fn edge_direction(from: Vec3, to: Vec3) -> Vec3 {
    let d = to - from;
    let len = d.length();
    if len < 1e-6 {
        Vec3::X
    } else {
        d / len
    }
}
