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

//! Merged per-chain geometry and its one-entry-per-root cache.
//!
//! A chain's points are the concatenation of its members' version-cached
//! curve samples, with each joint appearing once. Orientation frames are
//! transported across the whole chain in a single pass so the tube's
//! cross-section cannot jump at a joint, and each member's twist profile is
//! then applied to the samples that member contributed.

use std::collections::HashMap;
use std::sync::Arc;

use crate::cache::key::GeometryKey;
use crate::cache::CacheStats;
use crate::geometry::frames::{parallel_transport, twist_frame_in_place, Frame};
use crate::math::Vec3;
use crate::strand::{set::StrandSet, StrandId};

/// One chain's merged sample points and orientation frames.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChainGeometry {
    /// Sampled centerline points across all member strands, joints merged.
    pub points: Vec<Vec3>,
    /// One orientation frame per point, transported chain-wide.
    pub frames: Vec<Frame>,
}

impl ChainGeometry {
    /// Number of samples along the chain.
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the chain produced no usable samples.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.len() < 2
    }
}

#[derive(Debug)]
struct ChainEntry {
    key: GeometryKey,
    geometry: Arc<ChainGeometry>,
}

/// Cache of merged chain geometry, one entry per chain root.
///
/// Chains are independent, so there is no cross-chain eviction pressure; a
/// rebuild simply replaces the root's previous entry.
#[derive(Debug, Default)]
pub struct ChainGeometryCache {
    entries: HashMap<StrandId, ChainEntry>,
    stats: CacheStats,
}

impl ChainGeometryCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the chain's merged geometry, rebuilding it only when some
    /// member's version or the sampling resolution changed.
    ///
    /// `root` must be a chain root; the chain is re-derived from the
    /// current topology on every call, so membership changes are picked up
    /// by the key comparison like any other edit.
    pub fn get_or_build(
        &mut self,
        set: &mut StrandSet,
        root: StrandId,
        curve_segments: u32,
    ) -> (GeometryKey, Arc<ChainGeometry>) {
        let chain = set.chain_of(root);
        let key = GeometryKey::new(curve_segments, set.version_stamps(&chain));

        if let Some(entry) = self.entries.get(&root) {
            if entry.key == key {
                self.stats.hits += 1;
                return (key, Arc::clone(&entry.geometry));
            }
        }
        self.stats.misses += 1;

        let geometry = Arc::new(build_chain_geometry(set, &chain, curve_segments));
        if self
            .entries
            .insert(
                root,
                ChainEntry {
                    key: key.clone(),
                    geometry: Arc::clone(&geometry),
                },
            )
            .is_some()
        {
            self.stats.evictions += 1;
        }
        log::trace!(
            "rebuilt chain geometry for {root}: {} members, {} samples",
            chain.len(),
            geometry.len()
        );
        (key, geometry)
    }

    /// Drops the cached entry for a chain root, if any.
    pub fn invalidate_root(&mut self, root: StrandId) {
        if self.entries.remove(&root).is_some() {
            self.stats.evictions += 1;
        }
    }

    /// Drops every cached entry.
    pub fn clear(&mut self) {
        self.stats.evictions += self.entries.len() as u64;
        self.entries.clear();
    }

    /// Number of cached chains.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no chain is cached.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Hit, miss, and eviction counters.
    #[inline]
    pub fn stats(&self) -> CacheStats {
        self.stats
    }
}

/// Concatenates member samples, transports frames across the whole chain,
/// and applies each member's twist to its own span.
fn build_chain_geometry(
    set: &mut StrandSet,
    chain: &[StrandId],
    curve_segments: u32,
) -> ChainGeometry {
    let mut points: Vec<Vec3> = Vec::new();
    for (index, &id) in chain.iter().enumerate() {
        if let Some(strand) = set.get_mut(id) {
            let samples = strand.curve_points(curve_segments);
            if index == 0 {
                points.extend_from_slice(samples);
            } else if samples.len() > 1 {
                // The first sample duplicates the previous member's last.
                points.extend_from_slice(&samples[1..]);
            }
        }
    }

    let mut frames = parallel_transport(&points);

    let n = curve_segments.max(1) as usize;
    for (index, &id) in chain.iter().enumerate() {
        let twist = match set.get(id) {
            Some(strand) => strand.twist(),
            None => continue,
        };
        if twist.is_zero() {
            continue;
        }
        let base = index * n;
        let first_local = if index == 0 { 0 } else { 1 };
        for local in first_local..=n {
            let global = base + local;
            if global >= frames.len() {
                break;
            }
            let t = local as f32 / n as f32;
            twist_frame_in_place(&mut frames, &points, global, twist.angle_at(t));
        }
    }

    ChainGeometry { points, frames }
}
