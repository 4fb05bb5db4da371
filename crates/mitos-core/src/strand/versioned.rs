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

//! Per-strand versioned sample caches.

use std::collections::HashMap;

use crate::geometry::curve::sample_bezier;
use crate::geometry::frames::{apply_twist, parallel_transport, Frame, TwistProfile};
use crate::math::Vec3;

#[derive(Debug, Default)]
struct CurveEntry {
    version: u64,
    points: Vec<Vec3>,
}

#[derive(Debug, Default)]
struct FrameEntry {
    version: u64,
    frames: Vec<Frame>,
}

/// A strand's monotonic geometry version plus the sampled curve points and
/// frames cached under it, one slot per segment count.
///
/// Every read re-checks the slot's recorded version against the live one,
/// so a stale slot can only ever miss, never serve old samples. Versions
/// start at 1; 0 marks a slot that has never been built.
#[derive(Debug)]
pub struct VersionedGeometry {
    version: u64,
    curve_cache: HashMap<u32, CurveEntry>,
    frame_cache: HashMap<u32, FrameEntry>,
}

impl VersionedGeometry {
    /// Creates fresh state at version 1 with empty caches.
    pub fn new() -> Self {
        Self {
            version: 1,
            curve_cache: HashMap::new(),
            frame_cache: HashMap::new(),
        }
    }

    /// The current geometry version.
    #[inline]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Increments the version by exactly one and drops all cached samples.
    pub fn bump(&mut self) {
        self.version += 1;
        self.curve_cache.clear();
        self.frame_cache.clear();
    }

    /// Cached curve points for `segments`, rebuilt when the slot's version
    /// lags the strand's.
    pub fn curve_points(&mut self, control_points: &[Vec3], segments: u32) -> &[Vec3] {
        let version = self.version;
        let entry = self.curve_cache.entry(segments).or_default();
        if entry.version != version {
            entry.points = sample_bezier(control_points, segments).unwrap_or_default();
            entry.version = version;
        }
        &entry.points
    }

    /// Cached curve points and twist-adjusted transport frames for
    /// `segments`.
    pub fn samples(
        &mut self,
        control_points: &[Vec3],
        segments: u32,
        twist: &TwistProfile,
    ) -> (&[Vec3], &[Frame]) {
        let version = self.version;

        let curve_entry = self.curve_cache.entry(segments).or_default();
        if curve_entry.version != version {
            curve_entry.points = sample_bezier(control_points, segments).unwrap_or_default();
            curve_entry.version = version;
        }
        let points: &[Vec3] = &curve_entry.points;

        let frame_entry = self.frame_cache.entry(segments).or_default();
        if frame_entry.version != version {
            let mut frames = parallel_transport(points);
            apply_twist(&mut frames, points, twist);
            frame_entry.frames = frames;
            frame_entry.version = version;
        }

        (points, &frame_entry.frames)
    }
}

impl Default for VersionedGeometry {
    fn default() -> Self {
        Self::new()
    }
}
