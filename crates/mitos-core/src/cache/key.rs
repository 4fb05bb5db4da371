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

//! Explicit cache keys built from strand ids and version stamps.
//!
//! Keys carry `(id, version)` pairs rather than any memory identity, so
//! they stay meaningful across frames and can be compared, hashed, and
//! logged freely.

use crate::strand::StrandId;

/// Key for one chain's merged CPU-side points and frames.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GeometryKey {
    curve_segments: u32,
    stamps: Vec<(StrandId, u64)>,
}

impl GeometryKey {
    /// Builds a key from a sampling resolution and the chain's stamps in
    /// chain order.
    pub fn new(curve_segments: u32, stamps: Vec<(StrandId, u64)>) -> Self {
        Self {
            curve_segments,
            stamps,
        }
    }

    /// The number of curve segments the geometry was sampled at.
    #[inline]
    pub fn curve_segments(&self) -> u32 {
        self.curve_segments
    }

    /// The `(id, version)` stamps of the chain members, in chain order.
    #[inline]
    pub fn stamps(&self) -> &[(StrandId, u64)] {
        &self.stamps
    }
}

/// Key for one chain's uploaded tube mesh buffers.
///
/// Extends [`GeometryKey`] with the cross-section resolution, because two
/// meshes of the same curve at different ring densities are different
/// buffers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BufferKey {
    curve_segments: u32,
    tube_segments: u32,
    stamps: Vec<(StrandId, u64)>,
}

impl BufferKey {
    /// Builds a key from both resolutions and the chain's stamps in chain
    /// order.
    pub fn new(curve_segments: u32, tube_segments: u32, stamps: Vec<(StrandId, u64)>) -> Self {
        Self {
            curve_segments,
            tube_segments,
            stamps,
        }
    }

    /// Derives a buffer key from a geometry key plus the ring resolution.
    pub fn from_geometry(key: &GeometryKey, tube_segments: u32) -> Self {
        Self {
            curve_segments: key.curve_segments(),
            tube_segments,
            stamps: key.stamps().to_vec(),
        }
    }

    /// The number of curve segments the mesh was sampled at.
    #[inline]
    pub fn curve_segments(&self) -> u32 {
        self.curve_segments
    }

    /// The number of segments around each cross-section ring.
    #[inline]
    pub fn tube_segments(&self) -> u32 {
        self.tube_segments
    }

    /// The `(id, version)` stamps of the chain members, in chain order.
    #[inline]
    pub fn stamps(&self) -> &[(StrandId, u64)] {
        &self.stamps
    }

    /// Whether two keys describe the same chain, ignoring versions,
    /// resolutions, and downstream membership. A chain is identified by its
    /// root, the first stamped strand, so the check survives attachments
    /// growing the chain. Used to spot stale entries superseded by a newer
    /// upload of the same chain.
    pub fn same_chain(&self, other: &BufferKey) -> bool {
        match (self.stamps.first(), other.stamps.first()) {
            (Some(a), Some(b)) => a.0 == b.0,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_compare_by_value() {
        let a = GeometryKey::new(10, vec![(StrandId(0), 1), (StrandId(1), 4)]);
        let b = GeometryKey::new(10, vec![(StrandId(0), 1), (StrandId(1), 4)]);
        assert_eq!(a, b);

        let newer = GeometryKey::new(10, vec![(StrandId(0), 1), (StrandId(1), 5)]);
        assert_ne!(a, newer);

        let coarser = GeometryKey::new(5, vec![(StrandId(0), 1), (StrandId(1), 4)]);
        assert_ne!(a, coarser);
    }

    #[test]
    fn buffer_key_extends_the_geometry_key() {
        let geometry = GeometryKey::new(10, vec![(StrandId(3), 2)]);
        let fine = BufferKey::from_geometry(&geometry, 40);
        let coarse = BufferKey::from_geometry(&geometry, 8);
        assert_ne!(fine, coarse);
        assert_eq!(fine.curve_segments(), 10);
        assert_eq!(fine.tube_segments(), 40);
    }

    #[test]
    fn same_chain_ignores_versions_but_not_roots() {
        let old = BufferKey::new(10, 40, vec![(StrandId(0), 1), (StrandId(1), 1)]);
        let bumped = BufferKey::new(10, 40, vec![(StrandId(0), 2), (StrandId(1), 7)]);
        let rescaled = BufferKey::new(20, 16, vec![(StrandId(0), 1), (StrandId(1), 1)]);
        let grown = BufferKey::new(10, 40, vec![(StrandId(0), 1), (StrandId(1), 1), (StrandId(4), 1)]);
        let other = BufferKey::new(10, 40, vec![(StrandId(2), 1), (StrandId(3), 1)]);
        let empty = BufferKey::new(10, 40, Vec::new());

        assert!(old.same_chain(&bumped));
        assert!(old.same_chain(&rescaled));
        assert!(old.same_chain(&grown));
        assert!(!old.same_chain(&other));
        assert!(!old.same_chain(&empty));
        assert!(!empty.same_chain(&empty));
    }
}
