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

//! Curve sampling, frame transport, and tube mesh emission.
//!
//! Everything in this module is a pure function of its inputs: identical
//! arguments always produce bit-identical output, which is what allows the
//! caches in [`crate::cache`] to key results by version counters alone.
//! Mutable state never lives here.

pub mod curve;
pub mod frames;
pub mod profile;
pub mod tube;

pub use curve::{cubic_point, cubic_tangent, sample_bezier};
pub use frames::{apply_twist, parallel_transport, Frame, TwistProfile};
pub use profile::CrossSection;
pub use tube::{TubeMesh, TubeStyle};

/// Sampling resolutions used when turning a chain of strands into a tube.
///
/// These are part of every cache key: rendering the same chain at two
/// resolutions produces two independent cache entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TubeResolution {
    /// Number of curve segments sampled per strand.
    pub curve_segments: u32,
    /// Number of ring samples around the tube cross-section.
    pub tube_segments: u32,
    /// Number of perimeter samples for the end caps.
    pub cap_segments: u32,
}

impl Default for TubeResolution {
    /// The resolution used by the interactive editor.
    fn default() -> Self {
        Self {
            curve_segments: 56,
            tube_segments: 40,
            cap_segments: 32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_resolution_matches_editor_settings() {
        let res = TubeResolution::default();
        assert_eq!(res.curve_segments, 56);
        assert_eq!(res.tube_segments, 40);
        assert_eq!(res.cap_segments, 32);
    }
}
