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

//! Parallel transport orientation frames and twist.
//!
//! Tangents for the whole polyline are precomputed in one batch pass; that
//! stage is independent per sample. The transport loop itself is inherently
//! sequential (each frame is derived from the previous tangent) and must not
//! be reordered or parallelized.

use crate::math::{degrees_to_radians, Vec3};

/// Twist angles below this magnitude (in degrees) leave a frame untouched.
const MIN_TWIST_DEG: f32 = 0.01;

/// An orientation frame at one curve sample: the cross-section plane's
/// `right` and `up` axes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    /// The axis along which the cross-section width extends.
    pub right: Vec3,
    /// The axis along which the cross-section height extends.
    pub up: Vec3,
}

impl Frame {
    /// Creates a frame from its two axes.
    #[inline]
    pub const fn new(right: Vec3, up: Vec3) -> Self {
        Self { right, up }
    }

    /// Returns this frame rotated by `angle` radians around `axis`.
    ///
    /// `axis` must be normalized by the caller.
    #[inline]
    pub fn rotated_around(&self, axis: Vec3, angle: f32) -> Self {
        Self {
            right: self.right.rotate_around(axis, angle),
            up: self.up.rotate_around(axis, angle),
        }
    }
}

/// Divides by the vector's length when it is meaningful, otherwise keeps
/// the vector as-is. Matches the guard used throughout the transport loop.
#[inline]
fn normalize_or_keep(v: Vec3) -> Vec3 {
    let len = v.length();
    if len > 1e-6 {
        v / len
    } else {
        v
    }
}

/// Tangent of the sampled polyline at `index`: forward difference, falling
/// back to the backward difference at the last sample and to the X axis when
/// both endpoints coincide.
pub(crate) fn polyline_tangent(points: &[Vec3], index: usize) -> Vec3 {
    let tangent = if index < points.len() - 1 {
        points[index + 1] - points[index]
    } else {
        points[index] - points[index - 1]
    };
    let len = tangent.length();
    if len > 1e-6 {
        tangent / len
    } else {
        Vec3::X
    }
}

/// Computes one orientation frame per sampled point via sequential parallel
/// transport.
///
/// The initial frame is deterministic: `right` is the world Y axis crossed
/// with the first tangent, or the world Z axis when the tangent is nearly
/// vertical. Each following frame rotates the previous one by the angle
/// between consecutive tangents (Rodrigues' formula) and is then
/// re-orthonormalized against the current tangent, so numerical drift cannot
/// accumulate along long chains.
///
/// Fewer than two points yields no frames.
pub fn parallel_transport(points: &[Vec3]) -> Vec<Frame> {
    let n = points.len();
    if n < 2 {
        return Vec::new();
    }

    // Batched tangent precompute. The last sample reuses the tangent of the
    // segment before it.
    let mut tangents = Vec::with_capacity(n);
    for i in 0..n - 1 {
        let t = points[i + 1] - points[i];
        let len = t.length();
        let len = if len < 1e-6 { 1.0 } else { len };
        tangents.push(t / len);
    }
    tangents.push(tangents[n - 2]);

    let t0 = tangents[0];
    let mut right = if t0.y.abs() < 0.9 {
        Vec3::Y.cross(t0)
    } else {
        Vec3::Z.cross(t0)
    };
    right = normalize_or_keep(right);
    let mut up = normalize_or_keep(right.cross(t0));

    let mut frames = Vec::with_capacity(n);
    frames.push(Frame::new(right, up));

    // Sequential transport. Each step depends on the previous tangent.
    let mut prev = t0;
    for &tangent in tangents.iter().skip(1) {
        let dot = prev.dot(tangent);

        if dot < -0.99 {
            // Direction reversal: flip instead of rotating through the
            // ill-conditioned 180 degree case.
            right = -right;
        } else if dot < 0.99 {
            let mut axis = prev.cross(tangent);
            let axis_len = axis.length();
            if axis_len > 1e-6 {
                axis = axis / axis_len;
                let angle = dot.clamp(-1.0, 1.0).acos();
                right = right.rotate_around(axis, angle);
            }
        }

        up = normalize_or_keep(right.cross(tangent));
        right = normalize_or_keep(tangent.cross(up));

        frames.push(Frame::new(right, up));
        prev = tangent;
    }

    frames
}

/// Twist angles (in degrees) attached to a strand's four control points.
///
/// The angle along the curve is the cubic Bernstein blend of the four
/// values, so twist eases in and out the same way the curve itself does.
#[derive(Debug, Clone, Copy, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct TwistProfile {
    /// Twist at the start point (t = 0).
    pub start: f32,
    /// Twist weight at the first control point.
    pub cp1: f32,
    /// Twist weight at the second control point.
    pub cp2: f32,
    /// Twist at the end point (t = 1).
    pub end: f32,
}

impl TwistProfile {
    /// Interpolated twist angle in degrees at curve parameter `t`.
    pub fn angle_at(&self, t: f32) -> f32 {
        let t2 = t * t;
        let t3 = t2 * t;
        let mt = 1.0 - t;
        let mt2 = mt * mt;
        let mt3 = mt2 * mt;

        mt3 * self.start + 3.0 * mt2 * t * self.cp1 + 3.0 * mt * t2 * self.cp2 + t3 * self.end
    }

    /// True when every control angle is exactly zero.
    pub fn is_zero(&self) -> bool {
        self.start == 0.0 && self.cp1 == 0.0 && self.cp2 == 0.0 && self.end == 0.0
    }
}

/// Rotates `frames[index]` by `angle_deg` degrees around the polyline
/// tangent at `index`. Angles below [`MIN_TWIST_DEG`] are a no-op.
pub(crate) fn twist_frame_in_place(
    frames: &mut [Frame],
    points: &[Vec3],
    index: usize,
    angle_deg: f32,
) {
    if angle_deg.abs() < MIN_TWIST_DEG {
        return;
    }
    let tangent = polyline_tangent(points, index);
    frames[index] = frames[index].rotated_around(tangent, degrees_to_radians(angle_deg));
}

/// Applies a strand's twist profile to its own frames, with `t` running
/// from 0 at the first sample to 1 at the last.
pub fn apply_twist(frames: &mut [Frame], points: &[Vec3], twist: &TwistProfile) {
    let n = frames.len();
    if n < 2 {
        return;
    }
    for i in 0..n {
        let t = i as f32 / (n - 1) as f32;
        twist_frame_in_place(frames, points, i, twist.angle_at(t));
    }
}
