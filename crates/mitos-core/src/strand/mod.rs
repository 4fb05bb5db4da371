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

//! The strand data model: cubic Bezier tubes, their topology links, and
//! dirty propagation across those links.
//!
//! All mutation goes through [`StrandSet`] and [`DirtyPropagator`] so that
//! the version invariant holds: a strand's geometry version changes if and
//! only if its control points, topology, or twist changed. Code outside
//! this crate edits strands through [`crate::scene::StrandScene`].

pub mod id;
pub mod propagation;
pub mod set;
mod versioned;

pub use id::StrandId;
pub use propagation::{ContinuityConflict, DirtyPropagator, DirtyWave};
pub use set::StrandSet;
pub use versioned::VersionedGeometry;

use serde::{Deserialize, Serialize};

use crate::geometry::frames::{Frame, TwistProfile};
use crate::geometry::tube::TubeStyle;
use crate::math::{LinearRgba, Vec3};

/// Which endpoint of a strand a link refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttachmentSide {
    /// The strand's start point (curve parameter 0).
    Start,
    /// The strand's end point (curve parameter 1).
    End,
}

/// One of a strand's two interior control points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlSlot {
    /// The control point adjacent to the start.
    Cp1,
    /// The control point adjacent to the end.
    Cp2,
}

/// A child strand's glue record: its start is pinned to one endpoint of a
/// parent strand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attachment {
    /// The strand this one hangs off.
    pub parent: StrandId,
    /// Which of the parent's endpoints the child's start is pinned to.
    pub side: AttachmentSide,
    /// Whether the link also constrains tangents (C1 continuity): the
    /// child's first control point tracks the parent's tangent at the
    /// connection point.
    pub continuity: bool,
}

/// Two positions are treated as coincident when every component is within
/// this tolerance.
const ENDPOINT_SNAP_TOL: f32 = 1e-6;

/// Default strand color, a warm orange.
const DEFAULT_COLOR: LinearRgba = LinearRgba::new(0.9, 0.5, 0.1, 1.0);

#[inline]
fn components_close(a: Vec3, b: Vec3, tol: f32) -> bool {
    (a.x - b.x).abs() <= tol && (a.y - b.y).abs() <= tol && (a.z - b.z).abs() <= tol
}

/// A single tube-shaped cubic Bezier curve.
///
/// A strand owns its four control points, twist profile, visual style, and
/// a [`VersionedGeometry`] holding the version counter and sample caches.
/// Topology (parent link, children) is stored here but maintained by
/// [`StrandSet`].
#[derive(Debug)]
pub struct Strand {
    id: StrandId,
    pub(crate) start: Vec3,
    pub(crate) control_point1: Vec3,
    pub(crate) control_point2: Vec3,
    pub(crate) end: Vec3,
    pub(crate) twist: TwistProfile,
    pub(crate) style: TubeStyle,
    pub(crate) color: LinearRgba,
    pub(crate) attachment: Option<Attachment>,
    pub(crate) children: Vec<StrandId>,
    pub(crate) geometry: VersionedGeometry,
}

impl Strand {
    /// Creates a strand between `start` and `end` with control points at
    /// roughly one and two thirds along the straight connection.
    pub(crate) fn new(id: StrandId, start: Vec3, end: Vec3) -> Self {
        let direction = end - start;
        Self {
            id,
            start,
            control_point1: start + direction * 0.33,
            control_point2: start + direction * 0.67,
            end,
            twist: TwistProfile::default(),
            style: TubeStyle::default(),
            color: DEFAULT_COLOR,
            attachment: None,
            children: Vec::new(),
            geometry: VersionedGeometry::new(),
        }
    }

    /// This strand's stable id.
    #[inline]
    pub fn id(&self) -> StrandId {
        self.id
    }

    /// The start point of the curve.
    #[inline]
    pub fn start(&self) -> Vec3 {
        self.start
    }

    /// The end point of the curve.
    #[inline]
    pub fn end(&self) -> Vec3 {
        self.end
    }

    /// The first interior control point.
    #[inline]
    pub fn control_point1(&self) -> Vec3 {
        self.control_point1
    }

    /// The second interior control point.
    #[inline]
    pub fn control_point2(&self) -> Vec3 {
        self.control_point2
    }

    /// All four control points in curve order.
    #[inline]
    pub fn control_polygon(&self) -> [Vec3; 4] {
        [self.start, self.control_point1, self.control_point2, self.end]
    }

    /// The endpoint on the given side.
    #[inline]
    pub fn endpoint(&self, side: AttachmentSide) -> Vec3 {
        match side {
            AttachmentSide::Start => self.start,
            AttachmentSide::End => self.end,
        }
    }

    /// The strand's twist profile in degrees.
    #[inline]
    pub fn twist(&self) -> TwistProfile {
        self.twist
    }

    /// The strand's tube style.
    #[inline]
    pub fn style(&self) -> TubeStyle {
        self.style
    }

    /// The strand's draw color.
    #[inline]
    pub fn color(&self) -> LinearRgba {
        self.color
    }

    /// The glue record to a parent strand, if this strand is attached.
    #[inline]
    pub fn attachment(&self) -> Option<Attachment> {
        self.attachment
    }

    /// Ids of strands whose start is glued to one of this strand's
    /// endpoints, in attach order.
    #[inline]
    pub fn children(&self) -> &[StrandId] {
        &self.children
    }

    /// The current geometry version.
    #[inline]
    pub fn geometry_version(&self) -> u64 {
        self.geometry.version()
    }

    /// Bumps the geometry version by exactly one and clears the sample
    /// caches.
    pub(crate) fn mark_dirty(&mut self) {
        self.geometry.bump();
    }

    /// Version-cached sampled curve points for this strand.
    pub fn curve_points(&mut self, segments: u32) -> &[Vec3] {
        let control = self.control_polygon();
        self.geometry.curve_points(&control, segments)
    }

    /// Version-cached sampled points and twist-adjusted frames for this
    /// strand alone, independent of any chain it belongs to.
    pub fn samples(&mut self, segments: u32) -> (&[Vec3], &[Frame]) {
        let control = self.control_polygon();
        let twist = self.twist;
        self.geometry.samples(&control, segments, &twist)
    }

    /// Moves one endpoint. Control points that coincide with the old
    /// endpoint position travel with it; all others stay put.
    pub(crate) fn set_endpoint(&mut self, side: AttachmentSide, position: Vec3) {
        let old = self.endpoint(side);
        if components_close(self.control_point1, old, ENDPOINT_SNAP_TOL) {
            self.control_point1 = position;
        }
        if components_close(self.control_point2, old, ENDPOINT_SNAP_TOL) {
            self.control_point2 = position;
        }
        match side {
            AttachmentSide::Start => self.start = position,
            AttachmentSide::End => self.end = position,
        }
        self.mark_dirty();
    }

    /// Moves one interior control point.
    pub(crate) fn set_control_point(&mut self, slot: ControlSlot, position: Vec3) {
        match slot {
            ControlSlot::Cp1 => self.control_point1 = position,
            ControlSlot::Cp2 => self.control_point2 = position,
        }
        self.mark_dirty();
    }

    /// Translates the whole strand, preserving its shape.
    pub(crate) fn translate(&mut self, delta: Vec3) {
        self.start = self.start + delta;
        self.control_point1 = self.control_point1 + delta;
        self.control_point2 = self.control_point2 + delta;
        self.end = self.end + delta;
        self.mark_dirty();
    }

    /// Resets the control points onto the straight line between the
    /// endpoints.
    pub(crate) fn make_straight(&mut self) {
        let direction = self.end - self.start;
        self.control_point1 = self.start + direction * 0.33;
        self.control_point2 = self.start + direction * 0.67;
        self.mark_dirty();
    }

    /// Direction pointing away from the curve body at an endpoint, with the
    /// distance to the adjacent control point. Falls back to the chord when
    /// the control point sits on the endpoint, and to the X axis when the
    /// strand is fully degenerate.
    pub(crate) fn outward_tangent(&self, side: AttachmentSide) -> (Vec3, f32) {
        let (anchor, adjacent, far) = match side {
            AttachmentSide::Start => (self.start, self.control_point1, self.end),
            AttachmentSide::End => (self.end, self.control_point2, self.start),
        };
        let offset = anchor - adjacent;
        let len = offset.length();
        if len > 1e-6 {
            return (offset / len, len);
        }
        let chord = anchor - far;
        let chord_len = chord.length();
        if chord_len > 1e-6 {
            (chord / chord_len, 0.0)
        } else {
            (Vec3::X, 0.0)
        }
    }

    /// Replaces the twist profile.
    pub(crate) fn set_twist_profile(&mut self, twist: TwistProfile) {
        self.twist = twist;
        self.mark_dirty();
    }

    /// Replaces the tube style. Bumps the version because the style is
    /// baked into mesh vertices.
    pub(crate) fn set_style(&mut self, style: TubeStyle) {
        self.style = style;
        self.mark_dirty();
    }

    /// Replaces the draw color. Color is a draw-call parameter, never baked
    /// into buffers, so it does not touch the geometry version.
    pub(crate) fn set_color(&mut self, color: LinearRgba) {
        self.color = color;
    }
}
