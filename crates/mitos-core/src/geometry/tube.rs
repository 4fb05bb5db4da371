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

//! Tube surface triangulation.
//!
//! The builder sweeps a cross-section ring along sampled points and frames
//! and emits flat `f32` arrays, three components per vertex, ready to hand
//! to a vertex buffer without any per-vertex restructuring.

use serde::{Deserialize, Serialize};

use crate::geometry::frames::Frame;
use crate::geometry::profile::CrossSection;
use crate::math::{Vec2, Vec3};

/// Visual parameters of a tube: its cross-section shape and extents.
///
/// A chain is rendered with the style of its root strand.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TubeStyle {
    /// The swept cross-section shape.
    pub cross_section: CrossSection,
    /// Half-extent along each frame's `right` axis.
    pub width: f32,
    /// Height as a fraction of the width.
    pub height_ratio: f32,
}

impl Default for TubeStyle {
    /// A flat elliptical tube, the editor's default look.
    fn default() -> Self {
        Self {
            cross_section: CrossSection::Ellipse,
            width: 0.15,
            height_ratio: 0.4,
        }
    }
}

impl TubeStyle {
    /// The cross-section height actually used for meshing.
    #[inline]
    pub fn height(&self) -> f32 {
        self.width * self.cross_section.effective_height_ratio(self.height_ratio)
    }
}

/// A triangulated mesh as flat vertex and normal arrays.
///
/// Both arrays hold `x, y, z` triples and are always the same length.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TubeMesh {
    /// Vertex positions, three `f32` per vertex.
    pub vertices: Vec<f32>,
    /// Vertex normals, three `f32` per vertex.
    pub normals: Vec<f32>,
}

impl TubeMesh {
    /// True when the mesh holds no triangles.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Number of vertices in the mesh.
    #[inline]
    pub fn vertex_count(&self) -> u32 {
        (self.vertices.len() / 3) as u32
    }

    /// Vertex positions reinterpreted as bytes for buffer upload.
    #[inline]
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Vertex normals reinterpreted as bytes for buffer upload.
    #[inline]
    pub fn normal_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.normals)
    }

    fn push_triangle(&mut self, positions: [Vec3; 3], normals: [Vec3; 3]) {
        for v in positions {
            self.vertices.extend_from_slice(&[v.x, v.y, v.z]);
        }
        for n in normals {
            self.normals.extend_from_slice(&[n.x, n.y, n.z]);
        }
    }
}

/// Surface normal for a ring factor, unnormalized input left untouched when
/// degenerate.
#[inline]
fn ring_normal(factor: Vec2, right: Vec3, up: Vec3) -> Vec3 {
    let n = right * factor.x + up * factor.y;
    let len = n.length();
    let len = if len < 1e-6 { 1.0 } else { len };
    n / len
}

/// Sweeps `style`'s cross-section along the sampled points and frames and
/// triangulates the resulting tube.
///
/// Adjacent rings are joined with two triangles per ring segment, so the
/// output holds `(N - 1) * R * 6` vertices for `N` samples and a ring of
/// `R` factors. Degenerate input (fewer than two samples, or a ring of
/// fewer than three segments) yields an empty mesh rather than an error.
pub fn build_tube(
    points: &[Vec3],
    frames: &[Frame],
    style: &TubeStyle,
    tube_segments: u32,
) -> TubeMesh {
    let n = points.len().min(frames.len());
    if n < 2 || tube_segments < 3 {
        return TubeMesh::default();
    }

    let ring = style.cross_section.ring_factors(tube_segments);
    let ring_count = ring.len();
    if ring_count < 3 {
        return TubeMesh::default();
    }

    let width = style.width;
    let height = style.height();

    let mut mesh = TubeMesh {
        vertices: Vec::with_capacity((n - 1) * ring_count * 18),
        normals: Vec::with_capacity((n - 1) * ring_count * 18),
    };

    for i in 0..n - 1 {
        let c1 = points[i];
        let c2 = points[i + 1];
        let f1 = frames[i];
        let f2 = frames[i + 1];

        for j in 0..ring_count {
            let a = ring[j];
            let b = ring[(j + 1) % ring_count];

            let v00 = c1 + f1.right * (width * a.x) + f1.up * (height * a.y);
            let v01 = c1 + f1.right * (width * b.x) + f1.up * (height * b.y);
            let v10 = c2 + f2.right * (width * a.x) + f2.up * (height * a.y);
            let v11 = c2 + f2.right * (width * b.x) + f2.up * (height * b.y);

            let n00 = ring_normal(a, f1.right, f1.up);
            let n01 = ring_normal(b, f1.right, f1.up);
            let n10 = ring_normal(a, f2.right, f2.up);
            let n11 = ring_normal(b, f2.right, f2.up);

            mesh.push_triangle([v00, v10, v11], [n00, n10, n11]);
            mesh.push_triangle([v00, v11, v01], [n00, n11, n01]);
        }
    }

    mesh
}

/// Builds a flat end cap as a triangle fan over the cross-section ring.
///
/// Every cap vertex shares the curve tangent as its normal, which matches
/// the lighting of the adjoining tube rim. An empty mesh is returned when
/// the ring is too coarse to enclose any area.
pub fn build_cap(
    position: Vec3,
    tangent: Vec3,
    frame: Frame,
    style: &TubeStyle,
    cap_segments: u32,
) -> TubeMesh {
    let ring = style.cross_section.ring_factors(cap_segments);
    let ring_count = ring.len();
    if ring_count < 3 {
        return TubeMesh::default();
    }

    let width = style.width;
    let height = style.height();

    let perimeter: Vec<Vec3> = ring
        .iter()
        .map(|f| position + frame.right * (width * f.x) + frame.up * (height * f.y))
        .collect();

    let mut mesh = TubeMesh {
        vertices: Vec::with_capacity(ring_count * 9),
        normals: Vec::with_capacity(ring_count * 9),
    };
    for j in 0..ring_count {
        let a = perimeter[j];
        let b = perimeter[(j + 1) % ring_count];
        mesh.push_triangle([position, a, b], [tangent, tangent, tangent]);
    }

    mesh
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::frames::parallel_transport;
    use crate::math::{approx_eq_eps, EPSILON};

    fn straight_line(n: usize) -> Vec<Vec3> {
        (0..n).map(|i| Vec3::new(i as f32, 0.0, 0.0)).collect()
    }

    fn circle_style(width: f32) -> TubeStyle {
        TubeStyle {
            cross_section: CrossSection::Circle,
            width,
            height_ratio: 0.4,
        }
    }

    #[test]
    fn degenerate_input_yields_an_empty_mesh() {
        let style = TubeStyle::default();
        assert!(build_tube(&[], &[], &style, 8).is_empty());

        let one = straight_line(1);
        let frames = parallel_transport(&one);
        assert!(build_tube(&one, &frames, &style, 8).is_empty());

        let line = straight_line(4);
        let frames = parallel_transport(&line);
        assert!(build_tube(&line, &frames, &style, 2).is_empty());
    }

    #[test]
    fn tube_triangle_count_follows_the_contract() {
        let points = straight_line(3);
        let frames = parallel_transport(&points);
        let mesh = build_tube(&points, &frames, &TubeStyle::default(), 8);
        // (N-1) rings * R segments * 2 triangles * 3 vertices * 3 floats.
        assert_eq!(mesh.vertices.len(), 2 * 8 * 6 * 3);
        assert_eq!(mesh.normals.len(), mesh.vertices.len());
        assert_eq!(mesh.vertex_count(), 96);
        assert_eq!(mesh.vertex_bytes().len(), mesh.vertices.len() * 4);
    }

    #[test]
    fn circular_tube_vertices_sit_at_the_tube_radius() {
        let points = straight_line(4);
        let frames = parallel_transport(&points);
        let width = 0.25;
        let mesh = build_tube(&points, &frames, &circle_style(width), 16);

        for chunk in mesh.vertices.chunks_exact(3) {
            // The spine runs along X, so the radial distance is in the YZ
            // plane.
            let radial = (chunk[1] * chunk[1] + chunk[2] * chunk[2]).sqrt();
            assert!(approx_eq_eps(radial, width, 1e-4));
        }
    }

    #[test]
    fn elliptical_tube_respects_the_height_ratio() {
        let points = straight_line(4);
        let frames = parallel_transport(&points);
        let style = TubeStyle {
            cross_section: CrossSection::Ellipse,
            width: 0.2,
            height_ratio: 0.4,
        };
        let mesh = build_tube(&points, &frames, &style, 32);

        let mut max_y = 0.0f32;
        let mut max_z = 0.0f32;
        for chunk in mesh.vertices.chunks_exact(3) {
            max_y = max_y.max(chunk[1].abs());
            max_z = max_z.max(chunk[2].abs());
        }
        // On a straight X spine the frame maps width to Z and height to Y.
        assert!(approx_eq_eps(max_z, style.width, 1e-4));
        assert!(approx_eq_eps(max_y, style.height(), 1e-4));
    }

    #[test]
    fn tube_normals_are_unit_and_outward() {
        let points = straight_line(3);
        let frames = parallel_transport(&points);
        let mesh = build_tube(&points, &frames, &circle_style(0.3), 12);

        for (v, n) in mesh
            .vertices
            .chunks_exact(3)
            .zip(mesh.normals.chunks_exact(3))
        {
            let normal = Vec3::new(n[0], n[1], n[2]);
            assert!(approx_eq_eps(normal.length(), 1.0, 1e-4));
            // Outward means the normal agrees with the radial offset.
            let radial = Vec3::new(0.0, v[1], v[2]);
            assert!(normal.dot(radial) > 0.0);
        }
    }

    #[test]
    fn cap_is_a_fan_with_tangent_normals() {
        let frame = Frame::new(Vec3::new(0.0, 0.0, -1.0), Vec3::new(0.0, -1.0, 0.0));
        let style = TubeStyle::default();
        let mesh = build_cap(Vec3::ZERO, Vec3::X, frame, &style, 8);

        assert_eq!(mesh.vertex_count(), 8 * 3);
        for n in mesh.normals.chunks_exact(3) {
            assert!(approx_eq_eps(n[0], 1.0, EPSILON));
            assert!(approx_eq_eps(n[1], 0.0, EPSILON));
            assert!(approx_eq_eps(n[2], 0.0, EPSILON));
        }
        // Every third vertex is the fan center.
        for tri in mesh.vertices.chunks_exact(9) {
            assert_eq!(&tri[0..3], &[0.0, 0.0, 0.0]);
        }
    }

    #[test]
    fn cap_needs_at_least_three_ring_segments() {
        let frame = Frame::new(Vec3::Z, Vec3::Y);
        let style = TubeStyle {
            cross_section: CrossSection::Ellipse,
            width: 0.15,
            height_ratio: 0.4,
        };
        assert!(build_cap(Vec3::ZERO, Vec3::X, frame, &style, 2).is_empty());
    }
}
