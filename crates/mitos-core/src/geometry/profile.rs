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

//! Tube cross-section profiles.
//!
//! A profile is sampled into a closed ring of `(x, y)` factors in the unit
//! square. The mesh builder scales the factors by the strand's width and
//! height and places them in each sample's orientation frame, so the same
//! ring serves every point along the curve.

use serde::{Deserialize, Serialize};

use crate::math::{Vec2, FRAC_PI_2, FRAC_PI_3, FRAC_PI_6, TAU};

/// The shape swept along a strand's curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum CrossSection {
    /// An ellipse, flattened by the strand's height ratio.
    Ellipse,
    /// A circle. The strand's height ratio is ignored.
    Circle,
    /// A rectangle, optionally with rounded corners.
    Rectangle {
        /// Corner arc radius as a fraction of the half-extent, `0.0` for
        /// sharp corners.
        corner_radius: f32,
    },
    /// A diamond (square rotated 45 degrees).
    Diamond,
    /// A regular hexagon.
    Hexagon,
}

impl Default for CrossSection {
    fn default() -> Self {
        CrossSection::Ellipse
    }
}

impl CrossSection {
    /// The height ratio actually applied for this shape.
    ///
    /// Circles are round by definition, so they override the strand's
    /// configured ratio with `1.0`.
    pub fn effective_height_ratio(&self, height_ratio: f32) -> f32 {
        match self {
            CrossSection::Circle => 1.0,
            _ => height_ratio,
        }
    }

    /// Samples the profile into a closed ring of `(x, y)` factors.
    ///
    /// `x` multiplies `width * right` and `y` multiplies `height * up`.
    /// The ring wraps around: the segment after the last factor closes back
    /// to the first. The requested count is an upper bound; shapes built
    /// from sides or arcs round it down to a whole number of features.
    pub fn ring_factors(&self, segments: u32) -> Vec<Vec2> {
        let segments = segments as usize;
        match self {
            CrossSection::Ellipse | CrossSection::Circle => ellipse_ring(segments),
            CrossSection::Rectangle { corner_radius } => {
                if *corner_radius <= 0.0 {
                    sharp_rectangle_ring(segments)
                } else {
                    rounded_rectangle_ring(segments, *corner_radius)
                }
            }
            CrossSection::Diamond => diamond_ring(segments),
            CrossSection::Hexagon => hexagon_ring(segments),
        }
    }
}

fn ellipse_ring(segments: usize) -> Vec<Vec2> {
    (0..segments)
        .map(|i| {
            let angle = TAU * i as f32 / segments as f32;
            Vec2::new(angle.cos(), angle.sin())
        })
        .collect()
}

fn sharp_rectangle_ring(segments: usize) -> Vec<Vec2> {
    let per_side = (segments / 4).max(1);
    let mut ring = Vec::with_capacity(per_side * 4);
    for side in 0..4 {
        for j in 0..per_side {
            let t = j as f32 / per_side as f32;
            ring.push(match side {
                // Top edge, right to left.
                0 => Vec2::new(1.0 - 2.0 * t, 1.0),
                1 => Vec2::new(-1.0, 1.0 - 2.0 * t),
                2 => Vec2::new(-1.0 + 2.0 * t, -1.0),
                _ => Vec2::new(1.0, -1.0 + 2.0 * t),
            });
        }
    }
    ring
}

fn rounded_rectangle_ring(segments: usize, radius: f32) -> Vec<Vec2> {
    let r = radius;
    let per_corner = (segments / 8).max(2);
    let per_edge = (segments / 8).max(1);
    let corners = [
        Vec2::new(1.0 - r, 1.0 - r),
        Vec2::new(-1.0 + r, 1.0 - r),
        Vec2::new(-1.0 + r, -1.0 + r),
        Vec2::new(1.0 - r, -1.0 + r),
    ];

    let mut ring = Vec::with_capacity(4 * (per_corner + per_edge));
    for (ci, corner) in corners.iter().enumerate() {
        let start_angle = -FRAC_PI_2 + ci as f32 * FRAC_PI_2;
        for j in 0..per_corner {
            let angle = start_angle + j as f32 * FRAC_PI_2 / per_corner as f32;
            ring.push(Vec2::new(
                corner.x + r * angle.cos(),
                corner.y + r * angle.sin(),
            ));
        }
        // Straight edge following this corner.
        let inner = 1.0 - r;
        for j in 0..per_edge {
            let t = j as f32 / per_edge as f32;
            ring.push(match ci {
                0 => Vec2::new(inner * (1.0 - t) - inner * t, 1.0),
                1 => Vec2::new(-1.0, inner * (1.0 - t) - inner * t),
                2 => Vec2::new(-inner * (1.0 - t) + inner * t, -1.0),
                _ => Vec2::new(1.0, -inner * (1.0 - t) + inner * t),
            });
        }
    }
    ring
}

fn diamond_ring(segments: usize) -> Vec<Vec2> {
    let per_side = (segments / 4).max(1);
    let mut ring = Vec::with_capacity(per_side * 4);
    for side in 0..4 {
        for j in 0..per_side {
            let t = j as f32 / per_side as f32;
            ring.push(match side {
                // Top vertex toward right vertex, then around.
                0 => Vec2::new(t, 1.0 - t),
                1 => Vec2::new(1.0 - t, -t),
                2 => Vec2::new(-t, -1.0 + t),
                _ => Vec2::new(-1.0 + t, t),
            });
        }
    }
    ring
}

fn hexagon_ring(segments: usize) -> Vec<Vec2> {
    let vertices: Vec<Vec2> = (0..6)
        .map(|i| {
            let angle = FRAC_PI_6 + i as f32 * FRAC_PI_3;
            Vec2::new(angle.cos(), angle.sin())
        })
        .collect();

    if segments <= 6 {
        return vertices;
    }

    let per_side = (segments / 6).max(1);
    let mut ring = Vec::with_capacity(per_side * 6);
    for i in 0..6 {
        let a = vertices[i];
        let b = vertices[(i + 1) % 6];
        for j in 0..per_side {
            let t = j as f32 / per_side as f32;
            ring.push(Vec2::new(
                a.x * (1.0 - t) + b.x * t,
                a.y * (1.0 - t) + b.y * t,
            ));
        }
    }
    ring
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::approx_eq_eps;

    #[test]
    fn ellipse_ring_lies_on_the_unit_circle() {
        let ring = CrossSection::Ellipse.ring_factors(40);
        assert_eq!(ring.len(), 40);
        for p in &ring {
            assert!(approx_eq_eps(p.length(), 1.0, 1e-5));
        }
    }

    #[test]
    fn circle_overrides_height_ratio() {
        assert_eq!(CrossSection::Circle.effective_height_ratio(0.4), 1.0);
        assert_eq!(CrossSection::Ellipse.effective_height_ratio(0.4), 0.4);
        assert_eq!(
            CrossSection::Diamond.effective_height_ratio(0.7),
            0.7
        );
    }

    #[test]
    fn sharp_rectangle_ring_stays_on_the_square_boundary() {
        let ring = CrossSection::Rectangle { corner_radius: 0.0 }.ring_factors(40);
        assert_eq!(ring.len(), 40);
        for p in &ring {
            let on_boundary = approx_eq_eps(p.x.abs(), 1.0, 1e-5)
                || approx_eq_eps(p.y.abs(), 1.0, 1e-5);
            assert!(on_boundary, "({}, {}) is not on the square", p.x, p.y);
        }
    }

    #[test]
    fn rounded_rectangle_ring_is_inside_the_square() {
        let ring = CrossSection::Rectangle { corner_radius: 0.3 }.ring_factors(40);
        // 4 corners of 5 arc samples plus 4 edges of 5 samples.
        assert_eq!(ring.len(), 40);
        for p in &ring {
            assert!(p.x.abs() <= 1.0 + 1e-5);
            assert!(p.y.abs() <= 1.0 + 1e-5);
        }
    }

    #[test]
    fn diamond_ring_satisfies_the_manhattan_equation() {
        let ring = CrossSection::Diamond.ring_factors(40);
        assert_eq!(ring.len(), 40);
        for p in &ring {
            assert!(approx_eq_eps(p.x.abs() + p.y.abs(), 1.0, 1e-5));
        }
    }

    #[test]
    fn hexagon_ring_interpolates_between_six_vertices() {
        let coarse = CrossSection::Hexagon.ring_factors(6);
        assert_eq!(coarse.len(), 6);
        for p in &coarse {
            assert!(approx_eq_eps(p.length(), 1.0, 1e-5));
        }

        let fine = CrossSection::Hexagon.ring_factors(12);
        assert_eq!(fine.len(), 12);
        // Edge midpoints sit inside the circumscribed circle.
        assert!(fine.iter().any(|p| p.length() < 0.99));
    }

    #[test]
    fn default_profile_is_the_ellipse() {
        assert_eq!(CrossSection::default(), CrossSection::Ellipse);
    }
}
