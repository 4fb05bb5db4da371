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

//! Bezier curve evaluation.
//!
//! Strands are cubic Beziers (four control points), but the sampler accepts
//! any degree with at least two control points. Sampling is batched: the
//! Bernstein weight table for all `S + 1` parameters is filled before any
//! point is assembled. The batched path must stay numerically identical to
//! evaluating one sample at a time; tests pin that equivalence.

use crate::error::GeometryError;
use crate::math::Vec3;

/// Samples `segments + 1` points along the Bezier curve defined by
/// `control_points`, at evenly spaced parameters in `[0, 1]`.
///
/// The first and last samples are exactly the first and last control points.
/// Fewer than two control points is a caller contract violation and is
/// reported as [`GeometryError::TooFewControlPoints`].
pub fn sample_bezier(control_points: &[Vec3], segments: u32) -> Result<Vec<Vec3>, GeometryError> {
    let n = control_points.len();
    if n < 2 {
        return Err(GeometryError::TooFewControlPoints { got: n });
    }

    let degree = n - 1;
    let binom = binomial_row(degree);
    let count = segments as usize + 1;
    let inv_segments = 1.0 / segments.max(1) as f32;

    // Fill the whole weight table up front, one row of Bernstein weights
    // per sample.
    let mut weights = vec![0.0f32; count * n];
    for (row, chunk) in weights.chunks_exact_mut(n).enumerate() {
        let t = row as f32 * inv_segments;
        let mt = 1.0 - t;
        let mut t_pow = 1.0f32;
        for (i, w) in chunk.iter_mut().enumerate() {
            *w = binom[i] * t_pow * mt.powi((degree - i) as i32);
            t_pow *= t;
        }
    }

    let points = weights
        .chunks_exact(n)
        .map(|row| {
            let mut p = Vec3::ZERO;
            for (w, cp) in row.iter().zip(control_points) {
                p = p + *cp * *w;
            }
            p
        })
        .collect();

    Ok(points)
}

/// Evaluates the cubic Bezier defined by `points` at parameter `t`.
#[inline]
pub fn cubic_point(points: &[Vec3; 4], t: f32) -> Vec3 {
    let t2 = t * t;
    let t3 = t2 * t;
    let mt = 1.0 - t;
    let mt2 = mt * mt;
    let mt3 = mt2 * mt;

    points[0] * mt3 + points[1] * (3.0 * mt2 * t) + points[2] * (3.0 * mt * t2) + points[3] * t3
}

/// Evaluates the normalized tangent of the cubic Bezier at parameter `t`.
///
/// If the derivative is degenerate (coincident control points) the raw,
/// near-zero vector is returned instead of an arbitrary direction.
pub fn cubic_tangent(points: &[Vec3; 4], t: f32) -> Vec3 {
    let t2 = t * t;
    let mt = 1.0 - t;
    let mt2 = mt * mt;

    let tangent = (points[1] - points[0]) * (3.0 * mt2)
        + (points[2] - points[1]) * (6.0 * mt * t)
        + (points[3] - points[2]) * (3.0 * t2);

    let len = tangent.length();
    if len > 1e-6 {
        tangent / len
    } else {
        tangent
    }
}

/// Returns row `degree` of Pascal's triangle as binomial coefficients.
fn binomial_row(degree: usize) -> Vec<f32> {
    let mut row = vec![1.0f32];
    for _ in 0..degree {
        let mut next = vec![1.0f32; row.len() + 1];
        for i in 1..row.len() {
            next[i] = row[i - 1] + row[i];
        }
        row = next;
    }
    row
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::approx_eq;

    fn vec3_approx_eq(a: Vec3, b: Vec3) -> bool {
        approx_eq(a.x, b.x) && approx_eq(a.y, b.y) && approx_eq(a.z, b.z)
    }

    fn cubic() -> [Vec3; 4] {
        [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 2.0, 0.0),
            Vec3::new(3.0, 2.0, -1.0),
            Vec3::new(4.0, 0.0, 0.5),
        ]
    }

    #[test]
    fn too_few_control_points_is_an_error() {
        assert_eq!(
            sample_bezier(&[], 10),
            Err(GeometryError::TooFewControlPoints { got: 0 })
        );
        assert_eq!(
            sample_bezier(&[Vec3::ZERO], 10),
            Err(GeometryError::TooFewControlPoints { got: 1 })
        );
    }

    #[test]
    fn sample_count_and_exact_endpoints() {
        let cps = cubic();
        let points = sample_bezier(&cps, 10).unwrap();
        assert_eq!(points.len(), 11);
        assert_eq!(points[0], cps[0]);
        assert_eq!(points[10], cps[3]);
    }

    #[test]
    fn batched_samples_match_single_evaluation() {
        let cps = cubic();
        let segments = 16;
        let points = sample_bezier(&cps, segments).unwrap();
        for (i, p) in points.iter().enumerate() {
            let t = i as f32 / segments as f32;
            assert!(vec3_approx_eq(*p, cubic_point(&cps, t)));
        }
    }

    #[test]
    fn sampling_is_deterministic() {
        let cps = cubic();
        let a = sample_bezier(&cps, 56).unwrap();
        let b = sample_bezier(&cps, 56).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn two_control_points_sample_a_straight_line() {
        let cps = [Vec3::ZERO, Vec3::new(4.0, 0.0, 0.0)];
        let points = sample_bezier(&cps, 4).unwrap();
        for (i, p) in points.iter().enumerate() {
            assert!(vec3_approx_eq(*p, Vec3::new(i as f32, 0.0, 0.0)));
        }
    }

    #[test]
    fn quadratic_midpoint_uses_bernstein_weights() {
        let cps = [Vec3::ZERO, Vec3::new(2.0, 4.0, 0.0), Vec3::new(4.0, 0.0, 0.0)];
        let points = sample_bezier(&cps, 2).unwrap();
        // B(0.5) = 0.25*P0 + 0.5*P1 + 0.25*P2
        assert!(vec3_approx_eq(points[1], Vec3::new(2.0, 2.0, 0.0)));
    }

    #[test]
    fn cubic_tangent_is_normalized() {
        let cps = cubic();
        for i in 0..=8 {
            let t = i as f32 / 8.0;
            let tangent = cubic_tangent(&cps, t);
            assert!(approx_eq(tangent.length(), 1.0));
        }
    }

    #[test]
    fn degenerate_tangent_is_left_near_zero() {
        let p = Vec3::new(1.0, 2.0, 3.0);
        let cps = [p, p, p, p];
        let tangent = cubic_tangent(&cps, 0.5);
        assert!(tangent.length() < 1e-6);
    }
}
