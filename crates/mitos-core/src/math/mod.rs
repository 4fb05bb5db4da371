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

//! Foundational mathematics primitives for the strand engine.
//!
//! Curve evaluation, frame transport, and mesh emission all run on the types
//! in this module. Angular quantities are radians unless a function name says
//! otherwise (strand twist is user-facing and therefore stored in degrees,
//! converted at the point of use).

// --- Fundamental Constants ---

/// A small constant for floating-point comparisons.
pub const EPSILON: f32 = 1e-5;

// Re-export standard mathematical constants for convenience.
pub use std::f32::consts::{FRAC_PI_2, FRAC_PI_3, FRAC_PI_4, FRAC_PI_6, PI, SQRT_2, TAU};

/// The factor to convert degrees to radians (PI / 180.0).
pub const DEG_TO_RAD: f32 = PI / 180.0;
/// The factor to convert radians to degrees (180.0 / PI).
pub const RAD_TO_DEG: f32 = 180.0 / PI;

// --- Declare Sub-Modules ---

pub mod color;
pub mod matrix;
pub mod vector;

// --- Re-export Principal Types ---

pub use self::color::LinearRgba;
pub use self::matrix::Mat4;
pub use self::vector::{Vec2, Vec3, Vec4};

// --- Utility Functions ---

/// Converts an angle from degrees to radians.
///
/// # Examples
///
/// ```
/// use mitos_core::math::{degrees_to_radians, PI};
/// assert_eq!(degrees_to_radians(180.0), PI);
/// ```
#[inline]
pub fn degrees_to_radians(degrees: f32) -> f32 {
    degrees * DEG_TO_RAD
}

/// Converts an angle from radians to degrees.
///
/// # Examples
///
/// ```
/// use mitos_core::math::{radians_to_degrees, PI};
/// assert_eq!(radians_to_degrees(PI), 180.0);
/// ```
#[inline]
pub fn radians_to_degrees(radians: f32) -> f32 {
    radians * RAD_TO_DEG
}

/// Performs an approximate equality comparison between two floats with a custom tolerance.
///
/// # Examples
///
/// ```
/// use mitos_core::math::approx_eq_eps;
/// assert!(approx_eq_eps(0.001, 0.002, 1e-2));
/// assert!(!approx_eq_eps(0.001, 0.002, 1e-4));
/// ```
#[inline]
pub fn approx_eq_eps(a: f32, b: f32, epsilon: f32) -> bool {
    (a - b).abs() < epsilon
}

/// Performs an approximate equality comparison using the module's default [`EPSILON`].
///
/// # Examples
///
/// ```
/// use mitos_core::math::{approx_eq, EPSILON};
/// assert!(approx_eq(1.0, 1.0 + EPSILON / 2.0));
/// assert!(!approx_eq(1.0, 1.0 + EPSILON * 2.0));
/// ```
#[inline]
pub fn approx_eq(a: f32, b: f32) -> bool {
    approx_eq_eps(a, b, EPSILON)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn angle_conversions_round_trip() {
        assert!(approx_eq(degrees_to_radians(90.0), FRAC_PI_2));
        assert!(approx_eq(radians_to_degrees(FRAC_PI_2), 90.0));
        let deg = 37.5;
        assert!(approx_eq(radians_to_degrees(degrees_to_radians(deg)), deg));
    }

    #[test]
    fn approx_eq_respects_tolerance() {
        assert!(approx_eq(0.0, EPSILON * 0.5));
        assert!(!approx_eq(0.0, EPSILON * 2.0));
        assert!(approx_eq_eps(10.0, 10.4, 0.5));
        assert!(!approx_eq_eps(10.0, 10.6, 0.5));
    }
}
