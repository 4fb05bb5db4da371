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

//! Defines the `LinearRgba` color type used for strand draw colors.

/// Represents a color in a **linear RGBA** color space using `f32` components.
///
/// Using a linear color space is crucial for correct lighting and blending.
/// `#[repr(C)]` ensures a consistent memory layout, which is important when
/// passing color data to graphics APIs.
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
pub struct LinearRgba {
    /// The red component in linear space.
    pub r: f32,
    /// The green component in linear space.
    pub g: f32,
    /// The blue component in linear space.
    pub b: f32,
    /// The alpha (opacity) component (linear, but not gamma-corrected).
    pub a: f32,
}

impl LinearRgba {
    /// Opaque white (`[1.0, 1.0, 1.0, 1.0]`).
    pub const WHITE: Self = Self::rgb(1.0, 1.0, 1.0);
    /// Opaque black (`[0.0, 0.0, 0.0, 1.0]`).
    pub const BLACK: Self = Self::rgb(0.0, 0.0, 0.0);
    /// Opaque red (`[1.0, 0.0, 0.0, 1.0]`).
    pub const RED: Self = Self::rgb(1.0, 0.0, 0.0);
    /// Opaque green (`[0.0, 1.0, 0.0, 1.0]`).
    pub const GREEN: Self = Self::rgb(0.0, 1.0, 0.0);
    /// Opaque blue (`[0.0, 0.0, 1.0, 1.0]`).
    pub const BLUE: Self = Self::rgb(0.0, 0.0, 1.0);

    /// Creates a new `LinearRgba` with explicit RGBA values.
    #[inline]
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Creates a new opaque `LinearRgba` (alpha = 1.0).
    #[inline]
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Creates an opaque `LinearRgba` from sRGB components, converting the
    /// color channels to linear space.
    #[inline]
    pub fn from_srgb(r: f32, g: f32, b: f32) -> Self {
        Self {
            r: srgb_to_linear(r),
            g: srgb_to_linear(g),
            b: srgb_to_linear(b),
            a: 1.0,
        }
    }

    /// Returns a copy of this color with a different alpha.
    #[inline]
    pub fn with_alpha(&self, a: f32) -> Self {
        Self { a, ..*self }
    }

    /// Returns the components as a `[r, g, b, a]` array, the layout expected
    /// by shader uniforms.
    #[inline]
    pub fn to_array(&self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Performs a linear interpolation between two colors.
    #[inline]
    pub fn lerp(start: Self, end: Self, t: f32) -> Self {
        Self {
            r: start.r + (end.r - start.r) * t,
            g: start.g + (end.g - start.g) * t,
            b: start.b + (end.b - start.b) * t,
            a: start.a + (end.a - start.a) * t,
        }
    }
}

/// Converts an sRGB component to linear space.
#[inline]
fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::approx_eq;

    #[test]
    fn srgb_conversion_endpoints() {
        let black = LinearRgba::from_srgb(0.0, 0.0, 0.0);
        assert!(approx_eq(black.r, 0.0));
        let white = LinearRgba::from_srgb(1.0, 1.0, 1.0);
        assert!(approx_eq(white.r, 1.0));
        assert!(approx_eq(white.a, 1.0));
    }

    #[test]
    fn lerp_midpoint() {
        let mid = LinearRgba::lerp(LinearRgba::BLACK, LinearRgba::WHITE, 0.5);
        assert!(approx_eq(mid.r, 0.5));
        assert!(approx_eq(mid.g, 0.5));
        assert!(approx_eq(mid.b, 0.5));
        assert!(approx_eq(mid.a, 1.0));
    }

    #[test]
    fn to_array_layout() {
        let c = LinearRgba::new(0.1, 0.2, 0.3, 0.4);
        assert_eq!(c.to_array(), [0.1, 0.2, 0.3, 0.4]);
        assert_eq!(c.with_alpha(1.0).a, 1.0);
    }
}
