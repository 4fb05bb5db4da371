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

//! Defines the `Mat4` type and associated operations.

use super::{Vec3, Vec4};
use std::ops::Mul;

/// A 4x4 column-major matrix.
///
/// Used for camera view and projection transforms. The memory layout is
/// column-major, which is compatible with modern graphics APIs like Vulkan,
/// Metal, and DirectX.
#[derive(Debug, Clone, Copy, PartialEq)]
#[repr(C)]
pub struct Mat4 {
    /// The columns of the matrix. `cols[0]` is the first column, and so on.
    pub cols: [Vec4; 4],
}

impl Mat4 {
    /// The 4x4 identity matrix.
    pub const IDENTITY: Self = Self {
        cols: [Vec4::X, Vec4::Y, Vec4::Z, Vec4::W],
    };

    /// A 4x4 matrix with all elements set to 0.
    pub const ZERO: Self = Self {
        cols: [Vec4::ZERO; 4],
    };

    /// Creates a new matrix from four column vectors.
    #[inline]
    pub fn from_cols(c0: Vec4, c1: Vec4, c2: Vec4, c3: Vec4) -> Self {
        Self {
            cols: [c0, c1, c2, c3],
        }
    }

    /// Returns a row of the matrix as a `Vec4`.
    #[inline]
    fn get_row(&self, index: usize) -> Vec4 {
        Vec4 {
            x: self.cols[0].get(index),
            y: self.cols[1].get(index),
            z: self.cols[2].get(index),
            w: self.cols[3].get(index),
        }
    }

    /// Returns the matrix columns as a nested `f32` array, in column-major
    /// order, ready for upload into a shader uniform.
    #[inline]
    pub fn to_cols_array_2d(&self) -> [[f32; 4]; 4] {
        [
            [self.cols[0].x, self.cols[0].y, self.cols[0].z, self.cols[0].w],
            [self.cols[1].x, self.cols[1].y, self.cols[1].z, self.cols[1].w],
            [self.cols[2].x, self.cols[2].y, self.cols[2].z, self.cols[2].w],
            [self.cols[3].x, self.cols[3].y, self.cols[3].z, self.cols[3].w],
        ]
    }

    /// Creates a right-handed perspective projection matrix with a [0, 1] depth range (ZO).
    ///
    /// # Arguments
    ///
    /// * `fov_y_radians`: Vertical field of view in radians.
    /// * `aspect_ratio`: Width divided by height of the viewport.
    /// * `z_near`: Distance to the near clipping plane (must be positive).
    /// * `z_far`: Distance to the far clipping plane (must be positive and > `z_near`).
    #[inline]
    pub fn perspective_rh_zo(
        fov_y_radians: f32,
        aspect_ratio: f32,
        z_near: f32,
        z_far: f32,
    ) -> Self {
        assert!(z_near > 0.0 && z_far > z_near);
        let tan_half_fovy = (fov_y_radians / 2.0).tan();
        let f = 1.0 / tan_half_fovy;
        let aa = f / aspect_ratio;
        let bb = f;
        let cc = z_far / (z_near - z_far);
        let dd = (z_near * z_far) / (z_near - z_far);

        Self::from_cols(
            Vec4::new(aa, 0.0, 0.0, 0.0),
            Vec4::new(0.0, bb, 0.0, 0.0),
            Vec4::new(0.0, 0.0, cc, -1.0),
            Vec4::new(0.0, 0.0, dd, 0.0),
        )
    }

    /// Creates a right-handed view matrix for a camera looking from `eye` towards `target`.
    ///
    /// # Arguments
    ///
    /// * `eye`: The position of the camera in world space.
    /// * `target`: The point in world space that the camera is looking at.
    /// * `up`: A vector indicating the "up" direction of the world (commonly `Vec3::Y`).
    ///
    /// # Returns
    ///
    /// Returns `Some(Mat4)` if a valid view matrix can be constructed, or `None` if
    /// `eye` and `target` are too close, or if `up` is parallel to the view direction.
    #[inline]
    pub fn look_at_rh(eye: Vec3, target: Vec3, up: Vec3) -> Option<Self> {
        let forward = target - eye;
        if forward.length_squared() < crate::math::EPSILON * crate::math::EPSILON {
            return None;
        }
        let f = forward.normalize();
        let s = f.cross(up);
        if s.length_squared() < crate::math::EPSILON * crate::math::EPSILON {
            return None;
        }
        let s = s.normalize();
        let u = s.cross(f);

        Some(Self::from_cols(
            Vec4::new(s.x, u.x, -f.x, 0.0),
            Vec4::new(s.y, u.y, -f.y, 0.0),
            Vec4::new(s.z, u.z, -f.z, 0.0),
            Vec4::new(-eye.dot(s), -eye.dot(u), eye.dot(f), 1.0),
        ))
    }
}

impl Default for Mat4 {
    /// Returns the identity matrix.
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul<Mat4> for Mat4 {
    type Output = Self;
    /// Multiplies this matrix by another `Mat4`. Note that matrix multiplication is not commutative.
    #[inline]
    fn mul(self, rhs: Mat4) -> Self::Output {
        let mut result_cols = [Vec4::ZERO; 4];
        for (c_idx, target_col) in result_cols.iter_mut().enumerate() {
            let col_from_rhs = rhs.cols[c_idx];
            *target_col = Vec4 {
                x: self.get_row(0).dot(col_from_rhs),
                y: self.get_row(1).dot(col_from_rhs),
                z: self.get_row(2).dot(col_from_rhs),
                w: self.get_row(3).dot(col_from_rhs),
            };
        }
        Mat4 { cols: result_cols }
    }
}

impl Mul<Vec4> for Mat4 {
    type Output = Vec4;
    /// Transforms a `Vec4` by this matrix.
    #[inline]
    fn mul(self, rhs: Vec4) -> Self::Output {
        self.cols[0] * rhs.x + self.cols[1] * rhs.y + self.cols[2] * rhs.z + self.cols[3] * rhs.w
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{approx_eq, FRAC_PI_2};

    #[test]
    fn identity_is_the_multiplicative_neutral() {
        let m = Mat4::from_cols(
            Vec4::new(1.0, 2.0, 3.0, 4.0),
            Vec4::new(5.0, 6.0, 7.0, 8.0),
            Vec4::new(9.0, 10.0, 11.0, 12.0),
            Vec4::new(13.0, 14.0, 15.0, 16.0),
        );
        assert_eq!(Mat4::IDENTITY * m, m);
        assert_eq!(m * Mat4::IDENTITY, m);
        let v = Vec4::new(1.0, -2.0, 3.0, 1.0);
        assert_eq!(Mat4::IDENTITY * v, v);
    }

    #[test]
    fn perspective_maps_the_depth_range_to_zero_one() {
        let m = Mat4::perspective_rh_zo(FRAC_PI_2, 1.0, 0.1, 100.0);

        let near_clip = m * Vec4::new(0.0, 0.0, -0.1, 1.0);
        assert!(approx_eq(near_clip.z / near_clip.w, 0.0));

        let far_clip = m * Vec4::new(0.0, 0.0, -100.0, 1.0);
        assert!(approx_eq(far_clip.z / far_clip.w, 1.0));
    }

    #[test]
    fn look_at_moves_the_eye_to_the_origin() {
        let eye = Vec3::new(0.0, 0.0, 5.0);
        let view = Mat4::look_at_rh(eye, Vec3::ZERO, Vec3::Y).unwrap();

        let eye_in_view = view * Vec4::from_vec3(eye, 1.0);
        assert!(approx_eq(eye_in_view.x, 0.0));
        assert!(approx_eq(eye_in_view.y, 0.0));
        assert!(approx_eq(eye_in_view.z, 0.0));

        // The target sits straight down the view direction (negative Z).
        let target_in_view = view * Vec4::new(0.0, 0.0, 0.0, 1.0);
        assert!(approx_eq(target_in_view.z, -5.0));
    }

    #[test]
    fn look_at_rejects_degenerate_frames() {
        let eye = Vec3::new(1.0, 2.0, 3.0);
        assert!(Mat4::look_at_rh(eye, eye, Vec3::Y).is_none());
        // Up parallel to the view direction leaves no usable right vector.
        assert!(Mat4::look_at_rh(Vec3::ZERO, Vec3::Y, Vec3::Y).is_none());
    }

    #[test]
    fn cols_array_preserves_column_major_order() {
        let m = Mat4::from_cols(
            Vec4::new(1.0, 2.0, 3.0, 4.0),
            Vec4::new(5.0, 6.0, 7.0, 8.0),
            Vec4::new(9.0, 10.0, 11.0, 12.0),
            Vec4::new(13.0, 14.0, 15.0, 16.0),
        );
        let cols = m.to_cols_array_2d();
        assert_eq!(cols[0], [1.0, 2.0, 3.0, 4.0]);
        assert_eq!(cols[3][2], 15.0);
    }
}
