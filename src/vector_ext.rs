//! Vector3 extensions

use crate::Matrix4x4;
use nalgebra::Vector3;

/// Extension methods for Vector3
pub trait Vector3Ext {
    /// Return the normalized vector (zero if too small)
    fn normalized(self) -> Vector3<f32>;

    /// Component-wise comparison within `tolerance`
    fn almost_equal(&self, other: &Vector3<f32>, tolerance: f32) -> bool;

    /// True if no component is negative
    fn is_non_negative(&self) -> bool;

    /// Apply a transformation matrix to the vector as a point
    fn transformed(self, matrix: &Matrix4x4) -> Vector3<f32>;

    /// Apply only the linear part of a transformation matrix (no translation)
    fn transformed_direction(self, matrix: &Matrix4x4) -> Vector3<f32>;
}

impl Vector3Ext for Vector3<f32> {
    fn normalized(self) -> Vector3<f32> {
        let norm = self.norm();
        if norm <= f32::EPSILON {
            Vector3::zeros()
        } else {
            self / norm
        }
    }

    fn almost_equal(&self, other: &Vector3<f32>, tolerance: f32) -> bool {
        (self - other).iter().all(|d| d.abs() <= tolerance)
    }

    fn is_non_negative(&self) -> bool {
        self.x >= 0.0 && self.y >= 0.0 && self.z >= 0.0
    }

    fn transformed(self, matrix: &Matrix4x4) -> Vector3<f32> {
        matrix.transform_point(self)
    }

    fn transformed_direction(self, matrix: &Matrix4x4) -> Vector3<f32> {
        matrix.transform_direction(self)
    }
}
