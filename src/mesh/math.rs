//! Mesh math utilities

use crate::{Mesh, Triangle, Vector3Ext};
use nalgebra::Vector3;

impl Triangle {
    /// Unnormalized cross product `(v1 - v0) x (v2 - v0)`
    pub fn cross(&self) -> Vector3<f32> {
        let [a, b, c] = self.vertices;
        (b - a).cross(&(c - a))
    }

    /// Unit normal following the right-hand rule over 0 -> 1 -> 2
    ///
    /// Zero for a degenerate triangle.
    pub fn geometric_normal(&self) -> Vector3<f32> {
        self.cross().normalized()
    }

    /// Area of the triangle
    pub fn area(&self) -> f32 {
        0.5 * self.cross().norm()
    }

    /// Check the stored normal against the geometric one
    ///
    /// Both direction and unit length must match within `tolerance` per
    /// component. A degenerate triangle never matches.
    pub fn normal_matches(&self, tolerance: f32) -> bool {
        let computed = self.geometric_normal();
        if computed == Vector3::zeros() {
            return false;
        }
        self.normal.almost_equal(&computed, tolerance)
    }
}

impl Mesh {
    /// True if no vertex has a negative coordinate
    pub fn is_in_positive(&self) -> bool {
        self.vertices().all(|v| v.is_non_negative())
    }

    /// Compute total surface area of the mesh
    pub fn surface_area(&self) -> f32 {
        self.triangles().iter().map(Triangle::area).sum()
    }

    /// Signed volume of a closed, consistently oriented mesh.
    ///
    /// Positive when the triangles wind outward. If the mesh is not closed
    /// the result is meaningless.
    pub fn signed_volume(&self) -> f32 {
        let v6_sum: f32 = self
            .triangles()
            .iter()
            .map(|t| {
                let [a, b, c] = t.vertices;
                a.dot(&b.cross(&c))
            })
            .sum();
        v6_sum / 6.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BBox3;

    #[test]
    fn test_triangle_area() {
        let tri = Triangle::from_vertices(Vector3::zeros(), Vector3::x(), Vector3::y());
        assert!((tri.area() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_degenerate_triangle() {
        let p = Vector3::new(1.0, 1.0, 1.0);
        let tri = Triangle::new([p, p, Vector3::zeros()], Vector3::z());
        assert_eq!(tri.geometric_normal(), Vector3::zeros());
        assert!(!tri.normal_matches(1.0));

        // collinear but distinct
        let tri = Triangle::new(
            [Vector3::zeros(), Vector3::x(), Vector3::x() * 2.0],
            Vector3::zeros(),
        );
        assert!(!tri.normal_matches(1.0));
    }

    #[test]
    fn test_normal_matches_checks_magnitude() {
        let mut tri = Triangle::from_vertices(Vector3::zeros(), Vector3::x(), Vector3::y());
        assert!(tri.normal_matches(0.0));

        tri.normal = Vector3::new(0.0, 0.0, 2.0);
        assert!(!tri.normal_matches(1e-3));

        tri.normal = Vector3::new(0.0, 0.0, -1.0);
        assert!(!tri.normal_matches(1e-3));

        tri.normal = Vector3::new(0.0002, 0.0, 0.9999);
        assert!(tri.normal_matches(1e-3));
    }

    #[test]
    fn test_volume_and_area_on_cube() {
        let bbox = BBox3::new(Vector3::zeros(), Vector3::new(2.0, 2.0, 2.0));
        let mesh = Mesh::from_bbox(&bbox);
        assert!((mesh.signed_volume() - 8.0).abs() < 1e-4);
        assert!((mesh.surface_area() - 24.0).abs() < 1e-4);
        assert!(mesh.is_in_positive());
    }
}
