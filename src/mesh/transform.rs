//! Mesh transformation and manipulation operations
//!
//! All operations modify the mesh in place and preserve triangle order.
//! Those that apply a matrix return it, so callers can display or reuse it.
//! An operation that fails leaves the mesh untouched.

use crate::{Error, Matrix4x4, Measurement, Mesh, Result, Vector3Ext};
use nalgebra::Vector3;

/// Which rotation axes [`Mesh::rotate_with_policy`] accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AxisPolicy {
    /// Accept an axis only if at least one component is strictly positive.
    ///
    /// This is the historical behaviour of the `rotate` command and is kept
    /// so existing scripts behave the same. It rejects valid axes such as
    /// `(-1, 0, 0)`; use [`AxisPolicy::NonZero`] for those.
    #[default]
    RequirePositiveComponent,
    /// Accept any finite, non-zero axis
    NonZero,
}

impl AxisPolicy {
    pub fn accepts(&self, axis: Vector3<f32>) -> bool {
        match self {
            AxisPolicy::RequirePositiveComponent => axis.iter().any(|c| *c > 0.0),
            AxisPolicy::NonZero => {
                axis.iter().all(|c| c.is_finite()) && axis.iter().any(|c| *c != 0.0)
            }
        }
    }
}

impl Mesh {
    /// Scale every vertex by `factor` about the origin
    ///
    /// Normals are left as they are, even for a negative factor.
    ///
    /// # Example
    ///
    /// ```rust
    /// use stlkit::Mesh;
    /// use nalgebra::Vector3;
    ///
    /// let mut mesh = Mesh::new();
    /// mesh.add_triangle_vertices(Vector3::zeros(), Vector3::x(), Vector3::y());
    /// let matrix = mesh.scale(2.0)?;
    /// assert_eq!(matrix.m11, 2.0);
    /// assert_eq!(mesh.triangle(0).unwrap().vertices[1], Vector3::new(2.0, 0.0, 0.0));
    /// # Ok::<(), stlkit::Error>(())
    /// ```
    pub fn scale(&mut self, factor: f32) -> Result<Matrix4x4> {
        if !factor.is_finite() {
            return Err(Error::InvalidParameter(format!(
                "scale factor must be finite, got {}",
                factor
            )));
        }

        for tri in self.triangles_mut() {
            for v in &mut tri.vertices {
                *v *= factor;
            }
        }

        log::debug!("scaled {} triangles by {}", self.triangle_count(), factor);
        Ok(Matrix4x4::scaling(factor as f64))
    }

    /// Move every vertex by `offset`; normals are unchanged
    pub fn translate(&mut self, offset: Vector3<f32>) -> Result<Matrix4x4> {
        if !offset.iter().all(|c| c.is_finite()) {
            return Err(Error::InvalidParameter(format!(
                "translation must be finite, got {:?}",
                offset
            )));
        }

        for tri in self.triangles_mut() {
            for v in &mut tri.vertices {
                *v += offset;
            }
        }

        log::debug!("translated {} triangles by {:?}", self.triangle_count(), offset);
        Ok(Matrix4x4::translation(offset))
    }

    /// Rotate around the axis through `point` with direction `axis`
    ///
    /// Uses [`AxisPolicy::default`] to validate the axis.
    pub fn rotate(
        &mut self,
        point: Vector3<f32>,
        axis: Vector3<f32>,
        angle_radians: f64,
    ) -> Result<Matrix4x4> {
        self.rotate_with_policy(point, axis, angle_radians, AxisPolicy::default())
    }

    /// Rotate, validating the axis with `policy`
    ///
    /// Vertices get the full transform, normals only its rotation part.
    pub fn rotate_with_policy(
        &mut self,
        point: Vector3<f32>,
        axis: Vector3<f32>,
        angle_radians: f64,
        policy: AxisPolicy,
    ) -> Result<Matrix4x4> {
        if !policy.accepts(axis) {
            log::warn!("rotation axis {:?} rejected by {:?}", axis, policy);
            return Err(Error::AxisNotSpecified);
        }

        let matrix = Matrix4x4::rotation(point, axis, angle_radians)?;
        for tri in self.triangles_mut() {
            for v in &mut tri.vertices {
                *v = v.transformed(&matrix);
            }
            tri.normal = tri.normal.transformed_direction(&matrix);
        }

        log::debug!(
            "rotated {} triangles by {} rad around {:?} through {:?}",
            self.triangle_count(),
            angle_radians,
            axis,
            point
        );
        Ok(matrix)
    }

    /// Apply an arbitrary homogeneous matrix
    ///
    /// Vertices get the full transform. Normals get the linear part only and
    /// are re-normalized; a normal collapsed by a singular matrix becomes zero.
    ///
    /// # Errors
    ///
    /// [`Error::MatrixMissing`] if `matrix` is `None`.
    pub fn transform(&mut self, matrix: Option<&Matrix4x4>) -> Result<Matrix4x4> {
        let Some(matrix) = matrix else {
            log::warn!("transform requested without a matrix");
            return Err(Error::MatrixMissing);
        };

        for tri in self.triangles_mut() {
            for v in &mut tri.vertices {
                *v = v.transformed(matrix);
            }
            tri.normal = tri.normal.transformed_direction(matrix).normalized();
        }

        log::debug!("transformed {} triangles by {}", self.triangle_count(), matrix);
        Ok(*matrix)
    }

    /// Uniformly scale so the bounding box fits into `size`
    ///
    /// The factor is the smallest `size / extent` over the axes with a
    /// non-zero extent, so proportions are kept. A mesh without extent is left
    /// unchanged and the identity is returned.
    ///
    /// # Errors
    ///
    /// [`Error::BoxDimensionInvalid`] if any component of `size` is not > 0.
    pub fn fit_box(&mut self, size: Vector3<f32>) -> Result<Matrix4x4> {
        if !(size.x > 0.0 && size.y > 0.0 && size.z > 0.0) {
            log::warn!("size box {:?} rejected", size);
            return Err(Error::BoxDimensionInvalid(format!(
                "each dimension must be > 0, got [{} {} {}]",
                size.x, size.y, size.z
            )));
        }

        let extent = self.measure().len;
        let factor = (0..3)
            .filter(|&axis| extent[axis] > 0.0)
            .map(|axis| size[axis] / extent[axis])
            .reduce(f32::min);

        match factor {
            Some(factor) => self.scale(factor),
            None => Ok(Matrix4x4::identity()),
        }
    }

    /// Per-axis minimum, maximum and length over all vertices
    ///
    /// An empty mesh measures zero on every axis.
    pub fn measure(&self) -> Measurement {
        Measurement::from(self.bounding_box())
    }

    /// Replace every stored normal with the geometric normal
    ///
    /// Degenerate triangles get a zero normal.
    pub fn recalculate_normals(&mut self) {
        for tri in self.triangles_mut() {
            tri.normal = tri.geometric_normal();
        }
        log::debug!("recalculated {} normals", self.triangle_count());
    }
}
