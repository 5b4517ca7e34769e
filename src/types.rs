//! Basic types for stlkit

use crate::{Error, Result};
use nalgebra::Vector3;
use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Row-major 4x4 homogeneous matrix
///
/// Entries are `f64` so that composed transforms do not accumulate single
/// precision error before being applied to `f32` vertices.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(from = "[[f64; 4]; 4]", into = "[[f64; 4]; 4]")
)]
pub struct Matrix4x4 {
    pub m11: f64,
    pub m12: f64,
    pub m13: f64,
    pub m14: f64,
    pub m21: f64,
    pub m22: f64,
    pub m23: f64,
    pub m24: f64,
    pub m31: f64,
    pub m32: f64,
    pub m33: f64,
    pub m34: f64,
    pub m41: f64,
    pub m42: f64,
    pub m43: f64,
    pub m44: f64,
}

impl Matrix4x4 {
    pub fn identity() -> Self {
        Self::from_rows([
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    pub fn from_rows(r: [[f64; 4]; 4]) -> Self {
        Self {
            m11: r[0][0],
            m12: r[0][1],
            m13: r[0][2],
            m14: r[0][3],
            m21: r[1][0],
            m22: r[1][1],
            m23: r[1][2],
            m24: r[1][3],
            m31: r[2][0],
            m32: r[2][1],
            m33: r[2][2],
            m34: r[2][3],
            m41: r[3][0],
            m42: r[3][1],
            m43: r[3][2],
            m44: r[3][3],
        }
    }

    pub fn rows(&self) -> [[f64; 4]; 4] {
        [
            [self.m11, self.m12, self.m13, self.m14],
            [self.m21, self.m22, self.m23, self.m24],
            [self.m31, self.m32, self.m33, self.m34],
            [self.m41, self.m42, self.m43, self.m44],
        ]
    }

    /// Uniform scaling about the origin
    pub fn scaling(factor: f64) -> Self {
        Self::from_rows([
            [factor, 0.0, 0.0, 0.0],
            [0.0, factor, 0.0, 0.0],
            [0.0, 0.0, factor, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    pub fn translation(offset: Vector3<f32>) -> Self {
        Self::from_rows([
            [1.0, 0.0, 0.0, offset.x as f64],
            [0.0, 1.0, 0.0, offset.y as f64],
            [0.0, 0.0, 1.0, offset.z as f64],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    /// Rotation by `angle_radians` around the axis through `point` with direction `axis`
    ///
    /// The angle follows the right-hand rule around the normalized axis. The
    /// result moves `point` to the origin, rotates, and moves it back.
    ///
    /// # Example
    ///
    /// ```rust
    /// use stlkit::Matrix4x4;
    /// use nalgebra::Vector3;
    ///
    /// let m = Matrix4x4::rotation(
    ///     Vector3::new(1.0, 0.0, 0.0),
    ///     Vector3::new(0.0, 0.0, 1.0),
    ///     std::f64::consts::FRAC_PI_2,
    /// )?;
    /// let p = m.transform_point(Vector3::new(2.0, 0.0, 0.0));
    /// assert!((p - Vector3::new(1.0, 1.0, 0.0)).norm() < 1e-6);
    /// # Ok::<(), stlkit::Error>(())
    /// ```
    pub fn rotation(point: Vector3<f32>, axis: Vector3<f32>, angle_radians: f64) -> Result<Self> {
        let axis = axis.cast::<f64>();
        let norm = axis.norm();
        if norm == 0.0 || !norm.is_finite() {
            return Err(Error::AxisNotSpecified);
        }
        let u = axis / norm;
        let (s, c) = angle_radians.sin_cos();
        let t = 1.0 - c;

        let rotate = Self::from_rows([
            [
                c + u.x * u.x * t,
                u.x * u.y * t - u.z * s,
                u.x * u.z * t + u.y * s,
                0.0,
            ],
            [
                u.y * u.x * t + u.z * s,
                c + u.y * u.y * t,
                u.y * u.z * t - u.x * s,
                0.0,
            ],
            [
                u.z * u.x * t - u.y * s,
                u.z * u.y * t + u.x * s,
                c + u.z * u.z * t,
                0.0,
            ],
            [0.0, 0.0, 0.0, 1.0],
        ]);

        let to_origin = Self::translation(-point);
        let back = Self::translation(point);
        Ok(back.multiply(&rotate).multiply(&to_origin))
    }

    pub fn multiply(&self, other: &Matrix4x4) -> Matrix4x4 {
        let a = self.rows();
        let b = other.rows();

        let mut c = [[0.0f64; 4]; 4];
        for i in 0..4 {
            for j in 0..4 {
                c[i][j] =
                    a[i][0] * b[0][j] + a[i][1] * b[1][j] + a[i][2] * b[2][j] + a[i][3] * b[3][j];
            }
        }

        Matrix4x4::from_rows(c)
    }

    /// Apply the full homogeneous transform to a point
    pub fn transform_point(&self, p: Vector3<f32>) -> Vector3<f32> {
        let (x, y, z) = (p.x as f64, p.y as f64, p.z as f64);
        let mut out = [
            self.m11 * x + self.m12 * y + self.m13 * z + self.m14,
            self.m21 * x + self.m22 * y + self.m23 * z + self.m24,
            self.m31 * x + self.m32 * y + self.m33 * z + self.m34,
        ];
        let w = self.m41 * x + self.m42 * y + self.m43 * z + self.m44;
        if w != 1.0 && w.abs() > f64::EPSILON {
            for v in &mut out {
                *v /= w;
            }
        }
        Vector3::new(out[0] as f32, out[1] as f32, out[2] as f32)
    }

    /// Apply only the upper-left 3x3 part, for directions such as normals
    pub fn transform_direction(&self, d: Vector3<f32>) -> Vector3<f32> {
        let (x, y, z) = (d.x as f64, d.y as f64, d.z as f64);
        Vector3::new(
            (self.m11 * x + self.m12 * y + self.m13 * z) as f32,
            (self.m21 * x + self.m22 * y + self.m23 * z) as f32,
            (self.m31 * x + self.m32 * y + self.m33 * z) as f32,
        )
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::identity()
    }
}

impl Default for Matrix4x4 {
    fn default() -> Self {
        Self::identity()
    }
}

impl From<[[f64; 4]; 4]> for Matrix4x4 {
    fn from(value: [[f64; 4]; 4]) -> Self {
        Self::from_rows(value)
    }
}

impl From<Matrix4x4> for [[f64; 4]; 4] {
    fn from(value: Matrix4x4) -> Self {
        value.rows()
    }
}

impl From<nalgebra::Matrix4<f64>> for Matrix4x4 {
    fn from(value: nalgebra::Matrix4<f64>) -> Self {
        let mut rows = [[0.0f64; 4]; 4];
        for (i, row) in rows.iter_mut().enumerate() {
            for (j, v) in row.iter_mut().enumerate() {
                *v = value[(i, j)];
            }
        }
        Self::from_rows(rows)
    }
}

impl From<Matrix4x4> for nalgebra::Matrix4<f64> {
    fn from(value: Matrix4x4) -> Self {
        nalgebra::Matrix4::new(
            value.m11, value.m12, value.m13, value.m14, value.m21, value.m22, value.m23, value.m24,
            value.m31, value.m32, value.m33, value.m34, value.m41, value.m42, value.m43, value.m44,
        )
    }
}

/// Text form `[[m11 m12 m13 m14] [m21 ...] [m31 ...] [m41 ... m44]]`
impl fmt::Display for Matrix4x4 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, row) in self.rows().iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "[{} {} {} {}]", row[0], row[1], row[2], row[3])?;
        }
        write!(f, "]")
    }
}

impl FromStr for Matrix4x4 {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let inner = s
            .trim()
            .strip_prefix('[')
            .and_then(|s| s.strip_suffix(']'))
            .ok_or_else(|| Error::MatrixParse(format!("expected [[..] [..] [..] [..]], got '{}'", s)))?;

        let mut rows = [[0.0f64; 4]; 4];
        let mut count = 0;
        let mut rest = inner.trim_start();
        while !rest.is_empty() {
            let open = rest
                .strip_prefix('[')
                .ok_or_else(|| Error::MatrixParse(format!("expected '[' at '{}'", rest)))?;
            let close = open
                .find(']')
                .ok_or_else(|| Error::MatrixParse("unterminated row".to_string()))?;
            if count == 4 {
                return Err(Error::MatrixParse("more than 4 rows".to_string()));
            }

            let values = open[..close]
                .split(|c: char| c.is_whitespace() || c == ',')
                .filter(|t| !t.is_empty())
                .map(|t| {
                    t.parse::<f64>()
                        .map_err(|e| Error::MatrixParse(format!("'{}': {}", t, e)))
                })
                .collect::<Result<Vec<f64>>>()?;
            if values.len() != 4 {
                return Err(Error::MatrixParse(format!(
                    "row {} has {} values, expected 4",
                    count + 1,
                    values.len()
                )));
            }
            rows[count].copy_from_slice(&values);
            count += 1;
            rest = open[close + 1..].trim_start();
        }

        if count != 4 {
            return Err(Error::MatrixParse(format!(
                "found {} rows, expected 4",
                count
            )));
        }
        Ok(Self::from_rows(rows))
    }
}

/// 3D Bounding Box
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BBox3 {
    pub min: Vector3<f32>,
    pub max: Vector3<f32>,
}

impl BBox3 {
    /// Create a new bounding box
    pub fn new(min: Vector3<f32>, max: Vector3<f32>) -> Self {
        debug_assert!(min.x <= max.x);
        debug_assert!(min.y <= max.y);
        debug_assert!(min.z <= max.z);
        Self { min, max }
    }

    /// Create an empty bounding box
    pub fn empty() -> Self {
        Self {
            min: Vector3::new(f32::MAX, f32::MAX, f32::MAX),
            max: Vector3::new(f32::MIN, f32::MIN, f32::MIN),
        }
    }

    /// Get the size of the bounding box
    pub fn size(&self) -> Vector3<f32> {
        if self.is_empty() {
            return Vector3::zeros();
        }
        self.max - self.min
    }

    /// Get the center of the bounding box
    pub fn center(&self) -> Vector3<f32> {
        (self.min + self.max) * 0.5
    }

    /// Check if the bounding box is empty
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Check if a point is inside the bounding box
    pub fn contains(&self, point: Vector3<f32>) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
            && point.z >= self.min.z
            && point.z <= self.max.z
    }

    /// Expand the bounding box to include a point
    pub fn include_point(&mut self, point: Vector3<f32>) {
        self.min = self.min.inf(&point);
        self.max = self.max.sup(&point);
    }
}

impl fmt::Display for BBox3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<Min: <{:.2}, {:.2}, {:.2}> | Max: <{:.2}, {:.2}, {:.2}>>",
            self.min.x, self.min.y, self.min.z, self.max.x, self.max.y, self.max.z
        )
    }
}

/// Per-axis minimum, maximum and length of a mesh
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Measurement {
    pub min: Vector3<f32>,
    pub max: Vector3<f32>,
    pub len: Vector3<f32>,
}

impl From<BBox3> for Measurement {
    fn from(bbox: BBox3) -> Self {
        if bbox.is_empty() {
            return Self {
                min: Vector3::zeros(),
                max: Vector3::zeros(),
                len: Vector3::zeros(),
            };
        }
        Self {
            min: bbox.min,
            max: bbox.max,
            len: bbox.max - bbox.min,
        }
    }
}

/// STL triangle: three ordered vertices and the normal stored with them
///
/// The stored normal is data read from the file. It is not kept in sync with
/// the vertices; see [`crate::Mesh::recalculate_normals`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Triangle {
    pub normal: Vector3<f32>,
    pub vertices: [Vector3<f32>; 3],
}

impl Triangle {
    /// Create a triangle with an explicit stored normal
    pub fn new(vertices: [Vector3<f32>; 3], normal: Vector3<f32>) -> Self {
        Self { normal, vertices }
    }

    /// Create a triangle whose stored normal is its geometric normal
    pub fn from_vertices(a: Vector3<f32>, b: Vector3<f32>, c: Vector3<f32>) -> Self {
        let mut tri = Self::new([a, b, c], Vector3::zeros());
        tri.normal = tri.geometric_normal();
        tri
    }

    /// Directed edge `slot` running from vertex `slot` to vertex `(slot + 1) % 3`
    pub fn edge(&self, slot: usize) -> (Vector3<f32>, Vector3<f32>) {
        (self.vertices[slot % 3], self.vertices[(slot + 1) % 3])
    }
}

impl fmt::Display for Triangle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c] = self.vertices;
        write!(
            f,
            "Triangle([{} {} {}] [{} {} {}] [{} {} {}])",
            a.x, a.y, a.z, b.x, b.y, b.z, c.x, c.y, c.z
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_near(a: Vector3<f32>, b: Vector3<f32>) {
        assert!((a - b).norm() < 1e-5, "{:?} != {:?}", a, b);
    }

    #[test]
    fn test_bbox_creation() {
        let bbox = BBox3::new(Vector3::zeros(), Vector3::new(10.0, 10.0, 10.0));
        assert_eq!(bbox.size(), Vector3::new(10.0, 10.0, 10.0));
        assert_eq!(bbox.center(), Vector3::new(5.0, 5.0, 5.0));
        assert!(bbox.contains(Vector3::new(5.0, 5.0, 5.0)));
        assert!(!bbox.contains(Vector3::new(15.0, 5.0, 5.0)));
    }

    #[test]
    fn test_empty_bbox_measures_zero() {
        let m = Measurement::from(BBox3::empty());
        assert_eq!(m.min, Vector3::zeros());
        assert_eq!(m.max, Vector3::zeros());
        assert_eq!(m.len, Vector3::zeros());
    }

    #[test]
    fn test_matrix_multiply_identity() {
        let t = Matrix4x4::translation(Vector3::new(1.0, 2.0, 3.0));
        assert_eq!(t.multiply(&Matrix4x4::identity()), t);
        assert_eq!(Matrix4x4::identity().multiply(&t), t);
        assert!(Matrix4x4::default().is_identity());
    }

    #[test]
    fn test_matrix_nalgebra_conversion() {
        let m = Matrix4x4::from_rows([
            [1.0, 2.0, 3.0, 4.0],
            [5.0, 6.0, 7.0, 8.0],
            [9.0, 10.0, 11.0, 12.0],
            [13.0, 14.0, 15.0, 16.0],
        ]);
        let na: nalgebra::Matrix4<f64> = m.into();
        assert_eq!(na[(0, 3)], 4.0);
        assert_eq!(na[(3, 0)], 13.0);
        assert_eq!(Matrix4x4::from(na), m);
    }

    #[test]
    fn test_rotation_right_hand_rule() {
        let m = Matrix4x4::rotation(
            Vector3::zeros(),
            Vector3::new(0.0, 0.0, 2.0),
            std::f64::consts::FRAC_PI_2,
        )
        .unwrap();
        assert_near(m.transform_point(Vector3::x()), Vector3::y());
        assert_near(m.transform_direction(Vector3::y()), -Vector3::x());
    }

    #[test]
    fn test_rotation_about_offset_axis_keeps_axis_point_fixed() {
        let point = Vector3::new(3.0, -2.0, 1.0);
        let m = Matrix4x4::rotation(point, Vector3::new(1.0, 1.0, 0.0), 1.234).unwrap();
        assert_near(m.transform_point(point), point);
        assert_near(
            m.transform_point(point + Vector3::new(2.0, 2.0, 0.0)),
            point + Vector3::new(2.0, 2.0, 0.0),
        );
    }

    #[test]
    fn test_rotation_rejects_zero_axis() {
        let err = Matrix4x4::rotation(Vector3::zeros(), Vector3::zeros(), 1.0).unwrap_err();
        assert!(matches!(err, Error::AxisNotSpecified));

        let err = Matrix4x4::rotation(Vector3::zeros(), Vector3::new(f32::NAN, 0.0, 1.0), 1.0)
            .unwrap_err();
        assert!(matches!(err, Error::AxisNotSpecified));
    }

    #[test]
    fn test_rotation_accepts_tiny_axis() {
        let tiny = Matrix4x4::rotation(
            Vector3::zeros(),
            Vector3::new(0.0, 0.0, 1e-20),
            std::f64::consts::FRAC_PI_2,
        )
        .unwrap();
        let unit = Matrix4x4::rotation(Vector3::zeros(), Vector3::z(), std::f64::consts::FRAC_PI_2)
            .unwrap();
        assert_eq!(tiny, unit);
        assert_near(tiny.transform_point(Vector3::x()), Vector3::y());
    }

    #[test]
    fn test_matrix_text_roundtrip() {
        let m = Matrix4x4::rotation(Vector3::new(1.0, 2.0, 3.0), Vector3::new(0.3, 0.5, 0.1), 0.7)
            .unwrap();
        let text = m.to_string();
        let parsed: Matrix4x4 = text.parse().unwrap();
        assert_eq!(parsed, m);

        assert_eq!(
            Matrix4x4::identity().to_string(),
            "[[1 0 0 0] [0 1 0 0] [0 0 1 0] [0 0 0 1]]"
        );
    }

    #[test]
    fn test_matrix_parse_errors() {
        assert!("[[1 0 0 0] [0 1 0 0] [0 0 1 0]]"
            .parse::<Matrix4x4>()
            .is_err());
        assert!("[[1 0 0] [0 1 0 0] [0 0 1 0] [0 0 0 1]]"
            .parse::<Matrix4x4>()
            .is_err());
        assert!("[[1 0 0 x] [0 1 0 0] [0 0 1 0] [0 0 0 1]]"
            .parse::<Matrix4x4>()
            .is_err());
        assert!("1 0 0 0".parse::<Matrix4x4>().is_err());

        let m: Matrix4x4 = " [[2 0 0 1]  [0 2 0 0] [0 0 2 0] [0 0 0 1]] ".parse().unwrap();
        assert_eq!(m.m11, 2.0);
        assert_eq!(m.m14, 1.0);
    }

    #[test]
    fn test_triangle_edges() {
        let tri = Triangle::from_vertices(Vector3::zeros(), Vector3::x(), Vector3::y());
        assert_eq!(tri.edge(0), (Vector3::zeros(), Vector3::x()));
        assert_eq!(tri.edge(2), (Vector3::y(), Vector3::zeros()));
        assert_eq!(tri.normal, Vector3::z());
    }
}
