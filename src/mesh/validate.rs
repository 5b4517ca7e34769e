//! Mesh validation.
//!
//! Reports, per triangle, the problems that make an STL file unsuitable for
//! printing: collapsed triangles, stored normals that disagree with the
//! winding, duplicated edges, holes and non-manifold seams.

use std::collections::BTreeMap;

use crate::mesh::EdgeIndex;
use crate::Mesh;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Options for mesh validation.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ValidationOptions {
    /// Per-axis distance below which two vertices are the same vertex.
    /// Zero means exact equality.
    pub vertex_tolerance: f32,
    /// Per-component tolerance between stored and computed unit normals.
    pub normal_tolerance: f32,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            vertex_tolerance: 0.0,
            normal_tolerance: 1e-3,
        }
    }
}

impl ValidationOptions {
    /// Exact comparison of both vertices and normals
    pub fn exact() -> Self {
        Self {
            vertex_tolerance: 0.0,
            normal_tolerance: 0.0,
        }
    }

    pub fn with_vertex_tolerance(mut self, tolerance: f32) -> Self {
        self.vertex_tolerance = tolerance;
        self
    }

    pub fn with_normal_tolerance(mut self, tolerance: f32) -> Self {
        self.normal_tolerance = tolerance;
        self
    }
}

/// Kind of defect, for counting and filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DefectKind {
    /// Two or more vertices of a triangle coincide
    EqualVertices,
    /// Stored normal differs from the geometric one
    NormalMismatch,
    /// A directed edge also appears in another triangle
    DuplicateEdge,
    /// No triangle uses the edge in the opposite direction
    Hole,
    /// More than one triangle uses the edge in the opposite direction
    NonManifold,
}

/// Problems found on one edge of a triangle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EdgeError {
    /// Other triangles with the same edge in the same direction
    pub same_edge_triangles: Vec<usize>,
    /// Triangles with the edge in the opposite direction
    pub counter_edge_triangles: Vec<usize>,
}

impl EdgeError {
    pub fn is_used_in_other_triangles(&self) -> bool {
        !self.same_edge_triangles.is_empty()
    }

    pub fn has_no_counter_edge(&self) -> bool {
        self.counter_edge_triangles.is_empty()
    }

    pub fn has_multiple_counter_edges(&self) -> bool {
        self.counter_edge_triangles.len() > 1
    }

    pub fn has_errors(&self) -> bool {
        self.is_used_in_other_triangles() || self.counter_edge_triangles.len() != 1
    }

    /// Defect kinds present on this edge
    pub fn kinds(&self) -> impl Iterator<Item = DefectKind> {
        [
            (self.is_used_in_other_triangles(), DefectKind::DuplicateEdge),
            (self.has_no_counter_edge(), DefectKind::Hole),
            (self.has_multiple_counter_edges(), DefectKind::NonManifold),
        ]
        .into_iter()
        .filter_map(|(present, kind)| present.then_some(kind))
    }
}

/// Problems found on one triangle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TriangleErrors {
    pub has_equal_vertices: bool,
    pub normal_mismatch: bool,
    /// Indexed by edge slot; `None` means the edge is fine
    pub edge_errors: [Option<EdgeError>; 3],
}

impl TriangleErrors {
    pub fn has_errors(&self) -> bool {
        self.has_equal_vertices
            || self.normal_mismatch
            || self.edge_errors.iter().any(Option::is_some)
    }

    /// Defect kinds present on this triangle, edge defects once per edge
    pub fn kinds(&self) -> impl Iterator<Item = DefectKind> + '_ {
        let flags = [
            (self.has_equal_vertices, DefectKind::EqualVertices),
            (self.normal_mismatch, DefectKind::NormalMismatch),
        ]
        .into_iter()
        .filter_map(|(present, kind)| present.then_some(kind));
        let edges = self.edge_errors.iter().flatten().flat_map(EdgeError::kinds);
        flags.chain(edges)
    }
}

/// Result of [`Mesh::validate`]
///
/// Only triangles with at least one defect are present. Iteration is in
/// triangle order.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ValidationReport {
    triangles: BTreeMap<usize, TriangleErrors>,
    /// Number of triangles checked
    pub triangle_count: usize,
    /// Whether every vertex coordinate is non-negative
    pub in_positive: bool,
}

impl ValidationReport {
    /// Errors for one triangle, `None` if it has none
    pub fn get(&self, triangle: usize) -> Option<&TriangleErrors> {
        self.triangles.get(&triangle)
    }

    /// Defective triangles in ascending index order
    pub fn iter(&self) -> impl Iterator<Item = (usize, &TriangleErrors)> {
        self.triangles.iter().map(|(&i, e)| (i, e))
    }

    /// Number of triangles with at least one defect
    pub fn len(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// True if no triangle has a defect
    ///
    /// The non-negative coordinate check is informational and not included.
    pub fn is_clean(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Count occurrences of a defect kind; edge defects count once per edge
    pub fn count(&self, kind: DefectKind) -> usize {
        self.triangles
            .values()
            .flat_map(TriangleErrors::kinds)
            .filter(|k| *k == kind)
            .count()
    }

    pub fn into_map(self) -> BTreeMap<usize, TriangleErrors> {
        self.triangles
    }
}

impl Mesh {
    /// Validate with default options (exact vertex matching)
    ///
    /// # Example
    ///
    /// ```
    /// use stlkit::{BBox3, DefectKind, Mesh};
    /// use nalgebra::Vector3;
    ///
    /// let mut mesh = Mesh::from_bbox(&BBox3::new(Vector3::zeros(), Vector3::new(1.0, 1.0, 1.0)));
    /// assert!(mesh.validate().is_clean());
    ///
    /// mesh.remove_triangle(0);
    /// assert_eq!(mesh.validate().count(DefectKind::Hole), 3);
    /// ```
    pub fn validate(&self) -> ValidationReport {
        self.validate_with(&ValidationOptions::default())
    }

    /// Validate every triangle against the edge index built from this mesh
    pub fn validate_with(&self, options: &ValidationOptions) -> ValidationReport {
        let index = EdgeIndex::build_with_tolerance(self, options.vertex_tolerance);
        let mut triangles = BTreeMap::new();

        for (i, tri) in self.triangles().iter().enumerate() {
            let mut errors = TriangleErrors::default();

            if let Some([a, b, c]) = index.vertex_ids(i) {
                errors.has_equal_vertices = a == b || b == c || c == a;
            }
            errors.normal_mismatch = !tri.normal_matches(options.normal_tolerance);

            for slot in 0..3 {
                let (same, counter) = index.classify(i, slot);
                let edge_error = EdgeError {
                    same_edge_triangles: same,
                    counter_edge_triangles: counter,
                };
                if edge_error.has_errors() {
                    errors.edge_errors[slot] = Some(edge_error);
                }
            }

            if errors.has_errors() {
                triangles.insert(i, errors);
            }
        }

        let report = ValidationReport {
            triangles,
            triangle_count: self.triangle_count(),
            in_positive: self.is_in_positive(),
        };
        log::debug!(
            "validated {} triangles: {} with errors",
            report.triangle_count,
            report.len()
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BBox3, Triangle};
    use nalgebra::Vector3;

    fn cube() -> Mesh {
        Mesh::from_bbox(&BBox3::new(Vector3::zeros(), Vector3::new(1.0, 1.0, 1.0)))
    }

    #[test]
    fn closed_cube_is_clean() {
        let report = cube().validate();
        assert!(report.is_clean());
        assert_eq!(report.triangle_count, 12);
        assert!(report.in_positive);
    }

    #[test]
    fn edge_error_kinds() {
        let hole = EdgeError::default();
        assert_eq!(hole.kinds().collect::<Vec<_>>(), vec![DefectKind::Hole]);

        let seam = EdgeError {
            same_edge_triangles: vec![4],
            counter_edge_triangles: vec![1, 2],
        };
        assert_eq!(
            seam.kinds().collect::<Vec<_>>(),
            vec![DefectKind::DuplicateEdge, DefectKind::NonManifold]
        );

        let fine = EdgeError {
            same_edge_triangles: vec![],
            counter_edge_triangles: vec![3],
        };
        assert!(!fine.has_errors());
    }

    #[test]
    fn flipped_normal_is_reported() {
        let mut mesh = cube();
        let tri = mesh.triangle_mut(5).unwrap();
        tri.normal = -tri.normal;

        let report = mesh.validate();
        assert_eq!(report.len(), 1);
        let errors = report.get(5).unwrap();
        assert!(errors.normal_mismatch);
        assert!(!errors.has_equal_vertices);
        assert!(errors.edge_errors.iter().all(Option::is_none));
    }

    #[test]
    fn collapsed_triangle() {
        let p = Vector3::new(1.0, 1.0, 1.0);
        let mesh = Mesh::from_triangles(vec![Triangle::new([p, p, Vector3::zeros()], Vector3::z())]);
        let report = mesh.validate();
        let errors = report.get(0).unwrap();
        assert!(errors.has_equal_vertices);
        assert!(errors.normal_mismatch);
        assert_eq!(report.count(DefectKind::EqualVertices), 1);
    }

    #[test]
    fn negative_coordinates_are_informational() {
        let mesh = Mesh::from_bbox(&BBox3::new(
            Vector3::new(-1.0, 0.0, 0.0),
            Vector3::new(1.0, 1.0, 1.0),
        ));
        let report = mesh.validate();
        assert!(!report.in_positive);
        assert!(report.is_clean());
    }

    #[test]
    fn empty_mesh() {
        let report = Mesh::new().validate();
        assert!(report.is_clean());
        assert_eq!(report.triangle_count, 0);
        assert!(report.in_positive);
    }
}
