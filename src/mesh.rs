//! Triangle mesh representation

use crate::{BBox3, Triangle};
use nalgebra::Vector3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

mod edges; // Edge adjacency index
mod math; // Mesh math helpers
mod transform; // Transformation operations
mod validate; // Defect detection

pub use edges::{EdgeIndex, EdgeOccurrence, VertexWelder};
pub use transform::AxisPolicy;
pub use validate::{DefectKind, EdgeError, TriangleErrors, ValidationOptions, ValidationReport};

/// Triangle mesh
///
/// An ordered list of STL triangles. Every vertex is stored with its
/// triangle, so shared corners are repeated; connectivity is recovered on
/// demand by [`EdgeIndex`].
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Mesh {
    /// Solid name, carried through for the file codec
    pub name: String,
    triangles: Vec<Triangle>,
}

impl Mesh {
    /// Create an empty mesh
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mesh from an ordered list of triangles
    pub fn from_triangles(triangles: Vec<Triangle>) -> Self {
        Self {
            name: String::new(),
            triangles,
        }
    }

    /// Set the solid name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Create a closed, outward wound box mesh from a bounding box
    ///
    /// The 12 triangles carry their geometric normals.
    pub fn from_bbox(bbox: &BBox3) -> Self {
        let (lo, hi) = (bbox.min, bbox.max);
        let vertices = [
            Vector3::new(lo.x, lo.y, lo.z),
            Vector3::new(lo.x, lo.y, hi.z),
            Vector3::new(lo.x, hi.y, lo.z),
            Vector3::new(lo.x, hi.y, hi.z),
            Vector3::new(hi.x, lo.y, lo.z),
            Vector3::new(hi.x, lo.y, hi.z),
            Vector3::new(hi.x, hi.y, lo.z),
            Vector3::new(hi.x, hi.y, hi.z),
        ];

        let faces: [[usize; 3]; 12] = [
            // -X
            [0, 1, 3],
            [0, 3, 2],
            // +X
            [4, 6, 7],
            [4, 7, 5],
            // -Z
            [0, 2, 6],
            [0, 6, 4],
            // +Z
            [1, 5, 7],
            [1, 7, 3],
            // +Y
            [2, 3, 7],
            [2, 7, 6],
            // -Y
            [0, 4, 5],
            [0, 5, 1],
        ];

        let triangles = faces
            .iter()
            .map(|&[a, b, c]| Triangle::from_vertices(vertices[a], vertices[b], vertices[c]))
            .collect();
        Self::from_triangles(triangles)
    }

    /// Append a triangle, returning its index
    pub fn add_triangle(&mut self, tri: Triangle) -> usize {
        self.triangles.push(tri);
        self.triangles.len() - 1
    }

    /// Add a triangle by vertex positions with its geometric normal
    pub fn add_triangle_vertices(
        &mut self,
        a: Vector3<f32>,
        b: Vector3<f32>,
        c: Vector3<f32>,
    ) -> usize {
        self.add_triangle(Triangle::from_vertices(a, b, c))
    }

    /// Remove and return the triangle at `index`, shifting later triangles down
    pub fn remove_triangle(&mut self, index: usize) -> Option<Triangle> {
        if index < self.triangles.len() {
            Some(self.triangles.remove(index))
        } else {
            None
        }
    }

    /// Get triangle count
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// True if the mesh has no triangles
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Get a triangle by index
    pub fn triangle(&self, index: usize) -> Option<&Triangle> {
        self.triangles.get(index)
    }

    /// Get a mutable triangle by index
    pub fn triangle_mut(&mut self, index: usize) -> Option<&mut Triangle> {
        self.triangles.get_mut(index)
    }

    /// All triangles in file order
    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    /// Mutable access to all triangles; the count cannot change through it
    pub fn triangles_mut(&mut self) -> &mut [Triangle] {
        &mut self.triangles
    }

    /// Iterate over every stored vertex, three per triangle, in mesh order
    pub fn vertices(&self) -> impl Iterator<Item = &Vector3<f32>> + '_ {
        self.triangles.iter().flat_map(|t| t.vertices.iter())
    }

    /// Get the axis-aligned bounding box of all vertices
    ///
    /// Returns [`BBox3::empty`] for a mesh without triangles.
    pub fn bounding_box(&self) -> BBox3 {
        let mut bbox = BBox3::empty();
        for v in self.vertices() {
            bbox.include_point(*v);
        }
        bbox
    }

    /// Consume the mesh, returning its triangles
    pub fn into_triangles(self) -> Vec<Triangle> {
        self.triangles
    }
}

impl From<Vec<Triangle>> for Mesh {
    fn from(triangles: Vec<Triangle>) -> Self {
        Self::from_triangles(triangles)
    }
}
