//! # stlkit
//!
//! Analysis and transformation of triangle meshes as read from STL files.
//!
//! ## Features
//!
//! - **Validation**: collapsed triangles, wrong normals, duplicate edges,
//!   holes and non-manifold seams, reported per triangle
//! - **Transforms**: scale, translate, rotate about an arbitrary axis, apply a
//!   4x4 matrix, fit into a box
//! - **Edge index**: vertex welding and directed edge lookup
//!
//! ## Example
//!
//! ```rust
//! use stlkit::{BBox3, DefectKind, Mesh};
//! use nalgebra::Vector3;
//!
//! let mut mesh = Mesh::from_bbox(&BBox3::new(Vector3::zeros(), Vector3::new(10.0, 20.0, 5.0)));
//! assert!(mesh.validate().is_clean());
//!
//! let matrix = mesh.fit_box(Vector3::new(5.0, 5.0, 5.0))?;
//! assert_eq!(matrix.m11, 0.25);
//! assert_eq!(mesh.measure().len, Vector3::new(2.5, 5.0, 1.25));
//!
//! mesh.remove_triangle(0);
//! assert_eq!(mesh.validate().count(DefectKind::Hole), 3);
//! # Ok::<(), stlkit::Error>(())
//! ```

pub mod command;
pub mod error;
pub mod log_file;
pub mod mesh;
pub mod types;
pub mod vector_ext;

/// Convenience imports for common traits/extensions.
pub mod prelude {
    pub use crate::{Command, Mesh, Operation, Vector3Ext};
}

// Re-exports
pub use command::{Command, Operation, Outcome};
pub use error::{Error, Result};
pub use log_file::LogFile;
pub use mesh::{
    AxisPolicy, DefectKind, EdgeError, EdgeIndex, EdgeOccurrence, Mesh, TriangleErrors,
    ValidationOptions, ValidationReport, VertexWelder,
};
pub use types::{BBox3, Matrix4x4, Measurement, Triangle};
pub use vector_ext::Vector3Ext;

/// Crate version
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
