//! Operation dispatch
//!
//! One [`Command`] runs exactly one [`Operation`] against a mesh. The mesh
//! methods do the work; this module only selects the method and collects
//! what it produced.

use crate::{
    AxisPolicy, BBox3, LogFile, Matrix4x4, Measurement, Mesh, Result, ValidationOptions,
    ValidationReport,
};
use nalgebra::Vector3;

/// A single mesh operation
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// Pass the mesh through unchanged
    Copy,
    Measure,
    Scale {
        factor: f32,
    },
    Translate {
        offset: Vector3<f32>,
    },
    Rotate {
        point: Vector3<f32>,
        axis: Vector3<f32>,
        angle_radians: f64,
        policy: AxisPolicy,
    },
    Transform {
        matrix: Option<Matrix4x4>,
    },
    FitBox {
        size: Vector3<f32>,
    },
    Validate(ValidationOptions),
    RecalculateNormals,
}

impl Operation {
    /// Rotation with the angle given in degrees and the default axis policy
    pub fn rotate_degrees(point: Vector3<f32>, axis: Vector3<f32>, degrees: f64) -> Self {
        Operation::Rotate {
            point,
            axis,
            angle_radians: degrees.to_radians(),
            policy: AxisPolicy::default(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Operation::Copy => "copy",
            Operation::Measure => "measure",
            Operation::Scale { .. } => "scale",
            Operation::Translate { .. } => "translate",
            Operation::Rotate { .. } => "rotate",
            Operation::Transform { .. } => "transform",
            Operation::FitBox { .. } => "fitbox",
            Operation::Validate(_) => "validate",
            Operation::RecalculateNormals => "fixnorm",
        }
    }

    /// Whether a successful run leaves a mesh that should be written back
    pub fn modifies_mesh(&self) -> bool {
        !matches!(self, Operation::Measure | Operation::Validate(_))
    }

    /// Run the operation on `mesh`
    ///
    /// On error the mesh is unchanged.
    pub fn apply(&self, mesh: &mut Mesh) -> Result<Outcome> {
        let mut outcome = Outcome {
            write_back: self.modifies_mesh(),
            ..Outcome::default()
        };

        match self {
            Operation::Copy => {}
            Operation::Measure => outcome.measurement = Some(mesh.measure()),
            Operation::Scale { factor } => outcome.matrix = mesh.scale(*factor)?,
            Operation::Translate { offset } => outcome.matrix = mesh.translate(*offset)?,
            Operation::Rotate {
                point,
                axis,
                angle_radians,
                policy,
            } => {
                outcome.matrix = mesh.rotate_with_policy(*point, *axis, *angle_radians, *policy)?
            }
            Operation::Transform { matrix } => outcome.matrix = mesh.transform(matrix.as_ref())?,
            Operation::FitBox { size } => outcome.matrix = mesh.fit_box(*size)?,
            Operation::Validate(options) => outcome.report = Some(mesh.validate_with(options)),
            Operation::RecalculateNormals => mesh.recalculate_normals(),
        }

        Ok(outcome)
    }
}

/// What an operation produced besides its changes to the mesh
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    /// Matrix applied to the vertices, identity if none
    pub matrix: Matrix4x4,
    pub measurement: Option<Measurement>,
    pub report: Option<ValidationReport>,
    /// Whether the mesh should be handed back for writing
    pub write_back: bool,
}

impl Default for Outcome {
    fn default() -> Self {
        Self {
            matrix: Matrix4x4::identity(),
            measurement: None,
            report: None,
            write_back: false,
        }
    }
}

/// One invocation: an operation plus an optional normal fix afterwards
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub operation: Operation,
    /// Recalculate normals after an operation that writes the mesh back
    pub fix_normals: bool,
}

impl Command {
    pub fn new(operation: Operation) -> Self {
        Self {
            operation,
            fix_normals: false,
        }
    }

    pub fn with_fix_normals(mut self, fix_normals: bool) -> Self {
        self.fix_normals = fix_normals;
        self
    }

    /// Run the operation, then fix normals if requested
    ///
    /// # Example
    ///
    /// ```rust
    /// use stlkit::{BBox3, Command, Mesh, Operation};
    /// use nalgebra::Vector3;
    ///
    /// let mut mesh = Mesh::from_bbox(&BBox3::new(Vector3::zeros(), Vector3::new(10.0, 20.0, 5.0)));
    /// let outcome = Command::new(Operation::FitBox { size: Vector3::new(5.0, 5.0, 5.0) })
    ///     .run(&mut mesh)?;
    ///
    /// assert!(outcome.write_back);
    /// assert_eq!(outcome.matrix.m11, 0.25);
    /// # Ok::<(), stlkit::Error>(())
    /// ```
    pub fn run(&self, mesh: &mut Mesh) -> Result<Outcome> {
        let outcome = self.operation.apply(mesh)?;
        if self.fix_normals && outcome.write_back {
            mesh.recalculate_normals();
        }
        Ok(outcome)
    }

    /// Like [`Command::run`], recording the operation and its result in `log`
    pub fn run_logged(&self, mesh: &mut Mesh, log: &LogFile) -> Result<Outcome> {
        log.log(format!(
            "{} on '{}' ({} triangles)",
            self.operation.name(),
            mesh.name,
            mesh.triangle_count()
        ))?;

        let outcome = match self.run(mesh) {
            Ok(outcome) => outcome,
            Err(err) => {
                log.log(format!("{} failed: {}", self.operation.name(), err))?;
                return Err(err);
            }
        };

        if !outcome.matrix.is_identity() {
            log.log(format!("Matrix {}", outcome.matrix))?;
        }
        if let Some(m) = &outcome.measurement {
            log.log(format!(
                "Size [{} {} {}] from [{} {} {}] to [{} {} {}]",
                m.len.x, m.len.y, m.len.z, m.min.x, m.min.y, m.min.z, m.max.x, m.max.y, m.max.z
            ))?;
            log.log(format!("Bounding box {}", BBox3::new(m.min, m.max)))?;
        }
        if let Some(report) = &outcome.report {
            log.log(format!(
                "Errors found in {}/{} triangles",
                report.len(),
                report.triangle_count
            ))?;
            for (i, errors) in report.iter() {
                if let Some(tri) = mesh.triangle(i) {
                    let kinds: Vec<_> = errors.kinds().collect();
                    log.log(format!("  #{} {}: {:?}", i, tri, kinds))?;
                }
            }
        }
        if self.fix_normals && outcome.write_back {
            log.log("Normals recalculated")?;
        }
        Ok(outcome)
    }
}
