//! Error types for stlkit

use thiserror::Error;

/// stlkit error types
#[derive(Error, Debug)]
pub enum Error {
    /// Rotation requested without a usable axis direction
    #[error("The rotation axis must have a direction vector")]
    AxisNotSpecified,

    /// Fit-box target size with a non-positive component
    #[error("Invalid size box: {0}")]
    BoxDimensionInvalid(String),

    /// Transform requested without a matrix
    #[error("Transform not possible without a matrix")]
    MatrixMissing,

    /// Matrix text could not be read
    #[error("Cannot read matrix: {0}")]
    MatrixParse(String),

    /// Invalid parameter provided
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// File save error
    #[error("File save error: {0}")]
    FileSave(String),
}

/// Result type alias for stlkit operations
pub type Result<T> = std::result::Result<T, Error>;
