//! Error types for coefficient assembly.

use thiserror::Error;

/// Result type alias using the crate Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while assembling a finite volume system.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Volume count, matrix order or array length outside what the stencil supports.
    #[error("invalid size: {0}")]
    InvalidSize(String),

    /// Boundary closure requested for a scheme whose far-neighbour terms were never assembled.
    #[error("scheme mismatch: {0}")]
    SchemeMismatch(String),

    /// Coefficient arrays used before `allocate`.
    #[error("coefficient arrays have not been allocated")]
    UnallocatedState,

    /// Physically invalid input (spacing, diffusivity, density, velocity).
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Mesh-related errors.
    #[error("mesh error: {0}")]
    Mesh(String),

    /// Sparse matrix construction errors.
    #[error("matrix error: {0}")]
    Matrix(String),
}
