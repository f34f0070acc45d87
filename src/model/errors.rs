/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Error types for the tight-binding model

use thiserror::Error;

/// Result type for model construction
pub type Result<T> = std::result::Result<T, ModelError>;

/// Error type for model construction and derived Hamiltonians
#[derive(Error, Debug)]
pub enum ModelError {
    /// The geometry holds no sites
    #[error("Site model needs at least one site")]
    EmptyGeometry,

    /// A tight-binding parameter is out of range
    #[error("Invalid model parameter: {0}")]
    InvalidParameter(String),

    /// Row/column index beyond the Hamiltonian dimension
    #[error("Site index {index} out of range for dimension {dimension}")]
    IndexOutOfRange { index: usize, dimension: usize },

    /// Hopping entry without its conjugate partner
    #[error("Hamiltonian is not Hermitian at ({row}, {col})")]
    NotHermitian { row: usize, col: usize },

    /// Vector length does not match the number of sites
    #[error("Dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },

    /// Nearest-neighbor graph contains an odd ring
    #[error("Nearest-neighbor network is not bipartite (odd ring through site {0})")]
    NotBipartite(usize),

    /// Propagation of error from geometry module
    #[error("Geometry error: {0}")]
    Geometry(#[from] crate::geometry::GeometryError),
}
