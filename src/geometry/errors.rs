/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Error types for the geometry module

/// Error types for the geometry module
#[derive(Debug, thiserror::Error)]
pub enum GeometryError {
    #[error("Unknown species: {0}")]
    UnknownSpecies(String),

    #[error("Unsupported atomic number: {0}")]
    UnsupportedAtomicNumber(i32),

    #[error("Site index {index} out of range ({count} sites)")]
    SiteOutOfRange { index: usize, count: usize },

    #[error("Invalid neighbor radii: {0}")]
    InvalidRadii(String),

    #[error("Degenerate lattice: {0}")]
    DegenerateLattice(String),

    #[error("Non-finite coordinate for site {0}")]
    NonFiniteCoordinate(usize),
}

/// Result type for geometry operations
pub type Result<T> = std::result::Result<T, GeometryError>;
