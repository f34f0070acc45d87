/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Error types for sampling sets

use thiserror::Error;

/// Error type for sampling set construction
#[derive(Debug, Error)]
pub enum SamplingError {
    #[error("Sampling mesh must have at least one point per axis, got {0:?}")]
    EmptyMesh([usize; 3]),

    #[error("Sampling set must contain at least one point")]
    NoPoints,

    #[error("Non-finite sampling point {0:?}")]
    NonFinitePoint([f64; 3]),
}

/// Result type for sampling operations
pub type Result<T> = std::result::Result<T, SamplingError>;
