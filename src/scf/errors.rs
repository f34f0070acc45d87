/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Error types for the self-consistency engine

use crate::model::ModelError;
use crate::sampling::SamplingError;
use crate::solver::SolverError;
use crate::store::StoreError;
use thiserror::Error;

/// Result type for SCF operations
pub type Result<T> = std::result::Result<T, ScfError>;

/// Error type for SCF operations
#[derive(Error, Debug)]
pub enum ScfError {
    /// Invalid electron counts, mixing fraction or convergence options
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Non-finite density, energy or midgap
    #[error("Numerical error: {0}")]
    Numerical(String),

    /// Iteration cap reached before the density change fell below tolerance
    #[error(
        "No convergence after {iterations} iterations (density change {density_change:.3e}, Etot {total_energy:.8} eV)"
    )]
    NonConvergence {
        iterations: usize,
        density_change: f64,
        total_energy: f64,
    },

    /// Model construction or Hamiltonian derivation failed
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    /// Eigensolver failed
    #[error("Numerical error: {0}")]
    Solver(#[from] SolverError),

    /// Invalid sampling set
    #[error("Sampling error: {0}")]
    Sampling(#[from] SamplingError),

    /// Persisting or restoring a solution failed
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl ScfError {
    pub fn is_non_convergence(&self) -> bool {
        matches!(self, ScfError::NonConvergence { .. })
    }
}
