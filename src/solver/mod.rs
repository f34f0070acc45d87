/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Hermitian eigensolver interface
//!
//! The SCF engine only needs ascending eigenvalues and unit-norm eigenvectors
//! of a dense Hermitian matrix. [`Eigensolver`] abstracts that primitive;
//! [`FaerEigensolver`] is the default implementation.

mod dense;

pub use dense::FaerEigensolver;

use faer::Mat;
use ndarray::Array1;
use num_complex::Complex64;
use thiserror::Error;

/// Result type for eigensolver operations
pub type Result<T> = std::result::Result<T, SolverError>;

/// Errors reported by an eigensolver
#[derive(Error, Debug)]
pub enum SolverError {
    /// Matrix is not square or has no rows
    #[error("Invalid matrix shape {rows}x{cols}")]
    InvalidShape { rows: usize, cols: usize },

    /// Input or output contains NaN or infinity
    #[error("Non-finite value encountered: {0}")]
    NonFinite(String),

    /// Decomposition did not converge
    #[error("Eigendecomposition failed: {0}")]
    Decomposition(String),
}

/// Solves the Hermitian eigenproblem `H ψ = ε ψ`
pub trait Eigensolver: Send + Sync {
    /// Eigenvalues in ascending order with matching unit-norm eigenvectors
    /// stored column-wise
    fn eigh(&self, matrix: &Mat<Complex64>) -> Result<Spectrum>;
}

/// Eigenvalues and eigenvectors of one Hamiltonian at one sampling point
#[derive(Debug, Clone)]
pub struct Spectrum {
    eigenvalues: Vec<f64>,
    eigenvectors: Mat<Complex64>,
}

impl Spectrum {
    pub fn new(eigenvalues: Vec<f64>, eigenvectors: Mat<Complex64>) -> Result<Self> {
        let n = eigenvalues.len();
        if eigenvectors.nrows() != n || eigenvectors.ncols() != n {
            return Err(SolverError::InvalidShape {
                rows: eigenvectors.nrows(),
                cols: eigenvectors.ncols(),
            });
        }
        Ok(Self {
            eigenvalues,
            eigenvectors,
        })
    }

    pub fn eigenvalues(&self) -> &[f64] {
        &self.eigenvalues
    }

    pub fn eigenvectors(&self) -> &Mat<Complex64> {
        &self.eigenvectors
    }

    pub fn len(&self) -> usize {
        self.eigenvalues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.eigenvalues.is_empty()
    }

    /// Amplitudes of eigenstate `state` on every site
    pub fn wavefunction(&self, state: usize) -> Option<Vec<Complex64>> {
        if state >= self.len() {
            return None;
        }
        Some(
            (0..self.len())
                .map(|site| self.eigenvectors[(site, state)])
                .collect(),
        )
    }

    /// Site occupations `Σ_{j<count} |ψ_j(i)|²` of the lowest `count` states
    pub fn occupations(&self, count: usize) -> Array1<f64> {
        let n = self.len();
        let count = count.min(n);
        let mut occupation = Array1::<f64>::zeros(n);
        for state in 0..count {
            for site in 0..n {
                occupation[site] += self.eigenvectors[(site, state)].norm_sqr();
            }
        }
        occupation
    }

    /// Highest occupied level when `count` states are filled
    pub fn highest_occupied(&self, count: usize) -> Option<f64> {
        count
            .checked_sub(1)
            .and_then(|i| self.eigenvalues.get(i))
            .copied()
    }

    /// Lowest empty level when `count` states are filled
    pub fn lowest_unoccupied(&self, count: usize) -> Option<f64> {
        self.eigenvalues.get(count).copied()
    }

    /// Sum of the lowest `count` eigenvalues
    pub fn band_energy(&self, count: usize) -> f64 {
        self.eigenvalues.iter().take(count).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn diagonal() -> Spectrum {
        let vectors = Mat::<Complex64>::identity(3, 3);
        Spectrum::new(vec![-1.0, 0.5, 2.0], vectors).unwrap()
    }

    #[test]
    fn test_filling_queries() {
        let spectrum = diagonal();
        assert_eq!(spectrum.highest_occupied(0), None);
        assert_eq!(spectrum.highest_occupied(2), Some(0.5));
        assert_eq!(spectrum.lowest_unoccupied(2), Some(2.0));
        assert_eq!(spectrum.lowest_unoccupied(3), None);
        assert_relative_eq!(spectrum.band_energy(2), -0.5);
    }

    #[test]
    fn test_occupations() {
        let spectrum = diagonal();
        let occupation = spectrum.occupations(2);
        assert_eq!(occupation.to_vec(), vec![1.0, 1.0, 0.0]);
        assert_eq!(spectrum.occupations(10).sum(), 3.0);
        assert!(spectrum.wavefunction(3).is_none());
    }

    #[test]
    fn test_shape_check() {
        let vectors = Mat::<Complex64>::identity(2, 2);
        assert!(Spectrum::new(vec![0.0; 3], vectors).is_err());
    }
}
