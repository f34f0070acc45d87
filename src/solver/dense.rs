/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Dense Hermitian eigensolver backed by faer

use super::{Eigensolver, Result, SolverError, Spectrum};
use faer::{Mat, Side};
use num_complex::{Complex64, ComplexFloat};
use std::cmp::Ordering;

/// Full dense diagonalization with faer's self-adjoint eigendecomposition
#[derive(Debug, Clone, Copy, Default)]
pub struct FaerEigensolver;

impl FaerEigensolver {
    pub fn new() -> Self {
        Self
    }
}

impl Eigensolver for FaerEigensolver {
    fn eigh(&self, matrix: &Mat<Complex64>) -> Result<Spectrum> {
        let n = matrix.nrows();
        if n == 0 || matrix.ncols() != n {
            return Err(SolverError::InvalidShape {
                rows: n,
                cols: matrix.ncols(),
            });
        }
        for j in 0..n {
            for i in 0..n {
                let z = matrix[(i, j)];
                if !(z.re.is_finite() && z.im.is_finite()) {
                    return Err(SolverError::NonFinite(format!(
                        "matrix element ({}, {}) = {}",
                        i, j, z
                    )));
                }
            }
        }

        let evd = matrix
            .self_adjoint_eigen(Side::Lower)
            .map_err(|e| SolverError::Decomposition(format!("{:?}", e)))?;
        let values = evd.S().column_vector();
        let vectors = evd.U();

        let raw: Vec<f64> = (0..n).map(|j| values[j].re()).collect();
        if let Some(bad) = raw.iter().find(|e| !e.is_finite()) {
            return Err(SolverError::NonFinite(format!("eigenvalue {}", bad)));
        }

        // faer already sorts ascending; keep the ordering explicit anyway
        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&a, &b| raw[a].partial_cmp(&raw[b]).unwrap_or(Ordering::Equal));

        let eigenvalues = order.iter().map(|&j| raw[j]).collect();
        let eigenvectors = Mat::from_fn(n, n, |i, j| vectors[(i, order[j])]);

        Spectrum::new(eigenvalues, eigenvectors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_dimer_eigenpairs() {
        let mut h = Mat::<Complex64>::zeros(2, 2);
        h[(0, 1)] = Complex64::new(-1.0, 0.0);
        h[(1, 0)] = Complex64::new(-1.0, 0.0);

        let spectrum = FaerEigensolver::new().eigh(&h).unwrap();
        assert_relative_eq!(spectrum.eigenvalues()[0], -1.0, epsilon = 1e-12);
        assert_relative_eq!(spectrum.eigenvalues()[1], 1.0, epsilon = 1e-12);

        let bonding = spectrum.occupations(1);
        assert_relative_eq!(bonding[0], 0.5, epsilon = 1e-12);
        assert_relative_eq!(bonding[1], 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_complex_hermitian_is_sorted_and_normalized() {
        let mut h = Mat::<Complex64>::zeros(3, 3);
        h[(0, 0)] = Complex64::new(2.0, 0.0);
        h[(1, 1)] = Complex64::new(-1.0, 0.0);
        h[(2, 2)] = Complex64::new(0.5, 0.0);
        h[(0, 1)] = Complex64::new(0.3, 0.4);
        h[(1, 0)] = Complex64::new(0.3, -0.4);
        h[(1, 2)] = Complex64::new(0.0, -0.2);
        h[(2, 1)] = Complex64::new(0.0, 0.2);

        let spectrum = FaerEigensolver::new().eigh(&h).unwrap();
        let values = spectrum.eigenvalues();
        assert!(values.windows(2).all(|w| w[0] <= w[1]));
        assert_relative_eq!(values.iter().sum::<f64>(), 1.5, epsilon = 1e-10);

        for state in 0..3 {
            let norm: f64 = spectrum
                .wavefunction(state)
                .unwrap()
                .iter()
                .map(|c| c.norm_sqr())
                .sum();
            assert_relative_eq!(norm, 1.0, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_rejects_non_finite() {
        let mut h = Mat::<Complex64>::zeros(2, 2);
        h[(0, 0)] = Complex64::new(f64::NAN, 0.0);
        assert!(matches!(
            FaerEigensolver::new().eigh(&h),
            Err(SolverError::NonFinite(_))
        ));
    }
}
