/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Sparse real-space Hamiltonian and its builder
//!
//! Entries are collected as `(row, col, image, value)` triples by
//! [`HamiltonianBuilder`] and frozen into a [`SparseHamiltonian`] once the
//! Hermiticity check passes. The frozen operator is never edited in place;
//! spin-resolved variants replace the diagonal and share the hopping list.

use super::errors::{ModelError, Result};
use crate::geometry::ImageOffset;
use faer::Mat;
use ndarray::Array1;
use num_complex::Complex64;
use std::collections::BTreeMap;
use std::f64::consts::PI;
use std::sync::Arc;

/// One off-diagonal element, `H[row, col]` between the home cell and `image`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hopping {
    pub row: usize,
    pub col: usize,
    pub image: ImageOffset,
    pub value: f64,
}

/// Immutable real-space Hamiltonian over sites
#[derive(Debug, Clone)]
pub struct SparseHamiltonian {
    onsite: Array1<f64>,
    hoppings: Arc<[Hopping]>,
}

impl SparseHamiltonian {
    pub fn dimension(&self) -> usize {
        self.onsite.len()
    }

    /// Diagonal (on-site) energies
    pub fn onsite(&self) -> &Array1<f64> {
        &self.onsite
    }

    pub fn hoppings(&self) -> &[Hopping] {
        &self.hoppings
    }

    /// Home-cell matrix element `H[row, col]` (image `[0, 0, 0]` only);
    /// `None` when either index is outside the operator
    pub fn element(&self, row: usize, col: usize) -> Option<f64> {
        let n = self.dimension();
        if row >= n || col >= n {
            return None;
        }
        let hopping: f64 = self
            .hoppings
            .iter()
            .filter(|h| h.row == row && h.col == col && h.image == [0, 0, 0])
            .map(|h| h.value)
            .sum();
        if row == col {
            Some(self.onsite[row] + hopping)
        } else {
            Some(hopping)
        }
    }

    /// Same hoppings with a new diagonal
    pub(crate) fn with_onsite(&self, onsite: Array1<f64>) -> Result<Self> {
        if onsite.len() != self.dimension() {
            return Err(ModelError::DimensionMismatch {
                expected: self.dimension(),
                found: onsite.len(),
            });
        }
        Ok(Self {
            onsite,
            hoppings: Arc::clone(&self.hoppings),
        })
    }

    /// Dense Bloch Hamiltonian `H(k) = Σ_R H(R) exp(2πi k·R)`
    ///
    /// `k` is given in fractional (reciprocal lattice) coordinates.
    pub fn bloch_matrix(&self, k: &[f64; 3]) -> Mat<Complex64> {
        let n = self.dimension();
        let mut matrix = Mat::<Complex64>::zeros(n, n);
        for (i, &e) in self.onsite.iter().enumerate() {
            matrix[(i, i)] = Complex64::new(e, 0.0);
        }
        for h in self.hoppings.iter() {
            let phase = 2.0
                * PI
                * (k[0] * f64::from(h.image[0])
                    + k[1] * f64::from(h.image[1])
                    + k[2] * f64::from(h.image[2]));
            matrix[(h.row, h.col)] += Complex64::from_polar(h.value, phase);
        }
        matrix
    }
}

/// Accumulates Hamiltonian entries before freezing them
#[derive(Debug, Clone)]
pub struct HamiltonianBuilder {
    onsite: Vec<f64>,
    entries: BTreeMap<(usize, usize, ImageOffset), f64>,
}

impl HamiltonianBuilder {
    /// Builder for a `dimension` x `dimension` operator
    pub fn new(dimension: usize) -> Self {
        Self {
            onsite: vec![0.0; dimension],
            entries: BTreeMap::new(),
        }
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index >= self.onsite.len() {
            return Err(ModelError::IndexOutOfRange {
                index,
                dimension: self.onsite.len(),
            });
        }
        Ok(())
    }

    pub fn set_onsite(&mut self, site: usize, value: f64) -> Result<&mut Self> {
        self.check_index(site)?;
        self.onsite[site] = value;
        Ok(self)
    }

    /// Set `H[row, col]` towards `image`; a later call for the same triple
    /// replaces the earlier value
    pub fn set_hopping(
        &mut self,
        row: usize,
        col: usize,
        image: ImageOffset,
        value: f64,
    ) -> Result<&mut Self> {
        self.check_index(row)?;
        self.check_index(col)?;
        if row == col && image == [0, 0, 0] {
            return Err(ModelError::InvalidParameter(format!(
                "hopping from site {} onto itself; use set_onsite",
                row
            )));
        }
        self.entries.insert((row, col, image), value);
        Ok(self)
    }

    /// Freeze the entries, checking that every hopping has its conjugate
    pub fn finalize(self) -> Result<SparseHamiltonian> {
        for (&(row, col, image), &value) in &self.entries {
            let mirror = [-image[0], -image[1], -image[2]];
            match self.entries.get(&(col, row, mirror)) {
                Some(&partner) if (partner - value).abs() <= 1e-12 => {}
                _ => return Err(ModelError::NotHermitian { row, col }),
            }
        }
        let hoppings: Vec<Hopping> = self
            .entries
            .into_iter()
            .map(|((row, col, image), value)| Hopping {
                row,
                col,
                image,
                value,
            })
            .collect();
        Ok(SparseHamiltonian {
            onsite: Array1::from(self.onsite),
            hoppings: hoppings.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_builder_rejects_one_sided_hopping() {
        let mut builder = HamiltonianBuilder::new(2);
        builder.set_hopping(0, 1, [0, 0, 0], -1.0).unwrap();
        assert!(matches!(
            builder.finalize(),
            Err(ModelError::NotHermitian { row: 0, col: 1 })
        ));
    }

    #[test]
    fn test_builder_index_checks() {
        let mut builder = HamiltonianBuilder::new(2);
        assert!(builder.set_onsite(2, 1.0).is_err());
        assert!(builder.set_hopping(0, 0, [0, 0, 0], 1.0).is_err());
        assert!(builder.set_hopping(0, 0, [1, 0, 0], 1.0).is_ok());
    }

    #[test]
    fn test_bloch_phase() {
        // single-site chain: H(k) = e0 - 2t cos(2πk)
        let mut builder = HamiltonianBuilder::new(1);
        builder.set_onsite(0, 0.5).unwrap();
        builder.set_hopping(0, 0, [1, 0, 0], -1.0).unwrap();
        builder.set_hopping(0, 0, [-1, 0, 0], -1.0).unwrap();
        let h = builder.finalize().unwrap();

        let gamma = h.bloch_matrix(&[0.0, 0.0, 0.0]);
        assert_relative_eq!(gamma[(0, 0)].re, -1.5, epsilon = 1e-12);
        let edge = h.bloch_matrix(&[0.5, 0.0, 0.0]);
        assert_relative_eq!(edge[(0, 0)].re, 2.5, epsilon = 1e-12);
        assert_relative_eq!(edge[(0, 0)].im, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_with_onsite_shares_hoppings() {
        let mut builder = HamiltonianBuilder::new(2);
        builder.set_hopping(0, 1, [0, 0, 0], -2.0).unwrap();
        builder.set_hopping(1, 0, [0, 0, 0], -2.0).unwrap();
        let h = builder.finalize().unwrap();

        let shifted = h.with_onsite(Array1::from(vec![1.0, -1.0])).unwrap();
        assert_eq!(shifted.element(0, 0), Some(1.0));
        assert_eq!(shifted.element(0, 1), Some(-2.0));
        assert_eq!(h.element(0, 0), Some(0.0));
        assert!(h.with_onsite(Array1::zeros(3)).is_err());
    }

    #[test]
    fn test_element_outside_operator() {
        let h = HamiltonianBuilder::new(2).finalize().unwrap();
        assert_eq!(h.element(1, 1), Some(0.0));
        assert_eq!(h.element(2, 0), None);
        assert_eq!(h.element(0, 5), None);
    }
}
