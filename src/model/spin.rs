/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Spin-resolved mean-field Hamiltonians

use super::errors::{ModelError, Result};
use super::hamiltonian::SparseHamiltonian;
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Spin channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Spin {
    Up,
    Down,
}

impl Spin {
    pub const BOTH: [Spin; 2] = [Spin::Up, Spin::Down];

    pub fn opposite(self) -> Self {
        match self {
            Spin::Up => Spin::Down,
            Spin::Down => Spin::Up,
        }
    }
}

impl fmt::Display for Spin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Spin::Up => f.write_str("up"),
            Spin::Down => f.write_str("down"),
        }
    }
}

/// `Hup = H0 + U·diag(ndn − n0)` and `Hdn = H0 + U·diag(nup − n0)`
#[derive(Debug, Clone)]
pub struct SpinHamiltonianPair {
    up: SparseHamiltonian,
    down: SparseHamiltonian,
}

impl SpinHamiltonianPair {
    /// Derive both spin Hamiltonians from the backbone and the occupations.
    ///
    /// Each channel feels the Coulomb repulsion of the opposite spin,
    /// measured against the neutral reference charge `n0`.
    pub fn derive(
        h0: &SparseHamiltonian,
        up_density: &Array1<f64>,
        down_density: &Array1<f64>,
        coulomb: f64,
        reference_charge: &Array1<f64>,
    ) -> Result<Self> {
        let n = h0.dimension();
        for vector in [up_density, down_density, reference_charge] {
            if vector.len() != n {
                return Err(ModelError::DimensionMismatch {
                    expected: n,
                    found: vector.len(),
                });
            }
        }

        let up_onsite = h0.onsite() + &((down_density - reference_charge) * coulomb);
        let down_onsite = h0.onsite() + &((up_density - reference_charge) * coulomb);

        Ok(Self {
            up: h0.with_onsite(up_onsite)?,
            down: h0.with_onsite(down_onsite)?,
        })
    }

    pub fn up(&self) -> &SparseHamiltonian {
        &self.up
    }

    pub fn down(&self) -> &SparseHamiltonian {
        &self.down
    }

    pub fn get(&self, spin: Spin) -> &SparseHamiltonian {
        match spin {
            Spin::Up => &self.up,
            Spin::Down => &self.down,
        }
    }
}
