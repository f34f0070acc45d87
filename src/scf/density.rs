/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Electron counts and per-site spin densities

use super::errors::{Result, ScfError};
use crate::model::Spin;
use ndarray::{Array1, Zip};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Number of electrons in each spin channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectronCounts {
    pub up: usize,
    pub down: usize,
}

impl ElectronCounts {
    pub fn new(up: usize, down: usize) -> Self {
        Self { up, down }
    }

    /// Low-spin filling: `down = ⌊total/2⌋`, the odd electron goes up
    pub fn neutral(total: usize) -> Self {
        let down = total / 2;
        Self {
            up: total - down,
            down,
        }
    }

    pub fn total(&self) -> usize {
        self.up + self.down
    }

    pub fn get(&self, spin: Spin) -> usize {
        match spin {
            Spin::Up => self.up,
            Spin::Down => self.down,
        }
    }

    /// Move `transfer` electrons from the down to the up channel
    /// (negative values move them the other way)
    pub fn polarized(&self, transfer: i64) -> Result<Self> {
        let up = self.up as i64 + transfer;
        let down = self.down as i64 - transfer;
        if up < 0 || down < 0 {
            return Err(ScfError::Configuration(format!(
                "cannot transfer {} electrons with (Nup, Ndn) = ({}, {})",
                transfer, self.up, self.down
            )));
        }
        Ok(Self {
            up: up as usize,
            down: down as usize,
        })
    }

    /// Each channel holds at most one electron per site
    pub fn check_capacity(&self, sites: usize) -> Result<()> {
        if self.up > sites || self.down > sites {
            return Err(ScfError::Configuration(format!(
                "(Nup, Ndn) = ({}, {}) exceeds the {} available states per spin",
                self.up, self.down, sites
            )));
        }
        Ok(())
    }
}

/// Occupations `nup`, `ndn` plus the energy and midgap of the last step
#[derive(Debug, Clone, PartialEq)]
pub struct DensityState {
    up: Array1<f64>,
    down: Array1<f64>,
    total_energy: f64,
    midgap: f64,
}

impl DensityState {
    /// Electrons spread evenly over all sites
    pub fn uniform(sites: usize, counts: ElectronCounts) -> Self {
        let mut state = Self::unscored(Array1::ones(sites), Array1::ones(sites));
        state.normalize(counts);
        state
    }

    /// Uniformly random occupations, normalised to `counts`
    pub fn random<R: Rng + ?Sized>(sites: usize, counts: ElectronCounts, rng: &mut R) -> Self {
        let up = Array1::from_shape_fn(sites, |_| rng.gen::<f64>());
        let down = Array1::from_shape_fn(sites, |_| rng.gen::<f64>());
        let mut state = Self::unscored(up, down);
        state.normalize(counts);
        state
    }

    /// Caller-supplied occupations, normalised to `counts`
    pub fn from_occupations(
        up: Array1<f64>,
        down: Array1<f64>,
        counts: ElectronCounts,
    ) -> Result<Self> {
        if up.len() != down.len() {
            return Err(ScfError::Configuration(format!(
                "spin channels have {} and {} sites",
                up.len(),
                down.len()
            )));
        }
        if up.iter().chain(down.iter()).any(|v| !v.is_finite() || *v < 0.0) {
            return Err(ScfError::Configuration(
                "occupations must be finite and non-negative".to_string(),
            ));
        }
        let mut state = Self::unscored(up, down);
        state.normalize(counts);
        Ok(state)
    }

    fn unscored(up: Array1<f64>, down: Array1<f64>) -> Self {
        Self {
            up,
            down,
            total_energy: 0.0,
            midgap: 0.0,
        }
    }

    /// Rescale each channel so it sums to its electron count
    pub fn normalize(&mut self, counts: ElectronCounts) {
        normalize_channel(&mut self.up, counts.up);
        normalize_channel(&mut self.down, counts.down);
    }

    pub fn site_count(&self) -> usize {
        self.up.len()
    }

    pub fn up(&self) -> &Array1<f64> {
        &self.up
    }

    pub fn down(&self) -> &Array1<f64> {
        &self.down
    }

    pub fn get(&self, spin: Spin) -> &Array1<f64> {
        match spin {
            Spin::Up => &self.up,
            Spin::Down => &self.down,
        }
    }

    /// Spin polarization `nup − ndn` per site
    pub fn polarization(&self) -> Array1<f64> {
        &self.up - &self.down
    }

    /// Charge `nup + ndn` per site
    pub fn charge(&self) -> Array1<f64> {
        &self.up + &self.down
    }

    pub fn total_energy(&self) -> f64 {
        self.total_energy
    }

    pub fn midgap(&self) -> f64 {
        self.midgap
    }

    pub(crate) fn set_occupations(&mut self, up: Array1<f64>, down: Array1<f64>) {
        self.up = up;
        self.down = down;
    }

    pub(crate) fn set_derived(&mut self, total_energy: f64, midgap: f64) {
        self.total_energy = total_energy;
        self.midgap = midgap;
    }

    pub(crate) fn site_mut(&mut self, spin: Spin) -> &mut Array1<f64> {
        match spin {
            Spin::Up => &mut self.up,
            Spin::Down => &mut self.down,
        }
    }
}

fn normalize_channel(channel: &mut Array1<f64>, target: usize) {
    let n = channel.len();
    if n == 0 {
        return;
    }
    if target == 0 {
        channel.fill(0.0);
        return;
    }
    let sum = channel.sum();
    if sum > 0.0 && sum.is_finite() {
        *channel *= target as f64 / sum;
    } else {
        channel.fill(target as f64 / n as f64);
    }
}

/// L1 distance `Σ|a − b|`
pub fn density_change(old: &Array1<f64>, new: &Array1<f64>) -> f64 {
    let mut change = 0.0;
    Zip::from(old).and(new).for_each(|a, b| change += (a - b).abs());
    change
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_neutral_filling() {
        assert_eq!(ElectronCounts::neutral(6), ElectronCounts::new(3, 3));
        assert_eq!(ElectronCounts::neutral(7), ElectronCounts::new(4, 3));
        assert_eq!(ElectronCounts::neutral(0).total(), 0);
    }

    #[test]
    fn test_polarized_preserves_total() {
        let counts = ElectronCounts::new(3, 3);
        let moved = counts.polarized(2).unwrap();
        assert_eq!(moved, ElectronCounts::new(5, 1));
        assert_eq!(moved.total(), counts.total());
        assert_eq!(counts.polarized(-3).unwrap(), ElectronCounts::new(0, 6));
        assert!(counts.polarized(4).is_err());
    }

    #[test]
    fn test_capacity() {
        assert!(ElectronCounts::new(2, 2).check_capacity(2).is_ok());
        assert!(ElectronCounts::new(3, 0).check_capacity(2).is_err());
    }

    #[test]
    fn test_random_density_is_normalized() {
        let mut rng = StdRng::seed_from_u64(7);
        let counts = ElectronCounts::new(4, 2);
        let state = DensityState::random(10, counts, &mut rng);
        assert_relative_eq!(state.up().sum(), 4.0, epsilon = 1e-9);
        assert_relative_eq!(state.down().sum(), 2.0, epsilon = 1e-9);
        assert!(state.up().iter().all(|v| *v >= 0.0));
    }

    #[test]
    fn test_normalize_edge_cases() {
        let mut state = DensityState::from_occupations(
            Array1::zeros(4),
            Array1::from(vec![1.0, 2.0, 3.0, 4.0]),
            ElectronCounts::new(2, 0),
        )
        .unwrap();
        assert_eq!(state.up().to_vec(), vec![0.5; 4]);
        assert_eq!(state.down().to_vec(), vec![0.0; 4]);

        state.normalize(ElectronCounts::new(1, 1));
        assert_relative_eq!(state.down().sum(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_rejects_negative_occupation() {
        let result = DensityState::from_occupations(
            Array1::from(vec![1.0, -0.5]),
            Array1::from(vec![1.0, 0.5]),
            ElectronCounts::new(1, 1),
        );
        assert!(matches!(result, Err(ScfError::Configuration(_))));
    }

    #[test]
    fn test_density_change_and_polarization() {
        let state = DensityState::from_occupations(
            Array1::from(vec![1.0, 0.0]),
            Array1::from(vec![0.0, 1.0]),
            ElectronCounts::new(1, 1),
        )
        .unwrap();
        assert_eq!(state.polarization().to_vec(), vec![1.0, -1.0]);
        assert_eq!(state.charge().to_vec(), vec![1.0, 1.0]);
        assert_relative_eq!(density_change(state.up(), state.down()), 2.0);
    }
}
