/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Density mixing
//!
//! Linear mixing `ρ = α·ρ_calc + (1 − α)·ρ_old` with a fraction chosen from
//! the last density change: heavily damped while far from the fixed point,
//! undamped once close to it.

use super::errors::{Result, ScfError};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Linear mixing of the previous and the freshly computed density
pub fn linear_mix(alpha: f64, old_density: &Array1<f64>, new_density: &Array1<f64>) -> Array1<f64> {
    new_density * alpha + old_density * (1.0 - alpha)
}

/// Mixing fraction as a function of the last density change
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MixingSchedule {
    /// Density change above which the damped fraction is used
    pub coarse_threshold: f64,
    /// Fraction used far from convergence
    pub damped: f64,
    /// Fraction used close to convergence
    pub full: f64,
}

impl Default for MixingSchedule {
    fn default() -> Self {
        Self {
            coarse_threshold: 0.1,
            damped: 0.1,
            full: 1.0,
        }
    }
}

impl MixingSchedule {
    pub fn fraction(&self, last_change: f64) -> f64 {
        if last_change > self.coarse_threshold {
            self.damped
        } else {
            self.full
        }
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in [("damped", self.damped), ("full", self.full)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ScfError::Configuration(format!(
                    "{} mixing fraction {} outside [0, 1]",
                    name, value
                )));
            }
        }
        if !(self.coarse_threshold.is_finite() && self.coarse_threshold >= 0.0) {
            return Err(ScfError::Configuration(format!(
                "invalid mixing threshold {}",
                self.coarse_threshold
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_linear_mixing() {
        let old = Array1::from(vec![1.0, 2.0, 3.0]);
        let new = Array1::from(vec![2.0, 3.0, 4.0]);
        let mixed = linear_mix(0.5, &old, &new);
        assert_relative_eq!(mixed[0], 1.5);
        assert_relative_eq!(mixed[1], 2.5);
        assert_relative_eq!(mixed[2], 3.5);

        assert_eq!(linear_mix(0.0, &old, &new), old);
        assert_eq!(linear_mix(1.0, &old, &new), new);
    }

    #[test]
    fn test_schedule() {
        let schedule = MixingSchedule::default();
        assert_eq!(schedule.fraction(f64::INFINITY), 0.1);
        assert_eq!(schedule.fraction(0.5), 0.1);
        assert_eq!(schedule.fraction(0.1), 1.0);
        assert_eq!(schedule.fraction(1e-6), 1.0);
    }

    #[test]
    fn test_schedule_validation() {
        let bad = MixingSchedule {
            damped: 1.5,
            ..MixingSchedule::default()
        };
        assert!(bad.validate().is_err());
        assert!(MixingSchedule::default().validate().is_ok());
    }
}
