/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Tight-binding parameters of the pz backbone

use super::errors::{ModelError, Result};
use crate::geometry::Species;
use serde::{Deserialize, Serialize};

/// Hopping amplitudes, on-site offsets and neighbor-shell radii (eV, Å)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TightBindingParams {
    /// Nearest-neighbor hopping
    pub t1: f64,
    /// Second-neighbor hopping
    pub t2: f64,
    /// Third-neighbor hopping
    pub t3: f64,
    /// On-site energy of boron relative to carbon
    pub onsite_boron: f64,
    /// On-site energy of nitrogen relative to carbon
    pub onsite_nitrogen: f64,
    /// Shell boundaries: on-site, 1st, 2nd and 3rd neighbor radius
    pub shell_radii: [f64; 4],
}

impl Default for TightBindingParams {
    fn default() -> Self {
        Self {
            t1: 2.7,
            t2: 0.2,
            t3: 0.18,
            onsite_boron: 3.0,
            onsite_nitrogen: -3.0,
            shell_radii: [0.1, 1.6, 2.6, 3.1],
        }
    }
}

impl TightBindingParams {
    /// Nearest-neighbor-only model with hopping `t`
    pub fn nearest_neighbor(t: f64) -> Self {
        Self {
            t1: t,
            t2: 0.0,
            t3: 0.0,
            ..Self::default()
        }
    }

    /// Hopping magnitudes ordered by shell
    pub fn hoppings(&self) -> [f64; 3] {
        [self.t1, self.t2, self.t3]
    }

    /// On-site energy of a species (carbon is the reference)
    pub fn onsite(&self, species: Species) -> f64 {
        match species {
            Species::Boron => self.onsite_boron,
            Species::Carbon => 0.0,
            Species::Nitrogen => self.onsite_nitrogen,
        }
    }

    /// "1NN" or "3NN", used in labels
    pub fn neighbor_model(&self) -> &'static str {
        if self.t3 == 0.0 {
            "1NN"
        } else {
            "3NN"
        }
    }

    pub fn validate(&self) -> Result<()> {
        let values = [
            self.t1,
            self.t2,
            self.t3,
            self.onsite_boron,
            self.onsite_nitrogen,
        ];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(ModelError::InvalidParameter(format!(
                "non-finite tight-binding parameter in {:?}",
                self
            )));
        }
        if self.shell_radii.iter().any(|r| !r.is_finite() || *r <= 0.0)
            || self.shell_radii.windows(2).any(|w| w[1] <= w[0])
        {
            return Err(ModelError::InvalidParameter(format!(
                "shell radii must be positive and strictly increasing: {:?}",
                self.shell_radii
            )));
        }
        Ok(())
    }
}
