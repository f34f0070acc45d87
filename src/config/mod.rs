/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! JSON run files
//!
//! A run file lists the sites of one structure together with the model and
//! SCF settings. Everything except the sites has a default:
//!
//! ```json
//! {
//!   "name": "benzene",
//!   "sites": [{ "species": "C", "position": [1.39, 0.0, 0.0] }],
//!   "coulomb": 3.5,
//!   "scf": { "tolerance": 1e-10, "seed": 1 },
//!   "store": "results.json"
//! }
//! ```

use crate::geometry::{Geometry, GeometryError, Lattice, Species, Vector3D};
use crate::model::{ModelError, SiteModel, TightBindingParams};
use crate::sampling::{SamplingError, SamplingSet};
use crate::scf::{ConvergenceOptions, ElectronCounts};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while loading a run file
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid run file: {0}")]
    Invalid(String),

    #[error("Geometry error: {0}")]
    Geometry(#[from] GeometryError),

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Sampling error: {0}")]
    Sampling(#[from] SamplingError),
}

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// One site entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Element symbol or name (B, C or N)
    pub species: String,
    /// Cartesian position in Ångström
    pub position: Vector3D,
}

/// Lattice of a periodic structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatticeConfig {
    pub vectors: [Vector3D; 3],
    #[serde(default = "all_periodic")]
    pub periodic: [bool; 3],
}

fn all_periodic() -> [bool; 3] {
    [true; 3]
}

/// Starting density when no stored solution is found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum InitialDensity {
    /// Uniformly random occupations
    #[default]
    Random,
    /// Equal occupation on every site
    Uniform,
    /// Opposite spins on the two sublattices of a bipartite structure
    Sublattices,
}

/// SCF controls
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScfConfig {
    #[serde(flatten)]
    pub convergence: ConvergenceOptions,
    /// Seed of the random starting density
    pub seed: Option<u64>,
    pub initial: InitialDensity,
}

/// Contents of a run file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default = "default_name")]
    pub name: String,
    pub sites: Vec<SiteConfig>,
    #[serde(default)]
    pub lattice: Option<LatticeConfig>,
    #[serde(default)]
    pub hopping: TightBindingParams,
    /// On-site Coulomb repulsion U in eV
    #[serde(default, alias = "U")]
    pub coulomb: f64,
    /// Explicit electron counts; neutral low-spin filling when absent
    #[serde(default)]
    pub electrons: Option<ElectronCounts>,
    /// Electrons moved from the down to the up channel
    #[serde(default)]
    pub polarization: i64,
    #[serde(default = "single_point")]
    pub kmesh: [usize; 3],
    #[serde(default)]
    pub scf: ScfConfig,
    #[serde(default)]
    pub store: Option<PathBuf>,
}

fn default_name() -> String {
    "model".to_string()
}

fn single_point() -> [usize; 3] {
    [1, 1, 1]
}

impl RunConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let config: RunConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that do not require building the model
    pub fn validate(&self) -> Result<()> {
        if self.sites.is_empty() {
            return Err(ConfigError::Invalid("no sites given".to_string()));
        }
        if !self.coulomb.is_finite() {
            return Err(ConfigError::Invalid(format!(
                "Coulomb repulsion must be finite, got {}",
                self.coulomb
            )));
        }
        if self.kmesh.contains(&0) {
            return Err(SamplingError::EmptyMesh(self.kmesh).into());
        }
        let periodic = self
            .lattice
            .as_ref()
            .map(|l| l.periodic)
            .unwrap_or([false; 3]);
        for (axis, (&n, &repeats)) in self.kmesh.iter().zip(&periodic).enumerate() {
            if n > 1 && !repeats {
                return Err(ConfigError::Invalid(format!(
                    "k-mesh has {} points along non-periodic axis {}",
                    n, axis
                )));
            }
        }
        Ok(())
    }

    pub fn geometry(&self) -> Result<Geometry> {
        let mut geometry = match &self.lattice {
            Some(lattice) => Geometry::periodic(Lattice::new(lattice.vectors, lattice.periodic)?),
            None => Geometry::new(),
        };
        for site in &self.sites {
            let species: Species = site.species.parse()?;
            geometry.add_site(species, site.position)?;
        }
        Ok(geometry)
    }

    pub fn model(&self) -> Result<SiteModel> {
        Ok(SiteModel::new(self.geometry()?, self.hopping)?)
    }

    pub fn sampling(&self) -> Result<SamplingSet> {
        Ok(SamplingSet::regular(self.kmesh)?)
    }

    /// Electron counts before polarization
    pub fn electron_counts(&self, model: &SiteModel) -> ElectronCounts {
        self.electrons
            .unwrap_or_else(|| ElectronCounts::neutral(model.neutral_electron_count()))
    }

    pub fn convergence(&self) -> ConvergenceOptions {
        self.scf.convergence
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RunConfig::from_json(
            r#"{ "sites": [{ "species": "C", "position": [0.0, 0.0, 0.0] }] }"#,
        )
        .unwrap();
        assert_eq!(config.name, "model");
        assert_eq!(config.coulomb, 0.0);
        assert_eq!(config.kmesh, [1, 1, 1]);
        assert_eq!(config.scf.convergence, ConvergenceOptions::default());
        assert_eq!(config.scf.initial, InitialDensity::Random);
        assert_eq!(config.hopping, TightBindingParams::default());
        assert!(config.store.is_none());
    }

    #[test]
    fn test_flattened_scf_controls() {
        let config = RunConfig::from_json(
            r#"{
                "sites": [{ "species": "N", "position": [0.0, 0.0, 0.0] }],
                "U": 2.0,
                "scf": { "tolerance": 1e-8, "max_iterations": 50, "seed": 3, "initial": "uniform" }
            }"#,
        )
        .unwrap();
        assert_eq!(config.coulomb, 2.0);
        assert_eq!(config.scf.convergence.tolerance, 1e-8);
        assert_eq!(config.scf.convergence.max_iterations, 50);
        assert_eq!(config.scf.convergence.checkpoint_interval, 100);
        assert_eq!(config.scf.seed, Some(3));
        assert_eq!(config.scf.initial, InitialDensity::Uniform);
    }

    #[test]
    fn test_rejects_mesh_on_molecule() {
        let result = RunConfig::from_json(
            r#"{ "sites": [{ "species": "C", "position": [0.0, 0.0, 0.0] }], "kmesh": [4, 1, 1] }"#,
        );
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_unknown_species() {
        let config = RunConfig::from_json(
            r#"{ "sites": [{ "species": "Xe", "position": [0.0, 0.0, 0.0] }] }"#,
        )
        .unwrap();
        assert!(matches!(config.geometry(), Err(ConfigError::Geometry(_))));
    }
}
