/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! # hubbard-rs
//!
//! Self-consistent mean-field solution of the spin-polarized Hubbard model
//! on the pz network of carbon, boron and nitrogen structures.
//!
//! A [`model::SiteModel`] turns a [`geometry::Geometry`] into a sparse
//! tight-binding Hamiltonian with up to third-neighbor hoppings. The
//! [`scf::ScfEngine`] adds the on-site Coulomb term `U·(n_σ̄ − n0)` to each
//! spin channel, diagonalizes over a [`sampling::SamplingSet`] and iterates
//! the densities to self-consistency. Converged solutions are kept in a
//! [`store::ResultStore`] keyed by a hash of the model parameters.
//!
//! ```no_run
//! use hubbard_rs::geometry::{Geometry, Species, Vector3D};
//! use hubbard_rs::model::{SiteModel, TightBindingParams};
//! use hubbard_rs::sampling::SamplingSet;
//! use hubbard_rs::scf::{ConvergenceOptions, ElectronCounts, ScfEngine};
//!
//! # fn main() -> anyhow::Result<()> {
//! let mut geometry = Geometry::new();
//! geometry.add_site(Species::Carbon, Vector3D::new(0.0, 0.0, 0.0))?;
//! geometry.add_site(Species::Carbon, Vector3D::new(1.42, 0.0, 0.0))?;
//!
//! let model = SiteModel::new(geometry, TightBindingParams::default())?;
//! let electrons = ElectronCounts::neutral(model.neutral_electron_count());
//! let mut engine = ScfEngine::new(model, SamplingSet::gamma(), 3.5, electrons)?;
//! let report = engine.converge(&ConvergenceOptions::default(), None)?;
//! println!("Etot = {:.6} eV", report.total_energy);
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod geometry;
pub mod model;
pub mod sampling;
pub mod scf;
pub mod solver;
pub mod store;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const AUTHORS: &str = env!("CARGO_PKG_AUTHORS");

pub use model::{SiteModel, Spin, TightBindingParams};
pub use scf::{ConvergenceOptions, ElectronCounts, ScfEngine, ScfError};
pub use store::{MemoryStore, ResultStore, TableStore};
