/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Self-consistent field solution of the mean-field Hubbard model
//!
//! [`ScfEngine`] owns a [`crate::model::SiteModel`], a sampling set and the
//! current [`DensityState`]. Each [`ScfEngine::iterate`] step diagonalizes
//! the spin Hamiltonians at every sampling point, fills the lowest states,
//! and linearly mixes the resulting occupations into the density;
//! [`ScfEngine::converge`] repeats this with an adaptive mixing fraction.

mod density;
mod engine;
pub mod errors;
mod mixing;

pub use density::{density_change, DensityState, ElectronCounts};
pub use engine::{ConvergenceOptions, ConvergenceReport, Iteration, ScfEngine};
pub use errors::{Result, ScfError};
pub use mixing::{linear_mix, MixingSchedule};
