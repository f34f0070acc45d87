/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Mean-field self-consistency loop

use super::density::{density_change, DensityState, ElectronCounts};
use super::errors::{Result, ScfError};
use super::mixing::{linear_mix, MixingSchedule};
use crate::model::{SiteModel, Spin, SpinHamiltonianPair};
use crate::sampling::SamplingSet;
use crate::solver::{Eigensolver, FaerEigensolver, Spectrum};
use crate::store::{ParameterKey, ParameterSet, Record, ResultStore, StoreError, StructureKey};
use log::{debug, info, warn};
use ndarray::Array1;
use rand::Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Controls for [`ScfEngine::converge`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvergenceOptions {
    /// Stop once the density change is at or below this value
    pub tolerance: f64,
    /// Save to the store every this many iterations (0 disables)
    pub checkpoint_interval: usize,
    /// Iteration cap
    pub max_iterations: usize,
    pub mixing: MixingSchedule,
}

impl Default for ConvergenceOptions {
    fn default() -> Self {
        Self {
            tolerance: 1e-10,
            checkpoint_interval: 100,
            max_iterations: 10_000,
            mixing: MixingSchedule::default(),
        }
    }
}

impl ConvergenceOptions {
    pub fn validate(&self) -> Result<()> {
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(ScfError::Configuration(format!(
                "tolerance must be positive, got {}",
                self.tolerance
            )));
        }
        if self.max_iterations == 0 {
            return Err(ScfError::Configuration(
                "iteration cap must be at least 1".to_string(),
            ));
        }
        self.mixing.validate()
    }
}

/// Outcome of one [`ScfEngine::iterate`] step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Iteration {
    /// `Σ|nup_old − nup_new|` before mixing
    pub density_change: f64,
    pub total_energy: f64,
    pub midgap: f64,
}

/// Outcome of a converged [`ScfEngine::converge`] run
#[derive(Debug, Clone, PartialEq)]
pub struct ConvergenceReport {
    pub iterations: usize,
    pub density_change: f64,
    pub total_energy: f64,
    pub midgap: f64,
    /// Density change of every iteration
    pub history: Vec<f64>,
}

/// Contribution of one sampling point
struct PointContribution {
    up: Array1<f64>,
    down: Array1<f64>,
    homo: Option<f64>,
    lumo: Option<f64>,
    band_energy: f64,
}

/// Self-consistent field driver for one site model
#[derive(Debug)]
pub struct ScfEngine<S: Eigensolver = FaerEigensolver> {
    model: SiteModel,
    sampling: SamplingSet,
    solver: S,
    coulomb: f64,
    electrons: ElectronCounts,
    density: DensityState,
    hamiltonians: SpinHamiltonianPair,
}

impl ScfEngine<FaerEigensolver> {
    /// Engine with a uniform starting density and the dense faer solver
    pub fn new(
        model: SiteModel,
        sampling: SamplingSet,
        coulomb: f64,
        electrons: ElectronCounts,
    ) -> Result<Self> {
        Self::with_solver(model, sampling, coulomb, electrons, FaerEigensolver::new())
    }
}

impl<S: Eigensolver> ScfEngine<S> {
    pub fn with_solver(
        model: SiteModel,
        sampling: SamplingSet,
        coulomb: f64,
        electrons: ElectronCounts,
        solver: S,
    ) -> Result<Self> {
        if !coulomb.is_finite() {
            return Err(ScfError::Configuration(format!(
                "Coulomb repulsion must be finite, got {}",
                coulomb
            )));
        }
        let sites = model.site_count();
        electrons.check_capacity(sites)?;

        let density = DensityState::uniform(sites, electrons);
        let hamiltonians = SpinHamiltonianPair::derive(
            model.hamiltonian(),
            density.up(),
            density.down(),
            coulomb,
            model.reference_charge(),
        )?;

        info!(
            "SCF engine: {} sites, {} sampling points, U = {:.3} eV, (Nup, Ndn) = ({}, {})",
            sites,
            sampling.len(),
            coulomb,
            electrons.up,
            electrons.down
        );

        Ok(Self {
            model,
            sampling,
            solver,
            coulomb,
            electrons,
            density,
            hamiltonians,
        })
    }

    pub fn model(&self) -> &SiteModel {
        &self.model
    }

    pub fn sampling(&self) -> &SamplingSet {
        &self.sampling
    }

    pub fn coulomb(&self) -> f64 {
        self.coulomb
    }

    pub fn electrons(&self) -> ElectronCounts {
        self.electrons
    }

    pub fn density(&self) -> &DensityState {
        &self.density
    }

    pub fn hamiltonians(&self) -> &SpinHamiltonianPair {
        &self.hamiltonians
    }

    pub fn total_energy(&self) -> f64 {
        self.density.total_energy()
    }

    pub fn midgap(&self) -> f64 {
        self.density.midgap()
    }

    /// Spin polarization `nup − ndn` per site
    pub fn polarization(&self) -> Array1<f64> {
        self.density.polarization()
    }

    pub fn parameters(&self) -> ParameterSet {
        let params = self.model.params();
        ParameterSet {
            hoppings: params.hoppings(),
            shell_radii: params.shell_radii,
            coulomb: self.coulomb,
            onsite_boron: params.onsite_boron,
            onsite_nitrogen: params.onsite_nitrogen,
            electrons_up: self.electrons.up,
            electrons_down: self.electrons.down,
            structure: StructureKey::from_geometry(self.model.geometry()),
        }
    }

    pub fn parameter_key(&self) -> ParameterKey {
        ParameterKey::from_parameters(&self.parameters())
    }

    /// Replace the occupations; they are normalised to the electron counts
    pub fn set_density(&mut self, up: Array1<f64>, down: Array1<f64>) -> Result<()> {
        self.check_sites(up.len())?;
        self.density = DensityState::from_occupations(up, down, self.electrons)?;
        self.refresh_hamiltonians()
    }

    /// Start from uniformly random occupations
    pub fn randomize<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<()> {
        debug!("Using random density as starting point");
        self.density = DensityState::random(self.model.site_count(), self.electrons, rng);
        self.refresh_hamiltonians()
    }

    /// Move `transfer` electrons from the down to the up channel
    pub fn polarize(&mut self, transfer: i64) -> Result<()> {
        let electrons = self.electrons.polarized(transfer)?;
        electrons.check_capacity(self.model.site_count())?;
        self.electrons = electrons;
        self.density.normalize(self.electrons);
        info!(
            "Polarized: (Nup, Ndn) = ({}, {})",
            self.electrons.up, self.electrons.down
        );
        self.refresh_hamiltonians()
    }

    /// Put a full up electron on every site of `up_sites` and a full down
    /// electron on every site of `down_sites`, then renormalise
    pub fn polarize_sites(&mut self, up_sites: &[usize], down_sites: &[usize]) -> Result<()> {
        let sites = self.model.site_count();
        if let Some(bad) = up_sites.iter().chain(down_sites).find(|&&i| i >= sites) {
            return Err(ScfError::Configuration(format!(
                "site {} out of range for {} sites",
                bad, sites
            )));
        }
        for (targets, spin) in [(up_sites, Spin::Up), (down_sites, Spin::Down)] {
            for &i in targets {
                self.density.site_mut(spin)[i] = 1.0;
                self.density.site_mut(spin.opposite())[i] = 0.0;
            }
        }
        self.density.normalize(self.electrons);
        self.refresh_hamiltonians()
    }

    /// Antiferromagnetic start on a bipartite nearest-neighbour graph
    pub fn polarize_sublattices(&mut self) -> Result<()> {
        let colouring = self.model.sublattices()?;
        let (a, b): (Vec<usize>, Vec<usize>) =
            (0..colouring.len()).partition(|&i| colouring[i]);
        self.polarize_sites(&a, &b)
    }

    /// Change U and re-derive the spin Hamiltonians
    pub fn set_coulomb(&mut self, coulomb: f64) -> Result<()> {
        if !coulomb.is_finite() {
            return Err(ScfError::Configuration(format!(
                "Coulomb repulsion must be finite, got {}",
                coulomb
            )));
        }
        self.coulomb = coulomb;
        self.refresh_hamiltonians()
    }

    /// Eigenpairs of the `spin` Hamiltonian at sampling point `k`
    pub fn spectrum(&self, spin: Spin, k: &[f64; 3]) -> Result<Spectrum> {
        let matrix = self.hamiltonians.get(spin).bloch_matrix(k);
        Ok(self.solver.eigh(&matrix)?)
    }

    fn check_sites(&self, found: usize) -> Result<()> {
        let expected = self.model.site_count();
        if found != expected {
            return Err(ScfError::Configuration(format!(
                "density has {} sites, model has {}",
                found, expected
            )));
        }
        Ok(())
    }

    fn refresh_hamiltonians(&mut self) -> Result<()> {
        self.hamiltonians = SpinHamiltonianPair::derive(
            self.model.hamiltonian(),
            self.density.up(),
            self.density.down(),
            self.coulomb,
            self.model.reference_charge(),
        )?;
        Ok(())
    }

    fn sample_point(&self, k: &[f64; 3]) -> Result<PointContribution> {
        let up = self.spectrum(Spin::Up, k)?;
        let down = self.spectrum(Spin::Down, k)?;
        let (nu, nd) = (self.electrons.up, self.electrons.down);

        Ok(PointContribution {
            up: up.occupations(nu),
            down: down.occupations(nd),
            homo: max_level(up.highest_occupied(nu), down.highest_occupied(nd)),
            lumo: min_level(up.lowest_unoccupied(nu), down.lowest_unoccupied(nd)),
            band_energy: up.band_energy(nu) + down.band_energy(nd),
        })
    }

    /// One self-consistency step with mixing fraction `mix`.
    ///
    /// Diagonalizes both spin Hamiltonians at every sampling point in
    /// parallel, averages the occupations of the lowest `Nup`/`Ndn` states,
    /// mixes them into the current density and re-derives the Hamiltonians.
    /// The returned energy uses the densities from before mixing in the
    /// double-counting term `U·Σ nup·ndn`.
    pub fn iterate(&mut self, mix: f64) -> Result<Iteration> {
        if !(0.0..=1.0).contains(&mix) {
            return Err(ScfError::Configuration(format!(
                "mixing fraction {} outside [0, 1]",
                mix
            )));
        }

        let contributions = self
            .sampling
            .points()
            .par_iter()
            .map(|k| self.sample_point(k))
            .collect::<Result<Vec<_>>>()?;

        let n = self.model.site_count();
        let mut new_up = Array1::<f64>::zeros(n);
        let mut new_down = Array1::<f64>::zeros(n);
        let mut homo = None;
        let mut lumo = None;
        let mut band_energy = 0.0;
        for point in &contributions {
            new_up += &point.up;
            new_down += &point.down;
            homo = max_level(homo, point.homo);
            lumo = min_level(lumo, point.lumo);
            band_energy += point.band_energy;
        }
        let weight = self.sampling.weight();
        new_up *= weight;
        new_down *= weight;
        band_energy *= weight;

        let midgap = match (homo, lumo) {
            (Some(h), Some(l)) => 0.5 * (h + l),
            (Some(level), None) | (None, Some(level)) => level,
            (None, None) => 0.0,
        };

        let old_up = self.density.up();
        let old_down = self.density.down();
        let change = density_change(old_up, &new_up);
        let double_counting = self.coulomb * (old_up * old_down).sum();
        let total_energy = band_energy - double_counting;

        if !(change.is_finite() && total_energy.is_finite() && midgap.is_finite())
            || new_up.iter().chain(new_down.iter()).any(|v| !v.is_finite())
        {
            return Err(ScfError::Numerical(format!(
                "non-finite result (density change {}, Etot {}, midgap {})",
                change, total_energy, midgap
            )));
        }

        let mixed_up = linear_mix(mix, old_up, &new_up);
        let mixed_down = linear_mix(mix, old_down, &new_down);
        self.density.set_occupations(mixed_up, mixed_down);
        self.density.set_derived(total_energy, midgap);
        self.refresh_hamiltonians()?;

        debug!(
            "mix {:.2}: dn = {:.3e}, Etot = {:.10} eV, midgap = {:.6} eV",
            mix, change, total_energy, midgap
        );

        Ok(Iteration {
            density_change: change,
            total_energy,
            midgap,
        })
    }

    /// Recompute energy and midgap without changing the density
    pub fn find_midgap(&mut self) -> Result<f64> {
        Ok(self.iterate(0.0)?.midgap)
    }

    /// Iterate with adaptive mixing until the density change drops to
    /// `options.tolerance`.
    ///
    /// Every `checkpoint_interval` iterations the current state is written to
    /// `store` when one is given. With `U = 0` the spin Hamiltonians do not
    /// depend on the density, so a single undamped step reaches the fixed
    /// point and the loop stops there. Hitting the iteration cap returns
    /// [`ScfError::NonConvergence`] and leaves the last state in the engine.
    pub fn converge(
        &mut self,
        options: &ConvergenceOptions,
        mut store: Option<&mut dyn ResultStore>,
    ) -> Result<ConvergenceReport> {
        options.validate()?;
        info!(
            "Converging {} (tolerance {:.1e})",
            self.parameters(),
            options.tolerance
        );

        let non_interacting = self.coulomb == 0.0;
        let mut history = Vec::new();
        let mut last = Iteration {
            density_change: f64::INFINITY,
            total_energy: self.density.total_energy(),
            midgap: self.density.midgap(),
        };

        for iteration in 1..=options.max_iterations {
            let mix = if non_interacting {
                1.0
            } else {
                options.mixing.fraction(last.density_change)
            };
            last = self.iterate(mix)?;
            history.push(last.density_change);

            if options.checkpoint_interval > 0 && iteration % options.checkpoint_interval == 0 {
                info!(
                    "   {} iterations, dn = {:.3e}",
                    iteration, last.density_change
                );
                if let Some(store) = store.as_mut() {
                    self.save(&mut **store)?;
                }
            }

            if non_interacting || last.density_change <= options.tolerance {
                info!(
                    "   found solution in {} iterations: Etot = {:.10} eV",
                    iteration, last.total_energy
                );
                return Ok(ConvergenceReport {
                    iterations: iteration,
                    density_change: last.density_change,
                    total_energy: last.total_energy,
                    midgap: last.midgap,
                    history,
                });
            }
        }

        warn!(
            "No convergence after {} iterations (dn = {:.3e})",
            options.max_iterations, last.density_change
        );
        Err(ScfError::NonConvergence {
            iterations: options.max_iterations,
            density_change: last.density_change,
            total_energy: last.total_energy,
        })
    }

    /// Snapshot of the current state as a store record
    pub fn record(&self) -> Record {
        Record {
            key: self.parameter_key(),
            coulomb: self.coulomb,
            electrons_up: self.electrons.up,
            electrons_down: self.electrons.down,
            density_up: self.density.up().to_vec(),
            density_down: self.density.down().to_vec(),
            total_energy: self.density.total_energy(),
        }
    }

    /// Write the current state under its parameter key
    pub fn save<T: ResultStore + ?Sized>(&self, store: &mut T) -> Result<ParameterKey> {
        let record = self.record();
        let key = record.key;
        store.save(record)?;
        info!(
            "Saved (U, Nup, Ndn) = ({:.2}, {}, {}) as {}",
            self.coulomb, self.electrons.up, self.electrons.down, key
        );
        Ok(key)
    }

    /// Load the stored solution for the current parameters.
    ///
    /// Returns `false` on a cache miss, leaving the state untouched.
    pub fn restore<T: ResultStore + ?Sized>(&mut self, store: &T) -> Result<bool> {
        let key = self.parameter_key();
        let Some(record) = store.load(key)? else {
            warn!("No stored solution for {} ({})", self.parameters(), key);
            return Ok(false);
        };

        let expected = self.model.site_count();
        for found in [record.density_up.len(), record.density_down.len()] {
            if found != expected {
                return Err(StoreError::SiteCountMismatch { expected, found }.into());
            }
        }

        let midgap = self.density.midgap();
        self.density = DensityState::from_occupations(
            Array1::from(record.density_up),
            Array1::from(record.density_down),
            self.electrons,
        )?;
        self.density.set_derived(record.total_energy, midgap);
        self.refresh_hamiltonians()?;
        info!("Restored solution {} (Etot = {:.10} eV)", key, record.total_energy);
        Ok(true)
    }
}

fn max_level(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (Some(x), Some(y)) => Some(x.max(y)),
        (x, None) => x,
        (None, y) => y,
    }
}

fn min_level(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (Some(x), Some(y)) => Some(x.min(y)),
        (x, None) => x,
        (None, y) => y,
    }
}
