/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Command Line Interface (CLI) module
//!
//! Loads a run file, applies command-line overrides, restores or seeds the
//! starting density, converges it and prints the result.

use crate::config::{InitialDensity, RunConfig};
use crate::model::Spin;
use crate::scf::{ConvergenceReport, ScfEngine};
use crate::store::{ResultStore, TableStore};
use anyhow::{bail, Context, Result};
use clap::Parser;
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;

/// Self-consistent mean-field Hubbard model
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the JSON run file
    pub config: PathBuf,

    /// Override the on-site Coulomb repulsion U (eV)
    #[arg(short = 'u', long)]
    pub coulomb: Option<f64>,

    /// Override the convergence tolerance
    #[arg(long)]
    pub tolerance: Option<f64>,

    /// Override the iteration cap
    #[arg(long)]
    pub max_iterations: Option<usize>,

    /// Override the number of electrons moved from down to up
    #[arg(short, long, allow_hyphen_values = true)]
    pub polarization: Option<i64>,

    /// Seed of the random starting density
    #[arg(long)]
    pub seed: Option<u64>,

    /// Starting density when nothing is stored
    #[arg(long, value_enum)]
    pub initial: Option<InitialDensity>,

    /// Override the result table path
    #[arg(short, long)]
    pub store: Option<PathBuf>,

    /// Do not read or write a result table
    #[arg(long, conflicts_with = "store")]
    pub no_store: bool,

    /// Print per-site densities
    #[arg(long)]
    pub sites: bool,
}

impl Args {
    /// Apply command-line overrides on top of the run file
    pub fn apply(&self, config: &mut RunConfig) {
        if let Some(u) = self.coulomb {
            info!("Overriding U with: {}", u);
            config.coulomb = u;
        }
        if let Some(tolerance) = self.tolerance {
            config.scf.convergence.tolerance = tolerance;
        }
        if let Some(cap) = self.max_iterations {
            config.scf.convergence.max_iterations = cap;
        }
        if let Some(p) = self.polarization {
            config.polarization = p;
        }
        if let Some(seed) = self.seed {
            config.scf.seed = Some(seed);
        }
        if let Some(initial) = self.initial {
            config.scf.initial = initial;
        }
        if let Some(path) = &self.store {
            config.store = Some(path.clone());
        }
        if self.no_store {
            config.store = None;
        }
    }
}

/// Run one calculation described by `args`
pub fn run(args: &Args) -> Result<()> {
    let mut config = RunConfig::from_file(&args.config)
        .with_context(|| format!("Unable to load run file {}", args.config.display()))?;
    args.apply(&mut config);
    config.validate().context("Invalid settings after overrides")?;

    let model = config.model().context("Failed to build the site model")?;
    let label = model.label(&config.name, config.coulomb);
    info!("Model {}: {} sites", label, model.site_count());

    let electrons = config.electron_counts(&model);
    let sampling = config.sampling()?;
    let mut engine = ScfEngine::new(model, sampling, config.coulomb, electrons)?;
    if config.polarization != 0 {
        engine.polarize(config.polarization)?;
    }

    let mut store = match &config.store {
        Some(path) => Some(
            TableStore::open(path)
                .with_context(|| format!("Unable to open result table {}", path.display()))?,
        ),
        None => None,
    };

    let restored = match &store {
        Some(table) => engine.restore(table)?,
        None => false,
    };
    if !restored {
        seed_density(&mut engine, &config)?;
    }

    let options = config.convergence();
    let outcome = engine.converge(&options, store.as_mut().map(|s| s as &mut dyn ResultStore));
    let report = match outcome {
        Ok(report) => report,
        Err(e) if e.is_non_convergence() => {
            if let Some(table) = store.as_mut() {
                engine.save(table)?;
            }
            bail!("{}: {}", label, e);
        }
        Err(e) => return Err(e).with_context(|| format!("SCF failed for {}", label)),
    };

    if let Some(table) = store.as_mut() {
        engine.save(table)?;
    }

    print_summary(&engine, &label, &report, args.sites);
    Ok(())
}

fn seed_density(engine: &mut ScfEngine, config: &RunConfig) -> Result<()> {
    match config.scf.initial {
        InitialDensity::Random => {
            let mut rng = match config.scf.seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };
            engine.randomize(&mut rng)?;
        }
        InitialDensity::Uniform => {}
        InitialDensity::Sublattices => engine
            .polarize_sublattices()
            .context("Sublattice start needs a bipartite structure")?,
    }
    Ok(())
}

fn print_summary(engine: &ScfEngine, label: &str, report: &ConvergenceReport, sites: bool) {
    let electrons = engine.electrons();
    let magnetization: f64 = engine.polarization().sum();
    let moments = engine.polarization();
    let largest = moments.iter().fold(0.0_f64, |acc, m| acc.max(m.abs()));

    println!("{}", label);
    println!("-----------------------------------------------------------");
    println!("Electrons (up, down):  ({}, {})", electrons.up, electrons.down);
    println!("Iterations:            {}", report.iterations);
    println!("Density change:        {:.3e}", report.density_change);
    println!("Total energy:          {:.10} eV", report.total_energy);
    println!("Midgap:                {:.6} eV", report.midgap);
    println!("Net magnetization:     {:.6}", magnetization);
    println!("Largest site moment:   {:.6}", largest);

    if sites {
        println!();
        println!("{:>5} {:>3} {:>10} {:>10} {:>10}", "site", "", "n_up", "n_down", "m");
        let density = engine.density();
        for site in engine.model().geometry().sites() {
            let i = site.index();
            println!(
                "{:>5} {:>3} {:>10.6} {:>10.6} {:>10.6}",
                i,
                site.species(),
                density.get(Spin::Up)[i],
                density.get(Spin::Down)[i],
                moments[i]
            );
        }
    }
}
