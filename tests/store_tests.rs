/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

use approx::assert_relative_eq;
use hubbard_rs::geometry::{Geometry, Species, Vector3D};
use hubbard_rs::model::{SiteModel, TightBindingParams};
use hubbard_rs::sampling::SamplingSet;
use hubbard_rs::scf::{ConvergenceOptions, ElectronCounts, ScfEngine, ScfError};
use hubbard_rs::store::{MemoryStore, Record, ResultStore, StoreError, TableStore};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::Duration;
use tempfile::tempdir;

fn line(params: TightBindingParams, coulomb: f64) -> ScfEngine {
    let mut geometry = Geometry::new();
    for i in 0..4 {
        geometry
            .add_site(Species::Carbon, Vector3D::new(1.42 * i as f64, 0.0, 0.0))
            .unwrap();
    }
    let model = SiteModel::new(geometry, params).unwrap();
    ScfEngine::new(model, SamplingSet::gamma(), coulomb, ElectronCounts::new(2, 2)).unwrap()
}

fn chain(coulomb: f64) -> ScfEngine {
    line(TightBindingParams::nearest_neighbor(2.7), coulomb)
}

fn converged(coulomb: f64) -> ScfEngine {
    let mut engine = chain(coulomb);
    engine.randomize(&mut StdRng::seed_from_u64(1)).unwrap();
    engine
        .converge(&ConvergenceOptions::default(), None)
        .unwrap();
    engine
}

#[test]
fn test_table_round_trip_is_bit_identical() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("results.json");
    let engine = converged(2.0);

    let mut store = TableStore::open(&path).unwrap();
    let key = engine.save(&mut store).unwrap();

    let reopened = TableStore::open(&path).unwrap();
    let record = reopened.load(key).unwrap().expect("record was saved");
    assert_eq!(record, engine.record());
    assert_eq!(record.total_energy.to_bits(), engine.total_energy().to_bits());
}

#[test]
fn test_engine_restores_saved_solution() {
    let dir = tempdir().unwrap();
    let mut store = TableStore::open(dir.path().join("results.json")).unwrap();
    let original = converged(2.0);
    original.save(&mut store).unwrap();

    let mut fresh = chain(2.0);
    assert!(fresh.restore(&store).unwrap());
    for i in 0..4 {
        assert_relative_eq!(
            fresh.density().up()[i],
            original.density().up()[i],
            epsilon = 1e-12
        );
        assert_relative_eq!(
            fresh.density().down()[i],
            original.density().down()[i],
            epsilon = 1e-12
        );
    }
    assert_eq!(fresh.total_energy(), original.total_energy());

    // already at the fixed point
    let step = fresh.iterate(1.0).unwrap();
    assert!(step.density_change < 1e-9);
}

#[test]
fn test_cache_miss_leaves_state_untouched() {
    let mut store = MemoryStore::new();
    converged(2.0).save(&mut store).unwrap();

    let mut other = chain(2.5);
    let before = other.density().clone();
    assert!(!other.restore(&store).unwrap());
    assert_eq!(other.density(), &before);
}

#[test]
fn test_shell_radii_separate_stored_solutions() {
    let mut store = MemoryStore::new();
    let mut reference = line(TightBindingParams::default(), 2.0);
    reference.randomize(&mut StdRng::seed_from_u64(2)).unwrap();
    reference
        .converge(&ConvergenceOptions::default(), None)
        .unwrap();
    reference.save(&mut store).unwrap();

    // the wider third shell reaches the chain ends
    let wide = TightBindingParams {
        shell_radii: [0.1, 1.6, 3.0, 4.5],
        ..TightBindingParams::default()
    };
    let mut other = line(wide, 2.0);
    assert_eq!(reference.model().hamiltonian().element(0, 3), Some(0.0));
    assert_relative_eq!(
        other.model().hamiltonian().element(0, 3).unwrap(),
        -0.18,
        epsilon = 1e-12
    );
    assert_ne!(other.parameter_key(), reference.parameter_key());
    assert!(!other.restore(&store).unwrap());
}

#[test]
fn test_save_after_killed_writer() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("results.json");
    let mut store = TableStore::open(&path)
        .unwrap()
        .with_lock_timeout(Duration::from_millis(200));
    // lock file left behind by a writer that never ran its cleanup
    std::fs::write(dir.path().join("results.json.lock"), "").unwrap();

    let engine = converged(2.0);
    let key = engine.save(&mut store).unwrap();
    assert!(store.load(key).unwrap().is_some());
}

#[test]
fn test_save_overwrites_first_match() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("results.json");
    let mut store = TableStore::open(&path).unwrap();

    let mut engine = chain(1.0);
    engine.iterate(0.1).unwrap();
    let key = engine.save(&mut store).unwrap();
    engine.iterate(1.0).unwrap();
    engine.save(&mut store).unwrap();
    converged(3.0).save(&mut store).unwrap();

    assert_eq!(store.len().unwrap(), 2);
    let record = store.load(key).unwrap().unwrap();
    assert_eq!(record.total_energy, engine.total_energy());
}

#[test]
fn test_restore_rejects_wrong_site_count() {
    let mut store = MemoryStore::new();
    let mut engine = chain(2.0);
    store
        .save(Record {
            key: engine.parameter_key(),
            coulomb: 2.0,
            electrons_up: 2,
            electrons_down: 2,
            density_up: vec![1.0, 1.0],
            density_down: vec![1.0, 1.0],
            total_energy: -1.0,
        })
        .unwrap();

    assert!(matches!(
        engine.restore(&store),
        Err(ScfError::Store(StoreError::SiteCountMismatch {
            expected: 4,
            found: 2
        }))
    ));
}

#[test]
fn test_converge_checkpoints_into_store() {
    let mut store = MemoryStore::new();
    let mut engine = chain(2.0);
    engine.randomize(&mut StdRng::seed_from_u64(4)).unwrap();
    let options = ConvergenceOptions {
        checkpoint_interval: 1,
        ..ConvergenceOptions::default()
    };

    engine
        .converge(&options, Some(&mut store as &mut dyn ResultStore))
        .unwrap();

    assert_eq!(store.len(), 1);
    let record = store.load(engine.parameter_key()).unwrap().unwrap();
    assert_eq!(record.density_up, engine.density().up().to_vec());
}
