/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Tight-binding site model
//!
//! [`SiteModel`] owns the geometry and the spin-independent backbone
//! Hamiltonian H0. On-site energies come from the species offsets; hoppings
//! are assigned shell by shell, every pair going to the innermost radius band
//! that contains its distance. Second and third shells are skipped when their
//! amplitude is zero.

mod errors;
mod hamiltonian;
mod params;
mod spin;

pub use errors::{ModelError, Result};
pub use hamiltonian::{HamiltonianBuilder, Hopping, SparseHamiltonian};
pub use params::TightBindingParams;
pub use spin::{Spin, SpinHamiltonianPair};

use crate::geometry::{Geometry, Species};
use log::{debug, info};
use ndarray::Array1;
use std::collections::VecDeque;

/// Sites plus the backbone Hamiltonian built from them
#[derive(Debug, Clone)]
pub struct SiteModel {
    geometry: Geometry,
    params: TightBindingParams,
    hamiltonian: SparseHamiltonian,
    reference_charge: Array1<f64>,
    nearest: Vec<Vec<usize>>,
}

impl SiteModel {
    /// Build H0 for `geometry`
    pub fn new(geometry: Geometry, params: TightBindingParams) -> Result<Self> {
        params.validate()?;
        if geometry.is_empty() {
            return Err(ModelError::EmptyGeometry);
        }

        let n = geometry.site_count();
        let hoppings = params.hoppings();
        let mut builder = HamiltonianBuilder::new(n);
        let mut nearest = vec![Vec::new(); n];

        for site in geometry.sites() {
            let i = site.index();
            builder.set_onsite(i, params.onsite(site.species()))?;

            let bands = geometry.close(i, &params.shell_radii)?;
            for (shell, band) in bands.iter().enumerate().skip(1) {
                let amplitude = hoppings[shell - 1];
                if shell == 1 {
                    nearest[i] = band.iter().map(|nb| nb.index).collect();
                    nearest[i].sort_unstable();
                    nearest[i].dedup();
                }
                if amplitude == 0.0 {
                    continue;
                }
                for neighbor in band {
                    builder.set_hopping(i, neighbor.index, neighbor.image, -amplitude)?;
                }
            }
        }

        let hamiltonian = builder.finalize()?;
        let reference_charge: Array1<f64> = geometry
            .sites()
            .iter()
            .map(|s| s.species().reference_charge())
            .collect();

        info!(
            "Found {} pz sites ({} B, {} C, {} N), {} model",
            n,
            geometry.count_species(Species::Boron),
            geometry.count_species(Species::Carbon),
            geometry.count_species(Species::Nitrogen),
            params.neighbor_model()
        );
        debug!("Backbone Hamiltonian has {} hopping entries", hamiltonian.hoppings().len());

        Ok(Self {
            geometry,
            params,
            hamiltonian,
            reference_charge,
            nearest,
        })
    }

    pub fn site_count(&self) -> usize {
        self.geometry.site_count()
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn params(&self) -> &TightBindingParams {
        &self.params
    }

    /// Spin-independent backbone H0
    pub fn hamiltonian(&self) -> &SparseHamiltonian {
        &self.hamiltonian
    }

    /// Neutral-atom pi charge n0 per site
    pub fn reference_charge(&self) -> &Array1<f64> {
        &self.reference_charge
    }

    /// Total number of pi electrons of the neutral system
    pub fn neutral_electron_count(&self) -> usize {
        self.reference_charge.sum().round() as usize
    }

    /// First-shell neighbors of `site` (across lattice images, deduplicated)
    pub fn nearest_neighbors(&self, site: usize) -> &[usize] {
        self.nearest.get(site).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Two-colour the nearest-neighbor graph; `true` marks sublattice A
    pub fn sublattices(&self) -> Result<Vec<bool>> {
        let n = self.site_count();
        let mut colour: Vec<Option<bool>> = vec![None; n];
        let mut queue = VecDeque::new();

        for start in 0..n {
            if colour[start].is_some() {
                continue;
            }
            colour[start] = Some(true);
            queue.push_back(start);
            while let Some(site) = queue.pop_front() {
                let here = colour[site].unwrap_or(true);
                for &neighbor in &self.nearest[site] {
                    match colour[neighbor] {
                        None => {
                            colour[neighbor] = Some(!here);
                            queue.push_back(neighbor);
                        }
                        Some(c) if c == here => return Err(ModelError::NotBipartite(site)),
                        Some(_) => {}
                    }
                }
            }
        }
        Ok(colour.into_iter().map(|c| c.unwrap_or(true)).collect())
    }

    /// Run label `<name>-<1NN|3NN>-U<100·U>`
    pub fn label(&self, name: &str, coulomb: f64) -> String {
        format!(
            "{}-{}-U{:03}",
            name,
            self.params.neighbor_model(),
            (coulomb * 100.0).round() as i64
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Vector3D;
    use approx::assert_relative_eq;

    fn ring(n: usize, species: &[Species]) -> Geometry {
        let bond = 1.42;
        let radius = bond / (2.0 * (std::f64::consts::PI / n as f64).sin());
        let mut geometry = Geometry::new();
        for i in 0..n {
            let angle = 2.0 * std::f64::consts::PI * i as f64 / n as f64;
            geometry
                .add_site(
                    species[i % species.len()],
                    Vector3D::new(radius * angle.cos(), radius * angle.sin(), 0.0),
                )
                .unwrap();
        }
        geometry
    }

    #[test]
    fn test_benzene_backbone() {
        let model = SiteModel::new(ring(6, &[Species::Carbon]), TightBindingParams::default()).unwrap();
        let h = model.hamiltonian();

        assert_eq!(model.site_count(), 6);
        assert_eq!(model.neutral_electron_count(), 6);
        // ortho 1.42, meta 2.46, para 2.84 Å
        assert_relative_eq!(h.element(0, 1).unwrap(), -2.7, epsilon = 1e-12);
        assert_relative_eq!(h.element(0, 2).unwrap(), -0.2, epsilon = 1e-12);
        assert_relative_eq!(h.element(0, 3).unwrap(), -0.18, epsilon = 1e-12);
        assert_relative_eq!(h.element(0, 0).unwrap(), 0.0, epsilon = 1e-12);
        assert_eq!(model.nearest_neighbors(0), &[1, 5]);
    }

    #[test]
    fn test_onsite_offsets_and_label() {
        let params = TightBindingParams::nearest_neighbor(2.7);
        let model = SiteModel::new(ring(6, &[Species::Boron, Species::Nitrogen]), params).unwrap();
        let h = model.hamiltonian();

        assert_eq!(h.element(0, 0), Some(3.0));
        assert_eq!(h.element(1, 1), Some(-3.0));
        assert_eq!(h.element(0, 2), Some(0.0));
        assert_eq!(model.neutral_electron_count(), 6);
        assert_eq!(model.label("borazine", 3.5), "borazine-1NN-U350");
    }

    #[test]
    fn test_sublattices() {
        let benzene = SiteModel::new(ring(6, &[Species::Carbon]), TightBindingParams::default()).unwrap();
        let colours = benzene.sublattices().unwrap();
        assert_eq!(colours, vec![true, false, true, false, true, false]);

        let cyclopentadienyl = SiteModel::new(ring(5, &[Species::Carbon]), TightBindingParams::default()).unwrap();
        assert!(matches!(cyclopentadienyl.sublattices(), Err(ModelError::NotBipartite(_))));
    }

    #[test]
    fn test_empty_geometry() {
        assert!(matches!(
            SiteModel::new(Geometry::new(), TightBindingParams::default()),
            Err(ModelError::EmptyGeometry)
        ));
    }
}
