/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Content-addressed keys for stored solutions
//!
//! Every parameter is scaled to a fixed-point integer (micro-units) and fed
//! to SHA-256 in little-endian order behind a domain tag; the first eight
//! digest bytes form the key. The encoding never formats floats as text, so
//! keys are identical on every platform.
//!
//! The site species, positions and lattice enter through a
//! [`StructureKey`], so two structures never share a stored solution even
//! when their tight-binding parameters agree.

use crate::geometry::Geometry;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

const DOMAIN_TAG: &[u8] = b"hubbard-rs/parameter-key/v2";
const STRUCTURE_TAG: &[u8] = b"hubbard-rs/structure-key/v1";
const FIXED_POINT_SCALE: f64 = 1e6;

/// The physical parameters that identify one solution
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterSet {
    pub hoppings: [f64; 3],
    /// On-site, 1st, 2nd and 3rd neighbor radius
    pub shell_radii: [f64; 4],
    pub coulomb: f64,
    pub onsite_boron: f64,
    pub onsite_nitrogen: f64,
    pub electrons_up: usize,
    pub electrons_down: usize,
    pub structure: StructureKey,
}

impl fmt::Display for ParameterSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "t1={:.2} t2={:.2} t3={:.2} U={:.2} eB={:.2} eN={:.2} Nup={} Ndn={} structure={}",
            self.hoppings[0],
            self.hoppings[1],
            self.hoppings[2],
            self.coulomb,
            self.onsite_boron,
            self.onsite_nitrogen,
            self.electrons_up,
            self.electrons_down,
            self.structure
        )
    }
}

/// 64-bit digest of the sites and lattice of a [`Geometry`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StructureKey(u64);

impl StructureKey {
    pub fn from_geometry(geometry: &Geometry) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(STRUCTURE_TAG);
        hasher.update((geometry.site_count() as u64).to_le_bytes());
        for site in geometry.sites() {
            hasher.update(site.species().atomic_number().to_le_bytes());
            for x in <[f64; 3]>::from(*site.position()) {
                hasher.update(fixed_point(x).to_le_bytes());
            }
        }
        match geometry.lattice() {
            Some(lattice) => {
                hasher.update([1u8]);
                for vector in lattice.vectors() {
                    for x in <[f64; 3]>::from(*vector) {
                        hasher.update(fixed_point(x).to_le_bytes());
                    }
                }
                for periodic in lattice.periodic() {
                    hasher.update([u8::from(periodic)]);
                }
            }
            None => hasher.update([0u8]),
        }
        Self(truncate(hasher))
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for StructureKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// 64-bit digest of a [`ParameterSet`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterKey(pub(crate) u64);

impl ParameterKey {
    pub fn from_parameters(parameters: &ParameterSet) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(DOMAIN_TAG);
        for value in parameters
            .hoppings
            .iter()
            .chain(&parameters.shell_radii)
            .chain(&[
                parameters.coulomb,
                parameters.onsite_boron,
                parameters.onsite_nitrogen,
            ])
        {
            hasher.update(fixed_point(*value).to_le_bytes());
        }
        hasher.update((parameters.electrons_up as u64).to_le_bytes());
        hasher.update((parameters.electrons_down as u64).to_le_bytes());
        hasher.update(parameters.structure.value().to_le_bytes());
        Self(truncate(hasher))
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

fn fixed_point(value: f64) -> i64 {
    (value * FIXED_POINT_SCALE).round() as i64
}

/// First eight digest bytes, big-endian
fn truncate(hasher: Sha256) -> u64 {
    let digest = hasher.finalize();
    let mut head = [0u8; 8];
    head.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(head)
}

impl fmt::Display for ParameterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

impl FromStr for ParameterKey {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        u64::from_str_radix(s, 16).map(ParameterKey)
    }
}
