/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Sites of the pi-network and their chemical species

use super::errors::{GeometryError, Result};
use super::vector::Vector3D;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Chemical species carrying one pz orbital in the conjugated network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Species {
    Boron,
    Carbon,
    Nitrogen,
}

impl Species {
    /// Create a species from its atomic number
    pub fn from_atomic_number(z: i32) -> Result<Self> {
        match z {
            5 => Ok(Species::Boron),
            6 => Ok(Species::Carbon),
            7 => Ok(Species::Nitrogen),
            _ => Err(GeometryError::UnsupportedAtomicNumber(z)),
        }
    }

    pub fn atomic_number(&self) -> i32 {
        match self {
            Species::Boron => 5,
            Species::Carbon => 6,
            Species::Nitrogen => 7,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Species::Boron => "B",
            Species::Carbon => "C",
            Species::Nitrogen => "N",
        }
    }

    /// Number of pi electrons contributed by the neutral atom
    ///
    /// Boron donates none, carbon one and pyridinic/graphitic nitrogen two.
    pub fn reference_charge(&self) -> f64 {
        f64::from(self.atomic_number() - 5)
    }
}

impl FromStr for Species {
    type Err = GeometryError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "B" | "b" | "boron" | "Boron" => Ok(Species::Boron),
            "C" | "c" | "carbon" | "Carbon" => Ok(Species::Carbon),
            "N" | "n" | "nitrogen" | "Nitrogen" => Ok(Species::Nitrogen),
            other => Err(GeometryError::UnknownSpecies(other.to_string())),
        }
    }
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A single site of the network
#[derive(Debug, Clone, PartialEq)]
pub struct Site {
    index: usize,
    species: Species,
    position: Vector3D,
}

impl Site {
    pub(crate) fn new(index: usize, species: Species, position: Vector3D) -> Self {
        Self {
            index,
            species,
            position,
        }
    }

    /// Position of the site in the geometry's ordering
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn species(&self) -> Species {
        self.species
    }

    pub fn position(&self) -> &Vector3D {
        &self.position
    }
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} #{} at {}", self.species, self.index, self.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_species_lookup() {
        assert_eq!(Species::from_atomic_number(6).unwrap(), Species::Carbon);
        assert_eq!("N".parse::<Species>().unwrap(), Species::Nitrogen);
        assert_eq!(Species::Boron.symbol(), "B");
        assert!(Species::from_atomic_number(1).is_err());
        assert!("H".parse::<Species>().is_err());
    }

    #[test]
    fn test_reference_charge() {
        assert_eq!(Species::Boron.reference_charge(), 0.0);
        assert_eq!(Species::Carbon.reference_charge(), 1.0);
        assert_eq!(Species::Nitrogen.reference_charge(), 2.0);
    }
}
