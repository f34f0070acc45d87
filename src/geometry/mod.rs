/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Site geometry module
//!
//! Sites, species and neighbor queries consumed by the tight-binding model.
//! Parsing structure files and selecting the pi sites is left to the caller.

pub mod errors;
mod site;
mod structure;
mod vector;

pub use errors::{GeometryError, Result};
pub use site::{Site, Species};
pub use structure::{Geometry, ImageOffset, Lattice, Neighbor};
pub use vector::Vector3D;
