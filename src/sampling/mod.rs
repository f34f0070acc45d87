/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Sampling points of the periodic domain
//!
//! Points are fractional coordinates in the reciprocal cell. A molecule is
//! sampled at the origin only.

mod errors;

pub use errors::{Result, SamplingError};

use std::fmt;

/// Fixed list of sampling points, each with equal weight
#[derive(Debug, Clone, PartialEq)]
pub struct SamplingSet {
    points: Vec<[f64; 3]>,
}

impl SamplingSet {
    /// Only the origin (Γ)
    pub fn gamma() -> Self {
        Self {
            points: vec![[0.0; 3]],
        }
    }

    /// Regular mesh `k_a = i / n_a`, `i = 0..n_a`
    pub fn regular(mesh: [usize; 3]) -> Result<Self> {
        if mesh.iter().any(|&n| n == 0) {
            return Err(SamplingError::EmptyMesh(mesh));
        }
        let [nx, ny, nz] = mesh;
        let mut points = Vec::with_capacity(nx * ny * nz);
        for i in 0..nx {
            for j in 0..ny {
                for k in 0..nz {
                    points.push([
                        i as f64 / nx as f64,
                        j as f64 / ny as f64,
                        k as f64 / nz as f64,
                    ]);
                }
            }
        }
        Ok(Self { points })
    }

    /// Explicit list of points
    pub fn from_points(points: Vec<[f64; 3]>) -> Result<Self> {
        if points.is_empty() {
            return Err(SamplingError::NoPoints);
        }
        if let Some(bad) = points.iter().find(|p| p.iter().any(|x| !x.is_finite())) {
            return Err(SamplingError::NonFinitePoint(*bad));
        }
        Ok(Self { points })
    }

    pub fn points(&self) -> &[[f64; 3]] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Weight of a single point
    pub fn weight(&self) -> f64 {
        1.0 / self.points.len() as f64
    }
}

impl fmt::Display for SamplingSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} sampling point(s)", self.points.len())
    }
}
