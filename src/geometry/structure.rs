/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Site geometry with optional periodic lattice
//!
//! A [`Geometry`] is the ordered list of pi sites handed over by the
//! structure collaborator. Periodic systems additionally carry a [`Lattice`];
//! neighbor queries then run over lattice images and report the integer image
//! offset of every neighbor so that Bloch phases can be applied later.

use super::errors::{GeometryError, Result};
use super::site::{Site, Species};
use super::vector::Vector3D;

/// Integer lattice translation of a periodic image
pub type ImageOffset = [i32; 3];

/// Lattice vectors and the directions along which the system repeats
#[derive(Debug, Clone, PartialEq)]
pub struct Lattice {
    vectors: [Vector3D; 3],
    periodic: [bool; 3],
}

impl Lattice {
    /// Create a lattice; the three vectors must span a non-zero volume
    pub fn new(vectors: [Vector3D; 3], periodic: [bool; 3]) -> Result<Self> {
        if vectors.iter().any(|v| !v.is_finite()) {
            return Err(GeometryError::DegenerateLattice(
                "lattice vectors must be finite".to_string(),
            ));
        }
        let volume = vectors[0].dot(&vectors[1].cross(&vectors[2])).abs();
        if volume < 1e-8 {
            return Err(GeometryError::DegenerateLattice(format!(
                "cell volume {:.3e} is too small",
                volume
            )));
        }
        Ok(Self { vectors, periodic })
    }

    pub fn vectors(&self) -> &[Vector3D; 3] {
        &self.vectors
    }

    pub fn periodic(&self) -> [bool; 3] {
        self.periodic
    }

    /// Cartesian translation for an image offset
    pub fn translation(&self, image: ImageOffset) -> Vector3D {
        self.vectors[0] * f64::from(image[0])
            + self.vectors[1] * f64::from(image[1])
            + self.vectors[2] * f64::from(image[2])
    }

    /// Fractional coordinates of a Cartesian position
    pub fn fractional(&self, position: &Vector3D) -> [f64; 3] {
        let [a, b, c] = &self.vectors;
        let volume = a.dot(&b.cross(c));
        [
            position.dot(&b.cross(c)) / volume,
            position.dot(&c.cross(a)) / volume,
            position.dot(&a.cross(b)) / volume,
        ]
    }

    /// Number of images needed along each axis to cover `cutoff` when the
    /// sites span `spread` cells in fractional coordinates
    fn image_range(&self, cutoff: f64, spread: [f64; 3]) -> [i32; 3] {
        let [a, b, c] = &self.vectors;
        let volume = a.dot(&b.cross(c)).abs();
        let faces = [b.cross(c), c.cross(a), a.cross(b)];
        let mut range = [0; 3];
        for axis in 0..3 {
            if self.periodic[axis] {
                let height = volume / faces[axis].length();
                range[axis] = (cutoff / height + spread[axis]).ceil().max(1.0) as i32;
            }
        }
        range
    }
}

/// A neighbor found by [`Geometry::close`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub index: usize,
    pub image: ImageOffset,
    pub distance: f64,
}

/// Ordered collection of sites
#[derive(Debug, Clone, Default)]
pub struct Geometry {
    sites: Vec<Site>,
    lattice: Option<Lattice>,
}

impl Geometry {
    /// Create an empty, non-periodic geometry
    pub fn new() -> Self {
        Self {
            sites: Vec::new(),
            lattice: None,
        }
    }

    /// Create an empty geometry repeated by `lattice`
    pub fn periodic(lattice: Lattice) -> Self {
        Self {
            sites: Vec::new(),
            lattice: Some(lattice),
        }
    }

    /// Append a site and return its index
    pub fn add_site(&mut self, species: Species, position: Vector3D) -> Result<usize> {
        let index = self.sites.len();
        if !position.is_finite() {
            return Err(GeometryError::NonFiniteCoordinate(index));
        }
        self.sites.push(Site::new(index, species, position));
        Ok(index)
    }

    pub fn site_count(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    pub fn sites(&self) -> &[Site] {
        &self.sites
    }

    pub fn site(&self, index: usize) -> Option<&Site> {
        self.sites.get(index)
    }

    pub fn lattice(&self) -> Option<&Lattice> {
        self.lattice.as_ref()
    }

    /// Count sites of one species
    pub fn count_species(&self, species: Species) -> usize {
        self.sites.iter().filter(|s| s.species() == species).count()
    }

    /// Group the neighbors of `index` into radius bands.
    ///
    /// `radii` must be strictly increasing. Band 0 holds everything within
    /// `radii[0]` (the site itself), band `b` holds neighbors with
    /// `radii[b-1] < d <= radii[b]`. Each neighbor lands in exactly one band,
    /// the innermost one containing its distance.
    pub fn close(&self, index: usize, radii: &[f64]) -> Result<Vec<Vec<Neighbor>>> {
        validate_radii(radii)?;
        let center = self
            .sites
            .get(index)
            .ok_or(GeometryError::SiteOutOfRange {
                index,
                count: self.sites.len(),
            })?
            .position();
        let cutoff = radii[radii.len() - 1];

        let images = self.images(cutoff);
        let mut bands = vec![Vec::new(); radii.len()];
        for image in images {
            let shift = match &self.lattice {
                Some(lattice) => lattice.translation(image),
                None => Vector3D::origin(),
            };
            for site in &self.sites {
                let distance = (*site.position() + shift).distance(center);
                if let Some(band) = radii.iter().position(|&r| distance <= r) {
                    bands[band].push(Neighbor {
                        index: site.index(),
                        image,
                        distance,
                    });
                }
            }
        }
        Ok(bands)
    }

    fn images(&self, cutoff: f64) -> Vec<ImageOffset> {
        let range = match &self.lattice {
            Some(lattice) => lattice.image_range(cutoff, self.fractional_spread(lattice)),
            None => [0; 3],
        };
        let mut images = Vec::new();
        for i in -range[0]..=range[0] {
            for j in -range[1]..=range[1] {
                for k in -range[2]..=range[2] {
                    images.push([i, j, k]);
                }
            }
        }
        images
    }

    /// Width of the site cloud along each lattice axis, in cells
    fn fractional_spread(&self, lattice: &Lattice) -> [f64; 3] {
        let mut low = [f64::INFINITY; 3];
        let mut high = [f64::NEG_INFINITY; 3];
        for site in &self.sites {
            let frac = lattice.fractional(site.position());
            for axis in 0..3 {
                low[axis] = low[axis].min(frac[axis]);
                high[axis] = high[axis].max(frac[axis]);
            }
        }
        let mut spread = [0.0; 3];
        for axis in 0..3 {
            if high[axis] > low[axis] {
                spread[axis] = high[axis] - low[axis];
            }
        }
        spread
    }
}

fn validate_radii(radii: &[f64]) -> Result<()> {
    if radii.is_empty() {
        return Err(GeometryError::InvalidRadii("no radii given".to_string()));
    }
    if radii.iter().any(|r| !r.is_finite() || *r <= 0.0) {
        return Err(GeometryError::InvalidRadii(format!(
            "radii must be positive and finite: {:?}",
            radii
        )));
    }
    if radii.windows(2).any(|w| w[1] <= w[0]) {
        return Err(GeometryError::InvalidRadii(format!(
            "radii must be strictly increasing: {:?}",
            radii
        )));
    }
    Ok(())
}
