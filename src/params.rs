//! Input-parameter surface shared with the tomography solver.
//!
//! The solver's YAML parameter file carries a `domain` block describing the
//! inversion volume. The catalog engine does not consume it itself, but
//! collaborators (gridding, plotting) read it alongside the catalog, so the
//! block is exposed here as a typed structure with the axis initialization
//! the grid consumers expect.

use camino::Utf8Path;
use serde::{Deserialize, Serialize};

use crate::tomocat_errors::TomocatError;

/// The `domain` block of the solver parameter file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Domain {
    /// Minimum and maximum depth in km, `[min_dep, max_dep]`
    pub min_max_dep: [f64; 2],
    /// Minimum and maximum latitude in degrees, `[min_lat, max_lat]`
    pub min_max_lat: [f64; 2],
    /// Minimum and maximum longitude in degrees, `[min_lon, max_lon]`
    pub min_max_lon: [f64; 2],
    /// Number of grid nodes along depth, latitude, longitude
    pub n_rtp: [usize; 3],
}

impl Domain {
    /// Build the three coordinate axes of the inversion grid.
    ///
    /// Return
    /// ----------
    /// * `(dep, lat, lon, dr, dt, dp)` – node coordinates per axis and the
    ///   grid intervals. The depth axis is returned deepest-first, matching
    ///   the solver's radial ordering.
    pub fn init_axis(&self) -> (Vec<f64>, Vec<f64>, Vec<f64>, f64, f64, f64) {
        let dr = (self.min_max_dep[1] - self.min_max_dep[0]) / (self.n_rtp[0] - 1) as f64;
        let dt = (self.min_max_lat[1] - self.min_max_lat[0]) / (self.n_rtp[1] - 1) as f64;
        let dp = (self.min_max_lon[1] - self.min_max_lon[0]) / (self.n_rtp[2] - 1) as f64;

        let dep: Vec<f64> = (0..self.n_rtp[0])
            .rev()
            .map(|i| self.min_max_dep[0] + i as f64 * dr)
            .collect();
        let lat: Vec<f64> = (0..self.n_rtp[1])
            .map(|i| self.min_max_lat[0] + i as f64 * dt)
            .collect();
        let lon: Vec<f64> = (0..self.n_rtp[2])
            .map(|i| self.min_max_lon[0] + i as f64 * dp)
            .collect();

        (dep, lat, lon, dr, dt, dp)
    }
}

/// Typed view of the solver parameter file.
///
/// Only the blocks the catalog tooling shares with its collaborators are
/// modeled; unknown blocks are ignored on read and therefore dropped on
/// write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputParams {
    pub domain: Domain,
}

impl InputParams {
    /// Read a parameter file.
    ///
    /// Arguments
    /// -----------------
    /// * `path`: path to the YAML parameter file.
    ///
    /// Return
    /// ----------
    /// * The parsed parameters, or a [`TomocatError`] on I/O or YAML failure.
    pub fn read(path: &Utf8Path) -> Result<Self, TomocatError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&content)?)
    }

    /// Write the parameters back to a YAML file.
    pub fn write(&self, path: &Utf8Path) -> Result<(), TomocatError> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
