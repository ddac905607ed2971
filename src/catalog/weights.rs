//! # Weighting engine
//!
//! Down-weights spatially clustered sources or receivers so that dense
//! sub-networks do not dominate the inversion, and defines how two endpoint
//! weights combine into one differential-record weight.
//!
//! Two density estimates are provided:
//! - **Kernel (geographic) weighting** – a Gaussian overlap sum over the
//!   pairwise great-circle distance matrix, scaled by a reference distance
//!   derived from the mean pair separation.
//! - **Box weighting** – `1/√(cell population)` over a regular
//!   latitude/longitude(/depth) grid.
//!
//! Receiver weights propagate into every record referencing the receiver:
//! directly for absolute and cr rows, through the combination rule for cs
//! rows (two receiver endpoints). Source weights live on the source table,
//! where the solver reads them.

use ahash::RandomState;
use nalgebra::DMatrix;
use std::collections::HashMap;
use std::str::FromStr;

use crate::constants::{Degree, Kilometer};
use crate::distaz::haversine_km;
use crate::tomocat_errors::TomocatError;

use super::Catalog;

/// How two endpoint weights combine into a differential-record weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeightRule {
    /// `(w1 + w2) / 2`
    Average,
    /// `w1 × w2`
    Multiply,
}

impl FromStr for WeightRule {
    type Err = TomocatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "average" => Ok(WeightRule::Average),
            "multiply" => Ok(WeightRule::Multiply),
            other => Err(TomocatError::InvalidWeightRule(other.to_string())),
        }
    }
}

/// Which entity set a weighting pass applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeightTarget {
    Sources,
    Receivers,
}

impl FromStr for WeightTarget {
    type Err = TomocatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "src" | "sources" => Ok(WeightTarget::Sources),
            "rec" | "receivers" => Ok(WeightTarget::Receivers),
            other => Err(TomocatError::InvalidWeightTarget(other.to_string())),
        }
    }
}

/// Combine two endpoint weights under `rule`.
pub fn combine_weight(w1: f64, w2: f64, rule: WeightRule) -> f64 {
    match rule {
        WeightRule::Average => (w1 + w2) / 2.0,
        WeightRule::Multiply => w1 * w2,
    }
}

/// Kernel weights for a point set.
///
/// Builds the pairwise great-circle distance matrix (haversine, R = 6371 km),
/// takes `d_ref = scale × mean(d)`, accumulates the Gaussian overlap
/// `om_i = Σ_j exp(-(d_ij/d_ref)²)` and returns `w_i = mean(om)/om_i`, so a
/// point in a dense cluster weighs less than an isolated one and the weights
/// average to about 1.
///
/// Degenerate sets (fewer than two points, or all points coincident) get
/// unit weights.
pub(crate) fn kernel_weights(lats: &[Degree], lons: &[Degree], scale: f64) -> Vec<f64> {
    let n = lats.len();
    if n < 2 {
        return vec![1.0; n];
    }

    let dist = DMatrix::from_fn(n, n, |i, j| haversine_km(lats[i], lons[i], lats[j], lons[j]));
    let d_ref = scale * dist.mean();
    if d_ref <= 0.0 {
        return vec![1.0; n];
    }

    let om: Vec<f64> = (0..n)
        .map(|i| dist.row(i).iter().map(|d| (-(d / d_ref).powi(2)).exp()).sum())
        .collect();
    let mean_om: f64 = om.iter().sum::<f64>() / n as f64;

    om.iter().map(|o| mean_om / o).collect()
}

impl Catalog {
    /// Kernel-weight the sources or the receivers.
    ///
    /// Receiver weights are written to the receiver projection and
    /// propagated into every dependent record; source weights are written
    /// to the source table. Ends with the integrity pass.
    ///
    /// Arguments
    /// -----------------
    /// * `target` – Entity set to weight, see [`WeightTarget`].
    /// * `scale` – Reference-distance scale factor.
    /// * `rule` – Combination rule for cs rows (two receiver endpoints).
    pub fn geo_weighting(
        &mut self,
        target: WeightTarget,
        scale: f64,
        rule: WeightRule,
    ) -> Result<(), TomocatError> {
        match target {
            WeightTarget::Sources => {
                let lats: Vec<Degree> = self.sources.iter().map(|s| s.evla).collect();
                let lons: Vec<Degree> = self.sources.iter().map(|s| s.evlo).collect();
                let weights = kernel_weights(&lats, &lons, scale);
                for (src, w) in self.sources.iter_mut().zip(weights) {
                    src.weight = w;
                }
            }
            WeightTarget::Receivers => {
                let lats: Vec<Degree> = self.receivers.iter().map(|r| r.stla).collect();
                let lons: Vec<Degree> = self.receivers.iter().map(|r| r.stlo).collect();
                let weights = kernel_weights(&lats, &lons, scale);
                for (rec, w) in self.receivers.iter_mut().zip(weights) {
                    rec.weight = w;
                }
                self.propagate_receiver_weights(rule);
            }
        }
        self.update();
        Ok(())
    }

    /// Cell-density weighting: `w = 1/√(points in cell)`.
    ///
    /// Sources are binned on a 3-D latitude/longitude/depth grid, receivers
    /// on a 2-D latitude/longitude grid; propagation matches
    /// [`Catalog::geo_weighting`].
    ///
    /// Arguments
    /// -----------------
    /// * `target` – Entity set to weight.
    /// * `lat_step`, `lon_step` – Cell size in degrees.
    /// * `dep_step` – Cell size in km (sources only).
    /// * `rule` – Combination rule for cs rows.
    pub fn box_weighting(
        &mut self,
        target: WeightTarget,
        lat_step: Degree,
        lon_step: Degree,
        dep_step: Kilometer,
        rule: WeightRule,
    ) -> Result<(), TomocatError> {
        match target {
            WeightTarget::Sources => {
                let cells: Vec<(i64, i64, i64)> = self
                    .sources
                    .iter()
                    .map(|s| {
                        (
                            (s.evla / lat_step).floor() as i64,
                            (s.evlo / lon_step).floor() as i64,
                            (s.evdp / dep_step).floor() as i64,
                        )
                    })
                    .collect();
                let mut counts: HashMap<(i64, i64, i64), usize, RandomState> = HashMap::default();
                for cell in &cells {
                    *counts.entry(*cell).or_insert(0) += 1;
                }
                for (src, cell) in self.sources.iter_mut().zip(&cells) {
                    src.weight = 1.0 / (counts[cell] as f64).sqrt();
                }
            }
            WeightTarget::Receivers => {
                let cells: Vec<(i64, i64)> = self
                    .receivers
                    .iter()
                    .map(|r| {
                        (
                            (r.stla / lat_step).floor() as i64,
                            (r.stlo / lon_step).floor() as i64,
                        )
                    })
                    .collect();
                let mut counts: HashMap<(i64, i64), usize, RandomState> = HashMap::default();
                for cell in &cells {
                    *counts.entry(*cell).or_insert(0) += 1;
                }
                for (rec, cell) in self.receivers.iter_mut().zip(&cells) {
                    rec.weight = 1.0 / (counts[cell] as f64).sqrt();
                }
                self.propagate_receiver_weights(rule);
            }
        }
        self.update();
        Ok(())
    }

    /// Copy receiver-projection weights onto every dependent record:
    /// absolute and cr rows take their receiver's weight, cs rows combine
    /// their two endpoints under `rule`.
    fn propagate_receiver_weights(&mut self, rule: WeightRule) {
        let weights: HashMap<&str, f64, RandomState> = self
            .receivers
            .iter()
            .map(|r| (r.staname.as_str(), r.weight))
            .collect();
        let of = |name: &str| weights.get(name).copied().unwrap_or(1.0);

        for r in &mut self.records {
            r.weight = of(&r.staname);
        }
        for r in &mut self.cs_records {
            r.weight = combine_weight(of(&r.staname1), of(&r.staname2), rule);
        }
        for r in &mut self.cr_records {
            r.weight = of(&r.staname);
        }
    }
}
