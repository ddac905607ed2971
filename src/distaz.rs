//! # Great-circle distance and azimuth
//!
//! Distance, azimuth and back-azimuth between two geographic points on an
//! ellipsoidal Earth, plus the small haversine/arc-length helpers used by the
//! weighting engine.
//!
//! ## Overview
//! -----------------
//! - [`DistAZ`] – epicentral distance (degrees), azimuth and back-azimuth for
//!   a single point pair, via the classical Bullen formulas with the
//!   geocentric-colatitude substitution for Earth flattening.
//! - [`distance_azimuth`] – batched variant over coordinate slices.
//! - [`haversine_km`] – spherical great-circle distance in kilometers
//!   (mean radius 6371 km), used by the kernel weighting.
//! - [`deg2km`] / [`km2deg`] – arc-length conversions.
//!
//! ## Conventions
//! -----------------
//! With `DistAZ::new(lat1, lon1, lat2, lon2)`:
//! - `delta` is the great-circle separation in **degrees**;
//! - `baz` is the bearing **from point 1 toward point 2**;
//! - `az` is the bearing **from point 2 toward point 1**;
//!   all in degrees clockwise from North, in `[0, 360)`.
//!
//! Two policies keep downstream consumers free of NaN and seam artifacts:
//! numerically identical points yield exactly `(0, 0, 0)`, and any azimuth
//! within 1e-5° of the 0/360 seam is snapped to exactly 0 (no output is ever
//! 360).

use crate::constants::{
    Degree, Kilometer, AZIMUTH_SNAP_DEG, DEG2RAD, EARTH_RADIUS_KM, FLATTENING, KM_PER_DEG,
    RAD2DEG,
};

/// Distance, azimuth and back-azimuth of a geographic point pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistAZ {
    /// Epicentral distance in degrees
    pub delta: Degree,
    /// Bearing from point 2 toward point 1, degrees clockwise from North
    pub az: Degree,
    /// Bearing from point 1 toward point 2, degrees clockwise from North
    pub baz: Degree,
}

/// Snap an azimuth lying within [`AZIMUTH_SNAP_DEG`] of 0 or 360 to exactly 0.
fn snap_seam(az: Degree) -> Degree {
    if (az - 360.0).abs() < AZIMUTH_SNAP_DEG || az.abs() < AZIMUTH_SNAP_DEG {
        0.0
    } else {
        az
    }
}

impl DistAZ {
    /// Compute distance, azimuth and back-azimuth between two points.
    ///
    /// Latitudes are converted to geocentric colatitudes with the
    /// flattening correction before the spherical formulas are applied
    /// (Bullen, sec. 10.2).
    ///
    /// Arguments
    /// -----------------
    /// * `lat1`, `lon1`: coordinates of point 1 in degrees.
    /// * `lat2`, `lon2`: coordinates of point 2 in degrees.
    ///
    /// Return
    /// ----------
    /// * A [`DistAZ`] with `delta`/`az`/`baz` in degrees. Identical points
    ///   yield exactly `(0, 0, 0)`.
    pub fn new(lat1: Degree, lon1: Degree, lat2: Degree, lon2: Degree) -> Self {
        if lat1 == lat2 && lon1 == lon2 {
            return DistAZ {
                delta: 0.0,
                az: 0.0,
                baz: 0.0,
            };
        }

        // Geocentric colatitudes
        let scolat =
            std::f64::consts::FRAC_PI_2 - ((1.0 - FLATTENING).powi(2) * (lat1 * DEG2RAD).tan()).atan();
        let ecolat =
            std::f64::consts::FRAC_PI_2 - ((1.0 - FLATTENING).powi(2) * (lat2 * DEG2RAD).tan()).atan();
        let slon = lon1 * DEG2RAD;
        let elon = lon2 * DEG2RAD;

        // Direction cosines for point 1 (Bullen sec. 10.2, a-e)
        let a = scolat.sin() * slon.cos();
        let b = scolat.sin() * slon.sin();
        let c = scolat.cos();
        let d = slon.sin();
        let e = -slon.cos();
        let g = -c * e;
        let h = c * d;
        let k = -scolat.sin();

        // Same quantities for point 2
        let aa = ecolat.sin() * elon.cos();
        let bb = ecolat.sin() * elon.sin();
        let cc = ecolat.cos();
        let dd = elon.sin();
        let ee = -elon.cos();
        let gg = -cc * ee;
        let hh = cc * dd;
        let kk = -ecolat.sin();

        let delta = (a * aa + b * bb + c * cc).clamp(-1.0, 1.0).acos() * RAD2DEG;

        // Bearing at point 1 (baz), via eqn 7/8 to avoid quadrant problems
        let rhs1 = (aa - d).powi(2) + (bb - e).powi(2) + cc * cc - 2.0;
        let rhs2 = (aa - g).powi(2) + (bb - h).powi(2) + (cc - k).powi(2) - 2.0;
        let mut baz = rhs1.atan2(rhs2);
        if baz < 0.0 {
            baz += 2.0 * std::f64::consts::PI;
        }

        // Bearing at point 2 (az)
        let rhs1 = (a - dd).powi(2) + (b - ee).powi(2) + c * c - 2.0;
        let rhs2 = (a - gg).powi(2) + (b - hh).powi(2) + (c - kk).powi(2) - 2.0;
        let mut az = rhs1.atan2(rhs2);
        if az < 0.0 {
            az += 2.0 * std::f64::consts::PI;
        }

        DistAZ {
            delta,
            az: snap_seam(az * RAD2DEG),
            baz: snap_seam(baz * RAD2DEG),
        }
    }

    /// Epicentral distance converted to kilometers along the great circle.
    pub fn degrees_to_kilometers(&self) -> Kilometer {
        self.delta * KM_PER_DEG
    }
}

/// Batched [`DistAZ`] over coordinate slices.
///
/// All four slices must have the same length; each index is computed
/// independently, so identical-point forcing and seam snapping apply
/// element-wise.
///
/// Arguments
/// -----------------
/// * `lat1`, `lon1`: coordinates of the first point set, degrees.
/// * `lat2`, `lon2`: coordinates of the second point set, degrees.
///
/// Return
/// ----------
/// * One [`DistAZ`] per element.
///
/// Panics
/// ----------
/// * If the slice lengths differ.
pub fn distance_azimuth(
    lat1: &[Degree],
    lon1: &[Degree],
    lat2: &[Degree],
    lon2: &[Degree],
) -> Vec<DistAZ> {
    assert!(
        lat1.len() == lon1.len() && lat1.len() == lat2.len() && lat1.len() == lon2.len(),
        "distance_azimuth: coordinate slices must have equal length"
    );
    lat1.iter()
        .zip(lon1)
        .zip(lat2.iter().zip(lon2))
        .map(|((&la1, &lo1), (&la2, &lo2))| DistAZ::new(la1, lo1, la2, lo2))
        .collect()
}

/// Spherical great-circle distance in kilometers (haversine, R = 6371 km).
pub fn haversine_km(lat1: Degree, lon1: Degree, lat2: Degree, lon2: Degree) -> Kilometer {
    let phi1 = lat1 * DEG2RAD;
    let phi2 = lat2 * DEG2RAD;
    let dphi = (lat2 - lat1) * DEG2RAD;
    let dlam = (lon2 - lon1) * DEG2RAD;

    let s = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlam / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * s.sqrt().clamp(-1.0, 1.0).asin()
}

/// Convert a great-circle arc length from kilometers to degrees.
pub fn km2deg(km: Kilometer) -> Degree {
    let circum = 2.0 * std::f64::consts::PI * EARTH_RADIUS_KM;
    km / (circum / 360.0)
}

/// Convert a great-circle arc length from degrees to kilometers.
pub fn deg2km(deg: Degree) -> Kilometer {
    let circum = 2.0 * std::f64::consts::PI * EARTH_RADIUS_KM;
    deg * (circum / 360.0)
}
