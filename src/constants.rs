//! # Constants and type definitions for tomocat
//!
//! This module centralizes the **physical constants**, **conversion factors**, and **common type
//! definitions** used throughout the `tomocat` library.
//!
//! ## Overview
//!
//! - Geophysical constants (Earth radius, ellipsoidal flattening)
//! - Unit conversions (degrees ↔ kilometers along a great circle)
//! - Core type aliases used across the crate
//! - Container types for the catalog's lookup structures
//!
//! These definitions are used by all main modules, including the catalog store,
//! the selection engine, and the geometry helpers.

use ahash::RandomState;
use smallvec::SmallVec;
use std::collections::HashMap;

// -------------------------------------------------------------------------------------------------
// Physical constants and unit conversions
// -------------------------------------------------------------------------------------------------

/// Mean Earth radius in kilometers, used by the haversine kernel and deg ↔ km conversions
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Earth ellipsoidal flattening (Bott), used by the geocentric-colatitude substitution
pub const FLATTENING: f64 = 1.0 / 298.257;

/// Kilometers per degree of great-circle arc at the mean Earth radius
pub const KM_PER_DEG: f64 = 111.19;

/// Angular tolerance (degrees) under which an azimuth is snapped to exactly zero
pub const AZIMUTH_SNAP_DEG: f64 = 1e-5;

/// Variance inflation applied to differential travel-time noise.
///
/// A difference of two independently noisy picks carries √2 times the
/// single-pick standard deviation.
pub const DIFF_NOISE_INFLATION: f64 = std::f64::consts::SQRT_2;

/// Degrees → radians
pub const DEG2RAD: f64 = std::f64::consts::PI / 180.0;

/// Radians → degrees
pub const RAD2DEG: f64 = 180.0 / std::f64::consts::PI;

// -------------------------------------------------------------------------------------------------
// Type aliases
// -------------------------------------------------------------------------------------------------

/// Angle in degrees
pub type Degree = f64;
/// Distance in kilometers (also used for depth below sea level)
pub type Kilometer = f64;
/// Elevation in meters
pub type Meter = f64;
/// Travel time in seconds
pub type Seconds = f64;

/// String identifier of a seismic event, unique within a catalog
pub type EventId = String;

/// Station name, optionally network-qualified as `NET_STA`
pub type StationName = String;

/// Lookup table from event id to dense source index.
///
/// Uses [`ahash`](https://docs.rs/ahash) for fast hashing.
pub type EventMap = HashMap<EventId, usize, RandomState>;

/// Lookup table from station name to receiver-projection index
pub type StationMap = HashMap<StationName, usize, RandomState>;

/// A small, inline-optimized list of record row indices belonging to one group
/// (one source, or one receiver); groups are small relative to the catalog.
pub type RecordGroup = SmallVec<[usize; 8]>;
