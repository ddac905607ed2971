//! Source rows and origin-time handling.

use camino::Utf8PathBuf;
use chrono::{NaiveDate, NaiveDateTime, Timelike};

use crate::constants::{Degree, EventId, Kilometer};

/// One seismic source (earthquake) of the catalog.
///
/// `src_index` is dense 0..N-1 after the integrity pass; `num_rec` is derived
/// from the record tables and rewritten by the same pass. `event_id` is the
/// stable cross-reference key and must be unique within a catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct Source {
    pub src_index: usize,
    /// Event origin time, microsecond precision
    pub origin_time: NaiveDateTime,
    /// Event latitude in degrees
    pub evla: Degree,
    /// Event longitude in degrees
    pub evlo: Degree,
    /// Event depth in km
    pub evdp: Kilometer,
    /// Magnitude
    pub mag: f64,
    /// Number of records referencing this source (derived)
    pub num_rec: usize,
    /// Unique event identifier
    pub event_id: EventId,
    /// Source weight, non-negative
    pub weight: f64,
    /// File the source originated from; set when catalogs from different
    /// files are appended
    pub fname: Option<Utf8PathBuf>,
}

/// Assemble an origin time from the six catalog columns.
///
/// Arguments
/// -----------------
/// * `year`..`minute`: integer date/time fields.
/// * `second`: seconds with fractional part, carried to microseconds.
///
/// Return
/// ----------
/// * The origin time, or `None` when the fields do not form a valid civil
///   date/time.
pub fn origin_time_from_fields(
    year: i32,
    month: u32,
    day: u32,
    hour: u32,
    minute: u32,
    second: f64,
) -> Option<NaiveDateTime> {
    if !(0.0..60.0).contains(&second) {
        return None;
    }
    let whole = second.floor();
    // sub-microsecond fractions must not round up into a leap second
    let micro = (((second - whole) * 1e6).round() as u32).min(999_999);
    NaiveDate::from_ymd_opt(year, month, day)?.and_hms_micro_opt(hour, minute, whole as u32, micro)
}

/// Render an origin time as the six space-separated catalog columns
/// (`YYYY MM DD HH MM SS.ffffff`).
pub fn format_origin_time(t: &NaiveDateTime) -> String {
    format!(
        "{} {:02}.{:06}",
        t.format("%Y %m %d %H %M"),
        t.second(),
        t.nanosecond() / 1000
    )
}
