//! Record rows: absolute observations, differential pairs, and the receiver
//! projection row.
//!
//! Inside the store the three record kinds are separate types held in
//! separate tables. The `,cs`/`,cr` phase suffix that discriminates them on
//! disk exists only at the serialization boundary: [`split_phase_suffix`]
//! strips it on read, [`phase_with_suffix`] re-appends it on write.

use crate::constants::{Degree, EventId, Kilometer, Meter, Seconds, StationName};

/// Which of the three record tables a parsed line belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Absolute,
    CommonSource,
    CommonReceiver,
}

/// Split a serialized phase label into its base phase and record kind.
///
/// `P,cs` → (`P`, CommonSource); `P,cr` → (`P`, CommonReceiver); anything
/// else is an absolute-record phase. Only the recognized suffixes are
/// interpreted; a phase containing a comma otherwise is kept verbatim.
pub fn split_phase_suffix(phase: &str) -> (&str, RecordKind) {
    match phase.rsplit_once(',') {
        Some((base, "cs")) => (base, RecordKind::CommonSource),
        Some((base, "cr")) => (base, RecordKind::CommonReceiver),
        _ => (phase, RecordKind::Absolute),
    }
}

/// Render a base phase with the serialization suffix of its table.
pub fn phase_with_suffix(phase: &str, kind: RecordKind) -> String {
    match kind {
        RecordKind::Absolute => phase.to_string(),
        RecordKind::CommonSource => format!("{phase},cs"),
        RecordKind::CommonReceiver => format!("{phase},cr"),
    }
}

/// One source→receiver travel-time observation.
///
/// Receiver attributes are denormalized copies captured at parse time and
/// refreshed from the receiver projection after coordinate-changing
/// operations. `dist_deg`/`az`/`baz` are cached lazily by `calc_distaz`.
#[derive(Debug, Clone, PartialEq)]
pub struct AbsoluteRecord {
    pub src_index: usize,
    /// Dense 0-based position within the source's record group
    pub rec_index: usize,
    pub staname: StationName,
    pub stla: Degree,
    pub stlo: Degree,
    /// Receiver elevation in meters
    pub stel: Meter,
    /// Base phase label (no suffix)
    pub phase: String,
    /// Travel time in seconds
    pub tt: Seconds,
    pub weight: f64,
    /// Cached epicentral distance in degrees
    pub dist_deg: Option<Degree>,
    /// Cached azimuth (receiver → source bearing)
    pub az: Option<Degree>,
    /// Cached back-azimuth (source → receiver bearing)
    pub baz: Option<Degree>,
}

/// Differential observation between two receivers recording the same source.
#[derive(Debug, Clone, PartialEq)]
pub struct CommonSourceRecord {
    pub src_index: usize,
    pub rec_index1: usize,
    pub staname1: StationName,
    pub stla1: Degree,
    pub stlo1: Degree,
    pub stel1: Meter,
    pub rec_index2: usize,
    pub staname2: StationName,
    pub stla2: Degree,
    pub stlo2: Degree,
    pub stel2: Meter,
    /// Base phase label; serialized with a `,cs` suffix
    pub phase: String,
    /// Differential travel time `tt1 - tt2` in seconds
    pub tt: Seconds,
    pub weight: f64,
}

/// Differential observation between two sources recorded at the same receiver.
///
/// The anchor source is referenced through `src_index`; the paired source is
/// referenced through `event_id2`, with its coordinates carried as a
/// denormalized copy.
#[derive(Debug, Clone, PartialEq)]
pub struct CommonReceiverRecord {
    pub src_index: usize,
    pub rec_index: usize,
    pub staname: StationName,
    pub stla: Degree,
    pub stlo: Degree,
    pub stel: Meter,
    pub src_index2: usize,
    pub event_id2: EventId,
    pub evla2: Degree,
    pub evlo2: Degree,
    pub evdp2: Kilometer,
    /// Base phase label; serialized with a `,cr` suffix
    pub phase: String,
    /// Differential travel time `tt1 - tt2` in seconds
    pub tt: Seconds,
    pub weight: f64,
}

/// One physical station of the receiver projection.
#[derive(Debug, Clone, PartialEq)]
pub struct Receiver {
    pub staname: StationName,
    pub stla: Degree,
    pub stlo: Degree,
    pub stel: Meter,
    pub weight: f64,
}

#[cfg(test)]
mod record_test {
    use super::*;

    #[test]
    fn test_phase_suffix_roundtrip() {
        assert_eq!(split_phase_suffix("P"), ("P", RecordKind::Absolute));
        assert_eq!(split_phase_suffix("P,cs"), ("P", RecordKind::CommonSource));
        assert_eq!(split_phase_suffix("pP,cr"), ("pP", RecordKind::CommonReceiver));

        assert_eq!(phase_with_suffix("P", RecordKind::CommonSource), "P,cs");
        assert_eq!(phase_with_suffix("S", RecordKind::CommonReceiver), "S,cr");
        assert_eq!(phase_with_suffix("Pg", RecordKind::Absolute), "Pg");
    }

    #[test]
    fn test_unrecognized_suffix_is_data() {
        // A comma that does not introduce a known suffix stays in the phase.
        assert_eq!(split_phase_suffix("P,xx"), ("P,xx", RecordKind::Absolute));
    }
}
