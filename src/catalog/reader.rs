//! # src_rec Catalog Reader
//!
//! Utilities to parse the whitespace-delimited **src_rec** catalog format
//! into the four typed tables of a [`Catalog`](crate::catalog::Catalog).
//!
//! ## Overview
//! -----------------
//! This module provides:
//! - A small error type [`ParseCatalogError`] describing src_rec parsing
//!   failures with line-level context.
//! - Crate-internal line parsers converting a tokenized line into a
//!   [`Source`], [`AbsoluteRecord`], [`CommonSourceRecord`] or
//!   [`CommonReceiverRecord`].
//! - A crate-visible batch routine [`extract_catalog`] that reads an entire
//!   file and returns the four populated tables.
//!
//! ## Line shapes
//! -----------------
//! Comment lines start with `#`. Remaining lines are tokenized on
//! whitespace and classified as follows:
//!
//! - **Source**: `idx year month day hour minute second evla evlo evdp mag
//!   num_rec event_id [weight]` – 13 or 14 tokens, none carrying a phase
//!   suffix.
//! - **Absolute record**: `idx rec_idx [net] staname stla stlo stel phase
//!   [dist_deg] tt [weight]` – fewer than 13 tokens; the optional columns
//!   are governed by [`ReadOptions`].
//! - **Common-source record**: 13–14 tokens whose phase token ends in `,cs`.
//! - **Common-receiver record**: 13–14 tokens whose phase token ends in `,cr`.
//!
//! The phase suffix is the sole discriminator between the three record
//! kinds; the column count separates source lines from record lines. A
//! missing trailing weight column defaults to **1.0** on every line shape.
//!
//! ## Error handling
//! -----------------
//! Any field that fails type coercion aborts the read with a
//! [`ParseCatalogError`] naming the line and field – no partially parsed
//! catalog is ever returned. A record weight above 10 is *not* an error: it
//! is the signature of a distance column read as weight, and is surfaced as
//! a warning suggesting `dist_in_data`.
//!
//! ## See also
//! ------------
//! * [`crate::catalog::writer`] – The inverse transformation.
//! * [`crate::catalog::Catalog::read_with`] – Public entry point.
use camino::Utf8Path;
use thiserror::Error;

use crate::catalog::record::{
    split_phase_suffix, AbsoluteRecord, CommonReceiverRecord, CommonSourceRecord, RecordKind,
};
use crate::catalog::source::{origin_time_from_fields, Source};
use crate::tomocat_errors::TomocatError;

/// Options controlling how a src_rec file is interpreted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadOptions {
    /// Absolute record lines carry an epicentral-distance column before the
    /// travel time
    pub dist_in_data: bool,
    /// Absolute record lines carry a network column; station names become
    /// `NET_STA`
    pub name_net_and_sta: bool,
    /// Parse source lines only, ignoring every record line
    pub src_only: bool,
}

/// Line-level parsing errors for src_rec catalogs.
#[derive(Error, Debug, PartialEq)]
pub enum ParseCatalogError {
    #[error("line {line}: expected at least {expected} columns, found {found}")]
    TruncatedLine {
        line: usize,
        expected: usize,
        found: usize,
    },
    #[error("line {line}: invalid origin time: {value}")]
    InvalidDate { line: usize, value: String },
    #[error("line {line}: invalid value for {field}: {value}")]
    InvalidField {
        line: usize,
        field: &'static str,
        value: String,
    },
}

/// Tokenized line plus its 1-based position, with typed field accessors.
struct LineFields<'a> {
    tokens: Vec<&'a str>,
    line: usize,
}

impl<'a> LineFields<'a> {
    fn new(content: &'a str, line: usize) -> Self {
        LineFields {
            tokens: content.split_whitespace().collect(),
            line,
        }
    }

    fn require(&self, expected: usize) -> Result<(), ParseCatalogError> {
        if self.tokens.len() < expected {
            Err(ParseCatalogError::TruncatedLine {
                line: self.line,
                expected,
                found: self.tokens.len(),
            })
        } else {
            Ok(())
        }
    }

    fn parse<T: std::str::FromStr>(
        &self,
        idx: usize,
        field: &'static str,
    ) -> Result<T, ParseCatalogError> {
        self.tokens[idx]
            .parse::<T>()
            .map_err(|_| ParseCatalogError::InvalidField {
                line: self.line,
                field,
                value: self.tokens[idx].to_string(),
            })
    }

    fn text(&self, idx: usize) -> String {
        self.tokens[idx].to_string()
    }

    /// Trailing optional weight column, defaulting to 1.0 when absent.
    fn opt_weight(&self, idx: usize) -> Result<f64, ParseCatalogError> {
        if self.tokens.len() > idx {
            self.parse(idx, "weight")
        } else {
            Ok(1.0)
        }
    }
}

fn parse_source_line(fields: &LineFields) -> Result<Source, ParseCatalogError> {
    fields.require(13)?;

    let year: i32 = fields.parse(1, "year")?;
    let month: u32 = fields.parse(2, "month")?;
    let day: u32 = fields.parse(3, "day")?;
    let hour: u32 = fields.parse(4, "hour")?;
    let minute: u32 = fields.parse(5, "minute")?;
    let second: f64 = fields.parse(6, "second")?;

    let origin_time = origin_time_from_fields(year, month, day, hour, minute, second).ok_or(
        ParseCatalogError::InvalidDate {
            line: fields.line,
            value: fields.tokens[1..7].join(" "),
        },
    )?;

    Ok(Source {
        src_index: fields.parse(0, "src_index")?,
        origin_time,
        evla: fields.parse(7, "evla")?,
        evlo: fields.parse(8, "evlo")?,
        evdp: fields.parse(9, "evdp")?,
        mag: fields.parse(10, "mag")?,
        num_rec: fields.parse(11, "num_rec")?,
        event_id: fields.text(12),
        weight: fields.opt_weight(13)?,
        fname: None,
    })
}

fn parse_absolute_line(
    fields: &LineFields,
    options: &ReadOptions,
) -> Result<AbsoluteRecord, ParseCatalogError> {
    // idx rec_idx [net] staname stla stlo stel phase [dist] tt
    let mut col = 2;
    let staname = if options.name_net_and_sta {
        fields.require(9 + options.dist_in_data as usize)?;
        let name = format!("{}_{}", fields.tokens[col], fields.tokens[col + 1]);
        col += 2;
        name
    } else {
        fields.require(8 + options.dist_in_data as usize)?;
        let name = fields.text(col);
        col += 1;
        name
    };

    let stla = fields.parse(col, "stla")?;
    let stlo = fields.parse(col + 1, "stlo")?;
    let stel = fields.parse(col + 2, "stel")?;
    let phase = fields.text(col + 3);
    col += 4;

    let dist_deg = if options.dist_in_data {
        let d = fields.parse(col, "dist_deg")?;
        col += 1;
        Some(d)
    } else {
        None
    };

    Ok(AbsoluteRecord {
        src_index: fields.parse(0, "src_index")?,
        rec_index: fields.parse(1, "rec_index")?,
        staname,
        stla,
        stlo,
        stel,
        phase,
        tt: fields.parse(col, "tt")?,
        weight: fields.opt_weight(col + 1)?,
        dist_deg,
        az: None,
        baz: None,
    })
}

fn parse_common_source_line(fields: &LineFields) -> Result<CommonSourceRecord, ParseCatalogError> {
    fields.require(13)?;
    let (base, _) = split_phase_suffix(fields.tokens[11]);

    Ok(CommonSourceRecord {
        src_index: fields.parse(0, "src_index")?,
        rec_index1: fields.parse(1, "rec_index1")?,
        staname1: fields.text(2),
        stla1: fields.parse(3, "stla1")?,
        stlo1: fields.parse(4, "stlo1")?,
        stel1: fields.parse(5, "stel1")?,
        rec_index2: fields.parse(6, "rec_index2")?,
        staname2: fields.text(7),
        stla2: fields.parse(8, "stla2")?,
        stlo2: fields.parse(9, "stlo2")?,
        stel2: fields.parse(10, "stel2")?,
        phase: base.to_string(),
        tt: fields.parse(12, "tt")?,
        weight: fields.opt_weight(13)?,
    })
}

fn parse_common_receiver_line(
    fields: &LineFields,
) -> Result<CommonReceiverRecord, ParseCatalogError> {
    fields.require(13)?;
    let (base, _) = split_phase_suffix(fields.tokens[11]);

    Ok(CommonReceiverRecord {
        src_index: fields.parse(0, "src_index")?,
        rec_index: fields.parse(1, "rec_index")?,
        staname: fields.text(2),
        stla: fields.parse(3, "stla")?,
        stlo: fields.parse(4, "stlo")?,
        stel: fields.parse(5, "stel")?,
        src_index2: fields.parse(6, "src_index2")?,
        event_id2: fields.text(7),
        evla2: fields.parse(8, "evla2")?,
        evlo2: fields.parse(9, "evlo2")?,
        evdp2: fields.parse(10, "evdp2")?,
        phase: base.to_string(),
        tt: fields.parse(12, "tt")?,
        weight: fields.opt_weight(13)?,
    })
}

/// Classify a tokenized 13+-column line by its phase-token suffix.
///
/// cs/cr record lines carry the suffix at column 11; a wide line without
/// one is a source line, which the caller resolves from the
/// [`RecordKind::Absolute`] result.
fn classify(fields: &LineFields) -> RecordKind {
    if fields.tokens.len() >= 13 {
        split_phase_suffix(fields.tokens[11]).1
    } else {
        RecordKind::Absolute
    }
}

/// Parsed content of one src_rec file: the four tables in file order.
pub(crate) type ParsedTables = (
    Vec<Source>,
    Vec<AbsoluteRecord>,
    Vec<CommonSourceRecord>,
    Vec<CommonReceiverRecord>,
);

/// Read a full **src_rec** file into the four catalog tables.
///
/// The read is fail-fast: the first malformed field aborts with a
/// [`ParseCatalogError`] carrying the line number. Comment and blank lines
/// are skipped. With `options.src_only` every record line is ignored.
///
/// Arguments
/// -----------------
/// * `path` – Path to the src_rec file.
/// * `options` – Column-layout options, see [`ReadOptions`].
///
/// Return
/// ----------
/// * The `(sources, records, cs_records, cr_records)` tables, in file order
///   and not yet reindexed.
pub(crate) fn extract_catalog(
    path: &Utf8Path,
    options: &ReadOptions,
) -> Result<ParsedTables, TomocatError> {
    let content = std::fs::read_to_string(path)
        .map_err(|_| TomocatError::CatalogFileNotFound(path.to_string()))?;

    let mut sources = Vec::new();
    let mut records = Vec::new();
    let mut cs_records = Vec::new();
    let mut cr_records = Vec::new();
    let mut outlier_weight = false;

    for (line_no, raw) in content.lines().enumerate() {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let fields = LineFields::new(trimmed, line_no + 1);
        if fields.tokens.len() >= 13 {
            match classify(&fields) {
                RecordKind::CommonSource => {
                    if !options.src_only {
                        cs_records.push(parse_common_source_line(&fields)?);
                    }
                }
                RecordKind::CommonReceiver => {
                    if !options.src_only {
                        cr_records.push(parse_common_receiver_line(&fields)?);
                    }
                }
                RecordKind::Absolute => sources.push(parse_source_line(&fields)?),
            }
        } else if !options.src_only {
            let record = parse_absolute_line(&fields, options)?;
            outlier_weight |= record.weight > 10.0;
            records.push(record);
        }
    }

    if outlier_weight && !options.dist_in_data {
        log::warn!(
            "{path}: at least one record weight exceeds 10; the file probably \
             carries a distance column – re-read with dist_in_data"
        );
    }

    Ok((sources, records, cs_records, cr_records))
}
