//! src_rec catalog serializer.
//!
//! Emits the exact column layout the reader consumes: source lines with
//! unpadded integers and 4-decimal floats, record lines indented by three
//! spaces with `{:6.4}` floats, and cs/cr phases suffixed with `,cs`/`,cr`.
//! Records are grouped under their source line in table order. Progress is
//! reported per source, mirroring the long-catalog ergonomics of the
//! reference tooling.

use std::io::{BufWriter, Write};

use camino::Utf8Path;
use indicatif::{ProgressBar, ProgressStyle};

use crate::catalog::record::{phase_with_suffix, RecordKind};
use crate::catalog::source::format_origin_time;
use crate::catalog::Catalog;
use crate::tomocat_errors::TomocatError;

/// Serialize the catalog to `path` in src_rec form.
///
/// The caller is expected to hold a consistent catalog (the public
/// [`Catalog::write`] wrapper runs the integrity pass first); rows are
/// written in table order, absolute records before cs before cr within each
/// source.
pub(crate) fn write_catalog(catalog: &Catalog, path: &Utf8Path) -> Result<(), TomocatError> {
    let file = std::fs::File::create(path)?;
    let mut out = BufWriter::new(file);

    let pb = ProgressBar::new(catalog.sources.len().max(1) as u64);
    pb.set_style(
        ProgressStyle::with_template("writing sources [{bar:40.cyan/blue}] {pos}/{len}")
            .expect("indicatif template")
            .progress_chars("=> "),
    );

    let mut abs_iter = catalog.records.iter().peekable();
    let mut cs_iter = catalog.cs_records.iter().peekable();
    let mut cr_iter = catalog.cr_records.iter().peekable();

    for src in &catalog.sources {
        writeln!(
            out,
            "{} {} {:.4} {:.4} {:.4} {:.4} {} {} {:.4}",
            src.src_index,
            format_origin_time(&src.origin_time),
            src.evla,
            src.evlo,
            src.evdp,
            src.mag,
            src.num_rec,
            src.event_id,
            src.weight
        )?;

        if catalog.src_only {
            pb.inc(1);
            continue;
        }

        while let Some(rec) = abs_iter.next_if(|r| r.src_index == src.src_index) {
            writeln!(
                out,
                "   {} {} {} {:6.4} {:6.4} {:6.4} {} {:6.4} {:6.4}",
                rec.src_index,
                rec.rec_index,
                rec.staname,
                rec.stla,
                rec.stlo,
                rec.stel,
                rec.phase,
                rec.tt,
                rec.weight
            )?;
        }

        while let Some(rec) = cs_iter.next_if(|r| r.src_index == src.src_index) {
            writeln!(
                out,
                "   {} {} {} {:6.4} {:6.4} {:6.4} {} {} {:6.4} {:6.4} {:6.4} {} {:6.4} {:6.4}",
                rec.src_index,
                rec.rec_index1,
                rec.staname1,
                rec.stla1,
                rec.stlo1,
                rec.stel1,
                rec.rec_index2,
                rec.staname2,
                rec.stla2,
                rec.stlo2,
                rec.stel2,
                phase_with_suffix(&rec.phase, RecordKind::CommonSource),
                rec.tt,
                rec.weight
            )?;
        }

        while let Some(rec) = cr_iter.next_if(|r| r.src_index == src.src_index) {
            writeln!(
                out,
                "   {} {} {} {:6.4} {:6.4} {:6.4} {} {} {:6.4} {:6.4} {:6.4} {} {:6.4} {:6.4}",
                rec.src_index,
                rec.rec_index,
                rec.staname,
                rec.stla,
                rec.stlo,
                rec.stel,
                rec.src_index2,
                rec.event_id2,
                rec.evla2,
                rec.evlo2,
                rec.evdp2,
                phase_with_suffix(&rec.phase, RecordKind::CommonReceiver),
                rec.tt,
                rec.weight
            )?;
        }

        pb.inc(1);
    }

    pb.finish_and_clear();
    out.flush()?;
    Ok(())
}
