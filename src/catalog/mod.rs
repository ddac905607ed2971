//! # Catalog: the source–receiver relational store
//!
//! High-level facilities to **ingest**, **filter**, **weight**, and
//! **differentiate** seismic travel-time catalogs. The central type is
//! [`Catalog`], which owns four linked tables plus the materialized receiver
//! projection and enforces their referential integrity.
//!
//! Modules
//! -----------------
//! * [`reader`](crate::catalog::reader) – Fixed-form src_rec ASCII parser.
//! * [`writer`](crate::catalog::writer) – The inverse serializer.
//! * [`select`](crate::catalog::select) – Predicate filters with integrity cascade.
//! * [`double_difference`](crate::catalog::double_difference) – cs/cr pair generator.
//! * [`weights`](crate::catalog::weights) – Kernel and cell-density weighting.
//! * [`noise`](crate::catalog::noise) – Synthetic noise injection.
//! * [`source`](crate::catalog::source), [`record`](crate::catalog::record) – Row types.
//!
//! Data model
//! -----------------
//! * **sources** – one row per earthquake, keyed by dense `src_index` and
//!   cross-referenced by unique `event_id`.
//! * **records** – absolute source→receiver travel-time observations.
//! * **cs_records** / **cr_records** – common-source / common-receiver
//!   differential observations.
//! * **receivers** – deduplicated station projection derived from the union
//!   of all record tables; the authoritative list of physical stations.
//!
//! Consistency discipline
//! -----------------
//! Tables are mutated in place by the selection/weighting/difference
//! engines; [`Catalog::update`] is the **sole** point at which the
//! referential invariants are restored. Every public mutating operation of
//! this crate ends by invoking it, so a catalog observed between public
//! calls is always consistent. Batched internal edits stay cheap because
//! nothing is reconciled per-row.
//!
//! Quick-start
//! -----------------
//! ```rust,no_run
//! use camino::Utf8Path;
//! use tomocat::catalog::Catalog;
//! use tomocat::catalog::weights::{WeightRule, WeightTarget};
//! use tomocat::catalog::double_difference::DiffKind;
//!
//! # fn run() -> Result<(), tomocat::tomocat_errors::TomocatError> {
//! let mut catalog = Catalog::read(Utf8Path::new("src_rec_file"))?;
//! catalog.select_by_box_region([-120.0, -115.0, 32.0, 36.0])?;
//! catalog.calc_distaz(false)?;
//! catalog.generate_double_difference(DiffKind::CommonSource, 15.0, 1.5, WeightRule::Average)?;
//! catalog.geo_weighting(WeightTarget::Receivers, 0.5, WeightRule::Average)?;
//! catalog.write(Utf8Path::new("src_rec_file_out"))?;
//! # Ok(()) }
//! ```

pub mod double_difference;
pub mod noise;
pub mod reader;
pub mod record;
pub mod select;
pub mod source;
pub mod weights;
pub mod writer;

use ahash::RandomState;
use camino::{Utf8Path, Utf8PathBuf};
use std::collections::{HashMap, HashSet};

use crate::constants::{Degree, EventMap, Kilometer, StationMap};
use crate::distaz::DistAZ;
use crate::download::fetch_catalog_file;
use crate::rotation::{rtp_rotation, rtp_rotation_reverse};
use crate::tomocat_errors::TomocatError;

use self::reader::{extract_catalog, ReadOptions};
use self::record::{AbsoluteRecord, CommonReceiverRecord, CommonSourceRecord, Receiver};
use self::source::Source;

/// In-memory src_rec catalog: four linked tables and the receiver projection.
///
/// See the [module documentation](crate::catalog) for the data model and the
/// consistency discipline.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    /// Catalog carries sources only; record tables stay empty
    pub src_only: bool,
    /// Source table, dense `src_index` after [`Catalog::update`]
    pub sources: Vec<Source>,
    /// Absolute travel-time records
    pub records: Vec<AbsoluteRecord>,
    /// Common-source differential records
    pub cs_records: Vec<CommonSourceRecord>,
    /// Common-receiver differential records
    pub cr_records: Vec<CommonReceiverRecord>,
    /// Receiver projection, rebuilt by [`Catalog::update`]
    pub receivers: Vec<Receiver>,
    /// Files this catalog was assembled from
    pub fnames: Vec<Utf8PathBuf>,
}

impl Catalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Catalog::default()
    }

    /// Read a catalog with default options.
    ///
    /// Equivalent to [`Catalog::read_with`] with [`ReadOptions::default`].
    pub fn read(path: &Utf8Path) -> Result<Self, TomocatError> {
        Catalog::read_with(path, ReadOptions::default())
    }

    /// Read a catalog from a src_rec file.
    ///
    /// The parsed tables go through the full integrity pass before being
    /// returned, so the resulting catalog has dense indices and accurate
    /// `num_rec` counts regardless of what the file claimed.
    ///
    /// Arguments
    /// -----------------
    /// * `path` – Path to the src_rec file.
    /// * `options` – Column-layout options, see [`ReadOptions`].
    ///
    /// Return
    /// ----------
    /// * The consistent catalog, or a [`TomocatError`] on I/O or parse
    ///   failure (no partial catalog is returned).
    pub fn read_with(path: &Utf8Path, options: ReadOptions) -> Result<Self, TomocatError> {
        let (sources, records, cs_records, cr_records) = extract_catalog(path, &options)?;

        let mut catalog = Catalog {
            src_only: options.src_only,
            sources,
            records,
            cs_records,
            cr_records,
            receivers: Vec::new(),
            fnames: vec![path.to_path_buf()],
        };
        catalog.update();
        Ok(catalog)
    }

    /// Read a catalog, downloading it first when the path is missing locally.
    ///
    /// See [`fetch_catalog_file`](crate::download::fetch_catalog_file) for
    /// the download semantics; absence of both the local file and the remote
    /// resource is a hard error.
    pub fn read_or_fetch(
        path: &Utf8Path,
        url: &str,
        options: ReadOptions,
    ) -> Result<Self, TomocatError> {
        let local = fetch_catalog_file(path, url)?;
        Catalog::read_with(&local, options)
    }

    /// Serialize the catalog to a src_rec file.
    ///
    /// The integrity pass runs first, so the emitted file always has dense
    /// indices and accurate counts.
    pub fn write(&mut self, path: &Utf8Path) -> Result<(), TomocatError> {
        self.update();
        writer::write_catalog(self, path)
    }

    // ---------------------------------------------------------------------
    // Integrity maintenance
    // ---------------------------------------------------------------------

    /// Restore every referential invariant of the store.
    ///
    /// In order: duplicate `event_id` eviction (first occurrence wins),
    /// cross-table cascade (orphaned records drop, record-less sources drop
    /// unless kept alive by a cr pair reference), `num_rec` recount, dense
    /// reindex of `src_index` (remapping every foreign key, cr pair sides by
    /// `event_id2`), dense per-source `rec_index` assignment for the
    /// absolute and cr tables, stable sort of all tables, and a rebuild of
    /// the receiver projection.
    ///
    /// This is the sole consistency boundary: mutating operations batch
    /// their edits and end with this pass.
    pub fn update(&mut self) {
        self.erase_src_with_duplicated_evid();
        self.cascade_records_to_sources();
        self.cascade_sources_to_records();
        self.update_num_rec();
        self.reset_index();
        self.sort_tables();
        self.update_unique_receivers();
    }

    /// Drop sources reusing an `event_id`, keeping the first occurrence.
    ///
    /// The losers' dependents are removed by the record↔source cascade that
    /// follows in [`Catalog::update`].
    fn erase_src_with_duplicated_evid(&mut self) {
        let mut seen: HashSet<String, RandomState> = HashSet::default();
        let keep: Vec<bool> = self
            .sources
            .iter()
            .map(|s| seen.insert(s.event_id.clone()))
            .collect();
        if keep.iter().all(|&k| k) {
            return;
        }

        let mut it = keep.iter();
        self.sources.retain(|_| *it.next().unwrap());
        log::info!(
            "dropped {} source(s) with duplicated event_id",
            keep.iter().filter(|&&k| !k).count()
        );
    }

    /// Drop records whose source no longer exists. cr rows additionally
    /// require their pair-side `event_id2` to resolve.
    fn cascade_records_to_sources(&mut self) {
        let alive: HashSet<usize, RandomState> =
            self.sources.iter().map(|s| s.src_index).collect();
        let evids: HashSet<&str, RandomState> =
            self.sources.iter().map(|s| s.event_id.as_str()).collect();

        self.records.retain(|r| alive.contains(&r.src_index));
        self.cs_records.retain(|r| alive.contains(&r.src_index));
        self.cr_records
            .retain(|r| alive.contains(&r.src_index) && evids.contains(r.event_id2.as_str()));
    }

    /// Drop sources with no remaining records. A source referenced only as a
    /// cr pair side stays alive. Catalogs in `src_only` mode keep every
    /// source.
    fn cascade_sources_to_records(&mut self) {
        if self.src_only {
            return;
        }

        let mut referenced: HashSet<usize, RandomState> = HashSet::default();
        for r in &self.records {
            referenced.insert(r.src_index);
        }
        for r in &self.cs_records {
            referenced.insert(r.src_index);
        }
        let mut paired_evids: HashSet<&str, RandomState> = HashSet::default();
        for r in &self.cr_records {
            referenced.insert(r.src_index);
            paired_evids.insert(r.event_id2.as_str());
        }

        let before = self.sources.len();
        self.sources.retain(|s| {
            referenced.contains(&s.src_index) || paired_evids.contains(s.event_id.as_str())
        });
        if self.sources.len() != before {
            log::info!(
                "dropped {} source(s) without remaining records",
                before - self.sources.len()
            );
        }
    }

    /// Recompute the per-source record count over all three record tables.
    ///
    /// A `src_only` catalog keeps the counts the file declared – there are
    /// no records to count them from.
    fn update_num_rec(&mut self) {
        if self.src_only {
            return;
        }
        let mut counts: HashMap<usize, usize, RandomState> = HashMap::default();
        for r in &self.records {
            *counts.entry(r.src_index).or_insert(0) += 1;
        }
        for r in &self.cs_records {
            *counts.entry(r.src_index).or_insert(0) += 1;
        }
        for r in &self.cr_records {
            *counts.entry(r.src_index).or_insert(0) += 1;
        }
        for src in &mut self.sources {
            src.num_rec = counts.get(&src.src_index).copied().unwrap_or(0);
        }
    }

    /// Reassign `src_index` to the dense 0..N-1 space given by the current
    /// source order, remapping every foreign key (cr pair sides through
    /// `event_id2`), and assign dense per-source `rec_index` values to the
    /// absolute and cr tables.
    pub fn reset_index(&mut self) {
        let index_map: HashMap<usize, usize, RandomState> = self
            .sources
            .iter()
            .enumerate()
            .map(|(new, s)| (s.src_index, new))
            .collect();
        let evid_map: EventMap = self
            .sources
            .iter()
            .enumerate()
            .map(|(new, s)| (s.event_id.clone(), new))
            .collect();

        for (new, src) in self.sources.iter_mut().enumerate() {
            src.src_index = new;
        }
        for r in &mut self.records {
            r.src_index = index_map[&r.src_index];
        }
        for r in &mut self.cs_records {
            r.src_index = index_map[&r.src_index];
        }
        for r in &mut self.cr_records {
            r.src_index = index_map[&r.src_index];
            r.src_index2 = evid_map[&r.event_id2];
        }

        // dense per-source rec_index, preserving relative row order
        let mut cursor: HashMap<usize, usize, RandomState> = HashMap::default();
        for r in &mut self.records {
            let c = cursor.entry(r.src_index).or_insert(0);
            r.rec_index = *c;
            *c += 1;
        }
        cursor.clear();
        for r in &mut self.cr_records {
            let c = cursor.entry(r.src_index).or_insert(0);
            r.rec_index = *c;
            *c += 1;
        }
    }

    /// Stable-sort all tables by `(src_index, rec_index…)`.
    fn sort_tables(&mut self) {
        self.sources.sort_by_key(|s| s.src_index);
        self.records.sort_by_key(|r| (r.src_index, r.rec_index));
        self.cs_records
            .sort_by_key(|r| (r.src_index, r.rec_index1, r.rec_index2));
        self.cr_records.sort_by_key(|r| (r.src_index, r.rec_index));
    }

    /// Rebuild the receiver projection from the union of all record tables.
    ///
    /// Coordinates come from the first appearance of each station; weights
    /// assigned by a previous weighting pass are preserved across rebuilds.
    fn update_unique_receivers(&mut self) {
        let previous: HashMap<String, f64, RandomState> = self
            .receivers
            .drain(..)
            .map(|r| (r.staname, r.weight))
            .collect();

        let mut seen: StationMap = HashMap::default();
        let mut receivers: Vec<Receiver> = Vec::new();

        let mut push = |name: &str, stla: Degree, stlo: Degree, stel: f64| {
            if !seen.contains_key(name) {
                seen.insert(name.to_string(), receivers.len());
                receivers.push(Receiver {
                    staname: name.to_string(),
                    stla,
                    stlo,
                    stel,
                    weight: previous.get(name).copied().unwrap_or(1.0),
                });
            }
        };

        for r in &self.records {
            push(&r.staname, r.stla, r.stlo, r.stel);
        }
        for r in &self.cs_records {
            push(&r.staname1, r.stla1, r.stlo1, r.stel1);
            push(&r.staname2, r.stla2, r.stlo2, r.stel2);
        }
        for r in &self.cr_records {
            push(&r.staname, r.stla, r.stlo, r.stel);
        }

        receivers.sort_by(|a, b| a.staname.cmp(&b.staname));
        self.receivers = receivers;
    }

    // ---------------------------------------------------------------------
    // Concatenation
    // ---------------------------------------------------------------------

    /// Append another catalog to this one.
    ///
    /// Both catalogs are reindexed first to normalize their `src_index`
    /// spaces; the other catalog's indices are then offset past this
    /// catalog's sources, every table is concatenated, and sources are
    /// tagged with their file of origin when the catalogs come from
    /// different files. Ends with the integrity pass (which also resolves
    /// any `event_id` collision in favor of this catalog's row).
    ///
    /// Arguments
    /// -----------------
    /// * `other` – The catalog to absorb; consumed.
    ///
    /// Return
    /// ----------
    /// * `Err(TomocatError::SrcOnlyMismatch)` when one catalog is
    ///   `src_only` and the other is not; `Ok(())` otherwise.
    pub fn append(&mut self, mut other: Catalog) -> Result<(), TomocatError> {
        if self.src_only != other.src_only {
            return Err(TomocatError::SrcOnlyMismatch);
        }

        self.reset_index();
        other.reset_index();

        if self.fnames.first() != other.fnames.first() {
            let own = self.fnames.first().cloned();
            for src in self.sources.iter_mut().filter(|s| s.fname.is_none()) {
                src.fname = own.clone();
            }
            let theirs = other.fnames.first().cloned();
            for src in other.sources.iter_mut().filter(|s| s.fname.is_none()) {
                src.fname = theirs.clone();
            }
        }

        let offset = self.sources.len();
        for src in &mut other.sources {
            src.src_index += offset;
        }
        for r in &mut other.records {
            r.src_index += offset;
        }
        for r in &mut other.cs_records {
            r.src_index += offset;
        }
        for r in &mut other.cr_records {
            r.src_index += offset;
            r.src_index2 += offset;
        }

        self.sources.append(&mut other.sources);
        self.records.append(&mut other.records);
        self.cs_records.append(&mut other.cs_records);
        self.cr_records.append(&mut other.cr_records);
        self.fnames.append(&mut other.fnames);

        self.update();
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Geometry
    // ---------------------------------------------------------------------

    /// Fill the cached distance/azimuth/back-azimuth columns of the
    /// absolute-record table.
    ///
    /// Rows already carrying a cached distance are skipped unless `force`
    /// is set.
    ///
    /// Arguments
    /// -----------------
    /// * `force` – Recompute even where a cached value exists.
    pub fn calc_distaz(&mut self, force: bool) -> Result<(), TomocatError> {
        let positions: HashMap<usize, (Degree, Degree), RandomState> = self
            .sources
            .iter()
            .map(|s| (s.src_index, (s.evla, s.evlo)))
            .collect();

        for rec in &mut self.records {
            if rec.dist_deg.is_some() && rec.az.is_some() && !force {
                continue;
            }
            let &(evla, evlo) = positions
                .get(&rec.src_index)
                .ok_or(TomocatError::SourceNotFound(rec.src_index))?;
            let d = DistAZ::new(evla, evlo, rec.stla, rec.stlo);
            rec.dist_deg = Some(d.delta);
            rec.az = Some(d.az);
            rec.baz = Some(d.baz);
        }
        Ok(())
    }

    /// Refresh every denormalized coordinate copy from the authoritative
    /// entity lists.
    ///
    /// Receiver coordinates flow into absolute/cs/cr rows by station name;
    /// paired-source coordinates flow into cr rows by `event_id2`. Must run
    /// after any operation that rewrites the projections (rotation,
    /// projection to planar coordinates, hypocenter perturbation).
    pub fn refresh_locations(&mut self) {
        let stations: HashMap<&str, (Degree, Degree, f64), RandomState> = self
            .receivers
            .iter()
            .map(|r| (r.staname.as_str(), (r.stla, r.stlo, r.stel)))
            .collect();
        let events: HashMap<&str, (Degree, Degree, Kilometer), RandomState> = self
            .sources
            .iter()
            .map(|s| (s.event_id.as_str(), (s.evla, s.evlo, s.evdp)))
            .collect();

        for r in &mut self.records {
            if let Some(&(la, lo, el)) = stations.get(r.staname.as_str()) {
                (r.stla, r.stlo, r.stel) = (la, lo, el);
            }
        }
        for r in &mut self.cs_records {
            if let Some(&(la, lo, el)) = stations.get(r.staname1.as_str()) {
                (r.stla1, r.stlo1, r.stel1) = (la, lo, el);
            }
            if let Some(&(la, lo, el)) = stations.get(r.staname2.as_str()) {
                (r.stla2, r.stlo2, r.stel2) = (la, lo, el);
            }
        }
        for r in &mut self.cr_records {
            if let Some(&(la, lo, el)) = stations.get(r.staname.as_str()) {
                (r.stla, r.stlo, r.stel) = (la, lo, el);
            }
            if let Some(&(la, lo, dp)) = events.get(r.event_id2.as_str()) {
                (r.evla2, r.evlo2, r.evdp2) = (la, lo, dp);
            }
        }
    }

    /// Rotate every source and receiver coordinate into the frame in which
    /// `(clat, clon)` is the origin, with an extra twist of `angle` degrees;
    /// `reverse` applies the exact inverse.
    ///
    /// Denormalized copies are refreshed and cached distances are cleared
    /// (recompute with [`Catalog::calc_distaz`]).
    pub fn rotate(&mut self, clat: Degree, clon: Degree, angle: Degree, reverse: bool) {
        let transform = |la: Degree, lo: Degree| -> (Degree, Degree) {
            if reverse {
                rtp_rotation_reverse(la, lo, clat, clon, angle)
            } else {
                rtp_rotation(la, lo, clat, clon, angle)
            }
        };

        for src in &mut self.sources {
            (src.evla, src.evlo) = transform(src.evla, src.evlo);
        }
        for rec in &mut self.receivers {
            (rec.stla, rec.stlo) = transform(rec.stla, rec.stlo);
        }

        self.invalidate_distaz();
        self.refresh_locations();
    }

    /// Project every source and receiver coordinate to UTM kilometers in the
    /// given zone, writing easting into the longitude fields and northing
    /// into the latitude fields.
    ///
    /// Denormalized copies are refreshed and cached distances are cleared;
    /// degree-based operations are meaningless afterwards.
    pub fn to_utm(&mut self, zone: u8) {
        for src in &mut self.sources {
            let (northing, easting, _) = utm::to_utm_wgs84(src.evla, src.evlo, zone);
            src.evla = northing / 1000.0;
            src.evlo = easting / 1000.0;
        }
        for rec in &mut self.receivers {
            let (northing, easting, _) = utm::to_utm_wgs84(rec.stla, rec.stlo, zone);
            rec.stla = northing / 1000.0;
            rec.stlo = easting / 1000.0;
        }

        self.invalidate_distaz();
        self.refresh_locations();
    }

    fn invalidate_distaz(&mut self) {
        for rec in &mut self.records {
            rec.dist_deg = None;
            rec.az = None;
            rec.baz = None;
        }
    }

    // ---------------------------------------------------------------------
    // Flat views for collaborators
    // ---------------------------------------------------------------------

    /// Source positions as `(evlo, evla, evdp, weight)` tuples.
    pub fn source_positions(&self) -> Vec<(Degree, Degree, Kilometer, f64)> {
        self.sources
            .iter()
            .map(|s| (s.evlo, s.evla, s.evdp, s.weight))
            .collect()
    }

    /// Receiver positions as `(stlo, stla, stel, weight)` tuples.
    pub fn receiver_positions(&self) -> Vec<(Degree, Degree, f64, f64)> {
        self.receivers
            .iter()
            .map(|r| (r.stlo, r.stla, r.stel, r.weight))
            .collect()
    }
}

impl std::fmt::Display for Catalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "tomocat Catalog: files={:?}, src_only={}, sources={}, receivers={}, records={} (cs={}, cr={})",
            self.fnames,
            self.src_only,
            self.sources.len(),
            self.receivers.len(),
            self.records.len(),
            self.cs_records.len(),
            self.cr_records.len()
        )
    }
}

#[cfg(test)]
mod catalog_test {
    use super::*;
    use crate::test_fixtures::{abs_record, assert_consistent, small_catalog, source};
    use approx::assert_relative_eq;

    #[test]
    fn test_update_restores_invariants() {
        let mut catalog = small_catalog();
        assert_consistent(&catalog);

        // wreck the indices and counts, then update
        catalog.sources[0].src_index = 17;
        for r in &mut catalog.records {
            if r.src_index == 0 {
                r.src_index = 17;
            }
        }
        catalog.sources[1].num_rec = 99;
        catalog.update();
        assert_consistent(&catalog);
    }

    #[test]
    fn test_update_drops_orphan_records_and_empty_sources() {
        let mut catalog = small_catalog();
        let n_src = catalog.sources.len();

        // orphan: a record pointing at a source that never existed
        catalog.records.push(abs_record(42, 0, "STA01", "P", 9.9));
        // empty source: remove every record of the last source
        let last = n_src - 1;
        catalog.records.retain(|r| r.src_index != last);
        catalog.cs_records.retain(|r| r.src_index != last);
        catalog
            .cr_records
            .retain(|r| r.src_index != last && r.src_index2 != last);

        catalog.update();
        assert_consistent(&catalog);
        assert!(catalog.sources.iter().all(|s| s.src_index != 42));
        assert_eq!(catalog.sources.len(), n_src - 1);
    }

    #[test]
    fn test_update_keeps_cr_paired_source_alive() {
        let mut catalog = small_catalog();
        // strip every direct record of ev002 but keep the cr row pairing it
        catalog.records.retain(|r| r.src_index != 1);
        catalog.cs_records.retain(|r| r.src_index != 1);
        assert!(catalog.cr_records.iter().any(|r| r.event_id2 == "ev002"));

        catalog.update();
        assert_consistent(&catalog);
        assert!(catalog.sources.iter().any(|s| s.event_id == "ev002"));
    }

    #[test]
    fn test_duplicate_event_id_first_wins() {
        let mut catalog = small_catalog();
        let mut dup = source(99, "ev001", 10.0, 10.0, 5.0);
        dup.mag = 9.0;
        catalog.sources.push(dup);
        catalog.records.push(abs_record(99, 0, "STA01", "P", 1.0));

        catalog.update();
        assert_consistent(&catalog);
        let survivors: Vec<_> = catalog
            .sources
            .iter()
            .filter(|s| s.event_id == "ev001")
            .collect();
        assert_eq!(survivors.len(), 1);
        assert!(survivors[0].mag < 9.0, "the first occurrence must win");
    }

    #[test]
    fn test_append_offsets_and_merges() {
        let mut a = small_catalog();
        let n_a = a.sources.len();
        let mut b = small_catalog();
        // disambiguate event ids so nothing collides
        for (i, src) in b.sources.iter_mut().enumerate() {
            src.event_id = format!("other{i:03}");
        }
        for r in &mut b.cr_records {
            r.event_id2 = format!("other{:03}", r.src_index2);
        }
        b.fnames = vec!["other_file".into()];
        let n_b = b.sources.len();

        a.append(b).unwrap();
        assert_consistent(&a);
        assert_eq!(a.sources.len(), n_a + n_b);
        assert_eq!(a.fnames.len(), 2);
        // provenance tags present on both halves
        assert!(a.sources.iter().all(|s| s.fname.is_some()));
    }

    #[test]
    fn test_append_src_only_mismatch() {
        let mut a = small_catalog();
        let mut b = small_catalog();
        b.src_only = true;
        assert_eq!(a.append(b).unwrap_err(), TomocatError::SrcOnlyMismatch);
    }

    #[test]
    fn test_calc_distaz_lazy_and_forced() {
        let mut catalog = small_catalog();
        catalog.calc_distaz(false).unwrap();
        assert!(catalog.records.iter().all(|r| r.dist_deg.is_some()));

        let cached = catalog.records[0].dist_deg.unwrap();
        catalog.records[0].dist_deg = Some(cached + 5.0);
        catalog.calc_distaz(false).unwrap();
        assert_relative_eq!(catalog.records[0].dist_deg.unwrap(), cached + 5.0);
        catalog.calc_distaz(true).unwrap();
        assert_relative_eq!(catalog.records[0].dist_deg.unwrap(), cached);
    }

    #[test]
    fn test_rotate_roundtrip_restores_coordinates() {
        let mut catalog = small_catalog();
        let original: Vec<(f64, f64)> = catalog.sources.iter().map(|s| (s.evla, s.evlo)).collect();

        catalog.rotate(5.0, 12.0, 30.0, false);
        catalog.rotate(5.0, 12.0, 30.0, true);

        for (src, &(la, lo)) in catalog.sources.iter().zip(&original) {
            assert_relative_eq!(src.evla, la, epsilon = 1e-9);
            assert_relative_eq!(src.evlo, lo, epsilon = 1e-9);
        }
        // caches were invalidated on the way
        assert!(catalog.records.iter().all(|r| r.dist_deg.is_none()));
    }

    #[test]
    fn test_rotate_refreshes_denormalized_copies() {
        let mut catalog = small_catalog();
        catalog.rotate(5.0, 12.0, 0.0, false);

        for r in &catalog.cs_records {
            let rec1 = catalog
                .receivers
                .iter()
                .find(|x| x.staname == r.staname1)
                .unwrap();
            assert_relative_eq!(r.stla1, rec1.stla);
            assert_relative_eq!(r.stlo1, rec1.stlo);
        }
        for r in &catalog.cr_records {
            let paired = catalog
                .sources
                .iter()
                .find(|s| s.event_id == r.event_id2)
                .unwrap();
            assert_relative_eq!(r.evla2, paired.evla);
            assert_relative_eq!(r.evlo2, paired.evlo);
        }
    }
}
