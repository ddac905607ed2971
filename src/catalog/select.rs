//! # Selection and filtering engine
//!
//! Predicate-based row removal over the catalog tables. Each operation
//! filters sources and/or records, logs the before/after row counts, and
//! ends with the integrity pass so the removal cascades through every
//! dependent table (see [`Catalog::update`]).
//!
//! All filters are idempotent: applying the same predicate twice leaves the
//! catalog unchanged after the first application.

use ahash::RandomState;
use chrono::NaiveDateTime;
use ordered_float::OrderedFloat;
use std::collections::{HashMap, HashSet};

use crate::constants::{Degree, Kilometer, RecordGroup};
use crate::tomocat_errors::TomocatError;

use super::source::Source;
use super::Catalog;

/// Largest circular gap, in degrees, between consecutive sorted azimuths.
///
/// A single azimuth leaves the full circle open (gap 360); an empty slice is
/// treated the same way.
pub(crate) fn max_circular_gap(azimuths: &[Degree]) -> Degree {
    if azimuths.len() < 2 {
        return 360.0;
    }
    let mut sorted: Vec<Degree> = azimuths.to_vec();
    sorted.sort_by_key(|&a| OrderedFloat(a));

    let mut max_gap = sorted[0] + 360.0 - sorted[sorted.len() - 1];
    for pair in sorted.windows(2) {
        max_gap = max_gap.max(pair[1] - pair[0]);
    }
    max_gap
}

impl Catalog {
    /// Keep sources inside the box, then keep receivers inside the box.
    ///
    /// The two passes are independent: a source is not protected by its
    /// receivers and vice versa. cr pair-side sources outside the box are
    /// removed with their rows by the cascade.
    ///
    /// Arguments
    /// -----------------
    /// * `region` – `[lon_min, lon_max, lat_min, lat_max]` in degrees.
    pub fn select_by_box_region(&mut self, region: [Degree; 4]) -> Result<(), TomocatError> {
        let [lon_min, lon_max, lat_min, lat_max] = region;
        let inside = |la: Degree, lo: Degree| {
            (lat_min..=lat_max).contains(&la) && (lon_min..=lon_max).contains(&lo)
        };

        let before = (self.sources.len(), self.records.len());
        self.sources.retain(|s| inside(s.evla, s.evlo));
        if !self.src_only {
            self.records.retain(|r| inside(r.stla, r.stlo));
            self.cs_records
                .retain(|r| inside(r.stla1, r.stlo1) && inside(r.stla2, r.stlo2));
            self.cr_records.retain(|r| inside(r.stla, r.stlo));
        }
        self.update();
        log::info!(
            "select_by_box_region: sources {} -> {}, records {} -> {}",
            before.0,
            self.sources.len(),
            before.1,
            self.records.len()
        );
        Ok(())
    }

    /// Keep sources whose depth lies in `[dep_min, dep_max]` km.
    pub fn select_by_depth(&mut self, dep_range: [Kilometer; 2]) -> Result<(), TomocatError> {
        let before = self.sources.len();
        self.sources
            .retain(|s| (dep_range[0]..=dep_range[1]).contains(&s.evdp));
        self.update();
        log::info!(
            "select_by_depth: sources {} -> {}",
            before,
            self.sources.len()
        );
        Ok(())
    }

    /// Keep absolute records whose epicentral distance lies in
    /// `[dist_min, dist_max]` degrees.
    ///
    /// Distances are computed lazily through the geometry module; pass
    /// `force` to discard cached values first.
    pub fn select_by_distance(
        &mut self,
        dist_range: [Degree; 2],
        force: bool,
    ) -> Result<(), TomocatError> {
        self.calc_distaz(force)?;

        let before = self.records.len();
        self.records.retain(|r| {
            r.dist_deg
                .map(|d| (dist_range[0]..=dist_range[1]).contains(&d))
                .unwrap_or(false)
        });
        self.update();
        log::info!(
            "select_by_distance: records {} -> {}",
            before,
            self.records.len()
        );
        Ok(())
    }

    /// Keep sources whose azimuthal gap is **strictly below** `max_azi_gap`.
    ///
    /// The gap is the largest angle, seen from the source, between
    /// circularly consecutive station back-azimuths of its absolute
    /// records. Sources with fewer than two records have a full-circle gap
    /// and are always removed for thresholds up to 360.
    pub fn select_by_azi_gap(&mut self, max_azi_gap: Degree) -> Result<(), TomocatError> {
        self.calc_distaz(false)?;

        let mut bazs: HashMap<usize, Vec<Degree>, RandomState> = HashMap::default();
        for r in &self.records {
            let baz = r.baz.ok_or(TomocatError::MissingDistaz)?;
            bazs.entry(r.src_index).or_default().push(baz);
        }

        let before = self.sources.len();
        self.sources.retain(|s| {
            bazs.get(&s.src_index)
                .map(|list| max_circular_gap(list) < max_azi_gap)
                .unwrap_or(false)
        });
        self.update();
        log::info!(
            "select_by_azi_gap: sources {} -> {}",
            before,
            self.sources.len()
        );
        Ok(())
    }

    /// Keep records whose base phase is in `phases`.
    ///
    /// The `,cs`/`,cr` suffix is a serialization artifact and never takes
    /// part in the comparison.
    pub fn select_by_phase(&mut self, phases: &[&str]) -> Result<(), TomocatError> {
        let before = self.records.len() + self.cs_records.len() + self.cr_records.len();
        self.records.retain(|r| phases.contains(&r.phase.as_str()));
        self.cs_records
            .retain(|r| phases.contains(&r.phase.as_str()));
        self.cr_records
            .retain(|r| phases.contains(&r.phase.as_str()));
        self.update();
        log::info!(
            "select_by_phase: records {} -> {}",
            before,
            self.records.len() + self.cs_records.len() + self.cr_records.len()
        );
        Ok(())
    }

    /// Keep sources referenced by at least `min_num_rec` records.
    pub fn select_by_num_rec(&mut self, min_num_rec: usize) -> Result<(), TomocatError> {
        self.update_num_rec();
        let before = self.sources.len();
        self.sources.retain(|s| s.num_rec >= min_num_rec);
        self.update();
        log::info!(
            "select_by_num_rec: sources {} -> {}",
            before,
            self.sources.len()
        );
        Ok(())
    }

    /// Thin sources to one per spatial cell.
    ///
    /// Sources are binned by integer floor-division of latitude, longitude
    /// (degrees) and depth (km) by the respective steps; within each
    /// occupied cell only the source with the highest `num_rec` survives
    /// (first-seen wins ties).
    pub fn select_one_per_cell(
        &mut self,
        lat_step: Degree,
        lon_step: Degree,
        dep_step: Kilometer,
    ) -> Result<(), TomocatError> {
        self.update_num_rec();

        let cell = |s: &Source| {
            (
                (s.evla / lat_step).floor() as i64,
                (s.evlo / lon_step).floor() as i64,
                (s.evdp / dep_step).floor() as i64,
            )
        };

        let mut best: HashMap<(i64, i64, i64), (usize, usize), RandomState> = HashMap::default();
        for src in &self.sources {
            let entry = best.entry(cell(src)).or_insert((src.src_index, src.num_rec));
            if src.num_rec > entry.1 {
                *entry = (src.src_index, src.num_rec);
            }
        }
        let winners: HashSet<usize, RandomState> = best.values().map(|&(idx, _)| idx).collect();

        let before = self.sources.len();
        self.sources.retain(|s| winners.contains(&s.src_index));
        self.update();
        log::info!(
            "select_one_per_cell: sources {} -> {}",
            before,
            self.sources.len()
        );
        Ok(())
    }

    /// Remove near-duplicate events.
    ///
    /// Sources are sorted by (origin time, longitude, latitude); adjacent
    /// rows lying within all three thresholds are duplicates, and the member
    /// of each pair with the smaller record count is dropped (ties drop the
    /// earlier row). The scan repeats until no adjacent duplicate remains,
    /// then the cascade removes the dropped sources' records.
    ///
    /// Arguments
    /// -----------------
    /// * `thre_deg` – Coordinate threshold in degrees (applied to latitude
    ///   and longitude independently).
    /// * `thre_dep` – Depth threshold in km.
    /// * `thre_time_min` – Origin-time threshold in minutes.
    pub fn erase_duplicate_events(
        &mut self,
        thre_deg: Degree,
        thre_dep: Kilometer,
        thre_time_min: f64,
    ) -> Result<(), TomocatError> {
        self.sources.sort_by(|a, b| {
            (a.origin_time, OrderedFloat(a.evlo), OrderedFloat(a.evla)).cmp(&(
                b.origin_time,
                OrderedFloat(b.evlo),
                OrderedFloat(b.evla),
            ))
        });

        let minutes = |a: &NaiveDateTime, b: &NaiveDateTime| {
            (*a - *b).num_milliseconds().abs() as f64 / 60_000.0
        };
        let before = self.sources.len();
        let mut iteration = 0;

        loop {
            let close = |a: &Source, b: &Source| {
                (a.evlo - b.evlo).abs() < thre_deg
                    && (a.evla - b.evla).abs() < thre_deg
                    && (a.evdp - b.evdp).abs() < thre_dep
                    && minutes(&a.origin_time, &b.origin_time) < thre_time_min
            };

            let n = self.sources.len();
            let mut drop = vec![false; n];
            let mut num_duplicated = 0;
            for i in 0..n {
                let dup_prev = i > 0 && close(&self.sources[i - 1], &self.sources[i]);
                let dup_next = i + 1 < n && close(&self.sources[i], &self.sources[i + 1]);
                if dup_prev || dup_next {
                    num_duplicated += 1;
                }
                if dup_prev && self.sources[i].num_rec < self.sources[i - 1].num_rec {
                    drop[i] = true;
                }
                if dup_next && self.sources[i].num_rec <= self.sources[i + 1].num_rec {
                    drop[i] = true;
                }
            }

            log::info!(
                "erase_duplicate_events: iteration {iteration}, duplicated rows: {num_duplicated}"
            );
            if num_duplicated == 0 {
                break;
            }

            let mut it = drop.iter();
            self.sources.retain(|_| !*it.next().unwrap());
            iteration += 1;
        }

        self.update();
        log::info!(
            "erase_duplicate_events: sources {} -> {}",
            before,
            self.sources.len()
        );
        Ok(())
    }

    /// Absolute-record row indices grouped by source, in table order.
    pub(crate) fn records_by_source(&self) -> Vec<(usize, RecordGroup)> {
        let mut order: Vec<(usize, RecordGroup)> = Vec::new();
        let mut position: HashMap<usize, usize, RandomState> = HashMap::default();
        for (row, r) in self.records.iter().enumerate() {
            let at = *position.entry(r.src_index).or_insert_with(|| {
                order.push((r.src_index, RecordGroup::new()));
                order.len() - 1
            });
            order[at].1.push(row);
        }
        order
    }
}

#[cfg(test)]
mod select_test {
    use super::*;
    use crate::test_fixtures::{assert_consistent, small_catalog};
    use approx::assert_relative_eq;

    #[test]
    fn test_max_circular_gap() {
        assert_relative_eq!(max_circular_gap(&[0.0, 90.0, 180.0, 270.0]), 90.0);
        assert_relative_eq!(max_circular_gap(&[0.0, 180.0]), 180.0);
        assert_relative_eq!(max_circular_gap(&[10.0]), 360.0);
        assert_relative_eq!(max_circular_gap(&[350.0, 10.0]), 340.0);
    }

    #[test]
    fn test_select_by_box_region_cascades_both_ways() {
        let mut catalog = small_catalog();
        // box keeps ev001/ev002 sources and STA01/STA02 receivers
        catalog.select_by_box_region([-0.1, 1.6, -0.1, 1.6]).unwrap();
        assert_consistent(&catalog);

        assert!(catalog.sources.iter().all(|s| s.event_id != "ev003"));
        assert!(catalog.receivers.iter().all(|r| r.staname != "STA03"));
        // the surviving records reference surviving entities only
        assert!(catalog.records.iter().all(|r| r.staname != "STA03"));
    }

    #[test]
    fn test_select_by_box_region_idempotent() {
        let region = [-0.1, 1.6, -0.1, 1.6];
        let mut once = small_catalog();
        once.select_by_box_region(region).unwrap();
        let mut twice = small_catalog();
        twice.select_by_box_region(region).unwrap();
        twice.select_by_box_region(region).unwrap();

        assert_eq!(once.sources, twice.sources);
        assert_eq!(once.records, twice.records);
        assert_eq!(once.cs_records, twice.cs_records);
        assert_eq!(once.cr_records, twice.cr_records);
    }

    #[test]
    fn test_select_by_depth() {
        let mut catalog = small_catalog();
        catalog.select_by_depth([0.0, 12.0]).unwrap();
        assert_consistent(&catalog);
        assert!(catalog.sources.iter().all(|s| s.evdp <= 12.0));
        assert!(catalog.sources.iter().any(|s| s.event_id == "ev001"));
    }

    #[test]
    fn test_select_by_distance_lazy_cache() {
        let mut catalog = small_catalog();
        assert!(catalog.records.iter().all(|r| r.dist_deg.is_none()));
        catalog.select_by_distance([0.0, 1.2], false).unwrap();
        assert_consistent(&catalog);
        assert!(catalog
            .records
            .iter()
            .all(|r| r.dist_deg.unwrap() <= 1.2));
    }

    #[test]
    fn test_select_by_phase_ignores_suffix() {
        let mut catalog = small_catalog();
        catalog.select_by_phase(&["P"]).unwrap();
        assert_consistent(&catalog);
        assert!(catalog.records.iter().all(|r| r.phase == "P"));
        // the cs/cr tables hold base phases, so P rows survive there too
        assert!(!catalog.cs_records.is_empty());
        assert!(!catalog.cr_records.is_empty());

        let mut none = small_catalog();
        none.select_by_phase(&["Pn"]).unwrap();
        assert!(none.records.is_empty());
        assert!(none.sources.is_empty());
    }

    #[test]
    fn test_select_by_num_rec() {
        let mut catalog = small_catalog();
        catalog.select_by_num_rec(5).unwrap();
        assert_consistent(&catalog);
        // only ev001 has 5 dependents (3 abs + 1 cs + 1 cr); dropping ev002
        // takes the cr row pairing it down as well
        let ids: Vec<&str> = catalog.sources.iter().map(|s| s.event_id.as_str()).collect();
        assert_eq!(ids, vec!["ev001"]);
        assert!(catalog.cr_records.is_empty());
    }

    #[test]
    fn test_select_by_azi_gap_keeps_below_threshold() {
        let mut catalog = small_catalog();
        catalog.calc_distaz(false).unwrap();

        let gaps: Vec<(String, f64)> = catalog
            .sources
            .iter()
            .map(|s| {
                let bazs: Vec<f64> = catalog
                    .records
                    .iter()
                    .filter(|r| r.src_index == s.src_index)
                    .map(|r| r.baz.unwrap())
                    .collect();
                (s.event_id.clone(), max_circular_gap(&bazs))
            })
            .collect();

        let threshold = 250.0;
        let expected: Vec<&str> = gaps
            .iter()
            .filter(|(_, g)| *g < threshold)
            .map(|(id, _)| id.as_str())
            .collect();

        catalog.select_by_azi_gap(threshold).unwrap();
        assert_consistent(&catalog);
        let kept: Vec<&str> = catalog.sources.iter().map(|s| s.event_id.as_str()).collect();
        for id in &expected {
            assert!(kept.contains(id), "{id} should survive");
        }
        // single-record sources always fall
        assert!(!kept.contains(&"ev003"));
    }

    #[test]
    fn test_select_one_per_cell_keeps_best() {
        let mut catalog = small_catalog();
        // huge cells: every source lands in one of two cells split by sign
        catalog.select_one_per_cell(90.0, 90.0, 100.0).unwrap();
        assert_consistent(&catalog);

        let ids: Vec<&str> = catalog.sources.iter().map(|s| s.event_id.as_str()).collect();
        // ev001 (5 dependents) beats ev002 in the positive cell; ev003 owns its cell
        assert!(ids.contains(&"ev001"));
        assert!(!ids.contains(&"ev002"));
        assert!(ids.contains(&"ev003"));
    }

    #[test]
    fn test_erase_duplicate_events() {
        let mut catalog = small_catalog();
        // clone ev001 into a near-identical weaker twin
        let mut twin = catalog.sources[0].clone();
        twin.src_index = 10;
        twin.event_id = "ev001b".into();
        twin.evla += 0.001;
        twin.num_rec = 0;
        catalog.sources.push(twin);
        catalog
            .records
            .push(crate::test_fixtures::abs_record(10, 0, "STA01", "P", 3.3));
        catalog.update();
        let with_twin = catalog.sources.len();

        catalog.erase_duplicate_events(0.01, 1.0, 1.0).unwrap();
        assert_consistent(&catalog);
        assert_eq!(catalog.sources.len(), with_twin - 1);
        assert!(catalog.sources.iter().any(|s| s.event_id == "ev001"));
        assert!(catalog.sources.iter().all(|s| s.event_id != "ev001b"));
    }
}
