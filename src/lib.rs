pub mod catalog;
pub mod constants;
pub mod distaz;
pub mod download;
pub mod params;
pub mod rotation;
pub mod tomocat_errors;

pub use catalog::reader::ReadOptions;
pub use catalog::Catalog;
pub use tomocat_errors::TomocatError;

#[cfg(test)]
pub(crate) mod test_fixtures {
    use chrono::NaiveDate;

    use crate::catalog::record::{AbsoluteRecord, CommonReceiverRecord, CommonSourceRecord};
    use crate::catalog::source::Source;
    use crate::catalog::Catalog;
    use crate::constants::{Degree, Meter};

    /// Coordinates of the synthetic test network.
    pub(crate) fn station(name: &str) -> (Degree, Degree, Meter) {
        match name {
            "STA01" => (0.0, 0.5, 100.0),
            "STA02" => (0.5, 0.0, 200.0),
            "STA03" => (2.0, 2.0, 300.0),
            other => panic!("unknown test station {other}"),
        }
    }

    pub(crate) fn source(
        src_index: usize,
        event_id: &str,
        evla: Degree,
        evlo: Degree,
        evdp: f64,
    ) -> Source {
        Source {
            src_index,
            origin_time: NaiveDate::from_ymd_opt(2019, 7, 6)
                .unwrap()
                .and_hms_micro_opt(3, 19, 53, 40_000)
                .unwrap()
                + chrono::Duration::seconds(90 * src_index as i64),
            evla,
            evlo,
            evdp,
            mag: 2.5,
            num_rec: 0,
            event_id: event_id.to_string(),
            weight: 1.0,
            fname: None,
        }
    }

    pub(crate) fn abs_record(
        src_index: usize,
        rec_index: usize,
        staname: &str,
        phase: &str,
        tt: f64,
    ) -> AbsoluteRecord {
        let (stla, stlo, stel) = station(staname);
        AbsoluteRecord {
            src_index,
            rec_index,
            staname: staname.to_string(),
            stla,
            stlo,
            stel,
            phase: phase.to_string(),
            tt,
            weight: 1.0,
            dist_deg: None,
            az: None,
            baz: None,
        }
    }

    /// A three-event, three-station catalog exercising all four tables.
    pub(crate) fn small_catalog() -> Catalog {
        let sources = vec![
            source(0, "ev001", 1.0, 1.0, 10.0),
            source(1, "ev002", 1.5, 1.5, 20.0),
            source(2, "ev003", -0.5, -0.5, 5.0),
        ];
        let records = vec![
            abs_record(0, 0, "STA01", "P", 12.0),
            abs_record(0, 1, "STA02", "P", 13.5),
            abs_record(0, 2, "STA03", "S", 20.0),
            abs_record(1, 0, "STA01", "P", 15.0),
            abs_record(1, 1, "STA02", "P", 16.0),
            abs_record(2, 0, "STA01", "P", 11.0),
        ];

        let (stla1, stlo1, stel1) = station("STA01");
        let (stla2, stlo2, stel2) = station("STA02");
        let cs_records = vec![CommonSourceRecord {
            src_index: 0,
            rec_index1: 0,
            staname1: "STA01".to_string(),
            stla1,
            stlo1,
            stel1,
            rec_index2: 1,
            staname2: "STA02".to_string(),
            stla2,
            stlo2,
            stel2,
            phase: "P".to_string(),
            tt: 12.0 - 13.5,
            weight: 1.0,
        }];
        let cr_records = vec![CommonReceiverRecord {
            src_index: 0,
            rec_index: 0,
            staname: "STA01".to_string(),
            stla: stla1,
            stlo: stlo1,
            stel: stel1,
            src_index2: 1,
            event_id2: "ev002".to_string(),
            evla2: 1.5,
            evlo2: 1.5,
            evdp2: 20.0,
            phase: "P".to_string(),
            tt: 12.0 - 15.0,
            weight: 1.0,
        }];

        let mut catalog = Catalog {
            src_only: false,
            sources,
            records,
            cs_records,
            cr_records,
            receivers: Vec::new(),
            fnames: vec!["test_fixture".into()],
        };
        catalog.update();
        catalog
    }

    /// Every invariant the integrity pass promises.
    pub(crate) fn assert_consistent(catalog: &Catalog) {
        for (i, src) in catalog.sources.iter().enumerate() {
            assert_eq!(src.src_index, i, "src_index must be dense");
        }
        let n = catalog.sources.len();
        for r in &catalog.records {
            assert!(r.src_index < n, "absolute record with dangling src_index");
        }
        for r in &catalog.cs_records {
            assert!(r.src_index < n, "cs record with dangling src_index");
        }
        for r in &catalog.cr_records {
            assert!(r.src_index < n, "cr record with dangling src_index");
            assert!(r.src_index2 < n, "cr record with dangling src_index2");
            assert_eq!(
                catalog.sources[r.src_index2].event_id, r.event_id2,
                "cr pair side must resolve through event_id2"
            );
        }
        for src in &catalog.sources {
            let count = catalog
                .records
                .iter()
                .filter(|r| r.src_index == src.src_index)
                .count()
                + catalog
                    .cs_records
                    .iter()
                    .filter(|r| r.src_index == src.src_index)
                    .count()
                + catalog
                    .cr_records
                    .iter()
                    .filter(|r| r.src_index == src.src_index)
                    .count();
            assert_eq!(src.num_rec, count, "num_rec mismatch for {}", src.event_id);
        }
        for src in &catalog.sources {
            let mut expected = 0;
            for r in catalog
                .records
                .iter()
                .filter(|r| r.src_index == src.src_index)
            {
                assert_eq!(r.rec_index, expected, "rec_index must be dense per source");
                expected += 1;
            }
        }
    }
}
