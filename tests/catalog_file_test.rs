use chrono::{Datelike, Timelike};
use tomocat::{Catalog, ReadOptions, TomocatError};

mod common;
use common::{assert_consistent, data_path, temp_path};

#[test]
fn test_read_reference_catalog() {
    let catalog = Catalog::read(&data_path("src_rec_test.dat")).unwrap();
    assert_consistent(&catalog);

    assert_eq!(catalog.sources.len(), 3);
    assert_eq!(catalog.records.len(), 6);
    assert_eq!(catalog.cs_records.len(), 1);
    assert_eq!(catalog.cr_records.len(), 1);
    assert_eq!(catalog.receivers.len(), 3);

    let first = &catalog.sources[0];
    assert_eq!(first.event_id, "eq20180503142210");
    assert_eq!(first.origin_time.year(), 2018);
    assert_eq!(first.origin_time.month(), 5);
    assert_eq!(first.origin_time.second(), 10);
    assert_eq!(first.origin_time.nanosecond() / 1000, 120_000);
    assert_eq!(first.evla, 1.0);
    assert_eq!(first.evdp, 10.0);
    // 3 absolute + 1 cs dependents
    assert_eq!(first.num_rec, 4);

    // missing weight columns default to 1.0
    let second = &catalog.sources[1];
    assert_eq!(second.weight, 1.0);
    let rec = catalog
        .records
        .iter()
        .find(|r| r.src_index == 1 && r.staname == "AA01")
        .unwrap();
    assert_eq!(rec.weight, 1.0);
    let rec = catalog
        .records
        .iter()
        .find(|r| r.src_index == 1 && r.staname == "AA02")
        .unwrap();
    assert_eq!(rec.weight, 0.9);

    // the cs/cr suffix lives only in the file
    assert_eq!(catalog.cs_records[0].phase, "P");
    assert_eq!(catalog.cr_records[0].phase, "P");
    assert_eq!(catalog.cr_records[0].event_id2, "eq20180504021105");
}

#[test]
fn test_roundtrip_preserves_all_tables() {
    let mut catalog = Catalog::read(&data_path("src_rec_test.dat")).unwrap();

    let out = temp_path("tomocat_roundtrip.dat");
    catalog.write(&out).unwrap();
    let reread = Catalog::read(&out).unwrap();
    std::fs::remove_file(&out).unwrap();

    assert_eq!(catalog.sources, reread.sources);
    assert_eq!(catalog.records, reread.records);
    assert_eq!(catalog.cs_records, reread.cs_records);
    assert_eq!(catalog.cr_records, reread.cr_records);
    assert_eq!(catalog.receivers, reread.receivers);
}

#[test]
fn test_src_only_read_keeps_declared_counts() {
    let options = ReadOptions {
        src_only: true,
        ..ReadOptions::default()
    };
    let catalog = Catalog::read_with(&data_path("src_rec_test.dat"), options).unwrap();

    assert!(catalog.src_only);
    assert_eq!(catalog.sources.len(), 3);
    assert!(catalog.records.is_empty());
    assert!(catalog.cs_records.is_empty());
    assert!(catalog.cr_records.is_empty());
    // counts come from the source lines, not from (absent) records
    assert_eq!(catalog.sources[0].num_rec, 4);
    assert_eq!(catalog.sources[1].num_rec, 2);
}

#[test]
fn test_missing_file_is_a_hard_error() {
    let result = Catalog::read(&data_path("no_such_catalog.dat"));
    assert!(matches!(result, Err(TomocatError::CatalogFileNotFound(_))));
}

#[test]
fn test_append_catalogs_from_two_files() {
    let mut catalog = Catalog::read(&data_path("src_rec_test.dat")).unwrap();

    // a second copy with disjoint event ids stands in for another campaign
    let mut other = Catalog::read(&data_path("src_rec_test.dat")).unwrap();
    for src in &mut other.sources {
        src.event_id = format!("{}b", src.event_id);
    }
    for r in &mut other.cr_records {
        r.event_id2 = format!("{}b", r.event_id2);
    }
    let renamed = temp_path("tomocat_append_other.dat");
    other.write(&renamed).unwrap();
    let other = Catalog::read(&renamed).unwrap();
    std::fs::remove_file(&renamed).unwrap();

    let n_sources = catalog.sources.len();
    let n_records = catalog.records.len();
    catalog.append(other).unwrap();
    assert_consistent(&catalog);

    assert_eq!(catalog.sources.len(), 2 * n_sources);
    assert_eq!(catalog.records.len(), 2 * n_records);
    assert_eq!(catalog.fnames.len(), 2);
    // both halves carry their provenance tag
    assert!(catalog.sources.iter().all(|s| s.fname.is_some()));
}
