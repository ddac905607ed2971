use camino::Utf8PathBuf;
use tomocat::Catalog;

/// Path to a fixture under `tests/data`.
pub fn data_path(name: &str) -> Utf8PathBuf {
    Utf8PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(name)
}

/// A scratch path in the system temp directory.
pub fn temp_path(name: &str) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(std::env::temp_dir())
        .expect("temp dir must be valid UTF-8")
        .join(name)
}

/// Assert every invariant the integrity pass promises.
pub fn assert_consistent(catalog: &Catalog) {
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
}
