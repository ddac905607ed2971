//! Remote catalog retrieval.
//!
//! Catalogs referenced by path are normally read from disk; when the file is
//! absent the reader can fall back to streaming it from a remote URL. The
//! download is chunked, reports byte progress, and a failed or truncated
//! transfer is surfaced as [`TomocatError::CatalogUnavailable`] – explicitly
//! distinguishable from a file that simply does not exist locally.

use camino::{Utf8Path, Utf8PathBuf};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::{fs::File, io::AsyncWriteExt};
use tokio_stream::StreamExt;

use crate::tomocat_errors::TomocatError;

/// Stream a file from `url` to `path`, reporting byte progress.
///
/// Arguments
/// ---------
/// * `url`: the URL of the file to download
/// * `path`: the path to save the downloaded file
///
/// Return
/// ------
/// * `Ok(())` on a complete transfer, an error otherwise. A short read
///   against a known `Content-Length` is treated as a failure.
async fn download_catalog(url: &str, path: &Utf8Path) -> Result<(), TomocatError> {
    let response = reqwest::get(url).await?;
    if !response.status().is_success() {
        return Err(TomocatError::CatalogUnavailable(url.to_string()));
    }

    let total = response.content_length();
    let pb = match total {
        Some(n) => {
            let pb = ProgressBar::new(n);
            pb.set_style(
                ProgressStyle::with_template(
                    "{msg} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec})",
                )
                .expect("indicatif template")
                .progress_chars("=> "),
            );
            pb
        }
        None => ProgressBar::new_spinner(),
    };
    pb.set_message(format!("Downloading {url}"));

    let mut file = File::create(path).await?;
    let mut stream = response.bytes_stream();
    let mut written: u64 = 0;

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
        pb.inc(chunk.len() as u64);
    }
    file.flush().await?;
    pb.finish_with_message(format!("Downloaded {url}"));

    if let Some(expected) = total {
        if written != expected {
            return Err(TomocatError::CatalogUnavailable(url.to_string()));
        }
    }

    Ok(())
}

/// Resolve a catalog path, downloading it when missing locally.
///
/// Arguments
/// ---------
/// * `path`: the expected local location of the catalog file
/// * `url`: the remote fallback to stream from when `path` does not exist
///
/// Return
/// ------
/// * The path to a readable local copy, or
///   [`TomocatError::CatalogUnavailable`] when neither the file nor the
///   remote resource can be obtained.
pub fn fetch_catalog_file(path: &Utf8Path, url: &str) -> Result<Utf8PathBuf, TomocatError> {
    if path.exists() {
        return Ok(path.to_path_buf());
    }

    if url.is_empty() {
        return Err(TomocatError::InvalidUrl(url.to_string()));
    }

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(download_catalog(url, path)).inspect_err(|_| {
        // a failed download must not leave a partial file at `path`
        let _ = std::fs::remove_file(path);
    })?;

    Ok(path.to_path_buf())
}

#[cfg(test)]
mod download_test {
    use super::*;

    #[test]
    fn test_existing_file_is_not_downloaded() {
        let dir = Utf8PathBuf::from_path_buf(std::env::temp_dir()).unwrap();
        let path = dir.join("tomocat_fetch_existing.dat");
        std::fs::write(&path, "0 2000 1 1 0 0 0.0 0.0 0.0 10.0 1.0 0 ev0 1.0\n").unwrap();

        let got = fetch_catalog_file(&path, "http://invalid.invalid/none").unwrap();
        assert_eq!(got, path);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_missing_file_and_empty_url_is_fatal() {
        let dir = Utf8PathBuf::from_path_buf(std::env::temp_dir()).unwrap();
        let path = dir.join("tomocat_fetch_missing.dat");
        let result = fetch_catalog_file(&path, "");
        assert!(matches!(result, Err(TomocatError::InvalidUrl(_))));
    }
}
