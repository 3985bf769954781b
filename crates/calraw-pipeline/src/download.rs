//! Download collaborator: fetch the published archive over HTTP.
//!
//! The publisher exposes the release through plain HTTP with a
//! `Last-Modified` header that doubles as the release timestamp. Metadata
//! comes from a HEAD request; the archive itself is streamed to disk.

use crate::error::{PipelineError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::StreamExt;
use reqwest::header::{CONTENT_LENGTH, LAST_MODIFIED};
use std::path::Path;
use tokio::io::AsyncWriteExt;

/// Maximum number of attempts for a download
const MAX_RETRIES: u32 = 3;

/// Base delay between retry attempts, multiplied by the attempt number
const RETRY_DELAY_SECS: u64 = 5;

/// Metadata describing the currently published release
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveMetadata {
    /// Publisher's last-modified time; identifies the release
    pub release_datetime: DateTime<Utc>,
    /// Archive size in bytes
    pub content_length: i64,
}

/// Source of the dataset archive.
#[async_trait]
pub trait ArchiveSource: Send + Sync {
    /// Fetch the current release's metadata without downloading it.
    async fn fetch_metadata(&self) -> Result<ArchiveMetadata>;

    /// Download the archive to `dest`, replacing any existing file.
    async fn download_archive(&self, dest: &Path) -> Result<()>;
}

/// HTTP-backed archive source
pub struct HttpArchiveSource {
    client: reqwest::Client,
    url: String,
}

impl HttpArchiveSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl ArchiveSource for HttpArchiveSource {
    async fn fetch_metadata(&self) -> Result<ArchiveMetadata> {
        let response = self
            .client
            .head(&self.url)
            .send()
            .await?
            .error_for_status()?;

        let release_datetime = response
            .headers()
            .get(LAST_MODIFIED)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                PipelineError::archive_metadata("response has no Last-Modified header")
            })
            .and_then(parse_http_date)?;

        let content_length = response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<i64>().ok())
            .ok_or_else(|| {
                PipelineError::archive_metadata("response has no Content-Length header")
            })?;

        Ok(ArchiveMetadata {
            release_datetime,
            content_length,
        })
    }

    async fn download_archive(&self, dest: &Path) -> Result<()> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.try_download(dest).await {
                Ok(()) => return Ok(()),
                Err(PipelineError::Http(e)) if attempt < MAX_RETRIES => {
                    tracing::warn!(
                        attempt,
                        error = %e,
                        "Archive download failed, retrying"
                    );
                    tokio::time::sleep(std::time::Duration::from_secs(
                        RETRY_DELAY_SECS * attempt as u64,
                    ))
                    .await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

impl HttpArchiveSource {
    async fn try_download(&self, dest: &Path) -> Result<()> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?;

        let mut file = tokio::fs::File::create(dest).await?;
        let mut stream = response.bytes_stream();
        let mut written: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        tracing::info!(
            dest = %dest.display(),
            bytes = written,
            "Downloaded archive"
        );
        Ok(())
    }
}

/// Parse an HTTP date header (RFC 2822 / RFC 1123) into UTC.
fn parse_http_date(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            PipelineError::archive_metadata(format!("bad Last-Modified '{}': {}", value, e))
        })
}

/// Extract every entry of the ZIP archive into `dest_dir`.
///
/// Returns the number of files extracted. Entries with unsafe paths are
/// skipped.
pub fn extract_archive(archive_path: &Path, dest_dir: &Path) -> Result<usize> {
    let file = std::fs::File::open(archive_path)?;
    let mut archive = zip::ZipArchive::new(file)?;
    let mut extracted = 0;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let Some(relative) = entry.enclosed_name().map(|p| p.to_path_buf()) else {
            tracing::warn!(entry = entry.name(), "Skipping archive entry with unsafe path");
            continue;
        };

        // Flatten: the raw files load into one directory regardless of the
        // archive's internal layout.
        let Some(file_name) = relative.file_name() else {
            continue;
        };
        if entry.is_dir() {
            continue;
        }

        let dest = dest_dir.join(file_name);
        let mut out = std::fs::File::create(&dest)?;
        std::io::copy(&mut entry, &mut out)?;
        extracted += 1;
    }

    tracing::info!(
        archive = %archive_path.display(),
        dest = %dest_dir.display(),
        files = extracted,
        "Extracted archive"
    );
    Ok(extracted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn http_dates_parse_to_utc() {
        let parsed = parse_http_date("Tue, 11 Mar 2025 11:02:41 GMT").unwrap();
        assert_eq!(parsed.to_rfc3339(), "2025-03-11T11:02:41+00:00");
    }

    #[test]
    fn garbage_dates_are_rejected() {
        assert!(matches!(
            parse_http_date("next tuesday"),
            Err(PipelineError::ArchiveMetadata(_))
        ));
    }

    #[tokio::test]
    async fn metadata_comes_from_head_headers() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("Last-Modified", "Tue, 11 Mar 2025 11:02:41 GMT")
                    .insert_header("Content-Length", "824523776"),
            )
            .mount(&server)
            .await;

        let source = HttpArchiveSource::new(format!("{}/archive.zip", server.uri()));
        let metadata = source.fetch_metadata().await.unwrap();

        assert_eq!(metadata.content_length, 824523776);
        assert_eq!(
            metadata.release_datetime,
            parse_http_date("Tue, 11 Mar 2025 11:02:41 GMT").unwrap()
        );
    }

    #[tokio::test]
    async fn missing_last_modified_is_a_metadata_error() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(200).insert_header("Content-Length", "10"))
            .mount(&server)
            .await;

        let source = HttpArchiveSource::new(format!("{}/archive.zip", server.uri()));
        assert!(matches!(
            source.fetch_metadata().await,
            Err(PipelineError::ArchiveMetadata(_))
        ));
    }

    #[tokio::test]
    async fn download_writes_the_body_to_dest() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"archive bytes".to_vec()))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("calraw.zip");
        let source = HttpArchiveSource::new(format!("{}/archive.zip", server.uri()));

        source.download_archive(&dest).await.unwrap();
        assert_eq!(std::fs::read(&dest).unwrap(), b"archive bytes");
    }

    #[test]
    fn extract_flattens_entries_into_dest() {
        let dir = tempfile::tempdir().unwrap();
        let archive_path = dir.path().join("test.zip");

        let file = std::fs::File::create(&archive_path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        let options = zip::write::FileOptions::default();
        writer.start_file("nested/dir/CVR_SO_CD.TSV", options).unwrap();
        writer.write_all(b"FILING_ID\tREC_TYPE\n").unwrap();
        writer.start_file("FILERNAME_CD.TSV", options).unwrap();
        writer.write_all(b"FILER_ID\tNAML\n").unwrap();
        writer.finish().unwrap();

        let dest = dir.path().join("tsv");
        std::fs::create_dir_all(&dest).unwrap();
        let extracted = extract_archive(&archive_path, &dest).unwrap();

        assert_eq!(extracted, 2);
        assert!(dest.join("CVR_SO_CD.TSV").exists());
        assert!(dest.join("FILERNAME_CD.TSV").exists());
    }
}
