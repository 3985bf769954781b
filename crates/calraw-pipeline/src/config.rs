//! Pipeline configuration.
//!
//! One explicit struct threaded by reference through the coordinator and
//! collaborators. There is no ambient global state: every component that
//! needs a data directory receives this config (or a path derived from it)
//! as a parameter.

use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default location of the published archive.
pub const DEFAULT_ARCHIVE_URL: &str =
    "https://campaignfinance.cdn.sos.ca.gov/dbwebexport.zip";

/// File name the downloaded archive is stored under.
pub const ARCHIVE_FILE_NAME: &str = "calraw.zip";

/// Configuration for one pipeline invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Root data directory (archive, tsv/, csv/ live underneath)
    pub data_dir: PathBuf,
    /// URL of the published dataset archive
    pub archive_url: String,
    /// Schema registry app to load into
    pub app: String,
    /// Run the download stage
    pub download: bool,
    /// Run the clean stage
    pub clean: bool,
    /// Run the load stage
    pub load: bool,
    /// Keep the archive and intermediate files after each stage
    pub keep_files: bool,
    /// Skip the operator confirmation prompt
    pub noinput: bool,
    /// Run against pre-seeded test data (no download, files kept)
    pub test_mode: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            archive_url: DEFAULT_ARCHIVE_URL.to_string(),
            app: "calaccess".to_string(),
            download: true,
            clean: true,
            load: true,
            keep_files: false,
            noinput: false,
            test_mode: false,
        }
    }
}

impl PipelineConfig {
    /// Apply environment overrides (`CALRAW_DATA_DIR`, `CALRAW_ARCHIVE_URL`).
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(dir) = std::env::var("CALRAW_DATA_DIR") {
            self.data_dir = PathBuf::from(dir);
        }
        if let Ok(url) = std::env::var("CALRAW_ARCHIVE_URL") {
            self.archive_url = url;
        }
        self
    }

    /// Normalize the flag interactions: test mode never downloads and
    /// always keeps files.
    pub fn normalized(mut self) -> Self {
        if self.test_mode {
            self.download = false;
            self.keep_files = true;
        }
        self
    }

    /// Path the downloaded archive is written to.
    pub fn archive_path(&self) -> PathBuf {
        self.data_dir.join(ARCHIVE_FILE_NAME)
    }

    /// Directory the extracted raw TSV files land in.
    pub fn tsv_dir(&self) -> PathBuf {
        self.data_dir.join("tsv")
    }

    /// Directory cleaned CSV files are written to.
    pub fn csv_dir(&self) -> PathBuf {
        self.data_dir.join("csv")
    }

    /// Resolve the data directories, creating them where allowed.
    ///
    /// In test mode the tsv directory must already exist (it holds the
    /// sampled test data); a missing one is a configuration error reported
    /// before any state is touched.
    pub fn ensure_directories(&self) -> Result<()> {
        ensure_dir(&self.data_dir)?;

        let tsv_dir = self.tsv_dir();
        if self.test_mode {
            if !tsv_dir.exists() {
                return Err(PipelineError::config(format!(
                    "test data tsv directory does not exist at {}",
                    tsv_dir.display()
                )));
            }
        } else {
            ensure_dir(&tsv_dir)?;
        }

        ensure_dir(&self.csv_dir())?;
        Ok(())
    }
}

fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
        tracing::debug!(path = %path.display(), "Created data directory");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_forces_no_download_and_keep_files() {
        let config = PipelineConfig {
            test_mode: true,
            download: true,
            keep_files: false,
            ..Default::default()
        }
        .normalized();

        assert!(!config.download);
        assert!(config.keep_files);
    }

    #[test]
    fn normalized_leaves_regular_runs_alone() {
        let config = PipelineConfig::default().normalized();
        assert!(config.download);
        assert!(config.clean);
        assert!(config.load);
        assert!(!config.keep_files);
    }

    #[test]
    fn paths_derive_from_data_dir() {
        let config = PipelineConfig {
            data_dir: PathBuf::from("/var/calraw"),
            ..Default::default()
        };
        assert_eq!(config.archive_path(), PathBuf::from("/var/calraw/calraw.zip"));
        assert_eq!(config.tsv_dir(), PathBuf::from("/var/calraw/tsv"));
        assert_eq!(config.csv_dir(), PathBuf::from("/var/calraw/csv"));
    }

    #[test]
    fn ensure_directories_requires_tsv_dir_in_test_mode() {
        let tmp = tempfile::tempdir().unwrap();
        let config = PipelineConfig {
            data_dir: tmp.path().join("data"),
            test_mode: true,
            ..Default::default()
        }
        .normalized();

        let err = config.ensure_directories().unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
    }

    #[test]
    fn ensure_directories_creates_layout() {
        let tmp = tempfile::tempdir().unwrap();
        let config = PipelineConfig {
            data_dir: tmp.path().join("data"),
            ..Default::default()
        };

        config.ensure_directories().unwrap();
        assert!(config.tsv_dir().is_dir());
        assert!(config.csv_dir().is_dir());
    }
}
