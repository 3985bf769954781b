//! `calraw download` - fetch and extract the latest archive.

use crate::{progress, Result};
use calraw_common::humanize;
use calraw_pipeline::download::{extract_archive, ArchiveSource, HttpArchiveSource};
use calraw_pipeline::history::{command, RunHistory};
use colored::Colorize;

/// Download the current archive and extract it into the tsv directory,
/// under its own run record.
pub async fn run(keep_files: bool) -> Result<()> {
    let config = super::base_config();
    config.ensure_directories()?;

    let source = HttpArchiveSource::new(config.archive_url.clone());
    let metadata = source.fetch_metadata().await?;
    println!(
        "{} Release of {} ({})",
        "→".cyan(),
        metadata.release_datetime.format("%Y-%m-%d %H:%M UTC"),
        humanize::format_bytes(metadata.content_length.max(0) as u64)
    );

    let (_pool, history) = super::connect().await?;
    let version = history
        .get_or_create_version(metadata.release_datetime, metadata.content_length)
        .await?;
    let record = history
        .start_run(command::DOWNLOAD, version.id, None, None)
        .await?;

    let archive_path = config.archive_path();
    let pb = progress::spinner("Downloading archive");
    source.download_archive(&archive_path).await?;
    pb.set_message("Extracting archive");
    let extracted = extract_archive(&archive_path, &config.tsv_dir())?;
    pb.finish_and_clear();

    if !keep_files {
        std::fs::remove_file(&archive_path).map_err(calraw_pipeline::PipelineError::from)?;
    }

    history.finish_run(record.id).await?;

    println!("{} Extracted {} raw files", "✓".green(), extracted);
    Ok(())
}
