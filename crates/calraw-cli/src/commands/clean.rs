//! `calraw clean-file` - clean one raw data file.

use crate::Result;
use calraw_pipeline::error::PipelineError;
use calraw_pipeline::history::RunHistory;
use calraw_pipeline::stage::{CleanCommand, ItemCommand, RunContext};
use colored::Colorize;

/// Clean a single raw TSV into the csv directory.
pub async fn run(name: &str, keep_files: bool) -> Result<()> {
    let config = super::base_config();
    config.ensure_directories()?;

    let (_pool, history) = super::connect().await?;
    let last_run = history.last_started_top_run().await?.ok_or_else(|| {
        PipelineError::config("no update run recorded yet; run `calraw update` first")
    })?;

    let ctx = RunContext {
        version_id: last_run.version_id,
        parent_run_id: None,
    };
    let clean = CleanCommand {
        history: &history,
        tsv_dir: config.tsv_dir(),
        csv_dir: config.csv_dir(),
        keep_files,
    };
    clean.run(name, &ctx).await?;

    println!("{} Cleaned {}", "✓".green(), name);
    Ok(())
}
