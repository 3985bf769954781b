//! `calraw load-table` - load one cleaned file into its table.

use crate::{progress, Result};
use calraw_pipeline::error::PipelineError;
use calraw_pipeline::history::RunHistory;
use calraw_pipeline::schema::{ensure_destination_tables, SchemaRegistry};
use calraw_pipeline::stage::{ItemCommand, LoadCommand, RunContext};
use colored::Colorize;

/// Load a single model's cleaned CSV into its destination table.
pub async fn run(model: &str, keep_files: bool, app: &str) -> Result<()> {
    let config = super::base_config();
    config.ensure_directories()?;

    let registry = SchemaRegistry::for_app(app)?;
    let (pool, history) = super::connect().await?;
    ensure_destination_tables(&pool, &registry).await?;

    let last_run = history.last_started_top_run().await?.ok_or_else(|| {
        PipelineError::config("no update run recorded yet; run `calraw update` first")
    })?;

    let ctx = RunContext {
        version_id: last_run.version_id,
        parent_run_id: None,
    };
    let load = LoadCommand {
        history: &history,
        pool: &pool,
        registry: &registry,
        csv_dir: config.csv_dir(),
        keep_files,
    };

    let pb = progress::spinner(&format!("Loading {}", model));
    load.run(model, &ctx).await?;
    pb.finish_and_clear();

    println!("{} Loaded {}", "✓".green(), model);
    Ok(())
}
