//! `calraw status` - show the last recorded version and runs.

use crate::Result;
use calraw_common::humanize;
use calraw_pipeline::history::RunHistory;
use chrono::Utc;
use colored::Colorize;

/// Print the last loaded release and whether an interrupted run is pending.
pub async fn run() -> Result<()> {
    let (_pool, history) = super::connect().await?;

    let now = Utc::now();
    let finished = history.last_finished_top_run().await?;
    let started = history.last_started_top_run().await?;

    match &finished {
        Some(run) => {
            let version = history.version_by_id(run.version_id).await?;
            println!(
                "{} Last completed update: release of {} ({}), {} archive",
                "✓".green(),
                version.release_datetime.format("%Y-%m-%d %H:%M UTC"),
                humanize::ago(version.release_datetime, now),
                humanize::format_bytes(version.size_bytes.max(0) as u64)
            );
        }
        None => println!("{} No completed update yet", "–".dimmed()),
    }

    match &started {
        Some(run) if !run.is_finished() => {
            let version = history.version_by_id(run.version_id).await?;
            println!(
                "{} Interrupted update against the release of {} (started {}); `calraw update` can resume it",
                "!".yellow(),
                version.release_datetime.format("%Y-%m-%d %H:%M UTC"),
                humanize::ago(run.start_datetime, now)
            );
        }
        _ => {}
    }

    Ok(())
}
