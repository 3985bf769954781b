//! Stage runner.
//!
//! Executes one stage (clean or load) over a worklist of items. On resume,
//! items whose child run record — scoped to the resumed top-level run and
//! matched by command and item identity — is already finished are skipped.
//! Remaining items are processed strictly in enumeration order; the first
//! failure halts the stage in place so the top-level run's finish timestamp
//! stays NULL and a later invocation can resume.

use crate::clean::{csv_name_for, normalize_file};
use crate::error::{PipelineError, Result};
use crate::history::{command, RunHistory};
use crate::loader::load_table;
use crate::schema::SchemaRegistry;
use async_trait::async_trait;
use sqlx::PgPool;
use std::path::PathBuf;
use uuid::Uuid;

/// Identifies the run a stage executes under
#[derive(Debug, Clone, Copy)]
pub struct RunContext {
    pub version_id: Uuid,
    /// Top-level run this stage belongs to; None for standalone item runs
    pub parent_run_id: Option<Uuid>,
}

/// One per-item command a stage delegates to.
///
/// Implementations create and finish their own child run record, so a crash
/// mid-item leaves an unfinished record and the item is retried on resume.
#[async_trait]
pub trait ItemCommand: Send + Sync {
    /// Command name recorded in run history for each item.
    fn name(&self) -> &'static str;

    /// Process a single work item.
    async fn run(&self, item: &str, ctx: &RunContext) -> Result<()>;
}

/// What a stage invocation did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageReport {
    pub total: usize,
    pub skipped: usize,
    pub processed: usize,
}

/// Drops items already completed by the run being resumed, preserving the
/// worklist's order.
pub fn remaining_items(items: Vec<String>, completed: &[String]) -> Vec<String> {
    items
        .into_iter()
        .filter(|item| !completed.contains(item))
        .collect()
}

/// Sequential stage executor
pub struct StageRunner<'a> {
    history: &'a dyn RunHistory,
}

impl<'a> StageRunner<'a> {
    pub fn new(history: &'a dyn RunHistory) -> Self {
        Self { history }
    }

    /// Run `item_command` over `items`, skipping completed ones on resume.
    pub async fn run(
        &self,
        items: Vec<String>,
        item_command: &dyn ItemCommand,
        ctx: &RunContext,
        resume: bool,
    ) -> Result<StageReport> {
        let total = items.len();

        let items = if resume {
            let Some(parent_id) = ctx.parent_run_id else {
                return Err(PipelineError::config(
                    "cannot resume a stage without a top-level run",
                ));
            };
            let completed = self
                .history
                .completed_items(parent_id, item_command.name())
                .await?;
            let remaining = remaining_items(items, &completed);
            tracing::info!(
                command = item_command.name(),
                done = total - remaining.len(),
                remaining = remaining.len(),
                "Resuming stage"
            );
            remaining
        } else {
            items
        };

        let mut processed = 0;
        for item in &items {
            item_command.run(item, ctx).await?;
            processed += 1;
        }

        Ok(StageReport {
            total,
            skipped: total - items.len(),
            processed,
        })
    }
}

/// Enumerate the clean stage's worklist: raw TSV files, sorted by name.
pub fn clean_worklist(tsv_dir: &PathBuf) -> Result<Vec<String>> {
    if !tsv_dir.exists() {
        return Err(PipelineError::config(format!(
            "tsv directory does not exist at {}",
            tsv_dir.display()
        )));
    }

    let mut items = Vec::new();
    for entry in std::fs::read_dir(tsv_dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if entry.file_type()?.is_file() && name.to_ascii_uppercase().ends_with(".TSV") {
            items.push(name);
        }
    }
    items.sort();
    Ok(items)
}

/// Enumerate the load stage's worklist: registered models whose cleaned CSV
/// exists, in registry order.
pub fn load_worklist(registry: &SchemaRegistry, csv_dir: &PathBuf) -> Vec<String> {
    registry
        .tables()
        .filter(|schema| csv_dir.join(schema.csv_file_name()).exists())
        .map(|schema| schema.name.to_string())
        .collect()
}

/// Clean one raw file: TSV in, normalized CSV out, bracketed by its own
/// run record.
pub struct CleanCommand<'a> {
    pub history: &'a dyn RunHistory,
    pub tsv_dir: PathBuf,
    pub csv_dir: PathBuf,
    pub keep_files: bool,
}

#[async_trait]
impl ItemCommand for CleanCommand<'_> {
    fn name(&self) -> &'static str {
        command::CLEAN_FILE
    }

    async fn run(&self, item: &str, ctx: &RunContext) -> Result<()> {
        let src = self.tsv_dir.join(item);
        if !src.exists() {
            return Err(PipelineError::FileNotFound(src));
        }

        let record = self
            .history
            .start_run(self.name(), ctx.version_id, ctx.parent_run_id, Some(item))
            .await?;

        let dst = self.csv_dir.join(csv_name_for(item));
        normalize_file(&src, &dst)?;

        if !self.keep_files {
            std::fs::remove_file(&src)?;
        }

        self.history.finish_run(record.id).await?;
        Ok(())
    }
}

/// Load one destination table from its cleaned CSV, bracketed by its own
/// run record.
pub struct LoadCommand<'a> {
    pub history: &'a dyn RunHistory,
    pub pool: &'a PgPool,
    pub registry: &'a SchemaRegistry,
    pub csv_dir: PathBuf,
    pub keep_files: bool,
}

#[async_trait]
impl ItemCommand for LoadCommand<'_> {
    fn name(&self) -> &'static str {
        command::LOAD_TABLE
    }

    async fn run(&self, item: &str, ctx: &RunContext) -> Result<()> {
        let schema = self.registry.get(item)?;
        let csv_path = self.csv_dir.join(schema.csv_file_name());

        let record = self
            .history
            .start_run(self.name(), ctx.version_id, ctx.parent_run_id, Some(item))
            .await?;

        load_table(self.pool, schema, &csv_path).await?;

        if !self.keep_files {
            std::fs::remove_file(&csv_path)?;
        }

        self.history.finish_run(record.id).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remaining_items_preserves_order_and_drops_completed() {
        let items = vec![
            "A.TSV".to_string(),
            "B.TSV".to_string(),
            "C.TSV".to_string(),
            "D.TSV".to_string(),
            "E.TSV".to_string(),
        ];
        let completed = vec!["A.TSV".to_string(), "C.TSV".to_string(), "B.TSV".to_string()];

        let remaining = remaining_items(items, &completed);
        assert_eq!(remaining, vec!["D.TSV".to_string(), "E.TSV".to_string()]);
    }

    #[test]
    fn remaining_items_with_no_completions_is_identity() {
        let items = vec!["A.TSV".to_string(), "B.TSV".to_string()];
        assert_eq!(remaining_items(items.clone(), &[]), items);
    }

    #[test]
    fn clean_worklist_lists_tsv_files_sorted() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("B_CD.TSV"), "x").unwrap();
        std::fs::write(dir.path().join("A_CD.TSV"), "x").unwrap();
        std::fs::write(dir.path().join("README.txt"), "x").unwrap();
        std::fs::write(dir.path().join("lower.tsv"), "x").unwrap();

        let items = clean_worklist(&dir.path().to_path_buf()).unwrap();
        assert_eq!(items, vec!["A_CD.TSV", "B_CD.TSV", "lower.tsv"]);
    }

    #[test]
    fn clean_worklist_requires_the_directory() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(
            clean_worklist(&missing),
            Err(PipelineError::Config(_))
        ));
    }

    #[test]
    fn load_worklist_only_includes_models_with_a_csv_present() {
        let registry = SchemaRegistry::calaccess();
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("CVR_SO_CD.csv"), "x").unwrap();
        std::fs::write(dir.path().join("SMRY_CD.csv"), "x").unwrap();

        let items = load_worklist(&registry, &dir.path().to_path_buf());
        assert_eq!(items, vec!["cvr_so".to_string(), "smry".to_string()]);
    }

    #[test]
    fn load_worklist_is_empty_without_csv_files() {
        let registry = SchemaRegistry::calaccess();
        let dir = tempfile::tempdir().unwrap();
        assert!(load_worklist(&registry, &dir.path().to_path_buf()).is_empty());
    }
}
