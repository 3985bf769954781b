//! Pipeline coordinator.
//!
//! Top-level sequencing of one update invocation:
//!
//! 1. resolve data directories
//! 2. fetch remote release metadata
//! 3. query run history
//! 4. decide up-to-date / resume / restart
//! 5. confirm with the operator (unless unattended)
//! 6. reuse or create the top-level run record
//! 7. download stage (skippable, and skipped when already done)
//! 8. clean stage, then load stage (each skippable)
//! 9. set the top-level run's finish timestamp
//!
//! Execution is strictly sequential; any stage failure propagates
//! immediately, leaving the top-level run unfinished and resumable.

use crate::config::PipelineConfig;
use crate::download::{extract_archive, ArchiveSource};
use crate::error::{PipelineError, Result};
use crate::history::{command, RunHistory, RunRecord};
use crate::prompt::{ConfirmationPrompt, DecisionContext};
use crate::resume::{decide, Decision, RunSnapshot};
use crate::schema::{ensure_destination_tables, SchemaRegistry};
use crate::stage::{
    clean_worklist, load_worklist, CleanCommand, LoadCommand, RunContext, StageRunner,
};
use sqlx::PgPool;

/// How the invocation proceeds after the decision and confirmation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProceedMode {
    /// Nothing to do; exit successfully without touching state
    Skip,
    /// Begin a fresh top-level run
    Fresh,
    /// Continue the interrupted top-level run
    Resume,
}

/// Resolve the decision into a proceed mode, consulting the operator where
/// required. A declined confirmation with no remaining option is fatal.
pub fn resolve_confirmation(
    decision: Decision,
    noinput: bool,
    prompt: &dyn ConfirmationPrompt,
    ctx: &DecisionContext,
) -> Result<ProceedMode> {
    if noinput {
        return Ok(match decision {
            Decision::UpToDate => ProceedMode::Skip,
            Decision::Resume => ProceedMode::Resume,
            Decision::Restart => ProceedMode::Fresh,
        });
    }

    match decision {
        Decision::Resume => {
            if prompt.confirm(ctx)? {
                Ok(ProceedMode::Resume)
            } else if prompt.confirm_restart()? {
                Ok(ProceedMode::Fresh)
            } else {
                Err(PipelineError::Cancelled)
            }
        }
        Decision::UpToDate | Decision::Restart => {
            if prompt.confirm(ctx)? {
                Ok(ProceedMode::Fresh)
            } else {
                Err(PipelineError::Cancelled)
            }
        }
    }
}

/// Top-level pipeline sequencing
pub struct PipelineCoordinator<'a> {
    config: &'a PipelineConfig,
    pool: &'a PgPool,
    history: &'a dyn RunHistory,
    source: &'a dyn ArchiveSource,
    prompt: &'a dyn ConfirmationPrompt,
    registry: &'a SchemaRegistry,
}

impl<'a> PipelineCoordinator<'a> {
    pub fn new(
        config: &'a PipelineConfig,
        pool: &'a PgPool,
        history: &'a dyn RunHistory,
        source: &'a dyn ArchiveSource,
        prompt: &'a dyn ConfirmationPrompt,
        registry: &'a SchemaRegistry,
    ) -> Self {
        Self {
            config,
            pool,
            history,
            source,
            prompt,
            registry,
        }
    }

    /// Execute one update invocation end to end.
    pub async fn run(&self) -> Result<()> {
        let config = self.config.clone().normalized();

        config.ensure_directories()?;

        let metadata = self.source.fetch_metadata().await?;
        tracing::info!(
            release = %metadata.release_datetime,
            size_bytes = metadata.content_length,
            "Fetched remote release metadata"
        );

        let last_finished = self.history.last_finished_top_run().await?;
        let last_started = self.history.last_started_top_run().await?;
        let last_download = self.history.last_run_of(command::DOWNLOAD).await?;

        let finished_snap = self.snapshot(last_finished.as_ref()).await?;
        let started_snap = self.snapshot(last_started.as_ref()).await?;
        let download_snap = self.snapshot(last_download.as_ref()).await?;

        let decision = decide(
            metadata.release_datetime,
            finished_snap.as_ref(),
            started_snap.as_ref(),
            download_snap.as_ref(),
            config.download,
        );
        tracing::info!(decision = %decision, "Resume decision");

        let decision_ctx = DecisionContext {
            current_release: metadata.release_datetime,
            expected_size: metadata.content_length,
            decision,
            last_loaded_release: finished_snap.map(|s| s.release_datetime),
        };

        let mode = resolve_confirmation(decision, config.noinput, self.prompt, &decision_ctx)?;

        let (top_run, resume_mode) = match mode {
            ProceedMode::Skip => {
                tracing::info!("Database is up to date, nothing to do");
                return Ok(());
            }
            ProceedMode::Resume => {
                let run = last_started.ok_or_else(|| {
                    PipelineError::config("resume selected but no started run exists")
                })?;
                tracing::info!(run_id = %run.id, "Resuming interrupted run");
                (run, true)
            }
            ProceedMode::Fresh => {
                let version = self
                    .history
                    .get_or_create_version(metadata.release_datetime, metadata.content_length)
                    .await?;
                let run = self
                    .history
                    .start_run(command::UPDATE, version.id, None, None)
                    .await?;
                tracing::info!(run_id = %run.id, "Started new run");
                (run, false)
            }
        };

        let ctx = RunContext {
            version_id: top_run.version_id,
            parent_run_id: Some(top_run.id),
        };

        if config.download {
            self.run_download(&config, &top_run, resume_mode, download_snap.as_ref())
                .await?;
        }

        let runner = StageRunner::new(self.history);

        if config.clean {
            tracing::info!("Cleaning data files");
            let items = clean_worklist(&config.tsv_dir())?;
            let clean = CleanCommand {
                history: self.history,
                tsv_dir: config.tsv_dir(),
                csv_dir: config.csv_dir(),
                keep_files: config.keep_files,
            };
            let report = runner.run(items, &clean, &ctx, resume_mode).await?;
            tracing::info!(
                processed = report.processed,
                skipped = report.skipped,
                "Clean stage complete"
            );
        }

        if config.load {
            tracing::info!("Loading data files");
            ensure_destination_tables(self.pool, self.registry).await?;
            let items = load_worklist(self.registry, &config.csv_dir());
            let load = LoadCommand {
                history: self.history,
                pool: self.pool,
                registry: self.registry,
                csv_dir: config.csv_dir(),
                keep_files: config.keep_files,
            };
            let report = runner.run(items, &load, &ctx, resume_mode).await?;
            tracing::info!(
                processed = report.processed,
                skipped = report.skipped,
                "Load stage complete"
            );
        }

        self.history.finish_run(top_run.id).await?;
        tracing::info!(run_id = %top_run.id, "Update finished");
        Ok(())
    }

    /// Download stage: fetch and extract the archive under its own run
    /// record. Skipped on resume when a finished download already exists
    /// for the resumed run's exact release.
    async fn run_download(
        &self,
        config: &PipelineConfig,
        top_run: &RunRecord,
        resume_mode: bool,
        download_snap: Option<&RunSnapshot>,
    ) -> Result<()> {
        if resume_mode {
            let run_release = self
                .history
                .version_by_id(top_run.version_id)
                .await?
                .release_datetime;
            let already_done = download_snap
                .is_some_and(|d| d.finished && d.release_datetime == run_release);
            if already_done {
                tracing::info!("Archive already downloaded for this release");
                return Ok(());
            }
        }

        tracing::info!("Downloading archive");
        let record = self
            .history
            .start_run(command::DOWNLOAD, top_run.version_id, Some(top_run.id), None)
            .await?;

        let archive_path = config.archive_path();
        self.source.download_archive(&archive_path).await?;
        extract_archive(&archive_path, &config.tsv_dir())?;

        if !config.keep_files {
            std::fs::remove_file(&archive_path)?;
        }

        self.history.finish_run(record.id).await?;
        Ok(())
    }

    async fn snapshot(&self, run: Option<&RunRecord>) -> Result<Option<RunSnapshot>> {
        match run {
            Some(record) => {
                let version = self.history.version_by_id(record.version_id).await?;
                Ok(Some(RunSnapshot::new(
                    version.release_datetime,
                    record.is_finished(),
                )))
            }
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::sync::Mutex;

    /// Prompt fake answering from a script and recording what was asked.
    struct ScriptedPrompt {
        answers: Mutex<Vec<bool>>,
        asked: Mutex<Vec<&'static str>>,
    }

    impl ScriptedPrompt {
        fn new(answers: Vec<bool>) -> Self {
            Self {
                answers: Mutex::new(answers),
                asked: Mutex::new(Vec::new()),
            }
        }

        fn pop(&self) -> bool {
            self.answers.lock().unwrap().remove(0)
        }
    }

    impl ConfirmationPrompt for ScriptedPrompt {
        fn confirm(&self, _ctx: &DecisionContext) -> Result<bool> {
            self.asked.lock().unwrap().push("confirm");
            Ok(self.pop())
        }

        fn confirm_restart(&self) -> Result<bool> {
            self.asked.lock().unwrap().push("confirm_restart");
            Ok(self.pop())
        }
    }

    fn ctx(decision: Decision) -> DecisionContext {
        DecisionContext {
            current_release: Utc.with_ymd_and_hms(2025, 3, 11, 11, 0, 0).unwrap(),
            expected_size: 1024,
            decision,
            last_loaded_release: None,
        }
    }

    #[test]
    fn unattended_maps_decisions_directly() {
        let prompt = ScriptedPrompt::new(vec![]);

        let mode =
            resolve_confirmation(Decision::UpToDate, true, &prompt, &ctx(Decision::UpToDate))
                .unwrap();
        assert_eq!(mode, ProceedMode::Skip);

        let mode = resolve_confirmation(Decision::Resume, true, &prompt, &ctx(Decision::Resume))
            .unwrap();
        assert_eq!(mode, ProceedMode::Resume);

        let mode = resolve_confirmation(Decision::Restart, true, &prompt, &ctx(Decision::Restart))
            .unwrap();
        assert_eq!(mode, ProceedMode::Fresh);

        // No prompting happened.
        assert!(prompt.asked.lock().unwrap().is_empty());
    }

    #[test]
    fn confirmed_resume_resumes() {
        let prompt = ScriptedPrompt::new(vec![true]);
        let mode = resolve_confirmation(Decision::Resume, false, &prompt, &ctx(Decision::Resume))
            .unwrap();
        assert_eq!(mode, ProceedMode::Resume);
    }

    #[test]
    fn declined_resume_falls_back_to_restart_confirmation() {
        let prompt = ScriptedPrompt::new(vec![false, true]);
        let mode = resolve_confirmation(Decision::Resume, false, &prompt, &ctx(Decision::Resume))
            .unwrap();
        assert_eq!(mode, ProceedMode::Fresh);
        assert_eq!(
            *prompt.asked.lock().unwrap(),
            vec!["confirm", "confirm_restart"]
        );
    }

    #[test]
    fn declining_both_prompts_cancels_the_update() {
        let prompt = ScriptedPrompt::new(vec![false, false]);
        let err = resolve_confirmation(Decision::Resume, false, &prompt, &ctx(Decision::Resume))
            .unwrap_err();
        assert!(matches!(err, PipelineError::Cancelled));
    }

    #[test]
    fn declined_fresh_run_cancels_the_update() {
        let prompt = ScriptedPrompt::new(vec![false]);
        let err = resolve_confirmation(Decision::Restart, false, &prompt, &ctx(Decision::Restart))
            .unwrap_err();
        assert!(matches!(err, PipelineError::Cancelled));
    }

    #[test]
    fn attended_up_to_date_can_force_a_fresh_run() {
        let prompt = ScriptedPrompt::new(vec![true]);
        let mode =
            resolve_confirmation(Decision::UpToDate, false, &prompt, &ctx(Decision::UpToDate))
                .unwrap();
        assert_eq!(mode, ProceedMode::Fresh);
    }
}
