//! Operator confirmation.
//!
//! Renders the resume decision context into a short summary and asks the
//! operator to confirm before anything is persisted. Bypassed entirely in
//! unattended runs.

use crate::error::{PipelineError, Result};
use crate::resume::Decision;
use calraw_common::humanize;
use chrono::{DateTime, Utc};

/// Everything the operator needs to see before confirming
#[derive(Debug, Clone)]
pub struct DecisionContext {
    pub current_release: DateTime<Utc>,
    pub expected_size: i64,
    pub decision: Decision,
    /// When the last loaded version was released, if any
    pub last_loaded_release: Option<DateTime<Utc>>,
}

/// Render the confirmation summary shown to the operator.
pub fn render_summary(ctx: &DecisionContext, now: DateTime<Utc>) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "The latest release was published {} ({})\n",
        ctx.current_release.format("%Y-%m-%d %H:%M UTC"),
        humanize::ago(ctx.current_release, now)
    ));
    out.push_str(&format!(
        "Expected download size: {}\n",
        humanize::format_bytes(ctx.expected_size.max(0) as u64)
    ));

    if let Some(loaded) = ctx.last_loaded_release {
        out.push_str(&format!(
            "Your database was last loaded from the release of {} ({})\n",
            loaded.format("%Y-%m-%d %H:%M UTC"),
            humanize::ago(loaded, now)
        ));
    } else {
        out.push_str("Your database has never been loaded\n");
    }

    match ctx.decision {
        Decision::UpToDate => {
            out.push_str("Your database is already up to date.\n");
        }
        Decision::Resume => {
            out.push_str(
                "An earlier update for this data was interrupted and can be resumed.\n",
            );
        }
        Decision::Restart => {}
    }

    out
}

/// Operator yes/no confirmation.
pub trait ConfirmationPrompt: Send + Sync {
    /// Present the decision summary; returns whether to proceed.
    fn confirm(&self, ctx: &DecisionContext) -> Result<bool>;

    /// After a declined resume, ask whether to restart from scratch instead.
    fn confirm_restart(&self) -> Result<bool>;
}

/// Terminal prompt
pub struct InteractivePrompt;

impl ConfirmationPrompt for InteractivePrompt {
    fn confirm(&self, ctx: &DecisionContext) -> Result<bool> {
        let summary = render_summary(ctx, Utc::now());
        println!("{}", summary);

        let question = match ctx.decision {
            Decision::Resume => "Do you want to resume this update?",
            _ => "Do you want to download the latest data and update your database?",
        };

        inquire::Confirm::new(question)
            .with_default(false)
            .prompt()
            .map_err(|e| PipelineError::prompt(e.to_string()))
    }

    fn confirm_restart(&self) -> Result<bool> {
        inquire::Confirm::new("Do you want to re-start your update?")
            .with_default(false)
            .prompt()
            .map_err(|e| PipelineError::prompt(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn context(decision: Decision) -> DecisionContext {
        DecisionContext {
            current_release: Utc.with_ymd_and_hms(2025, 3, 11, 11, 0, 0).unwrap(),
            expected_size: 824_523_776,
            decision,
            last_loaded_release: Some(Utc.with_ymd_and_hms(2025, 1, 10, 9, 0, 0).unwrap()),
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 12, 11, 0, 0).unwrap()
    }

    #[test]
    fn summary_includes_release_size_and_age() {
        let rendered = render_summary(&context(Decision::Restart), now());
        assert!(rendered.contains("2025-03-11 11:00 UTC"));
        assert!(rendered.contains("1 day ago"));
        assert!(rendered.contains("786.33 MB"));
        assert!(rendered.contains("last loaded from the release of 2025-01-10"));
    }

    #[test]
    fn summary_mentions_resumable_update() {
        let rendered = render_summary(&context(Decision::Resume), now());
        assert!(rendered.contains("can be resumed"));
    }

    #[test]
    fn summary_mentions_up_to_date() {
        let rendered = render_summary(&context(Decision::UpToDate), now());
        assert!(rendered.contains("already up to date"));
    }

    #[test]
    fn summary_handles_never_loaded_database() {
        let mut ctx = context(Decision::Restart);
        ctx.last_loaded_release = None;
        let rendered = render_summary(&ctx, now());
        assert!(rendered.contains("never been loaded"));
    }
}
