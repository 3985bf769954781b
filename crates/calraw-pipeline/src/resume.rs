//! Resume decision engine.
//!
//! Pure function deciding, from the persisted run history and the current
//! remote release, whether this invocation has nothing to do, may continue
//! an interrupted run, or must start over. Resuming must never silently mix
//! data from two different dataset releases; the three resume-eligibility
//! branches below are the only situations where that risk is absent.

use chrono::{DateTime, Utc};

/// What this invocation should do with the prior run state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// A finished run already covers the current release
    UpToDate,
    /// Continue the interrupted run, skipping its finished children
    Resume,
    /// Abandon any unfinished progress and begin a fresh run
    Restart,
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Decision::UpToDate => write!(f, "up to date"),
            Decision::Resume => write!(f, "resume"),
            Decision::Restart => write!(f, "restart"),
        }
    }
}

/// The slice of a run record the decision depends on: which release it was
/// against and whether it completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSnapshot {
    pub release_datetime: DateTime<Utc>,
    pub finished: bool,
}

impl RunSnapshot {
    pub fn new(release_datetime: DateTime<Utc>, finished: bool) -> Self {
        Self {
            release_datetime,
            finished,
        }
    }
}

/// Decide up-to-date / resume / restart.
///
/// Rules, in order:
///
/// 1. `UpToDate` iff a finished top-level run exists for exactly the
///    current release.
/// 2. Otherwise `Resume` iff the most recently started top-level run is
///    unfinished AND at least one of:
///    a. it was started against the current release;
///    b. this invocation will not download (skipping download sidesteps
///       the version-mismatch concern);
///    c. a finished download run exists for that unfinished run's exact
///       release (the archive for that release is already on disk, so
///       continuing is safe even though the remote has moved on).
/// 3. Otherwise `Restart`.
pub fn decide(
    current_release: DateTime<Utc>,
    last_finished_top: Option<&RunSnapshot>,
    last_started_top: Option<&RunSnapshot>,
    last_download: Option<&RunSnapshot>,
    download_requested: bool,
) -> Decision {
    if let Some(finished) = last_finished_top {
        if finished.release_datetime == current_release {
            return Decision::UpToDate;
        }
    }

    if let Some(started) = last_started_top {
        if !started.finished {
            let same_release = started.release_datetime == current_release;
            let download_done_for_run = last_download.is_some_and(|d| {
                d.finished && d.release_datetime == started.release_datetime
            });

            if same_release || !download_requested || download_done_for_run {
                return Decision::Resume;
            }
        }
    }

    Decision::Restart
}
