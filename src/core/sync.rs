//! Version control synchronization
//!
//! Brings each working copy up to date without risking local work: dirty
//! copies are skipped, Git only fast-forwards, and any conflict is rolled
//! back to a clean state and reported for a human to resolve.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::core::config::{VcsKind, VersionControlTarget};
use crate::infra::git::{GitCli, GitError};
use crate::infra::process::CommandRunner;
use crate::infra::tfs::{self, TfsCli};

/// What happened to one working copy
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SyncStatus {
    /// Moved to a new revision
    Updated {
        /// Revision before the update, when known
        from: Option<String>,
        /// Revision after the update, when known
        to: Option<String>,
    },
    /// Already at the upstream revision
    UpToDate,
    /// Local changes present, nothing touched
    SkippedDirty,
    /// Update refused or conflicted; rolled back, needs a human
    Conflict,
    /// A command failed outright
    Failed { error: String },
    /// Version control type not supported
    Unsupported,
}

/// An update that needs manual resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Conflict {
    pub kind: VcsKind,
    pub path: PathBuf,
    pub message: String,
}

/// Result of synchronizing one working copy
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncOutcome {
    pub target: VersionControlTarget,
    pub status: SyncStatus,
    /// Markdown log lines, starting with a heading
    pub lines: Vec<String>,
    pub conflict: Option<Conflict>,
}

impl SyncOutcome {
    fn new(target: &VersionControlTarget, heading: String) -> Self {
        Self {
            target: target.clone(),
            status: SyncStatus::UpToDate,
            lines: vec![heading],
            conflict: None,
        }
    }

    fn line(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    fn fail(&mut self, error: String) {
        tracing::warn!("{}: {error}", self.target.path.display());
        self.line(format!("- Error: {error}"));
        self.status = SyncStatus::Failed { error };
    }
}

/// Update every target in order.
///
/// Never fails: errors become [`SyncStatus::Failed`] on the target they
/// belong to, and later targets still run.
pub async fn synchronize<R: CommandRunner>(
    runner: &R,
    targets: &[VersionControlTarget],
    tf_path: &str,
) -> Vec<SyncOutcome> {
    let mut outcomes = Vec::with_capacity(targets.len());
    for target in targets {
        let outcome = match target.kind {
            VcsKind::Git => sync_git(runner, target).await,
            VcsKind::Tfs => sync_tfs(runner, tf_path, target).await,
            VcsKind::Unknown => {
                tracing::warn!("Unknown version control type for {}", target.path.display());
                let mut outcome = SyncOutcome::new(
                    target,
                    format!("### ❓ Unknown VCS type: `{}`", target.path.display()),
                );
                outcome.status = SyncStatus::Unsupported;
                outcome
            }
        };
        outcomes.push(outcome);
    }
    outcomes
}

/// Fast-forward a Git working copy
pub async fn sync_git<R: CommandRunner>(runner: &R, target: &VersionControlTarget) -> SyncOutcome {
    let mut outcome = SyncOutcome::new(
        target,
        format!("### 🔁 Git Update: `{}`", target.path.display()),
    );
    let git = GitCli::new(runner, &target.path);

    if let Err(e) = update_git(&git, &mut outcome).await {
        outcome.fail(e.to_string());
    }
    outcome
}

async fn update_git<R: CommandRunner>(
    git: &GitCli<'_, R>,
    outcome: &mut SyncOutcome,
) -> Result<(), GitError> {
    let status = git.status_porcelain().await?;
    if !status.trim().is_empty() {
        tracing::info!("{}: local changes, skipping update", git.repo().display());
        outcome.status = SyncStatus::SkippedDirty;
        outcome.line("- Local changes present → **update skipped**.");
        return Ok(());
    }

    let before = git.short_head().await?;
    git.fetch_all().await?;

    match git.pull_ff_only().await {
        Ok(()) => {
            let after = git.short_head().await?;
            if before == after {
                outcome.status = SyncStatus::UpToDate;
                outcome.line("- Already up to date");
            } else {
                tracing::info!("{}: {before} -> {after}", git.repo().display());
                outcome.line(format!("- Updated ({before} → {after})"));
                outcome.status = SyncStatus::Updated {
                    from: Some(before),
                    to: Some(after),
                };
            }
        }
        Err(pull_error) => {
            tracing::warn!("{}: fast-forward pull failed: {pull_error}", git.repo().display());
            restore_after_failed_merge(git, outcome).await;
            outcome.line(
                "- ⚠️ Fast-forward not possible or pull conflicted → manual rebase/pull required.",
            );
            outcome.status = SyncStatus::Conflict;
            outcome.conflict = Some(Conflict {
                kind: VcsKind::Git,
                path: git.repo().to_path_buf(),
                message: "Not a fast-forward or merge conflict".to_string(),
            });
        }
    }
    Ok(())
}

async fn restore_after_failed_merge<R: CommandRunner>(
    git: &GitCli<'_, R>,
    outcome: &mut SyncOutcome,
) {
    let aborted = match git.merge_in_progress().await {
        Ok(false) => return,
        Ok(true) => git.merge_abort().await,
        Err(e) => Err(e),
    };
    match aborted {
        Ok(()) => outcome.line("- In-progress merge aborted, working copy restored."),
        Err(e) => {
            tracing::error!("{}: could not abort merge: {e}", git.repo().display());
            outcome.line(format!("- Error: merge abort failed, check the working copy: {e}"));
        }
    }
}

/// Get latest for a TFS workspace folder
pub async fn sync_tfs<R: CommandRunner>(
    runner: &R,
    tf_path: &str,
    target: &VersionControlTarget,
) -> SyncOutcome {
    let mut outcome = SyncOutcome::new(
        target,
        format!("### 🔁 TFS Get Latest: `{}`", target.path.display()),
    );
    let tfs = TfsCli::new(runner, tf_path, &target.path);

    let status = match tfs.status().await {
        Ok(out) if out.success() => out.combined(),
        Ok(out) => {
            outcome.fail(format!(
                "`tf status` exited with code {}: {}",
                out.code.unwrap_or(-1),
                out.combined().trim()
            ));
            return outcome;
        }
        Err(e) => {
            outcome.fail(e.to_string());
            return outcome;
        }
    };

    if tfs::has_pending_changes(&status) {
        tracing::info!("{}: pending changes, skipping get", target.path.display());
        outcome.status = SyncStatus::SkippedDirty;
        outcome.line("- Pending changes detected → **update skipped**.");
        return outcome;
    }

    let got = match tfs.get_latest().await {
        Ok(out) => out,
        Err(e) => {
            outcome.fail(e.to_string());
            return outcome;
        }
    };

    // tf exits nonzero on conflicts, so the text is checked first.
    if tfs::reports_conflict(&got.combined()) {
        tracing::warn!("{}: conflict during get, undoing", target.path.display());
        undo_after_conflict(&tfs, &target.path, &mut outcome).await;
        outcome.line(
            "- ⚠️ **Conflict** during get → pending changes undone automatically. Please resolve manually.",
        );
        outcome.status = SyncStatus::Conflict;
        outcome.conflict = Some(Conflict {
            kind: VcsKind::Tfs,
            path: target.path.clone(),
            message: "TFS get conflict".to_string(),
        });
    } else if got.success() {
        outcome.line("- Updated");
        outcome.status = SyncStatus::Updated {
            from: None,
            to: None,
        };
    } else {
        outcome.fail(format!(
            "`tf get` exited with code {}: {}",
            got.code.unwrap_or(-1),
            got.combined().trim()
        ));
    }
    outcome
}

async fn undo_after_conflict<R: CommandRunner>(
    tfs: &TfsCli<'_, R>,
    path: &Path,
    outcome: &mut SyncOutcome,
) {
    let failure = match tfs.undo_all().await {
        Ok(out) if out.success() => return,
        Ok(out) => out.combined().trim().to_string(),
        Err(e) => e.to_string(),
    };
    tracing::error!("{}: undo failed: {failure}", path.display());
    outcome.line(format!("- Error: undo failed, check the workspace: {failure}"));
}
