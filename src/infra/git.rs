//! Git operations
//!
//! Thin wrappers over the `git` command line for the commands a safe,
//! fast-forward-only update needs.

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::error::ProcessError;
use crate::infra::process::{CommandOutput, CommandRunner, Invocation};

/// Git operation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GitError {
    /// Git could not be run at all
    #[error(transparent)]
    Process(#[from] ProcessError),

    /// Git ran but reported failure
    #[error("`{command}` exited with code {code}: {output}")]
    NonZeroExit {
        command: String,
        code: i32,
        output: String,
    },
}

/// Git commands bound to one working copy
#[derive(Debug)]
pub struct GitCli<'a, R> {
    runner: &'a R,
    repo: PathBuf,
}

impl<'a, R: CommandRunner> GitCli<'a, R> {
    /// Bind git commands to the working copy at `repo`
    pub fn new(runner: &'a R, repo: &Path) -> Self {
        Self {
            runner,
            repo: repo.to_path_buf(),
        }
    }

    /// Get the working copy path
    pub fn repo(&self) -> &Path {
        &self.repo
    }

    /// `git status --porcelain`: empty when there is nothing uncommitted
    pub async fn status_porcelain(&self) -> Result<String, GitError> {
        let out = self.checked(&["status", "--porcelain"]).await?;
        Ok(out.stdout)
    }

    /// Abbreviated SHA of `HEAD`
    pub async fn short_head(&self) -> Result<String, GitError> {
        let out = self.checked(&["rev-parse", "--short", "HEAD"]).await?;
        Ok(out.stdout.trim().to_string())
    }

    /// Fetch every remote without touching the working tree
    pub async fn fetch_all(&self) -> Result<(), GitError> {
        self.checked(&["fetch", "--all", "--prune"]).await?;
        Ok(())
    }

    /// Integrate upstream only if it is a fast-forward
    pub async fn pull_ff_only(&self) -> Result<(), GitError> {
        self.checked(&["pull", "--ff-only"]).await?;
        Ok(())
    }

    /// Whether a merge is in progress (`MERGE_HEAD` exists)
    pub async fn merge_in_progress(&self) -> Result<bool, GitError> {
        let out = self
            .raw(&["rev-parse", "-q", "--verify", "MERGE_HEAD"])
            .await?;
        Ok(out.success())
    }

    /// Abort an in-progress merge, restoring the pre-merge tree
    pub async fn merge_abort(&self) -> Result<(), GitError> {
        self.checked(&["merge", "--abort"]).await?;
        Ok(())
    }

    async fn raw(&self, args: &[&str]) -> Result<CommandOutput, GitError> {
        let invocation = Invocation::new("git", &self.repo).args(args.iter().copied());
        Ok(self.runner.run(&invocation).await?)
    }

    async fn checked(&self, args: &[&str]) -> Result<CommandOutput, GitError> {
        let out = self.raw(args).await?;
        if out.success() {
            Ok(out)
        } else {
            Err(GitError::NonZeroExit {
                command: format!("git {}", args.join(" ")),
                code: out.code.unwrap_or(-1),
                output: out.combined().trim().to_string(),
            })
        }
    }
}
