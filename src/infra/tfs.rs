//! TFS (Team Foundation Version Control) operations
//!
//! Wraps the `tf` command line client.

use std::path::{Path, PathBuf};

use crate::error::ProcessError;
use crate::infra::process::{CommandOutput, CommandRunner, Invocation};

const NO_PENDING_CHANGES: &str = "there are no pending changes";

/// `tf` commands bound to one mapped workspace folder
#[derive(Debug)]
pub struct TfsCli<'a, R> {
    runner: &'a R,
    tf: String,
    workspace: PathBuf,
}

impl<'a, R: CommandRunner> TfsCli<'a, R> {
    /// Bind `tf` (at `tf_path`) to the workspace folder at `workspace`
    pub fn new(runner: &'a R, tf_path: &str, workspace: &Path) -> Self {
        Self {
            runner,
            tf: tf_path.to_string(),
            workspace: workspace.to_path_buf(),
        }
    }

    /// `tf status /recursive /format:brief`
    pub async fn status(&self) -> Result<CommandOutput, ProcessError> {
        self.run(&["status", "/recursive", "/format:brief"]).await
    }

    /// `tf get /recursive /noprompt`
    pub async fn get_latest(&self) -> Result<CommandOutput, ProcessError> {
        self.run(&["get", "/recursive", "/noprompt"]).await
    }

    /// `tf undo /recursive /noprompt`
    pub async fn undo_all(&self) -> Result<CommandOutput, ProcessError> {
        self.run(&["undo", "/recursive", "/noprompt"]).await
    }

    async fn run(&self, args: &[&str]) -> Result<CommandOutput, ProcessError> {
        let invocation = Invocation::new(&self.tf, &self.workspace).args(args.iter().copied());
        self.runner.run(&invocation).await
    }
}

/// Whether `tf status` output lists pending changes
pub fn has_pending_changes(status_output: &str) -> bool {
    let trimmed = status_output.trim();
    !trimmed.is_empty() && !trimmed.to_lowercase().starts_with(NO_PENDING_CHANGES)
}

/// Whether `tf get` output reports a conflict
pub fn reports_conflict(get_output: &str) -> bool {
    get_output.to_lowercase().contains("conflict")
}
