//! Run command implementation
//!
//! Implements `buildall run`: the full update/build/report workflow.

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};

use crate::cli::commands::RequestArgs;
use crate::cli::output::{create_spinner, OutputMode};
use crate::core::workflow::{self, Workspace};
use crate::infra::process::SystemRunner;

/// Execute the run command
///
/// Fails when the run ended early or any project failed to build, after
/// the report has been printed. A bad `--request` ends the run early too.
pub async fn execute(
    project_dir: &Path,
    args: &RequestArgs,
    logs_dir: PathBuf,
    mode: OutputMode,
) -> Result<()> {
    let request = args.build_request();
    let workspace = Workspace::new(
        project_dir.join(&args.config_dir),
        project_dir.join(logs_dir),
        project_dir,
    );

    let spinner = mode.interactive().then(|| create_spinner("Updating and building..."));
    let summary = workflow::run_parsed(&SystemRunner, request, &workspace).await;
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }

    if mode.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else if !mode.quiet {
        println!("{}", summary.markdown);
    }

    if let Some(error) = &summary.error {
        bail!("Run failed: {error}");
    }
    let failed = summary.failed_builds();
    if failed > 0 {
        bail!("{failed} project(s) failed to build");
    }
    Ok(())
}
