//! Run workflow
//!
//! Resolve configuration, update working copies, order and build the
//! projects, then persist the report. A run never returns an error: what
//! went wrong ends up in the report instead.

use std::path::{Path, PathBuf};

use chrono::Local;
use serde::Serialize;

use crate::core::builder::{BuildOrchestrator, BuildOutcome, RetryPolicy};
use crate::core::config::{self, BuildConfiguration, BuildRequest, ProjectTarget};
use crate::core::report::{BuildSection, Report};
use crate::core::resolver::{order_by_dependencies, DependencyGraph};
use crate::core::sync::{self, SyncOutcome};
use crate::error::ConfigError;
use crate::infra::msbuild::{resolve_msbuild_path, resolve_tf_path, MsBuild};
use crate::infra::process::CommandRunner;

/// Directories a run works with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    /// Where `build-config*.json` files live
    pub config_dir: PathBuf,
    /// Where reports are written
    pub logs_dir: PathBuf,
    /// Base for relative paths in the configuration
    pub working_dir: PathBuf,
}

impl Workspace {
    pub fn new(
        config_dir: impl Into<PathBuf>,
        logs_dir: impl Into<PathBuf>,
        working_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            config_dir: config_dir.into(),
            logs_dir: logs_dir.into(),
            working_dir: working_dir.into(),
        }
    }
}

/// What a run produced
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    /// Rendered report, followed by the log file line
    pub markdown: String,
    pub log_file: Option<PathBuf>,
    pub sync: Vec<SyncOutcome>,
    pub builds: Vec<BuildOutcome>,
    /// Error that ended the run early
    pub error: Option<String>,
}

impl RunSummary {
    /// Number of projects whose last build failed
    pub fn failed_builds(&self) -> usize {
        self.builds.iter().filter(|b| !b.success).count()
    }

    /// True when the run finished and every build succeeded
    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.failed_builds() == 0
    }
}

/// Build order for a configuration, without running anything
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Plan {
    pub order: Vec<ProjectTarget>,
    /// Dependency cycles, first name repeated at the end
    pub cycles: Vec<Vec<String>>,
}

/// Resolve the configuration and compute the build order
pub fn plan(request: &BuildRequest, workspace: &Workspace) -> Result<Plan, ConfigError> {
    let config = config::resolve(request, &workspace.config_dir)?;
    let graph = DependencyGraph::new(&config.projects);
    Ok(Plan {
        order: order_by_dependencies(&config.projects),
        cycles: graph.cycles(),
    })
}

/// Execute one full run
pub async fn run<R: CommandRunner>(
    runner: &R,
    request: &BuildRequest,
    workspace: &Workspace,
) -> RunSummary {
    run_parsed(runner, Ok(request.clone()), workspace).await
}

/// Execute one full run from the outcome of reading the request.
///
/// An unreadable or malformed request is reported like any other
/// configuration error: the report is still written.
pub async fn run_parsed<R: CommandRunner>(
    runner: &R,
    request: Result<BuildRequest, ConfigError>,
    workspace: &Workspace,
) -> RunSummary {
    let mut report = Report::new(Local::now(), workspace.working_dir.clone());

    if let Err(e) = execute(runner, request, workspace, &mut report).await {
        tracing::error!("Run aborted: {e}");
        report.error = Some(format!("Configuration error: {e}"));
    }

    let mut markdown = report.render();
    let log_file = match report.persist(&workspace.logs_dir) {
        Ok(path) => {
            markdown.push_str(&format!("\n🗂️ **Log file**: {}\n", path.display()));
            Some(path)
        }
        Err(e) => {
            tracing::warn!("Could not write report: {e}");
            markdown.push_str(&format!("\n⚠️ **Log file not written**: {e}\n"));
            None
        }
    };

    RunSummary {
        markdown,
        log_file,
        sync: report.vcs.unwrap_or_default(),
        builds: report.build.map(|b| b.outcomes).unwrap_or_default(),
        error: report.error,
    }
}

async fn execute<R: CommandRunner>(
    runner: &R,
    request: Result<BuildRequest, ConfigError>,
    workspace: &Workspace,
    report: &mut Report,
) -> Result<(), ConfigError> {
    let config = anchored(
        config::resolve(&request?, &workspace.config_dir)?,
        &workspace.working_dir,
    );

    let tf_path = resolve_tf_path(config.tf_path.as_deref());
    tracing::info!(
        "Updating {} working cop{}",
        config.version_control_paths.len(),
        if config.version_control_paths.len() == 1 { "y" } else { "ies" }
    );
    report.vcs = Some(sync::synchronize(runner, &config.version_control_paths, &tf_path).await);

    for cycle in DependencyGraph::new(&config.projects).cycles() {
        tracing::warn!("Dependency cycle: {}", cycle.join(" -> "));
    }
    let ordered = order_by_dependencies(&config.projects);

    let orchestrator = BuildOrchestrator::new(
        MsBuild {
            tool: resolve_msbuild_path(config.msbuild_path.as_deref()),
            configuration: config.configuration.clone(),
            platform: config.platform.clone(),
            timeout: config.build_timeout,
        },
        RetryPolicy {
            max_retries: config.max_retries,
        },
    );
    tracing::info!(
        "Building {} project(s) with {}",
        ordered.len(),
        orchestrator.tool()
    );
    let outcomes = orchestrator.build_all(runner, &ordered).await;

    report.build = Some(BuildSection {
        tool: orchestrator.tool().to_string(),
        outcomes,
    });
    Ok(())
}

/// Make relative target paths relative to `base`
fn anchored(mut config: BuildConfiguration, base: &Path) -> BuildConfiguration {
    for target in &mut config.version_control_paths {
        if target.path.is_relative() {
            target.path = base.join(&target.path);
        }
    }
    for project in &mut config.projects {
        if project.path.is_relative() {
            project.path = base.join(&project.path);
        }
    }
    config
}
