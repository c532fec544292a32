//! Run report
//!
//! Collects what a run did and renders it as one Markdown document, then
//! persists it under the logs directory.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::config::defaults::REPORT_FILE_PREFIX;
use crate::core::builder::BuildOutcome;
use crate::core::sync::SyncOutcome;
use crate::error::ReportError;
use crate::infra::filesystem;

/// Build stage results
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildSection {
    /// Resolved build tool
    pub tool: String,
    /// Last outcome per project, in build order
    pub outcomes: Vec<BuildOutcome>,
}

/// Everything a run report shows
///
/// Stages not reached stay `None` and are left out of the rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub started_at: DateTime<Local>,
    pub working_dir: PathBuf,
    pub vcs: Option<Vec<SyncOutcome>>,
    pub build: Option<BuildSection>,
    /// Error that ended the run early
    pub error: Option<String>,
}

impl Report {
    /// Start an empty report
    pub fn new(started_at: DateTime<Local>, working_dir: PathBuf) -> Self {
        Self {
            started_at,
            working_dir,
            vcs: None,
            build: None,
            error: None,
        }
    }

    /// Render the report as Markdown. Same report, same text.
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.render_header(&mut out);
        if let Some(vcs) = &self.vcs {
            render_vcs(&mut out, vcs);
        }
        if let Some(build) = &self.build {
            render_build(&mut out, build);
            render_summary(&mut out, &build.outcomes);
        }
        if let Some(error) = &self.error {
            out.push_str("\n## ❌ Run Error\n\n");
            push_fenced(&mut out, error);
        }
        out
    }

    /// Write the rendered report to a fresh timestamped file in `logs_dir`
    pub fn persist(&self, logs_dir: &Path) -> Result<PathBuf, ReportError> {
        let stem = format!(
            "{REPORT_FILE_PREFIX}{}",
            Local::now().format("%Y-%m-%dT%H-%M-%S-%3f")
        );
        let path = filesystem::write_new_file(logs_dir, &stem, "md", &self.render())?;
        tracing::info!("Report written to {}", path.display());
        Ok(path)
    }

    fn render_header(&self, out: &mut String) {
        out.push_str("# 🏗️ Build Report\n\n");
        let _ = writeln!(
            out,
            "- **Started**: {}",
            self.started_at.format("%Y-%m-%d %H:%M:%S")
        );
        let _ = writeln!(
            out,
            "- **Working directory**: `{}`",
            self.working_dir.display()
        );
    }
}

fn render_vcs(out: &mut String, outcomes: &[SyncOutcome]) {
    out.push_str("\n## 🔄 Version Control Update\n\n");
    if outcomes.is_empty() {
        out.push_str("- No version control paths configured, skipping.\n");
        return;
    }

    for outcome in outcomes {
        for line in &outcome.lines {
            out.push_str(line);
            out.push('\n');
        }
        out.push('\n');
    }

    let conflicts: Vec<_> = outcomes.iter().filter_map(|o| o.conflict.as_ref()).collect();
    if !conflicts.is_empty() {
        out.push_str("### ⚠️ Manual Intervention Required (VCS)\n\n");
        for conflict in conflicts {
            let _ = writeln!(
                out,
                "- **{}** `{}`: {}",
                conflict.kind.to_string().to_uppercase(),
                conflict.path.display(),
                conflict.message
            );
        }
    }
}

fn render_build(out: &mut String, build: &BuildSection) {
    out.push_str("\n## 🔨 Build\n\n");
    let _ = writeln!(out, "- **Build tool**: `{}`", build.tool);
    let _ = writeln!(out, "- **Projects**: {}\n", build.outcomes.len());

    for outcome in &build.outcomes {
        let icon = if outcome.success { "✅" } else { "❌" };
        let retries = if outcome.attempts > 1 {
            format!(", {} attempts", outcome.attempts)
        } else {
            String::new()
        };
        let _ = writeln!(
            out,
            "- {icon} **{}** ({}s{retries})",
            outcome.name, outcome.duration_secs
        );

        if let (false, Some(error)) = (outcome.success, &outcome.error) {
            let _ = writeln!(
                out,
                "\n<details><summary>{} output</summary>\n",
                outcome.name
            );
            push_fenced(out, error);
            out.push_str("\n</details>\n\n");
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn render_summary(out: &mut String, outcomes: &[BuildOutcome]) {
    let total = outcomes.len();
    let failed: Vec<&str> = outcomes
        .iter()
        .filter(|o| !o.success)
        .map(|o| o.name.as_str())
        .collect();
    let succeeded = total - failed.len();

    out.push_str("\n## 📊 Summary\n\n");
    let _ = writeln!(out, "- ✅ Succeeded: {succeeded}");
    let _ = writeln!(out, "- ❌ Failed: {}", failed.len());
    if total > 0 {
        let _ = writeln!(
            out,
            "- Success rate: {:.1}%",
            succeeded as f64 * 100.0 / total as f64
        );
    }
    if !failed.is_empty() {
        let _ = writeln!(out, "- Failed projects: {}", failed.join(", "));
    }
}

/// Append `text` in a fence longer than any backtick run inside it
fn push_fenced(out: &mut String, text: &str) {
    let longest = text
        .split(|c| c != '`')
        .map(str::len)
        .max()
        .unwrap_or(0);
    let fence = "`".repeat(longest.max(2) + 1);
    let _ = writeln!(out, "{fence}text\n{}\n{fence}", text.trim_end());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{VcsKind, VersionControlTarget};
    use crate::core::sync::{Conflict, SyncStatus};
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn started() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).single().unwrap()
    }

    fn outcome(name: &str, success: bool, error: Option<&str>) -> BuildOutcome {
        BuildOutcome {
            name: name.to_string(),
            path: PathBuf::from(format!("/src/{name}.sln")),
            success,
            duration_secs: 4,
            error: error.map(str::to_string),
            attempts: 1,
        }
    }

    fn full_report() -> Report {
        let target = VersionControlTarget {
            path: PathBuf::from("/src/repo"),
            kind: VcsKind::Git,
        };
        let mut report = Report::new(started(), PathBuf::from("/work"));
        report.vcs = Some(vec![SyncOutcome {
            target: target.clone(),
            status: SyncStatus::Conflict,
            lines: vec!["### Git Update: `/src/repo`".to_string(), "- conflicted".to_string()],
            conflict: Some(Conflict {
                kind: VcsKind::Git,
                path: target.path,
                message: "Not a fast-forward or merge conflict".to_string(),
            }),
        }]);
        report.build = Some(BuildSection {
            tool: "msbuild".to_string(),
            outcomes: vec![
                outcome("Core", true, None),
                outcome("App", false, Some("App.cs(3,1): error CS1002")),
                outcome("Web", true, None),
            ],
        });
        report
    }

    #[test]
    fn test_render_is_idempotent() {
        let report = full_report();
        assert_eq!(report.render(), report.render());
    }

    #[test]
    fn test_sections_in_order() {
        let text = full_report().render();
        let header = text.find("# 🏗️ Build Report").unwrap();
        let vcs = text.find("## 🔄 Version Control Update").unwrap();
        let manual = text.find("Manual Intervention Required (VCS)").unwrap();
        let build = text.find("## 🔨 Build").unwrap();
        let summary = text.find("## 📊 Summary").unwrap();
        assert!(header < vcs && vcs < manual && manual < build && build < summary);
        assert!(!text.contains("Run Error"));
    }

    #[test]
    fn test_header_fields() {
        let text = full_report().render();
        assert!(text.contains("- **Started**: 2024-03-01 09:30:00"));
        assert!(text.contains("- **Working directory**: `/work`"));
    }

    #[test]
    fn test_conflicts_listed() {
        let text = full_report().render();
        assert!(text.contains("- **GIT** `/src/repo`: Not a fast-forward or merge conflict"));
    }

    #[test]
    fn test_summary_counts() {
        let text = full_report().render();
        assert!(text.contains("- ✅ Succeeded: 2"));
        assert!(text.contains("- ❌ Failed: 1"));
        assert!(text.contains("- Success rate: 66.7%"));
        assert!(text.contains("- Failed projects: App"));
    }

    #[test]
    fn test_failure_output_in_collapsible_block() {
        let text = full_report().render();
        assert!(text.contains("<details><summary>App output</summary>"));
        assert!(text.contains("```text\nApp.cs(3,1): error CS1002\n```"));
        assert!(!text.contains("<summary>Core output"));
    }

    #[test]
    fn test_failure_output_follows_its_status_line() {
        let text = full_report().render();
        let app = text.find("- ❌ **App**").unwrap();
        let details = text.find("<summary>App output").unwrap();
        let web = text.find("- ✅ **Web**").unwrap();
        assert!(app < details && details < web);
    }

    #[test]
    fn test_no_vcs_targets_line() {
        let mut report = Report::new(started(), PathBuf::from("/work"));
        report.vcs = Some(vec![]);
        assert!(report.render().contains("No version control paths configured"));
    }

    #[test]
    fn test_partial_report_with_error() {
        let mut report = Report::new(started(), PathBuf::from("/work"));
        report.error = Some("Configuration error: `projects` is empty".to_string());
        let text = report.render();

        assert!(text.contains("## ❌ Run Error"));
        assert!(text.contains("`projects` is empty"));
        assert!(!text.contains("## 🔨 Build"));
        assert!(!text.contains("## 🔄 Version Control Update"));
    }

    #[test]
    fn test_fence_outgrows_backticks_in_text() {
        let mut out = String::new();
        push_fenced(&mut out, "before ``` after");
        assert!(out.starts_with("````text\n"));
        assert!(out.ends_with("\n````\n"));
    }

    #[test]
    fn test_persist_never_overwrites() {
        let dir = TempDir::new().unwrap();
        let logs = dir.path().join("logs");
        let report = full_report();

        let first = report.persist(&logs).unwrap();
        let second = report.persist(&logs).unwrap();

        assert_ne!(first, second);
        let name = first.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("build-"));
        assert!(name.ends_with(".md"));
        assert_eq!(std::fs::read_to_string(&first).unwrap(), report.render());
        assert_eq!(std::fs::read_to_string(&second).unwrap(), report.render());
    }
}
