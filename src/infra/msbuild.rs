//! MSBuild invocation
//!
//! Builds the command line for one project, decides success from the
//! tool's own summary text, and locates the `msbuild` and `tf` executables.

use std::path::Path;
use std::time::Duration;

use regex::Regex;

use crate::config::defaults::{FALLBACK_MSBUILD, FALLBACK_TF};
use crate::infra::process::Invocation;

/// Visual Studio install locations probed when no tool path is configured
const MSBUILD_CANDIDATES: &[&str] = &[
    r"C:\Program Files\Microsoft Visual Studio\2022\Community\MSBuild\Current\Bin\MSBuild.exe",
    r"C:\Program Files\Microsoft Visual Studio\2022\Professional\MSBuild\Current\Bin\MSBuild.exe",
    r"C:\Program Files\Microsoft Visual Studio\2022\Enterprise\MSBuild\Current\Bin\MSBuild.exe",
    r"C:\Program Files\Microsoft Visual Studio\2022\BuildTools\MSBuild\Current\Bin\MSBuild.exe",
    r"C:\Program Files (x86)\Microsoft Visual Studio\2019\BuildTools\MSBuild\Current\Bin\MSBuild.exe",
];

const TF_CANDIDATES: &[&str] = &[
    r"C:\Program Files\Microsoft Visual Studio\2022\Community\Common7\IDE\CommonExtensions\Microsoft\TeamFoundation\Team Explorer\TF.exe",
    r"C:\Program Files\Microsoft Visual Studio\2022\Professional\Common7\IDE\CommonExtensions\Microsoft\TeamFoundation\Team Explorer\TF.exe",
    r"C:\Program Files\Microsoft Visual Studio\2022\Enterprise\Common7\IDE\CommonExtensions\Microsoft\TeamFoundation\Team Explorer\TF.exe",
    r"C:\Program Files (x86)\Microsoft Visual Studio\2019\Community\Common7\IDE\CommonExtensions\Microsoft\TeamFoundation\Team Explorer\TF.exe",
];

/// A configured MSBuild executable
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MsBuild {
    /// Executable path or name
    pub tool: String,
    /// `/p:Configuration` value
    pub configuration: String,
    /// `/p:Platform` value
    pub platform: String,
    /// Per-project time budget
    pub timeout: Duration,
}

impl MsBuild {
    /// Invocation building `project`, run from the project's directory.
    ///
    /// Parallel build, errors-only console output plus the summary, so the
    /// captured text stays small and carries the success marker.
    pub fn invocation(&self, project: &Path) -> Invocation {
        let cwd = project
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        Invocation::new(&self.tool, cwd)
            .arg(project.display().to_string())
            .args([
                "/t:Build".to_string(),
                format!("/p:Configuration={}", self.configuration),
                format!("/p:Platform={}", self.platform),
                "/m".to_string(),
                "/nologo".to_string(),
                "/clp:ErrorsOnly;Summary".to_string(),
                "/v:m".to_string(),
            ])
            .timeout(self.timeout)
    }
}

/// Largest `N Error(s)` count in MSBuild's summary, if any is printed
pub fn reported_error_count(output: &str) -> Option<u64> {
    let re = Regex::new(r"(\d+) Error\(s\)").ok()?;
    re.captures_iter(output)
        .filter_map(|c| c.get(1)?.as_str().parse::<u64>().ok())
        .max()
}

/// Decide build success from MSBuild's output text.
///
/// A nonzero error count or "Build FAILED" means failure. Otherwise the
/// output must carry "Build succeeded" or a `0 Error(s)` summary; with
/// neither, the build counts as failed whatever the exit code was.
pub fn build_succeeded(output: &str) -> bool {
    let errors = reported_error_count(output);
    if errors.is_some_and(|n| n > 0) {
        return false;
    }

    let lower = output.to_lowercase();
    if lower.contains("build failed") {
        return false;
    }

    lower.contains("build succeeded") || errors == Some(0)
}

/// Locate MSBuild.
///
/// An explicit path is used if it exists, else looked up on `PATH`, else
/// passed through untouched. Without one, well-known Visual Studio
/// locations (Windows) and then `PATH` are tried.
pub fn resolve_msbuild_path(explicit: Option<&str>) -> String {
    resolve_tool(explicit, MSBUILD_CANDIDATES, &["MSBuild.exe", "msbuild"], FALLBACK_MSBUILD)
}

/// Locate the TFS command line client, same rules as [`resolve_msbuild_path`]
pub fn resolve_tf_path(explicit: Option<&str>) -> String {
    resolve_tool(explicit, TF_CANDIDATES, &["TF.exe", "tf"], FALLBACK_TF)
}

fn resolve_tool(
    explicit: Option<&str>,
    candidates: &[&str],
    names: &[&str],
    fallback: &str,
) -> String {
    if let Some(path) = explicit {
        if Path::new(path).exists() {
            return path.to_string();
        }
        return which::which(path).map_or_else(|_| path.to_string(), |p| p.display().to_string());
    }

    if cfg!(windows) {
        if let Some(found) = candidates.iter().find(|c| Path::new(c).exists()) {
            return (*found).to_string();
        }
    }

    names
        .iter()
        .find_map(|name| which::which(name).ok())
        .map_or_else(|| fallback.to_string(), |p| p.display().to_string())
}
