//! Build configuration resolution
//!
//! Merges the caller's request over a JSON configuration file into an
//! immutable [`BuildConfiguration`].
//!
//! The file lives in one explicit directory chosen by the caller:
//! `build-config.json`, or `build-config-<configName>.json` for a named
//! profile. Request fields win field by field; array fields are replaced
//! wholesale, never concatenated.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::defaults::{
    CONFIG_FILE_STEM, DEFAULT_BUILD_CONFIGURATION, DEFAULT_BUILD_PLATFORM,
    DEFAULT_BUILD_TIMEOUT_SECS, DEFAULT_MAX_RETRIES,
};
use crate::error::ConfigError;

/// Version control system of a working copy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VcsKind {
    /// Git working copy
    Git,
    /// TFS (TFVC) mapped workspace folder
    Tfs,
    /// Any other `type` string; reported and skipped
    #[serde(other)]
    Unknown,
}

impl fmt::Display for VcsKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Git => write!(f, "git"),
            Self::Tfs => write!(f, "tfs"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// A working copy to update before building
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionControlTarget {
    /// Working copy directory
    pub path: PathBuf,
    /// Version control system
    #[serde(rename = "type")]
    pub kind: VcsKind,
}

/// A project or solution file to build
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectTarget {
    /// Path to the `.sln` / `.csproj` file
    pub path: PathBuf,
    /// Name used by other projects' `dependencies`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Names of projects that must be built first
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,
}

impl ProjectTarget {
    /// Create a project with no name and no dependencies
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            name: None,
            dependencies: Vec::new(),
        }
    }

    /// Set the name
    #[must_use]
    pub fn named(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    /// Add a dependency by name
    #[must_use]
    pub fn depends_on(mut self, name: &str) -> Self {
        self.dependencies.push(name.to_string());
        self
    }

    /// Name for reports: the declared name, else the file name.
    ///
    /// Both `/` and `\` separate path components here, so Windows paths
    /// read from a config file get the right base name on any host.
    pub fn display_name(&self) -> String {
        if let Some(name) = &self.name {
            return name.clone();
        }
        let full = self.path.to_string_lossy();
        full.rsplit(|c| c == '/' || c == '\\')
            .find(|part| !part.is_empty())
            .unwrap_or(&full)
            .to_string()
    }
}

/// Shape of `build-config*.json`; also the overridable part of a request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigFile {
    /// Working copies to update
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_control_paths: Option<Vec<VersionControlTarget>>,

    /// Projects to build
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub projects: Option<Vec<ProjectTarget>>,

    /// MSBuild executable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub msbuild_path: Option<String>,

    /// Extra passes over still-failing projects
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u32>,

    /// Per-project build timeout; zero means the default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_timeout_seconds: Option<u64>,

    /// MSBuild `Configuration` property
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub configuration: Option<String>,

    /// MSBuild `Platform` property
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,

    /// TFS command line client
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tf_path: Option<String>,
}

impl ConfigFile {
    /// Load a configuration file.
    ///
    /// `profile` only feeds the not-found message.
    pub fn load(path: &Path, profile: Option<&str>) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
                profile: profile.map(str::to_string),
            });
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        serde_json::from_str(&content).map_err(|e| ConfigError::InvalidJson {
            path: path.to_path_buf(),
            error: e.to_string(),
        })
    }

    /// Fields of `self` where set, else those of `base`
    #[must_use]
    pub fn merged_over(self, base: Self) -> Self {
        Self {
            version_control_paths: self.version_control_paths.or(base.version_control_paths),
            projects: self.projects.or(base.projects),
            msbuild_path: self.msbuild_path.or(base.msbuild_path),
            max_retries: self.max_retries.or(base.max_retries),
            build_timeout_seconds: self.build_timeout_seconds.or(base.build_timeout_seconds),
            configuration: self.configuration.or(base.configuration),
            platform: self.platform.or(base.platform),
            tf_path: self.tf_path.or(base.tf_path),
        }
    }
}

/// The invocation object: what a caller passes to start a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildRequest {
    /// Load the configuration file (default true)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_config: Option<bool>,

    /// Profile selecting `build-config-<name>.json`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_name: Option<String>,

    /// Fields overriding the configuration file
    #[serde(flatten)]
    pub overrides: ConfigFile,
}

impl BuildRequest {
    /// Parse a request object; blank input is an empty request
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        if json.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(json).map_err(|e| ConfigError::InvalidRequest {
            error: e.to_string(),
        })
    }

    /// Whether the configuration file should be loaded
    pub fn uses_config(&self) -> bool {
        self.use_config.unwrap_or(true)
    }

    /// Profile name, if one was given and is not blank
    pub fn profile(&self) -> Option<&str> {
        self.config_name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
    }
}

/// Resolved, immutable input of one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildConfiguration {
    /// Working copies, updated in this order
    pub version_control_paths: Vec<VersionControlTarget>,
    /// Projects, never empty
    pub projects: Vec<ProjectTarget>,
    /// Configured MSBuild executable, before resolution
    pub msbuild_path: Option<String>,
    /// Configured TFS client, before resolution
    pub tf_path: Option<String>,
    /// Extra passes over still-failing projects
    pub max_retries: u32,
    /// Per-project build timeout
    pub build_timeout: Duration,
    /// MSBuild `Configuration` property
    pub configuration: String,
    /// MSBuild `Platform` property
    pub platform: String,
}

/// Path of the configuration file for `profile` inside `config_dir`
pub fn config_file_path(config_dir: &Path, profile: Option<&str>) -> Result<PathBuf, ConfigError> {
    match profile {
        None => Ok(config_dir.join(format!("{CONFIG_FILE_STEM}.json"))),
        Some(name) => {
            if name.contains(|c| c == '/' || c == '\\') || name.contains("..") {
                return Err(ConfigError::InvalidProfileName {
                    name: name.to_string(),
                });
            }
            Ok(config_dir.join(format!("{CONFIG_FILE_STEM}-{name}.json")))
        }
    }
}

/// Resolve the configuration for one run.
///
/// Reads at most one file; nothing else is touched.
pub fn resolve(
    request: &BuildRequest,
    config_dir: &Path,
) -> Result<BuildConfiguration, ConfigError> {
    let loaded = if request.uses_config() {
        let profile = request.profile();
        let path = config_file_path(config_dir, profile)?;
        tracing::info!("Loading build configuration from {}", path.display());
        ConfigFile::load(&path, profile)?
    } else {
        tracing::info!("Configuration file disabled, using request fields only");
        ConfigFile::default()
    };

    let merged = request.overrides.clone().merged_over(loaded);
    finalize(merged)
}

fn finalize(merged: ConfigFile) -> Result<BuildConfiguration, ConfigError> {
    let projects = merged.projects.unwrap_or_default();
    if projects.is_empty() {
        return Err(ConfigError::EmptyProjects);
    }
    if let Some(index) = projects
        .iter()
        .position(|p| p.path.as_os_str().is_empty())
    {
        return Err(ConfigError::EmptyProjectPath { index });
    }

    let timeout_secs = merged
        .build_timeout_seconds
        .filter(|s| *s > 0)
        .unwrap_or(DEFAULT_BUILD_TIMEOUT_SECS);

    Ok(BuildConfiguration {
        version_control_paths: merged.version_control_paths.unwrap_or_default(),
        projects,
        msbuild_path: merged.msbuild_path.filter(|p| !p.trim().is_empty()),
        tf_path: merged.tf_path.filter(|p| !p.trim().is_empty()),
        max_retries: merged.max_retries.unwrap_or(DEFAULT_MAX_RETRIES),
        build_timeout: Duration::from_secs(timeout_secs),
        configuration: merged
            .configuration
            .unwrap_or_else(|| DEFAULT_BUILD_CONFIGURATION.to_string()),
        platform: merged
            .platform
            .unwrap_or_else(|| DEFAULT_BUILD_PLATFORM.to_string()),
    })
}
