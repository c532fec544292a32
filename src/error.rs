//! Error types for buildall
//!
//! Domain-specific error types using thiserror.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Configuration resolution errors
///
/// These are fatal to a run: no version-control or build step happens
/// after one of them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Selected configuration file does not exist
    #[error(
        "Config not found: {} (configName=\"{}\")",
        path.display(),
        profile.as_deref().unwrap_or("default")
    )]
    NotFound {
        path: PathBuf,
        profile: Option<String>,
    },

    /// Configuration file could not be read
    #[error("Failed to read config '{}': {error}", path.display())]
    Read { path: PathBuf, error: String },

    /// Configuration file is not valid JSON for the expected shape
    #[error("Config JSON parse error in '{}': {error}", path.display())]
    InvalidJson { path: PathBuf, error: String },

    /// `@file` request could not be read
    #[error("Failed to read request file '{}': {error}", path.display())]
    RequestFile { path: PathBuf, error: String },

    /// Invocation object is not valid JSON for the expected shape
    #[error("Invalid request JSON: {error}")]
    InvalidRequest { error: String },

    /// Profile name would escape the configuration directory
    #[error("Invalid configName '{name}': must not contain path separators or '..'")]
    InvalidProfileName { name: String },

    /// No project survived the merge
    #[error("`projects` is empty: provide projects in the request or in the config file")]
    EmptyProjects,

    /// A project entry without a path
    #[error("Project #{index} has an empty `path`")]
    EmptyProjectPath { index: usize },
}

/// External process invocation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProcessError {
    /// Program could not be found
    #[error("'{program}' not found (is it installed and on PATH?)")]
    NotFound { program: String },

    /// Program could not be started or awaited
    #[error("Failed to run '{program}': {error}")]
    Spawn { program: String, error: String },

    /// Program exceeded its time budget and was killed
    #[error("'{program}' timed out after {}s", after.as_secs())]
    TimedOut { program: String, after: Duration },
}

/// Report persistence errors
#[derive(Error, Debug)]
pub enum ReportError {
    /// Failed to create the logs directory
    #[error("Failed to create directory '{}': {error}", path.display())]
    CreateDir { path: PathBuf, error: String },

    /// Failed to write the report file
    #[error("Failed to write report '{}': {error}", path.display())]
    WriteFile { path: PathBuf, error: String },

    /// Every candidate file name for this timestamp was taken
    #[error("No free report file name in '{}'", dir.display())]
    NoFreeName { dir: PathBuf },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_names_file_and_profile() {
        let err = ConfigError::NotFound {
            path: PathBuf::from("config/build-config-prod.json"),
            profile: Some("prod".to_string()),
        };
        let msg = err.to_string();
        assert!(msg.contains("build-config-prod.json"));
        assert!(msg.contains("configName=\"prod\""));
    }

    #[test]
    fn test_empty_projects_mentions_field() {
        assert!(ConfigError::EmptyProjects.to_string().contains("projects"));
    }

    #[test]
    fn test_timeout_message_in_seconds() {
        let err = ProcessError::TimedOut {
            program: "msbuild".to_string(),
            after: Duration::from_secs(90),
        };
        assert_eq!(err.to_string(), "'msbuild' timed out after 90s");
    }

    #[test]
    fn test_request_file_error_names_file() {
        let err = ConfigError::RequestFile {
            path: PathBuf::from("requests/nightly.json"),
            error: "No such file or directory".to_string(),
        };
        assert!(err.to_string().contains("requests/nightly.json"));
    }
}
