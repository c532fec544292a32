//! Common test utilities and helpers
//!
//! This module provides shared utilities for integration tests.

#![allow(dead_code)]

use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::TempDir;

/// Test project context
///
/// Creates a temporary directory for test projects and provides
/// utilities for setting up test scenarios.
pub struct TestProject {
    /// Temporary directory for the test project
    pub dir: TempDir,
}

impl TestProject {
    /// Create a new test project in a temporary directory
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Get the path to the test project directory
    pub fn path(&self) -> PathBuf {
        self.dir.path().to_path_buf()
    }

    /// Create a file in the test project
    pub fn create_file(&self, name: &str, content: &str) {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        std::fs::write(path, content).expect("Failed to write file");
    }

    /// Create a directory in the test project
    pub fn create_dir(&self, name: &str) {
        let path = self.dir.path().join(name);
        std::fs::create_dir_all(path).expect("Failed to create directory");
    }

    /// Check if a file exists in the test project
    pub fn file_exists(&self, name: &str) -> bool {
        self.dir.path().join(name).exists()
    }

    /// Read a file from the test project
    pub fn read_file(&self, name: &str) -> String {
        std::fs::read_to_string(self.dir.path().join(name)).expect("Failed to read file")
    }

    /// Write `config/build-config.json`
    pub fn write_config(&self, json: &str) {
        self.create_file("config/build-config.json", json);
    }

    /// Report files written to `logs/`
    pub fn reports(&self) -> Vec<PathBuf> {
        let Ok(entries) = std::fs::read_dir(self.dir.path().join("logs")) else {
            return Vec::new();
        };
        let mut reports: Vec<PathBuf> = entries
            .map(|e| e.expect("Failed to read logs entry").path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "md"))
            .collect();
        reports.sort();
        reports
    }

    /// Install a stand-in `msbuild` that succeeds unless the project path
    /// contains `Broken`. Returns its absolute path.
    #[cfg(unix)]
    pub fn fake_msbuild(&self) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        self.create_file("tools/msbuild", FAKE_MSBUILD);
        let path = self.dir.path().join("tools/msbuild");
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
            .expect("Failed to make fake msbuild executable");
        path
    }
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}

/// Run the buildall binary in `project` with `args`
pub fn run_buildall(project: &TestProject, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_buildall"))
        .current_dir(project.path())
        .env_remove("BUILDALL_CONFIG_DIR")
        .env_remove("BUILDALL_LOGS_DIR")
        .env_remove("RUST_LOG")
        .args(args)
        .output()
        .expect("Failed to execute buildall")
}

/// Stdout of a finished command as text
pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

/// Stderr of a finished command as text
pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

/// Shell stand-in for MSBuild printing its usual summary lines
#[cfg(unix)]
pub const FAKE_MSBUILD: &str = r#"#!/bin/sh
case "$1" in
  *Broken*)
    echo "Broken.cs(3,5): error CS1002: ; expected"
    echo "Build FAILED."
    echo "    0 Warning(s)"
    echo "    1 Error(s)"
    exit 1
    ;;
  *)
    echo "Build succeeded."
    echo "    0 Warning(s)"
    echo "    0 Error(s)"
    ;;
esac
"#;

/// Two projects where `App` depends on `Core`, listed dependent first
pub const SAMPLE_CONFIG: &str = r#"{
    "projects": [
        { "path": "app/App.sln", "name": "App", "dependencies": ["Core"] },
        { "path": "core/Core.sln", "name": "Core" }
    ]
}"#;
