//! CLI command implementations
//!
//! Each command is implemented in its own submodule.

pub mod plan;
pub mod run;

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Args, Subcommand};

use crate::cli::output::OutputMode;
use crate::config::defaults::{CONFIG_DIR, LOGS_DIR};
use crate::core::config::BuildRequest;
use crate::error::ConfigError;

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Update working copies, build all projects and write a report
    Run {
        #[command(flatten)]
        request: RequestArgs,

        /// Directory receiving report files
        #[arg(long, env = "BUILDALL_LOGS_DIR", default_value = LOGS_DIR)]
        logs_dir: PathBuf,
    },

    /// Show the build order without running anything
    Plan {
        #[command(flatten)]
        request: RequestArgs,
    },
}

/// Options selecting and overriding the build configuration
#[derive(Args, Debug, Clone, Default)]
pub struct RequestArgs {
    /// Directory holding build-config*.json
    #[arg(long, env = "BUILDALL_CONFIG_DIR", default_value = CONFIG_DIR)]
    pub config_dir: PathBuf,

    /// Use build-config-<NAME>.json instead of build-config.json
    #[arg(short = 'c', long, value_name = "NAME")]
    pub config_name: Option<String>,

    /// Ignore configuration files; everything comes from the request
    #[arg(long)]
    pub no_config: bool,

    /// Request object as inline JSON, or @path to read it from a file
    #[arg(long, value_name = "JSON|@FILE")]
    pub request: Option<String>,

    /// MSBuild executable
    #[arg(long)]
    pub msbuild_path: Option<String>,

    /// Extra passes over still-failing projects
    #[arg(long)]
    pub max_retries: Option<u32>,

    /// Per-project build timeout in seconds
    #[arg(long, value_name = "SECONDS")]
    pub timeout: Option<u64>,
}

impl RequestArgs {
    /// Assemble the request; flags take precedence over `--request` fields
    pub fn build_request(&self) -> Result<BuildRequest, ConfigError> {
        let mut request = match &self.request {
            None => BuildRequest::default(),
            Some(raw) => BuildRequest::from_json(&read_request(raw)?)?,
        };

        if self.no_config {
            request.use_config = Some(false);
        }
        if let Some(name) = &self.config_name {
            request.config_name = Some(name.clone());
        }
        if let Some(path) = &self.msbuild_path {
            request.overrides.msbuild_path = Some(path.clone());
        }
        if let Some(retries) = self.max_retries {
            request.overrides.max_retries = Some(retries);
        }
        if let Some(secs) = self.timeout {
            request.overrides.build_timeout_seconds = Some(secs);
        }
        Ok(request)
    }
}

fn read_request(raw: &str) -> Result<String, ConfigError> {
    match raw.strip_prefix('@') {
        Some(path) => {
            std::fs::read_to_string(Path::new(path)).map_err(|e| ConfigError::RequestFile {
                path: PathBuf::from(path),
                error: e.to_string(),
            })
        }
        None => Ok(raw.to_string()),
    }
}

impl Commands {
    /// Execute the command
    pub async fn run(self, mode: OutputMode) -> Result<()> {
        match self {
            Self::Run { request, logs_dir } => {
                let current_dir = std::env::current_dir()?;
                run::execute(&current_dir, &request, logs_dir, mode).await
            }
            Self::Plan { request } => {
                let current_dir = std::env::current_dir()?;
                plan::execute(&current_dir, &request, mode)
            }
        }
    }
}
