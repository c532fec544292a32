//! buildall - batch build orchestration
//!
//! Updates Git and TFS working copies without risking local work, builds
//! a list of MSBuild projects in dependency order, and writes a Markdown
//! report of the whole run.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`cli`] - Command-line interface parsing and output formatting
//! - [`core`] - Business logic (workflow stages)
//! - [`infra`] - Infrastructure layer (processes, filesystem)
//! - [`config`] - Configuration and constants
//! - [`error`] - Error types and handling

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod infra;

#[cfg(test)]
pub mod test_utils;
