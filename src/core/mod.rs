//! Core business logic module
//!
//! This module contains the run workflow and its stages. External tools
//! are reached only through [`crate::infra`].
//!
//! # Submodules
//!
//! - [`config`] - Configuration resolution (`build-config*.json` + request)
//! - [`sync`] - Version control update (Git, TFS)
//! - [`resolver`] - Dependency resolution
//! - [`builder`] - Build orchestration logic
//! - [`report`] - Markdown run report
//! - [`workflow`] - The run from configuration to persisted report

pub mod builder;
pub mod config;
pub mod report;
pub mod resolver;
pub mod sync;
pub mod workflow;
