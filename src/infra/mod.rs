//! Infrastructure layer
//!
//! Handles all I/O operations: external processes and the filesystem.
//! This module is the only place where side effects occur.

pub mod filesystem;
pub mod git;
pub mod msbuild;
pub mod process;
pub mod tfs;
