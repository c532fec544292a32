//! Build orchestration logic
//!
//! Builds projects one after another in the order given, then optionally
//! re-runs the subset that failed while that subset keeps shrinking.

use std::path::PathBuf;
use std::time::Instant;

use serde::Serialize;

use crate::config::defaults::MAX_DIAGNOSTIC_CHARS;
use crate::core::config::ProjectTarget;
use crate::error::ProcessError;
use crate::infra::msbuild::{self, MsBuild};
use crate::infra::process::CommandRunner;

/// Result of building one project
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildOutcome {
    /// Display name of the project
    pub name: String,
    /// Project or solution file
    pub path: PathBuf,
    /// Whether the tool reported success
    pub success: bool,
    /// Wall-clock time of the last attempt, rounded to seconds
    pub duration_secs: u64,
    /// Truncated diagnostic output on failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Number of times the project was built
    pub attempts: u32,
}

/// Bounded retry of still-failing projects
///
/// The first pass is compared against the full batch, so a pass where
/// every project fails (including a single-project run) is never retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RetryPolicy {
    /// Passes allowed after the first one
    pub max_retries: u32,
}

/// What to do after a build pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Build these (still failing) projects again
    Retry(Vec<usize>),
    /// Keep the outcomes as they are
    Stop,
}

impl RetryPolicy {
    /// Decide the next pass.
    ///
    /// `passes_done` counts passes so far (the first pass is 1),
    /// `attempted` is the size of the pass just finished and `failed` its
    /// failures. Retries only while failures exist, are strictly fewer
    /// than what was attempted, and passes remain.
    pub fn next_batch(
        &self,
        passes_done: u32,
        attempted: usize,
        failed: Vec<usize>,
    ) -> RetryDecision {
        if failed.is_empty() || failed.len() >= attempted || passes_done > self.max_retries {
            RetryDecision::Stop
        } else {
            RetryDecision::Retry(failed)
        }
    }
}

/// Build orchestrator state
#[derive(Debug)]
pub struct BuildOrchestrator {
    msbuild: MsBuild,
    retry: RetryPolicy,
}

impl BuildOrchestrator {
    /// Create a new build orchestrator
    pub fn new(msbuild: MsBuild, retry: RetryPolicy) -> Self {
        Self { msbuild, retry }
    }

    /// Get the resolved build tool
    pub fn tool(&self) -> &str {
        &self.msbuild.tool
    }

    /// Build one project
    pub async fn build_one<R: CommandRunner>(
        &self,
        runner: &R,
        project: &ProjectTarget,
    ) -> BuildOutcome {
        let name = project.display_name();
        tracing::info!("Building {name}");

        let started = Instant::now();
        let result = runner.run(&self.msbuild.invocation(&project.path)).await;
        let duration_secs = rounded_secs(started);

        let error = match result {
            Ok(out) => {
                let text = out.combined();
                if msbuild::build_succeeded(&text) {
                    None
                } else if text.trim().is_empty() {
                    Some(format!(
                        "Build tool exited with code {} without output",
                        out.code.map_or_else(|| "none".to_string(), |c| c.to_string())
                    ))
                } else {
                    Some(truncate_output(&text, MAX_DIAGNOSTIC_CHARS))
                }
            }
            Err(ProcessError::TimedOut { after, .. }) => {
                Some(format!("Build timeout after {}s", after.as_secs()))
            }
            Err(e) => Some(e.to_string()),
        };

        match &error {
            None => tracing::info!("{name} built in {duration_secs}s"),
            Some(_) => tracing::warn!("{name} failed after {duration_secs}s"),
        }

        BuildOutcome {
            name,
            path: project.path.clone(),
            success: error.is_none(),
            duration_secs,
            error,
            attempts: 1,
        }
    }

    /// Build `ordered` in sequence, retrying per the policy.
    ///
    /// Returns the last outcome of every project, in build order.
    pub async fn build_all<R: CommandRunner>(
        &self,
        runner: &R,
        ordered: &[ProjectTarget],
    ) -> Vec<BuildOutcome> {
        let mut latest: Vec<Option<BuildOutcome>> = vec![None; ordered.len()];
        let mut attempts = vec![0u32; ordered.len()];
        let mut batch: Vec<usize> = (0..ordered.len()).collect();
        let mut passes = 0u32;

        loop {
            passes += 1;
            if passes > 1 {
                tracing::info!("Retry pass {passes}: {} project(s)", batch.len());
            }

            for &index in &batch {
                attempts[index] += 1;
                let mut outcome = self.build_one(runner, &ordered[index]).await;
                outcome.attempts = attempts[index];
                latest[index] = Some(outcome);
            }

            let failed: Vec<usize> = batch
                .iter()
                .copied()
                .filter(|&i| latest[i].as_ref().is_some_and(|o| !o.success))
                .collect();

            match self.retry.next_batch(passes, batch.len(), failed) {
                RetryDecision::Retry(next) => batch = next,
                RetryDecision::Stop => break,
            }
        }

        latest.into_iter().flatten().collect()
    }
}

/// Keep at most `max_chars` characters of `text`, marking the cut
pub fn truncate_output(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        None => text.to_string(),
        Some((cut, _)) => format!("{}\n... (output truncated)", &text[..cut]),
    }
}

fn rounded_secs(started: Instant) -> u64 {
    let millis = started.elapsed().as_millis().saturating_add(500) / 1000;
    u64::try_from(millis).unwrap_or(u64::MAX)
}
