//! Test utilities
//!
//! A scripted [`CommandRunner`] plus proptest generators for project lists.

use std::sync::Mutex;

use crate::error::ProcessError;
use crate::infra::process::{CommandOutput, CommandRunner, Invocation};

/// Output of a command that exited with code zero
pub fn ok(stdout: &str) -> Result<CommandOutput, ProcessError> {
    Ok(CommandOutput {
        code: Some(0),
        stdout: stdout.to_string(),
        stderr: String::new(),
    })
}

/// Output of a command that exited with `code`, printing `stderr`
pub fn exit(code: i32, stderr: &str) -> Result<CommandOutput, ProcessError> {
    Ok(CommandOutput {
        code: Some(code),
        stdout: String::new(),
        stderr: stderr.to_string(),
    })
}

struct Rule {
    pattern: String,
    response: Result<CommandOutput, ProcessError>,
}

/// Runner answering from a script instead of spawning processes
///
/// Each rule answers once: the first unused rule whose pattern is a
/// substring of the command line wins. Commands with no matching rule
/// succeed with empty output. Every invocation is recorded.
#[derive(Default)]
pub struct ScriptedRunner {
    rules: Mutex<Vec<Rule>>,
    calls: Mutex<Vec<Invocation>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer the next command containing `pattern` with `response`
    #[must_use]
    pub fn on(self, pattern: &str, response: Result<CommandOutput, ProcessError>) -> Self {
        self.rules.lock().unwrap().push(Rule {
            pattern: pattern.to_string(),
            response,
        });
        self
    }

    /// Command lines seen so far, in order
    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(Invocation::command_line)
            .collect()
    }

    /// Invocations seen so far, in order
    pub fn invocations(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap().clone()
    }

    /// Whether any command line contained `pattern`
    pub fn ran(&self, pattern: &str) -> bool {
        self.calls().iter().any(|c| c.contains(pattern))
    }
}

impl CommandRunner for ScriptedRunner {
    async fn run(&self, invocation: &Invocation) -> Result<CommandOutput, ProcessError> {
        let line = invocation.command_line();
        self.calls.lock().unwrap().push(invocation.clone());

        let mut rules = self.rules.lock().unwrap();
        match rules.iter().position(|r| line.contains(&r.pattern)) {
            Some(index) => rules.remove(index).response,
            None => ok(""),
        }
    }
}

pub mod generators {
    use proptest::prelude::*;

    use crate::core::config::ProjectTarget;

    /// Project lists of up to `max` entries with random name-based edges.
    ///
    /// Every project is named `p<i>`; dependencies may point anywhere,
    /// including itself and unknown names, so cycles are common.
    pub fn project_list(max: usize) -> impl Strategy<Value = Vec<ProjectTarget>> {
        (1..=max).prop_flat_map(|len| {
            prop::collection::vec(prop::collection::vec(0..len + 2, 0..4), len).prop_map(
                move |edges| {
                    edges
                        .into_iter()
                        .enumerate()
                        .map(|(i, deps)| ProjectTarget {
                            path: format!("src/p{i}/p{i}.csproj").into(),
                            name: Some(format!("p{i}")),
                            dependencies: deps.into_iter().map(|d| format!("p{d}")).collect(),
                        })
                        .collect()
                },
            )
        })
    }

    /// Acyclic project lists: dependencies only point to lower indices.
    pub fn acyclic_project_list(max: usize) -> impl Strategy<Value = Vec<ProjectTarget>> {
        (1..=max).prop_flat_map(|len| {
            prop::collection::vec(prop::collection::vec(any::<prop::sample::Index>(), 0..4), len)
                .prop_map(|edges| {
                    edges
                        .into_iter()
                        .enumerate()
                        .map(|(i, deps)| ProjectTarget {
                            path: format!("src/p{i}/p{i}.csproj").into(),
                            name: Some(format!("p{i}")),
                            dependencies: if i == 0 {
                                Vec::new()
                            } else {
                                deps.into_iter().map(|d| format!("p{}", d.index(i))).collect()
                            },
                        })
                        .collect::<Vec<_>>()
                })
                // Reverse so dependents usually come first in the input.
                .prop_map(|mut list| {
                    list.reverse();
                    list
                })
        })
    }
}
