//! Plan command implementation
//!
//! Implements `buildall plan`: prints the resolved build order.

use std::fmt::Write as _;
use std::path::Path;

use anyhow::Result;

use crate::cli::commands::RequestArgs;
use crate::cli::output::{status, OutputMode};
use crate::core::workflow::{self, Plan, Workspace};

/// Execute the plan command
pub fn execute(project_dir: &Path, args: &RequestArgs, mode: OutputMode) -> Result<()> {
    let request = args.build_request()?;
    let workspace = Workspace::new(project_dir.join(&args.config_dir), project_dir, project_dir);
    let plan = workflow::plan(&request, &workspace)?;

    if mode.json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
    } else if !mode.quiet {
        print!("{}", format_plan(&plan));
    }
    Ok(())
}

/// Human-readable build order
pub fn format_plan(plan: &Plan) -> String {
    let mut out = String::from("Build order:\n");
    for (i, project) in plan.order.iter().enumerate() {
        let _ = write!(
            out,
            "  {:>2}. {} ({})",
            i + 1,
            project.display_name(),
            project.path.display()
        );
        if !project.dependencies.is_empty() {
            let _ = write!(out, " <- {}", project.dependencies.join(", "));
        }
        out.push('\n');
    }
    for cycle in &plan.cycles {
        let _ = writeln!(out, "{} Dependency cycle: {}", status::WARNING, cycle.join(" -> "));
    }
    if plan.cycles.is_empty() {
        let _ = writeln!(out, "{} No dependency cycles", status::SUCCESS);
    }
    out
}
