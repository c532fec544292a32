//! Dependency resolution
//!
//! Computes build order from name-based project dependencies.

use std::collections::{HashMap, HashSet};

use crate::core::config::ProjectTarget;

/// Dependency graph over a project list
///
/// Nodes are positions in the list. Edges come from `dependencies` names
/// that match some project's declared `name`; other names are treated as
/// satisfied elsewhere and ignored.
#[derive(Debug)]
pub struct DependencyGraph<'a> {
    projects: &'a [ProjectTarget],
    /// Adjacency list: project -> resolvable dependencies
    edges: Vec<Vec<usize>>,
}

impl<'a> DependencyGraph<'a> {
    /// Build the graph for `projects`
    pub fn new(projects: &'a [ProjectTarget]) -> Self {
        let mut by_name = HashMap::new();
        for (index, project) in projects.iter().enumerate() {
            if let Some(name) = &project.name {
                by_name.insert(name.as_str(), index);
            }
        }

        let edges = projects
            .iter()
            .map(|p| {
                p.dependencies
                    .iter()
                    .filter_map(|dep| by_name.get(dep.as_str()).copied())
                    .collect()
            })
            .collect();

        Self { projects, edges }
    }

    /// Compute build order as list positions.
    ///
    /// Depth-first from each project in list order; dependencies come
    /// before dependents. A project reached again while it is still on the
    /// current path is emitted right there, which breaks the cycle the
    /// same way every time. Each position appears exactly once.
    pub fn build_order(&self) -> Vec<usize> {
        let mut emitted = HashSet::new();
        let mut on_path = HashSet::new();
        let mut order = Vec::with_capacity(self.projects.len());

        for start in 0..self.projects.len() {
            self.visit(start, &mut emitted, &mut on_path, &mut order);
        }

        order
    }

    fn visit(
        &self,
        node: usize,
        emitted: &mut HashSet<usize>,
        on_path: &mut HashSet<usize>,
        order: &mut Vec<usize>,
    ) {
        if emitted.contains(&node) {
            return;
        }

        if on_path.contains(&node) {
            tracing::debug!(
                "Dependency cycle through '{}', building it early",
                self.projects[node].display_name()
            );
            emitted.insert(node);
            order.push(node);
            return;
        }

        on_path.insert(node);
        for &dep in &self.edges[node] {
            self.visit(dep, emitted, on_path, order);
        }
        on_path.remove(&node);

        // Already emitted if a cycle came back around to it.
        if emitted.insert(node) {
            order.push(node);
        }
    }

    /// Dependency cycles, as display names with the first name repeated
    /// at the end (`a -> b -> a`)
    pub fn cycles(&self) -> Vec<Vec<String>> {
        let mut done = HashSet::new();
        let mut path = Vec::new();
        let mut found: Vec<Vec<usize>> = Vec::new();

        for start in 0..self.projects.len() {
            self.collect_cycles(start, &mut done, &mut path, &mut found);
        }

        found
            .into_iter()
            .map(|cycle| {
                cycle
                    .into_iter()
                    .map(|i| self.projects[i].display_name())
                    .collect()
            })
            .collect()
    }

    fn collect_cycles(
        &self,
        node: usize,
        done: &mut HashSet<usize>,
        path: &mut Vec<usize>,
        found: &mut Vec<Vec<usize>>,
    ) {
        if let Some(pos) = path.iter().position(|&p| p == node) {
            let mut cycle = path[pos..].to_vec();
            cycle.push(node);
            if !found.contains(&cycle) {
                found.push(cycle);
            }
            return;
        }
        if done.contains(&node) {
            return;
        }

        path.push(node);
        for &dep in &self.edges[node] {
            self.collect_cycles(dep, done, path, found);
        }
        path.pop();
        done.insert(node);
    }
}

/// Order `projects` so each comes after the projects it depends on
pub fn order_by_dependencies(projects: &[ProjectTarget]) -> Vec<ProjectTarget> {
    DependencyGraph::new(projects)
        .build_order()
        .into_iter()
        .map(|i| projects[i].clone())
        .collect()
}
