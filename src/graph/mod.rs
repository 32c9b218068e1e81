//! Reactor dependency graph.
//!
//! Projects are nodes; an edge `a → b` means "a depends on b". The graph answers one
//! question for the workspace-state builder: which projects are upstream of a given project,
//! directly or transitively. Each upstream project is reported exactly once, in reactor
//! order (the order projects were added), so repeated runs enumerate identically.
//!
//! The host orchestrator guarantees acyclicity. The walker still tracks DFS colors and
//! reports a cycle as [`TestPropsError::GraphIntegrity`] instead of looping.

use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;

use crate::core::TestPropsError;
use crate::models::{Project, ProjectKey};

/// Color states for cycle detection using DFS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    /// Node has not been visited.
    White,
    /// Node is on the current DFS path.
    Gray,
    /// Node and everything below it has been visited.
    Black,
}

/// The set of projects built together and the dependency edges among them.
#[derive(Debug, Default)]
pub struct ReactorGraph {
    graph: DiGraph<Project, ()>,
    node_map: HashMap<ProjectKey, NodeIndex>,
}

impl ReactorGraph {
    /// Create an empty reactor.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a project to the reactor.
    ///
    /// # Errors
    ///
    /// Returns [`TestPropsError::GraphIntegrity`] if the project lacks identity fields or a
    /// project with the same `groupId:artifactId` is already present.
    pub fn add_project(&mut self, project: Project) -> Result<(), TestPropsError> {
        project.validate_identity()?;

        let key = project.key();
        if self.node_map.contains_key(&key) {
            return Err(TestPropsError::GraphIntegrity {
                reason: format!("project '{key}' is declared more than once"),
            });
        }

        let index = self.graph.add_node(project);
        self.node_map.insert(key, index);
        Ok(())
    }

    /// Record that `from` depends on `to`. Duplicate edges are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`TestPropsError::GraphIntegrity`] if either project is unknown or the
    /// project depends on itself.
    pub fn add_dependency(
        &mut self,
        from: &ProjectKey,
        to: &ProjectKey,
    ) -> Result<(), TestPropsError> {
        let from_idx = self.index_of(from)?;
        let to_idx = self.index_of(to).map_err(|_| TestPropsError::GraphIntegrity {
            reason: format!("project '{from}' depends on '{to}', which is not part of the reactor"),
        })?;

        if from_idx == to_idx {
            return Err(TestPropsError::GraphIntegrity {
                reason: format!("project '{from}' depends on itself"),
            });
        }

        if !self.graph.contains_edge(from_idx, to_idx) {
            self.graph.add_edge(from_idx, to_idx, ());
        }
        Ok(())
    }

    /// Look up a project by key.
    #[must_use]
    pub fn project(&self, key: &ProjectKey) -> Option<&Project> {
        self.node_map.get(key).map(|&idx| &self.graph[idx])
    }

    /// All projects in reactor order.
    pub fn projects(&self) -> impl Iterator<Item = &Project> {
        self.graph.node_indices().map(|idx| &self.graph[idx])
    }

    /// Number of projects in the reactor.
    #[must_use]
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    /// Whether the reactor has no projects.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// All projects `key` depends on, directly or transitively, each exactly once.
    ///
    /// Projects come back in reactor order. The root itself is only included, as the first
    /// element, when `include_root` is set.
    ///
    /// # Errors
    ///
    /// Returns [`TestPropsError::GraphIntegrity`] if the project is unknown or a cycle is
    /// reachable from it.
    pub fn upstream_of(
        &self,
        key: &ProjectKey,
        include_root: bool,
    ) -> Result<Vec<&Project>, TestPropsError> {
        let root = self.index_of(key)?;

        let mut colors: HashMap<NodeIndex, Color> = HashMap::new();
        let mut path = Vec::new();
        if let Some(cycle) = self.dfs_visit(root, &mut colors, &mut path) {
            return Err(self.cycle_error(&cycle));
        }

        let mut upstream: Vec<NodeIndex> = colors
            .into_iter()
            .filter(|&(idx, color)| idx != root && color == Color::Black)
            .map(|(idx, _)| idx)
            .collect();
        upstream.sort();

        let mut projects = Vec::with_capacity(upstream.len() + 1);
        if include_root {
            projects.push(&self.graph[root]);
        }
        projects.extend(upstream.into_iter().map(|idx| &self.graph[idx]));
        Ok(projects)
    }

    /// Check the whole reactor for cycles.
    ///
    /// # Errors
    ///
    /// Returns [`TestPropsError::GraphIntegrity`] describing the first cycle found.
    pub fn detect_cycles(&self) -> Result<(), TestPropsError> {
        let mut colors: HashMap<NodeIndex, Color> = HashMap::new();
        let mut path = Vec::new();

        for node in self.graph.node_indices() {
            if colors.get(&node).copied().unwrap_or(Color::White) == Color::White {
                if let Some(cycle) = self.dfs_visit(node, &mut colors, &mut path) {
                    return Err(self.cycle_error(&cycle));
                }
            }
        }

        Ok(())
    }

    fn index_of(&self, key: &ProjectKey) -> Result<NodeIndex, TestPropsError> {
        self.node_map.get(key).copied().ok_or_else(|| TestPropsError::GraphIntegrity {
            reason: format!("project '{key}' is not part of the reactor"),
        })
    }

    /// DFS visit marking nodes Gray then Black.
    ///
    /// Returns `Some(cycle_path)` if a Gray node is reached again.
    fn dfs_visit(
        &self,
        node: NodeIndex,
        colors: &mut HashMap<NodeIndex, Color>,
        path: &mut Vec<NodeIndex>,
    ) -> Option<Vec<NodeIndex>> {
        colors.insert(node, Color::Gray);
        path.push(node);

        for neighbor in self.graph.neighbors(node) {
            match colors.get(&neighbor).copied().unwrap_or(Color::White) {
                Color::Gray => {
                    let start = path.iter().position(|&n| n == neighbor).unwrap_or(0);
                    let mut cycle = path[start..].to_vec();
                    cycle.push(neighbor);
                    return Some(cycle);
                }
                Color::White => {
                    if let Some(cycle) = self.dfs_visit(neighbor, colors, path) {
                        return Some(cycle);
                    }
                }
                Color::Black => {}
            }
        }

        path.pop();
        colors.insert(node, Color::Black);
        None
    }

    fn cycle_error(&self, cycle: &[NodeIndex]) -> TestPropsError {
        let chain = cycle
            .iter()
            .map(|&idx| self.graph[idx].coordinates.to_string())
            .collect::<Vec<_>>()
            .join(" → ");
        TestPropsError::GraphIntegrity {
            reason: format!("circular dependency detected: {chain}"),
        }
    }

    /// Add an edge without the self-dependency check, for exercising cycle detection.
    #[cfg(test)]
    fn force_edge(&mut self, from: &ProjectKey, to: &ProjectKey) {
        let from_idx = self.node_map[from];
        let to_idx = self.node_map[to];
        self.graph.add_edge(from_idx, to_idx, ());
    }
}
