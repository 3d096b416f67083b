//! Dependency analysis for resources and batch tasks.
//!
//! Everything here is a pure function of its input: graphs are rebuilt per
//! query and nothing is cached between calls.
//!
//! # Overview
//!
//! | Operation | Result |
//! |-----------|--------|
//! | [`DependencyAnalyzer::build_graph`] | id → direct dependency ids |
//! | [`detect_cycles`] | every cycle reachable by DFS |
//! | [`topological_sort`] | levels of mutually independent ids |
//! | [`dependency_depth`] | longest dependency chain below an id |
//! | [`DependencyAnalyzer::group_parallel_tasks`] | levels of task objects |
//!
//! Levels exist so a caller can hand every node of one level to concurrent
//! workers. The analyzer itself never spawns anything.
//!
//! Edges pointing at ids that are not nodes of the graph are ignored for
//! ordering, depth and cycle purposes. [`DependencyAnalyzer::validate_dependencies`]
//! reports them.
//!
//! # Example
//!
//! ```ignore
//! use switchyard_core::{DependencyAnalyzer, Task};
//!
//! let tasks = vec![
//!     Task::new("build"),
//!     Task::new("test").with_dependencies(["build"]),
//!     Task::new("lint"),
//! ];
//!
//! let analyzer = DependencyAnalyzer::new();
//! let levels = analyzer.group_parallel_tasks(&tasks)?;
//! // levels[0] = [build, lint], levels[1] = [test]
//! ```

use crate::error::{Error, Result};
use crate::registry::ResourceRegistry;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use tracing::debug;

#[cfg(test)]
mod tests;

/// A set of node ids at the same topological depth
pub type Level = Vec<String>;

/// A unit of batch work with declared (or registry-provided) dependencies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Task id (usually a resource namespace)
    pub id: String,
    /// Declared dependencies; `None` means "ask the registry"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependencies: Option<Vec<String>>,
    /// Opaque caller data carried through grouping
    #[serde(default)]
    pub payload: Value,
}

impl Task {
    /// Create a task with undeclared dependencies
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            dependencies: None,
            payload: Value::Null,
        }
    }

    /// Declare dependencies explicitly
    #[must_use]
    pub fn with_dependencies<I, S>(mut self, dependencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies = Some(dependencies.into_iter().map(Into::into).collect());
        self
    }

    /// Attach a payload
    #[must_use]
    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = payload;
        self
    }
}

/// Adjacency list of opaque ids: node → direct dependencies
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyGraph {
    /// Nodes in insertion order
    nodes: Vec<String>,
    /// Direct dependencies per node, deduplicated, declaration order
    edges: HashMap<String, Vec<String>>,
}

impl DependencyGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from `(node, dependencies)` pairs
    pub fn from_edges<I, N, D, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (N, D)>,
        N: Into<String>,
        D: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut graph = Self::new();
        for (node, deps) in entries {
            let node = node.into();
            graph.add_node(node.clone());
            for dep in deps {
                graph.add_edge(node.clone(), dep);
            }
        }
        graph
    }

    /// Add a node (no-op if present)
    pub fn add_node(&mut self, id: impl Into<String>) {
        let id = id.into();
        if !self.edges.contains_key(&id) {
            self.nodes.push(id.clone());
            self.edges.insert(id, Vec::new());
        }
    }

    /// Record that `node` depends on `dependency`.
    ///
    /// The dependency itself is not added as a node.
    pub fn add_edge(&mut self, node: impl Into<String>, dependency: impl Into<String>) {
        let node = node.into();
        let dependency = dependency.into();
        self.add_node(node.clone());
        if let Some(deps) = self.edges.get_mut(&node) {
            if !deps.contains(&dependency) {
                deps.push(dependency);
            }
        }
    }

    /// Node ids in insertion order
    pub fn nodes(&self) -> &[String] {
        &self.nodes
    }

    /// Direct dependencies of a node (empty for unknown ids)
    pub fn dependencies(&self, id: &str) -> &[String] {
        self.edges.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether the id is a node of this graph
    pub fn contains(&self, id: &str) -> bool {
        self.edges.contains_key(id)
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph has no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of declared edges, dangling ones included
    pub fn edge_count(&self) -> usize {
        self.edges.values().map(Vec::len).sum()
    }

    /// Dependencies that are themselves nodes of the graph
    fn internal_dependencies<'a>(&'a self, id: &str) -> impl Iterator<Item = &'a String> + 'a {
        self.dependencies(id)
            .iter()
            .filter(move |dep| self.contains(dep))
    }
}

/// Summary of a task set's dependency structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyStats {
    /// Number of tasks
    pub total_tasks: usize,
    /// Number of declared edges
    pub total_edges: usize,
    /// Longest dependency chain (None when the graph is cyclic)
    pub max_depth: Option<usize>,
    /// Tasks without in-graph dependencies
    pub independent_count: usize,
    /// Whether any cycle exists
    pub has_cycles: bool,
}

/// One node of an explicit-stack depth-first walk
struct Frame<'g> {
    node: &'g str,
    deps: Vec<&'g str>,
    next: usize,
    /// Deepest chain seen below `node` so far
    depth: usize,
}

impl<'g> Frame<'g> {
    fn enter(graph: &'g DependencyGraph, node: &'g str) -> Self {
        Self {
            node,
            deps: graph.internal_dependencies(node).map(String::as_str).collect(),
            next: 0,
            depth: 0,
        }
    }

    /// Next dependency to visit, advancing the cursor
    fn advance(&mut self) -> Option<&'g str> {
        let dep = self.deps.get(self.next).copied();
        self.next += 1;
        dep
    }
}

/// Cycle members from the frame for `start` to the top of the stack
fn cycle_from(stack: &[Frame<'_>], start: &str) -> Vec<String> {
    let from = stack.iter().position(|f| f.node == start).unwrap_or(0);
    stack[from..].iter().map(|f| f.node.to_string()).collect()
}

/// Find cycles with a depth-first search over an active path.
///
/// A self-dependency is reported as a one-node cycle. Each cycle is reported
/// once, starting from the node where the search first entered it. The walk
/// keeps its own stack, so chain length is bounded by memory only.
pub fn detect_cycles(graph: &DependencyGraph) -> Vec<Vec<String>> {
    let mut finished: HashSet<&str> = HashSet::new();
    let mut on_path: HashSet<&str> = HashSet::new();
    let mut seen: HashSet<Vec<String>> = HashSet::new();
    let mut cycles = Vec::new();

    for root in graph.nodes() {
        let root = root.as_str();
        if finished.contains(root) {
            continue;
        }

        on_path.insert(root);
        let mut stack = vec![Frame::enter(graph, root)];
        while let Some(frame) = stack.last_mut() {
            match frame.advance() {
                Some(dep) if on_path.contains(dep) => {
                    let cycle = cycle_from(&stack, dep);
                    if seen.insert(rotate_to_min(&cycle)) {
                        cycles.push(cycle);
                    }
                }
                Some(dep) if !finished.contains(dep) => {
                    on_path.insert(dep);
                    stack.push(Frame::enter(graph, dep));
                }
                Some(_) => {}
                None => {
                    let node = frame.node;
                    stack.pop();
                    on_path.remove(node);
                    finished.insert(node);
                }
            }
        }
    }

    if !cycles.is_empty() {
        debug!("Detected {} dependency cycle(s)", cycles.len());
    }
    cycles
}

/// Rotation-independent key for a cycle
fn rotate_to_min(cycle: &[String]) -> Vec<String> {
    let pivot = cycle
        .iter()
        .enumerate()
        .min_by(|a, b| a.1.cmp(b.1))
        .map(|(i, _)| i)
        .unwrap_or(0);
    cycle[pivot..]
        .iter()
        .chain(cycle[..pivot].iter())
        .cloned()
        .collect()
}

/// Order nodes into levels by repeatedly peeling nodes whose dependencies
/// have all been emitted (Kahn's algorithm).
///
/// On a cyclic graph the peeling stops early and the nodes on or behind a
/// cycle are simply absent from the result. Run [`detect_cycles`] first when
/// that distinction matters.
pub fn topological_sort(graph: &DependencyGraph) -> Vec<Level> {
    let nodes = graph.nodes();
    let index: HashMap<&str, usize> = nodes
        .iter()
        .enumerate()
        .map(|(i, n)| (n.as_str(), i))
        .collect();

    let mut pending = vec![0usize; nodes.len()];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
    for (i, node) in nodes.iter().enumerate() {
        for dep in graph.internal_dependencies(node) {
            let j = index[dep.as_str()];
            pending[i] += 1;
            dependents[j].push(i);
        }
    }

    let mut current: Vec<usize> = (0..nodes.len()).filter(|&i| pending[i] == 0).collect();
    let mut levels = Vec::new();
    let mut emitted = 0;

    while !current.is_empty() {
        emitted += current.len();
        let mut next = Vec::new();
        for &i in &current {
            for &d in &dependents[i] {
                pending[d] -= 1;
                if pending[d] == 0 {
                    next.push(d);
                }
            }
        }
        levels.push(current.iter().map(|&i| nodes[i].clone()).collect());
        next.sort_unstable();
        current = next;
    }

    if emitted < nodes.len() {
        debug!(
            "Topological sort stalled with {} node(s) left (cyclic graph)",
            nodes.len() - emitted
        );
    }
    levels
}

/// Memoized depth computation shared by the depth queries
struct DepthMemo<'g> {
    graph: &'g DependencyGraph,
    depths: HashMap<&'g str, usize>,
}

impl<'g> DepthMemo<'g> {
    fn new(graph: &'g DependencyGraph) -> Self {
        Self {
            graph,
            depths: HashMap::new(),
        }
    }

    /// Post-order walk from `id`; a node's depth is stored once all of its
    /// dependencies have one
    fn depth(&mut self, id: &'g str) -> Result<usize> {
        if let Some(depth) = self.depths.get(id) {
            return Ok(*depth);
        }

        let mut on_path: HashSet<&'g str> = HashSet::from([id]);
        let mut stack = vec![Frame::enter(self.graph, id)];
        while let Some(frame) = stack.last_mut() {
            match frame.advance() {
                Some(dep) => {
                    if let Some(known) = self.depths.get(dep) {
                        frame.depth = frame.depth.max(known + 1);
                    } else if on_path.contains(dep) {
                        return Err(Error::cycle(cycle_from(&stack, dep)));
                    } else {
                        on_path.insert(dep);
                        stack.push(Frame::enter(self.graph, dep));
                    }
                }
                None => {
                    let (node, depth) = (frame.node, frame.depth);
                    stack.pop();
                    on_path.remove(node);
                    self.depths.insert(node, depth);
                    if let Some(parent) = stack.last_mut() {
                        parent.depth = parent.depth.max(depth + 1);
                    }
                }
            }
        }

        self.depths
            .get(id)
            .copied()
            .ok_or_else(|| Error::UnknownTask(id.to_string()))
    }
}

/// Length of the longest dependency chain below `id`.
///
/// 0 for a node without dependencies, otherwise one more than the deepest
/// direct dependency.
pub fn dependency_depth(graph: &DependencyGraph, id: &str) -> Result<usize> {
    let Some(node) = graph.nodes().iter().find(|n| n.as_str() == id) else {
        return Err(Error::UnknownTask(id.to_string()));
    };
    DepthMemo::new(graph).depth(node)
}

/// Dependency analysis over task sets, optionally filling undeclared
/// dependencies from a [`ResourceRegistry`]
#[derive(Debug, Clone, Copy, Default)]
pub struct DependencyAnalyzer<'r> {
    registry: Option<&'r ResourceRegistry>,
}

impl<'r> DependencyAnalyzer<'r> {
    /// Analyzer that only uses declared task dependencies
    pub fn new() -> Self {
        Self { registry: None }
    }

    /// Analyzer that consults the registry for tasks without declared dependencies
    pub fn with_registry(registry: &'r ResourceRegistry) -> Self {
        Self {
            registry: Some(registry),
        }
    }

    fn task_dependencies(&self, task: &Task) -> Vec<String> {
        match (&task.dependencies, self.registry) {
            (Some(deps), _) => deps.clone(),
            (None, Some(registry)) => registry
                .lookup(&task.id)
                .map(|record| record.dependencies.clone())
                .unwrap_or_default(),
            (None, None) => Vec::new(),
        }
    }

    /// Build the graph for a task set; every task id is a key
    pub fn build_graph(&self, tasks: &[Task]) -> DependencyGraph {
        let mut graph = DependencyGraph::new();
        for task in tasks {
            graph.add_node(task.id.clone());
            for dep in self.task_dependencies(task) {
                graph.add_edge(task.id.clone(), dep);
            }
        }
        graph
    }

    /// Group tasks into levels that can run in parallel.
    ///
    /// Fails on a cycle instead of returning partial levels.
    pub fn group_parallel_tasks(&self, tasks: &[Task]) -> Result<Vec<Vec<Task>>> {
        let mut by_id: HashMap<&str, &Task> = HashMap::with_capacity(tasks.len());
        for task in tasks {
            if by_id.insert(task.id.as_str(), task).is_some() {
                return Err(Error::Validation(format!("duplicate task id '{}'", task.id)));
            }
        }

        let levels = self.levels(tasks)?;
        let grouped: Vec<Vec<Task>> = levels
            .iter()
            .map(|level| {
                level
                    .iter()
                    .filter_map(|id| by_id.get(id.as_str()).map(|task| (*task).clone()))
                    .collect()
            })
            .collect();

        debug!(
            "Grouped {} task(s) into {} parallel level(s)",
            tasks.len(),
            grouped.len()
        );
        Ok(grouped)
    }

    /// Acyclic levels for a task set
    fn levels(&self, tasks: &[Task]) -> Result<Vec<Level>> {
        let graph = self.build_graph(tasks);
        if let Some(cycle) = detect_cycles(&graph).into_iter().next() {
            return Err(Error::cycle(cycle));
        }
        Ok(topological_sort(&graph))
    }

    /// Report every dependency that is not among the supplied task ids
    pub fn validate_dependencies(&self, tasks: &[Task]) -> Vec<String> {
        let ids: HashSet<&str> = tasks.iter().map(|t| t.id.as_str()).collect();
        let mut errors = Vec::new();
        for task in tasks {
            for dep in self.task_dependencies(task) {
                if !ids.contains(dep.as_str()) {
                    errors.push(format!("{} depends on missing '{}'", task.id, dep));
                }
            }
        }
        errors
    }

    /// Flattened levels, dependency-first
    pub fn execution_order(&self, tasks: &[Task]) -> Result<Vec<String>> {
        Ok(self.levels(tasks)?.into_iter().flatten().collect())
    }

    /// Tasks without in-graph dependencies, in input order
    pub fn independent_tasks(&self, tasks: &[Task]) -> Vec<String> {
        let graph = self.build_graph(tasks);
        graph
            .nodes()
            .iter()
            .filter(|id| graph.internal_dependencies(id).next().is_none())
            .cloned()
            .collect()
    }

    /// Summary statistics for a task set
    pub fn analyze(&self, tasks: &[Task]) -> DependencyStats {
        let graph = self.build_graph(tasks);
        let has_cycles = !detect_cycles(&graph).is_empty();

        let max_depth = if has_cycles {
            None
        } else {
            let mut memo = DepthMemo::new(&graph);
            graph
                .nodes()
                .iter()
                .map(|id| memo.depth(id))
                .collect::<Result<Vec<_>>>()
                .ok()
                .map(|depths| depths.into_iter().max().unwrap_or(0))
        };

        let independent_count = graph
            .nodes()
            .iter()
            .filter(|id| graph.internal_dependencies(id).next().is_none())
            .count();

        DependencyStats {
            total_tasks: graph.len(),
            total_edges: graph.edge_count(),
            max_depth,
            independent_count,
            has_cycles,
        }
    }
}
