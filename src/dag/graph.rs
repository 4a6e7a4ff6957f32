// src/dag/graph.rs

use std::collections::HashMap;

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use tracing::debug;

use crate::errors::{PipelineError, Result};
use crate::task::{TaskId, TaskRef};

/// Resolved dependency graph over task identities.
///
/// Edge direction: dependency -> dependent. Nodes are inserted in DFS
/// post-order from the roots, so node index order is itself a topological
/// order (prerequisites first, roots in the order they were given).
#[derive(Debug, Default)]
pub struct TaskGraph {
    graph: DiGraph<TaskRef, ()>,
    index: HashMap<TaskId, NodeIndex>,
}

impl TaskGraph {
    /// Discover every prerequisite of `roots`.
    ///
    /// - A task already complete is a leaf: its prerequisites are not visited.
    /// - Equal identities share one node.
    /// - An identity reached again while still on the recursion path is a
    ///   cycle and fails with `DagCycle` naming the path.
    pub fn resolve(roots: &[TaskRef]) -> Result<Self> {
        let mut graph = Self::default();
        let mut path = Vec::new();
        for root in roots {
            graph.visit(root.clone(), &mut path)?;
        }

        if let Err(cycle) = toposort(&graph.graph, None) {
            let id = graph.graph[cycle.node_id()].id().to_string();
            return Err(PipelineError::DagCycle(format!(
                "cycle detected in task graph involving {id}"
            )));
        }

        debug!(tasks = graph.len(), roots = roots.len(), "resolved task graph");
        Ok(graph)
    }

    fn visit(&mut self, task: TaskRef, path: &mut Vec<TaskId>) -> Result<NodeIndex> {
        let id = task.id().clone();

        if let Some(pos) = path.iter().position(|p| *p == id) {
            let mut cycle: Vec<String> = path[pos..].iter().map(ToString::to_string).collect();
            cycle.push(id.to_string());
            return Err(PipelineError::DagCycle(cycle.join(" -> ")));
        }
        if let Some(&ix) = self.index.get(&id) {
            return Ok(ix);
        }

        let deps: Vec<TaskRef> = if task.complete() {
            debug!(task = %id, "already complete; not resolving prerequisites");
            Vec::new()
        } else {
            task.requires()?.values().into_iter().cloned().collect()
        };

        path.push(id.clone());
        let mut dep_nodes = Vec::with_capacity(deps.len());
        for dep in deps {
            dep_nodes.push(self.visit(dep, path)?);
        }
        path.pop();

        let ix = self.graph.add_node(task);
        self.index.insert(id, ix);
        for dep in dep_nodes {
            self.graph.update_edge(dep, ix, ());
        }
        Ok(ix)
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn contains(&self, id: &TaskId) -> bool {
        self.index.contains_key(id)
    }

    pub fn task(&self, id: &TaskId) -> Option<&TaskRef> {
        self.index.get(id).map(|ix| &self.graph[*ix])
    }

    /// Position of `id` in the execution order.
    pub fn rank(&self, id: &TaskId) -> Option<usize> {
        self.index.get(id).map(|ix| ix.index())
    }

    /// All tasks, prerequisites before dependents.
    pub fn execution_order(&self) -> Vec<&TaskRef> {
        self.graph.node_indices().map(|ix| &self.graph[ix]).collect()
    }

    /// Direct prerequisites of `id`.
    pub fn dependencies_of(&self, id: &TaskId) -> Vec<TaskId> {
        self.neighbors(id, Direction::Incoming)
    }

    /// Tasks that list `id` as a direct prerequisite.
    pub fn dependents_of(&self, id: &TaskId) -> Vec<TaskId> {
        self.neighbors(id, Direction::Outgoing)
    }

    fn neighbors(&self, id: &TaskId, dir: Direction) -> Vec<TaskId> {
        let Some(&ix) = self.index.get(id) else {
            return Vec::new();
        };
        let mut ids: Vec<(usize, TaskId)> = self
            .graph
            .neighbors_directed(ix, dir)
            .map(|n| (n.index(), self.graph[n].id().clone()))
            .collect();
        ids.sort_by_key(|(rank, _)| *rank);
        ids.into_iter().map(|(_, id)| id).collect()
    }
}
