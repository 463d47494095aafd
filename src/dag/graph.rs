// src/dag/graph.rs

use std::collections::HashMap;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use tracing::warn;

use crate::plan::Plan;
use crate::types::StepId;

/// Node weight: the step id plus the advisory `concurrent` flag.
#[derive(Debug, Clone)]
struct DagNode {
    id: StepId,
    concurrent: bool,
}

/// Adjacency view of a plan's steps.
///
/// Edges point from dependency to dependent: for a step `B` with
/// `dependencyIds = ["A"]` the graph holds `A -> B`.
///
/// Building the graph does not validate anything. Unknown dependencies are
/// dropped and duplicated ids collapse onto their first declaration; callers
/// are expected to run the plan validator first.
#[derive(Debug, Clone)]
pub struct DagGraph {
    graph: DiGraph<DagNode, ()>,
    index: HashMap<StepId, NodeIndex>,
}

impl DagGraph {
    pub fn from_plan(plan: &Plan) -> Self {
        let mut graph: DiGraph<DagNode, ()> = DiGraph::new();
        let mut index: HashMap<StepId, NodeIndex> = HashMap::new();

        // First pass: one node per distinct step id.
        for step in &plan.steps {
            if index.contains_key(&step.id) {
                continue;
            }
            let idx = graph.add_node(DagNode {
                id: step.id.clone(),
                concurrent: step.concurrent,
            });
            index.insert(step.id.clone(), idx);
        }

        // Second pass: dependency edges. `update_edge` keeps repeated
        // dependency ids from producing parallel edges.
        for step in &plan.steps {
            let Some(&to) = index.get(&step.id) else {
                continue;
            };
            for dep in &step.dependency_ids {
                match index.get(dep) {
                    Some(&from) => {
                        graph.update_edge(from, to, ());
                    }
                    None => {
                        warn!(
                            step = %step.id,
                            dep = %dep,
                            "dependency not present in plan; ignoring edge"
                        );
                    }
                }
            }
        }

        Self { graph, index }
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// All step ids in ascending order.
    pub fn step_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.graph.node_weights().map(|n| n.id.as_str()).collect();
        ids.sort_unstable();
        ids
    }

    /// Whether the step declared itself parallel-friendly.
    pub fn is_concurrent(&self, id: &str) -> bool {
        self.index
            .get(id)
            .map(|&idx| self.graph[idx].concurrent)
            .unwrap_or(false)
    }

    /// Immediate dependencies of a step, ascending by id.
    pub fn dependencies_of(&self, id: &str) -> Vec<&str> {
        self.neighbours(id, Direction::Incoming)
    }

    /// Immediate dependents of a step, ascending by id.
    pub fn dependents_of(&self, id: &str) -> Vec<&str> {
        self.neighbours(id, Direction::Outgoing)
    }

    fn neighbours(&self, id: &str, dir: Direction) -> Vec<&str> {
        let Some(&idx) = self.index.get(id) else {
            return Vec::new();
        };
        let mut out: Vec<&str> = self
            .graph
            .neighbors_directed(idx, dir)
            .map(|n| self.graph[n].id.as_str())
            .collect();
        out.sort_unstable();
        out
    }

    pub fn has_cycle(&self) -> bool {
        petgraph::algo::is_cyclic_directed(&self.graph)
    }
}
