// src/dag/topology.rs

//! Structural analysis of a validated plan.
//!
//! Everything here is a pure function of the plan: entry/exit points, a
//! deterministic topological order, depth-based parallel groups ("waves")
//! and the critical path. Ties are always broken by ascending step id
//! (plain string ordering), so repeated analysis of the same plan yields
//! identical results.
//!
//! The analyzer assumes an acyclic plan. Steps that sit on (or behind) a
//! cycle never become ready in Kahn's algorithm and are simply missing from
//! the order, the groups and the critical path.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BinaryHeap, HashMap};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dag::graph::DagGraph;
use crate::plan::Plan;
use crate::types::StepId;

/// All steps sharing one depth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParallelGroup {
    pub depth: usize,
    pub step_ids: Vec<StepId>,
    /// Subset of `step_ids` whose `concurrent` flag is not `false`.
    /// Reporting only; the engine dispatches the whole group regardless.
    pub parallelizable_step_ids: Vec<StepId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Topology {
    pub entry_points: Vec<StepId>,
    pub exit_points: Vec<StepId>,
    pub topological_order: Vec<StepId>,
    pub parallel_groups: Vec<ParallelGroup>,
    pub critical_path: Vec<StepId>,
}

impl Topology {
    pub fn critical_path_length(&self) -> usize {
        self.critical_path.len()
    }

    /// Depth of a step, if it is part of the analyzed order.
    pub fn depth_of(&self, id: &str) -> Option<usize> {
        self.parallel_groups
            .iter()
            .find(|g| g.step_ids.iter().any(|s| s == id))
            .map(|g| g.depth)
    }

    /// Number of steps covered by the parallel groups.
    pub fn step_count(&self) -> usize {
        self.parallel_groups.iter().map(|g| g.step_ids.len()).sum()
    }
}

/// Analyze a plan. See [`analyze_graph`].
pub fn analyze(plan: &Plan) -> Topology {
    analyze_graph(&DagGraph::from_plan(plan))
}

/// Compute the topology of an already-built graph.
pub fn analyze_graph(graph: &DagGraph) -> Topology {
    let ids = graph.step_ids();

    let entry_points: Vec<StepId> = ids
        .iter()
        .filter(|id| graph.dependencies_of(id).is_empty())
        .map(|id| id.to_string())
        .collect();

    let exit_points: Vec<StepId> = ids
        .iter()
        .filter(|id| graph.dependents_of(id).is_empty())
        .map(|id| id.to_string())
        .collect();

    let order = kahn_order(graph, &ids);
    let depths = assign_depths(graph, &order);
    let parallel_groups = group_by_depth(graph, &order, &depths);
    let critical_path = critical_path(graph, &order);

    debug!(
        steps = ids.len(),
        ordered = order.len(),
        groups = parallel_groups.len(),
        critical_path_len = critical_path.len(),
        "topology analyzed"
    );

    Topology {
        entry_points,
        exit_points,
        topological_order: order.iter().map(|s| s.to_string()).collect(),
        parallel_groups,
        critical_path,
    }
}

/// Kahn's algorithm; among simultaneously ready steps the smallest id wins.
fn kahn_order<'g>(graph: &'g DagGraph, ids: &[&'g str]) -> Vec<&'g str> {
    let mut indegree: HashMap<&str, usize> = ids
        .iter()
        .map(|id| (*id, graph.dependencies_of(id).len()))
        .collect();

    let mut ready: BinaryHeap<Reverse<&str>> = ids
        .iter()
        .filter(|id| indegree.get(*id) == Some(&0))
        .map(|id| Reverse(*id))
        .collect();

    let mut order = Vec::with_capacity(ids.len());
    while let Some(Reverse(id)) = ready.pop() {
        order.push(id);
        for dependent in graph.dependents_of(id) {
            if let Some(deg) = indegree.get_mut(dependent) {
                *deg -= 1;
                if *deg == 0 {
                    ready.push(Reverse(dependent));
                }
            }
        }
    }

    order
}

/// depth(entry) = 0, depth(s) = 1 + max(depth(dep)).
///
/// Walking in topological order means every dependency is already resolved
/// when a step is reached, so each depth is computed exactly once.
fn assign_depths<'g>(graph: &'g DagGraph, order: &[&'g str]) -> HashMap<&'g str, usize> {
    let mut depths: HashMap<&str, usize> = HashMap::with_capacity(order.len());
    for &id in order {
        let depth = graph
            .dependencies_of(id)
            .iter()
            .filter_map(|dep| depths.get(dep))
            .map(|d| d + 1)
            .max()
            .unwrap_or(0);
        depths.insert(id, depth);
    }
    depths
}

fn group_by_depth(
    graph: &DagGraph,
    order: &[&str],
    depths: &HashMap<&str, usize>,
) -> Vec<ParallelGroup> {
    let mut by_depth: BTreeMap<usize, Vec<&str>> = BTreeMap::new();
    for &id in order {
        if let Some(&depth) = depths.get(id) {
            by_depth.entry(depth).or_default().push(id);
        }
    }

    by_depth
        .into_iter()
        .map(|(depth, mut members)| {
            members.sort_unstable();
            let parallelizable_step_ids = members
                .iter()
                .filter(|id| graph.is_concurrent(id))
                .map(|id| id.to_string())
                .collect();
            ParallelGroup {
                depth,
                step_ids: members.iter().map(|id| id.to_string()).collect(),
                parallelizable_step_ids,
            }
        })
        .collect()
}

/// Longest entry-to-exit chain by step count.
///
/// `chain[s]` is the number of steps on the longest chain starting at `s`.
/// The path starts at the smallest-id entry point achieving the maximum and
/// then repeatedly follows the smallest-id dependent that keeps the chain
/// maximal.
fn critical_path(graph: &DagGraph, order: &[&str]) -> Vec<StepId> {
    let mut chain: HashMap<&str, usize> = HashMap::with_capacity(order.len());
    for &id in order.iter().rev() {
        let best = graph
            .dependents_of(id)
            .iter()
            .filter_map(|d| chain.get(d))
            .max()
            .copied()
            .unwrap_or(0);
        chain.insert(id, best + 1);
    }

    let mut entries: Vec<&str> = order
        .iter()
        .copied()
        .filter(|id| graph.dependencies_of(id).is_empty())
        .collect();
    entries.sort_unstable();

    let Some(longest) = entries.iter().filter_map(|e| chain.get(e)).max().copied() else {
        return Vec::new();
    };

    let mut current = entries
        .into_iter()
        .find(|e| chain.get(e) == Some(&longest));
    let mut path = Vec::with_capacity(longest);

    while let Some(id) = current {
        path.push(id.to_string());
        let remaining = chain.get(id).copied().unwrap_or(1);
        // `dependents_of` is already sorted ascending.
        current = graph
            .dependents_of(id)
            .into_iter()
            .find(|d| chain.get(d).copied() == Some(remaining - 1) && remaining > 1);
    }

    path
}
