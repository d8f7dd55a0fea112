//! Bounded simple-path enumeration and the critical path.

use petgraph::stable_graph::NodeIndex;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

use crate::attack::AttackGraph;
use crate::graph::ResourceGraph;
use crate::model::{Relationship, Severity};

/// One step on an attack path.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackStep {
    /// Node id (`Internet` or a resource id).
    pub id: String,
    /// Resource type string, or `External` for the origin.
    pub kind: String,
}

/// A discovered path of compromise.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackPath {
    /// Steps from the origin to the sink.
    pub steps: Vec<AttackStep>,
    /// Risk score: 20 per node on the path.
    pub risk_score: u32,
    /// Severity of the exposure.
    pub severity: Severity,
}

impl AttackPath {
    fn from_indices(graph: &AttackGraph, indices: &[NodeIndex]) -> Self {
        let steps: Vec<AttackStep> = indices
            .iter()
            .map(|&idx| {
                let node = graph.node_at(idx);
                AttackStep {
                    id: node.id().to_string(),
                    kind: node.kind_label().to_string(),
                }
            })
            .collect();
        let risk_score = 20 * steps.len() as u32;
        Self {
            steps,
            risk_score,
            severity: Severity::Critical,
        }
    }
}

impl fmt::Display for AttackPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self
            .steps
            .iter()
            .map(|step| format!("[{}] {}", step.kind, step.id))
            .collect();
        write!(f, "{}", rendered.join(" -> "))
    }
}

/// The sensitive sinks of a resource graph, in id order.
///
/// A sink is the target of a `logs_to` edge, or any storage bucket.
#[must_use]
pub fn sensitive_sinks(resources: &ResourceGraph) -> Vec<String> {
    let mut seen = FxHashSet::default();
    let mut sinks = Vec::new();
    for (_, relationship, target) in resources.edges() {
        if relationship == Relationship::LogsTo && seen.insert(target.id.clone()) {
            sinks.push(target.id.clone());
        }
    }
    for resource in resources.resources() {
        if resource.kind.is_storage_bucket() && seen.insert(resource.id.clone()) {
            sinks.push(resource.id.clone());
        }
    }
    sinks.sort_unstable();
    sinks
}

/// Enumerate every simple path from `Internet` to any sink, bounded by
/// `cutoff` edges.
///
/// Depth-first search with an on-stack visited set; successors are visited
/// in id order so the result is reproducible. A path ending on one sink is
/// still extended toward sinks further out, matching per-sink enumeration.
#[must_use]
pub fn enumerate_paths(
    graph: &AttackGraph,
    sinks: &[String],
    cutoff: usize,
) -> Vec<Vec<NodeIndex>> {
    let sink_set: FxHashSet<NodeIndex> = sinks
        .iter()
        .filter_map(|id| graph.node_index(id))
        .collect();
    if sink_set.is_empty() {
        return Vec::new();
    }

    let origin = graph.internet();
    let mut paths = Vec::new();
    let mut path = vec![origin];
    let mut on_path: FxHashSet<NodeIndex> = FxHashSet::default();
    on_path.insert(origin);
    visit(graph, &sink_set, cutoff, origin, &mut path, &mut on_path, &mut paths);
    paths
}

fn visit(
    graph: &AttackGraph,
    sinks: &FxHashSet<NodeIndex>,
    cutoff: usize,
    current: NodeIndex,
    path: &mut Vec<NodeIndex>,
    on_path: &mut FxHashSet<NodeIndex>,
    out: &mut Vec<Vec<NodeIndex>>,
) {
    if path.len() > 1 && sinks.contains(&current) {
        out.push(path.clone());
    }
    // A path of n nodes spans n - 1 edges.
    if path.len() > cutoff {
        return;
    }
    for next in graph.successors_sorted(current) {
        if on_path.contains(&next) {
            continue;
        }
        path.push(next);
        on_path.insert(next);
        visit(graph, sinks, cutoff, next, path, on_path, out);
        path.pop();
        on_path.remove(&next);
    }
}

/// The shortest attack path from `Internet` to any sink, bounded by
/// `cutoff` edges.
///
/// Among sinks at equal distance, the path whose node-id sequence is
/// lexicographically least wins. Returns `None` when no sink is reachable
/// within the cutoff.
#[must_use]
pub fn critical_path(graph: &AttackGraph, sinks: &[String], cutoff: usize) -> Option<AttackPath> {
    let mut best: Option<Vec<NodeIndex>> = None;
    for sink_id in sinks {
        let Some(sink) = graph.node_index(sink_id) else {
            continue;
        };
        let Some(candidate) = bounded_shortest_path(graph, sink, cutoff) else {
            continue;
        };
        best = Some(match best {
            None => candidate,
            Some(current) => pick_better(graph, current, candidate),
        });
    }
    best.map(|indices| AttackPath::from_indices(graph, &indices))
}

/// Breadth-first shortest path from the origin to `sink`, refusing paths
/// longer than `cutoff` edges. Neighbors expand in id order, so the
/// returned path is stable across runs.
fn bounded_shortest_path(
    graph: &AttackGraph,
    sink: NodeIndex,
    cutoff: usize,
) -> Option<Vec<NodeIndex>> {
    let origin = graph.internet();
    if origin == sink {
        return Some(vec![origin]);
    }

    let mut parent: FxHashMap<NodeIndex, NodeIndex> = FxHashMap::default();
    let mut depth: FxHashMap<NodeIndex, usize> = FxHashMap::default();
    depth.insert(origin, 0);
    let mut queue = VecDeque::from([origin]);

    while let Some(node) = queue.pop_front() {
        let d = depth[&node];
        if d == cutoff {
            continue;
        }
        for next in graph.successors_sorted(node) {
            if depth.contains_key(&next) {
                continue;
            }
            depth.insert(next, d + 1);
            parent.insert(next, node);
            if next == sink {
                let mut path = vec![sink];
                let mut cursor = sink;
                while let Some(&prev) = parent.get(&cursor) {
                    path.push(prev);
                    cursor = prev;
                }
                path.reverse();
                return Some(path);
            }
            queue.push_back(next);
        }
    }
    None
}

fn pick_better(
    graph: &AttackGraph,
    current: Vec<NodeIndex>,
    candidate: Vec<NodeIndex>,
) -> Vec<NodeIndex> {
    if candidate.len() < current.len() {
        return candidate;
    }
    if candidate.len() == current.len() && path_ids(graph, &candidate) < path_ids(graph, &current) {
        return candidate;
    }
    current
}

fn path_ids<'a>(graph: &'a AttackGraph, path: &[NodeIndex]) -> Vec<&'a str> {
    path.iter().map(|&idx| graph.node_at(idx).id()).collect()
}
