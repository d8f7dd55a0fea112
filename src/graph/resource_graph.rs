//! Adjacency storage for the resource graph with deterministic accessors.

use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;
use rustc_hash::FxHashMap;

use crate::model::{Relationship, Resource};

/// A directed multi-relation graph over normalized resources.
///
/// Backed by a stable-index adjacency list plus a side table from resource
/// id to node index. Indices are assigned in id-sorted order by the
/// builder, so iteration through any accessor here is reproducible across
/// runs and inputs that compare equal.
///
/// The graph is loop-free with respect to a single relationship tag but may
/// contain cycles across tags; consumers that walk it must tolerate cycles.
#[derive(Clone, Debug)]
pub struct ResourceGraph {
    graph: StableDiGraph<Resource, Relationship>,
    index: FxHashMap<String, NodeIndex>,
}

impl ResourceGraph {
    pub(super) fn from_parts(
        graph: StableDiGraph<Resource, Relationship>,
        index: FxHashMap<String, NodeIndex>,
    ) -> Self {
        Self { graph, index }
    }

    /// Returns `true` if a resource with the given id is present.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Look up a resource by id.
    #[must_use]
    pub fn resource(&self, id: &str) -> Option<&Resource> {
        self.index.get(id).map(|&idx| &self.graph[idx])
    }

    /// All resources in id order.
    #[must_use]
    pub fn resources(&self) -> Vec<&Resource> {
        let mut out: Vec<&Resource> =
            self.graph.node_indices().map(|idx| &self.graph[idx]).collect();
        out.sort_by(|a, b| a.id.cmp(&b.id));
        out
    }

    /// All resource ids in sorted order.
    #[must_use]
    pub fn resource_ids(&self) -> Vec<&str> {
        let mut out: Vec<&str> = self.index.keys().map(String::as_str).collect();
        out.sort_unstable();
        out
    }

    /// Targets of outgoing edges from `id` carrying `relationship`, sorted
    /// by target id. Unknown ids yield an empty list.
    #[must_use]
    pub fn related_targets(&self, id: &str, relationship: Relationship) -> Vec<&Resource> {
        let Some(&idx) = self.index.get(id) else {
            return Vec::new();
        };
        let mut out: Vec<&Resource> = self
            .graph
            .edges(idx)
            .filter(|edge| *edge.weight() == relationship)
            .map(|edge| &self.graph[edge.target()])
            .collect();
        out.sort_by(|a, b| a.id.cmp(&b.id));
        out
    }

    /// All edges as `(source, relationship, target)` triples, sorted by
    /// source id, then relationship, then target id.
    #[must_use]
    pub fn edges(&self) -> Vec<(&Resource, Relationship, &Resource)> {
        let mut out = Vec::with_capacity(self.graph.edge_count());
        for idx in self.graph.node_indices() {
            for edge in self.graph.edges(idx) {
                out.push((
                    &self.graph[edge.source()],
                    *edge.weight(),
                    &self.graph[edge.target()],
                ));
            }
        }
        out.sort_by(|a, b| {
            a.0.id
                .cmp(&b.0.id)
                .then_with(|| a.1.cmp(&b.1))
                .then_with(|| a.2.id.cmp(&b.2.id))
        });
        out
    }

    /// Number of resources in the graph.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of relationship edges in the graph.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Returns `true` if the graph holds no resources.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }
}
