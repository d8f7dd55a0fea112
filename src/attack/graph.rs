//! Attack graph storage, inspection, and DOT export.

use std::fmt;

use petgraph::Direction;
use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::model::{Resource, ResourceKind};

/// Identifier of the external attacker origin.
pub const INTERNET_ID: &str = "Internet";

/// A node in the attack graph: the external origin or a resource.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttackNode {
    /// The external attacker origin. Always present, never has
    /// predecessors.
    Internet,
    /// A resource reachable by the attacker.
    Resource {
        /// The resource id.
        id: String,
        /// The resource kind, kept for visualization.
        kind: ResourceKind,
    },
}

impl AttackNode {
    /// The node identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Internet => INTERNET_ID,
            Self::Resource { id, .. } => id,
        }
    }

    /// A display label for the node kind (`External` for the origin).
    #[must_use]
    pub fn kind_label(&self) -> &str {
        match self {
            Self::Internet => "External",
            Self::Resource { kind, .. } => kind.as_type_str(),
        }
    }

    /// Returns `true` if this is the [`Internet`](Self::Internet) origin.
    #[must_use]
    pub fn is_internet(&self) -> bool {
        matches!(self, Self::Internet)
    }
}

/// Why an attacker can traverse an edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackMethod {
    /// An open security group makes the target reachable from anywhere.
    NetworkReachability,
    /// A world-readable bucket ACL or policy.
    PublicAclPolicy,
    /// A vector store endpoint reachable without a VPC access policy.
    PublicEndpoint,
    /// Instance metadata credentials yield the attached identity.
    ImdsCredentialAccess,
    /// An instance profile hop to its backing role.
    IdentityLink,
    /// A compromised agent abuses the identity it acts under.
    PromptInjectionToolAbuse,
    /// An attached policy grants a capability against the target.
    IamPermissionAllow,
    /// Data written by the source lands at the target.
    DataFlow,
}

impl fmt::Display for AttackMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::NetworkReachability => "Network Reachability",
            Self::PublicAclPolicy => "Public ACL/Policy",
            Self::PublicEndpoint => "Public Endpoint",
            Self::ImdsCredentialAccess => "IMDS/Credential Access",
            Self::IdentityLink => "Identity Link",
            Self::PromptInjectionToolAbuse => "Prompt Injection / Tool Abuse",
            Self::IamPermissionAllow => "IAM Permission allow",
            Self::DataFlow => "Data Flow",
        };
        write!(f, "{label}")
    }
}

/// An attacker-usable transition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackEdge {
    /// Why the attacker can traverse this edge.
    pub method: AttackMethod,
    /// What the attacker gains by traversing it.
    pub risk: String,
}

impl AttackEdge {
    /// Create an edge.
    #[must_use]
    pub fn new(method: AttackMethod, risk: impl Into<String>) -> Self {
        Self {
            method,
            risk: risk.into(),
        }
    }
}

/// The derived attack graph.
///
/// Backed by a stable-index adjacency list so the fix simulation can remove
/// edges in O(1) on its own clone while the original stays inspectable for
/// visualization. At most one edge exists per `(source, target)` pair; a
/// later phase writing the same pair replaces method and risk.
#[derive(Clone, Debug)]
pub struct AttackGraph {
    graph: StableDiGraph<AttackNode, AttackEdge>,
    index: FxHashMap<String, NodeIndex>,
    internet: NodeIndex,
}

impl AttackGraph {
    /// Create an attack graph holding only the `Internet` origin.
    #[must_use]
    pub fn new() -> Self {
        let mut graph = StableDiGraph::default();
        let internet = graph.add_node(AttackNode::Internet);
        let mut index = FxHashMap::default();
        index.insert(INTERNET_ID.to_string(), internet);
        Self {
            graph,
            index,
            internet,
        }
    }

    /// Index of the `Internet` origin.
    #[must_use]
    pub fn internet(&self) -> NodeIndex {
        self.internet
    }

    /// Look up a node index by id.
    #[must_use]
    pub fn node_index(&self, id: &str) -> Option<NodeIndex> {
        self.index.get(id).copied()
    }

    /// The node stored at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` does not belong to this graph; indices are only
    /// produced by this graph's own methods.
    #[must_use]
    pub fn node_at(&self, index: NodeIndex) -> &AttackNode {
        &self.graph[index]
    }

    /// Insert a node for `resource` if absent, returning its index.
    pub fn ensure_resource_node(&mut self, resource: &Resource) -> NodeIndex {
        if let Some(&idx) = self.index.get(&resource.id) {
            return idx;
        }
        let idx = self.graph.add_node(AttackNode::Resource {
            id: resource.id.clone(),
            kind: resource.kind.clone(),
        });
        self.index.insert(resource.id.clone(), idx);
        idx
    }

    /// Add an edge, replacing method and risk if the pair already exists.
    pub fn upsert_edge(&mut self, source: NodeIndex, target: NodeIndex, edge: AttackEdge) {
        match self.graph.find_edge(source, target) {
            Some(existing) => {
                if let Some(weight) = self.graph.edge_weight_mut(existing) {
                    *weight = edge;
                }
            }
            None => {
                self.graph.add_edge(source, target, edge);
            }
        }
    }

    /// The edge between two node indices, if any.
    #[must_use]
    pub fn edge(&self, source: NodeIndex, target: NodeIndex) -> Option<&AttackEdge> {
        let idx = self.graph.find_edge(source, target)?;
        self.graph.edge_weight(idx)
    }

    /// The edge between two node ids, if both exist and are connected.
    #[must_use]
    pub fn edge_between(&self, source: &str, target: &str) -> Option<&AttackEdge> {
        let src = self.node_index(source)?;
        let dst = self.node_index(target)?;
        self.edge(src, dst)
    }

    /// Remove the edge between two node indices, returning it.
    pub fn remove_edge(&mut self, source: NodeIndex, target: NodeIndex) -> Option<AttackEdge> {
        let idx = self.graph.find_edge(source, target)?;
        self.graph.remove_edge(idx)
    }

    /// Remove the edge between two node ids, returning it.
    pub fn remove_edge_by_ids(&mut self, source: &str, target: &str) -> Option<AttackEdge> {
        let src = self.node_index(source)?;
        let dst = self.node_index(target)?;
        self.remove_edge(src, dst)
    }

    /// Successors of a node, sorted by node id for reproducible traversal.
    #[must_use]
    pub fn successors_sorted(&self, node: NodeIndex) -> Vec<NodeIndex> {
        let mut out: Vec<NodeIndex> = self.graph.neighbors(node).collect();
        out.sort_by(|a, b| self.graph[*a].id().cmp(self.graph[*b].id()));
        out
    }

    /// Out-degree of the node with the given id; 0 for unknown ids.
    #[must_use]
    pub fn out_degree(&self, id: &str) -> usize {
        self.node_index(id)
            .map_or(0, |idx| self.graph.neighbors(idx).count())
    }

    /// All nodes sorted by id.
    #[must_use]
    pub fn nodes(&self) -> Vec<&AttackNode> {
        let mut out: Vec<&AttackNode> =
            self.graph.node_indices().map(|idx| &self.graph[idx]).collect();
        out.sort_by(|a, b| a.id().cmp(b.id()));
        out
    }

    /// All edges as `(source, target, edge)` triples sorted by source id,
    /// then target id.
    #[must_use]
    pub fn edges(&self) -> Vec<(&AttackNode, &AttackNode, &AttackEdge)> {
        let mut out = Vec::with_capacity(self.graph.edge_count());
        for idx in self.graph.node_indices() {
            for edge in self.graph.edges(idx) {
                out.push((
                    &self.graph[edge.source()],
                    &self.graph[edge.target()],
                    edge.weight(),
                ));
            }
        }
        out.sort_by(|a, b| a.0.id().cmp(b.0.id()).then_with(|| a.1.id().cmp(b.1.id())));
        out
    }

    /// Number of nodes, including the origin.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of attack edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Whether the `Internet` origin is intact: present and without
    /// predecessors.
    #[must_use]
    pub fn origin_is_valid(&self) -> bool {
        self.graph
            .node_weight(self.internet)
            .is_some_and(AttackNode::is_internet)
            && self
                .graph
                .edges_directed(self.internet, Direction::Incoming)
                .next()
                .is_none()
    }

    /// A serializable snapshot of nodes and edges in deterministic order.
    #[must_use]
    pub fn export(&self) -> AttackGraphExport {
        AttackGraphExport {
            nodes: self
                .nodes()
                .into_iter()
                .map(|node| AttackNodeExport {
                    id: node.id().to_string(),
                    kind: node.kind_label().to_string(),
                })
                .collect(),
            edges: self
                .edges()
                .into_iter()
                .map(|(source, target, edge)| AttackEdgeExport {
                    source: source.id().to_string(),
                    target: target.id().to_string(),
                    method: edge.method,
                    risk: edge.risk.clone(),
                })
                .collect(),
        }
    }

    /// Render the graph in Graphviz DOT format.
    ///
    /// Node indices become DOT node ids; edges are labeled with their
    /// method so `dot -Tpng` output reads as an attack narrative.
    #[must_use]
    pub fn to_dot(&self) -> String {
        use std::fmt::Write;

        let mut output = String::new();
        writeln!(output, "digraph {{").unwrap();
        writeln!(output, "    rankdir=LR;").unwrap();
        writeln!(output, "    node [shape=box, style=rounded];").unwrap();

        let mut nodes: Vec<NodeIndex> = self.graph.node_indices().collect();
        nodes.sort_by(|a, b| self.graph[*a].id().cmp(self.graph[*b].id()));
        for idx in &nodes {
            let node = &self.graph[*idx];
            let style = if node.is_internet() {
                " style=\"filled\" fillcolor=\"lightcoral\""
            } else {
                ""
            };
            writeln!(
                output,
                "    {} [ label=\"{}\"{} ];",
                idx.index(),
                node.id(),
                style
            )
            .unwrap();
        }

        writeln!(output).unwrap();

        for (source, target, edge) in self.edges() {
            let src = self.index[source.id()];
            let dst = self.index[target.id()];
            writeln!(
                output,
                "    {} -> {} [ label=\"{}\" ];",
                src.index(),
                dst.index(),
                edge.method
            )
            .unwrap();
        }

        writeln!(output, "}}").unwrap();
        output
    }
}

impl Default for AttackGraph {
    fn default() -> Self {
        Self::new()
    }
}

/// Serializable attack-graph snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackGraphExport {
    /// Nodes in id order.
    pub nodes: Vec<AttackNodeExport>,
    /// Edges in `(source, target)` order.
    pub edges: Vec<AttackEdgeExport>,
}

/// One exported node.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackNodeExport {
    /// Node id (`Internet` or a resource id).
    pub id: String,
    /// Resource type string, or `External` for the origin.
    pub kind: String,
}

/// One exported edge.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackEdgeExport {
    /// Source node id.
    pub source: String,
    /// Target node id.
    pub target: String,
    /// Traversal method.
    pub method: AttackMethod,
    /// Risk annotation.
    pub risk: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Resource;

    #[test]
    fn fresh_graph_holds_only_a_valid_origin() {
        let graph = AttackGraph::new();
        assert_eq!(graph.node_count(), 1);
        assert_eq!(graph.edge_count(), 0);
        assert!(graph.origin_is_valid());
        assert_eq!(graph.node_index(INTERNET_ID), Some(graph.internet()));
    }

    #[test]
    fn upsert_replaces_an_existing_pair() {
        let mut graph = AttackGraph::new();
        let bucket = Resource::new("aws_s3_bucket", "b");
        let idx = graph.ensure_resource_node(&bucket);
        graph.upsert_edge(
            graph.internet(),
            idx,
            AttackEdge::new(AttackMethod::PublicAclPolicy, "Data Leakage"),
        );
        graph.upsert_edge(
            graph.internet(),
            idx,
            AttackEdge::new(AttackMethod::NetworkReachability, "replacement"),
        );
        assert_eq!(graph.edge_count(), 1);
        let edge = graph.edge(graph.internet(), idx).unwrap();
        assert_eq!(edge.method, AttackMethod::NetworkReachability);
        assert_eq!(edge.risk, "replacement");
    }

    #[test]
    fn ensure_node_is_idempotent() {
        let mut graph = AttackGraph::new();
        let bucket = Resource::new("aws_s3_bucket", "b");
        let first = graph.ensure_resource_node(&bucket);
        let second = graph.ensure_resource_node(&bucket);
        assert_eq!(first, second);
        assert_eq!(graph.node_count(), 2);
    }

    #[test]
    fn removal_disconnects_the_pair() {
        let mut graph = AttackGraph::new();
        let bucket = Resource::new("aws_s3_bucket", "b");
        let idx = graph.ensure_resource_node(&bucket);
        graph.upsert_edge(
            graph.internet(),
            idx,
            AttackEdge::new(AttackMethod::PublicAclPolicy, "Data Leakage"),
        );
        let removed = graph.remove_edge_by_ids(INTERNET_ID, "aws_s3_bucket.b");
        assert!(removed.is_some());
        assert_eq!(graph.edge_count(), 0);
        assert!(graph.remove_edge_by_ids(INTERNET_ID, "aws_s3_bucket.b").is_none());
    }

    #[test]
    fn dot_output_labels_methods() {
        let mut graph = AttackGraph::new();
        let bucket = Resource::new("aws_s3_bucket", "b");
        let idx = graph.ensure_resource_node(&bucket);
        graph.upsert_edge(
            graph.internet(),
            idx,
            AttackEdge::new(AttackMethod::PublicAclPolicy, "Data Leakage"),
        );
        let dot = graph.to_dot();
        assert!(dot.contains("digraph {"));
        assert!(dot.contains("Internet"));
        assert!(dot.contains("Public ACL/Policy"));
    }
}
