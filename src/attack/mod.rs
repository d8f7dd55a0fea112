//! Attack graph construction.
//!
//! The attack graph is a derived directed graph expressing what an external
//! attacker could do: nodes are either the `Internet` origin or resource
//! identifiers, and edges encode attacker-usable transitions with a
//! [`method`](AttackEdge::method) (why the traversal is possible) and a
//! [`risk`](AttackEdge::risk) (what the attacker gains).
//!
//! Construction runs four phases over the resource graph:
//!
//! 1. **Ingress**: network-reachable instances, public buckets, and exposed
//!    vector stores gain an edge from `Internet`
//! 2. **Identity assumption**: `assumes_role`, `uses_identity`, and
//!    `linked_role` relationships are copied over
//! 3. **Permission-based access**: roles gain edges to every resource their
//!    attached policies grant a capability against
//! 4. **Data flow**: `logs_to` relationships are copied over
//!
//! The overlay is read-only after construction; the fix prioritizer works
//! on its own private copy.

pub mod exposure;
mod graph;
mod overlay;

pub use graph::{
    AttackEdge, AttackEdgeExport, AttackGraph, AttackGraphExport, AttackMethod, AttackNode,
    AttackNodeExport, INTERNET_ID,
};
pub use overlay::build_attack_graph;
