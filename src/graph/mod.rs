//! Resource graph storage and construction.
//!
//! The resource graph is a directed multi-relation graph over normalized
//! [`Resource`](crate::model::Resource) records. Nodes carry the resource,
//! edges carry a [`Relationship`](crate::model::Relationship) tag from the
//! closed set.
//!
//! Construction goes through [`ResourceGraphBuilder`], which assigns node
//! indices in id-sorted order so that equal inputs always produce the same
//! graph, and silently skips relationships whose endpoints are missing.
//!
//! # Examples
//!
//! ```
//! use breachgraph::graph::ResourceGraphBuilder;
//! use breachgraph::model::{Relationship, Resource};
//!
//! let graph = ResourceGraphBuilder::new()
//!     .add_resource(Resource::new("aws_instance", "web"))
//!     .add_resource(Resource::new("aws_security_group", "edge"))
//!     .relate("aws_instance.web", "aws_security_group.edge", Relationship::ProtectedBy)
//!     .build();
//!
//! assert_eq!(graph.node_count(), 2);
//! assert_eq!(graph.edge_count(), 1);
//! ```

mod builder;
mod resource_graph;

pub use builder::ResourceGraphBuilder;
pub use resource_graph::ResourceGraph;
