//! # Breachgraph: Attack Graph and Remediation Engine
//!
//! Breachgraph performs static security analysis of declarative cloud
//! infrastructure. Given a graph of parsed resources (compute instances,
//! security groups, identity roles, policy documents, storage buckets,
//! AI/ML services, and vector stores), it answers two questions:
//!
//! 1. Is there a chain of misconfigurations an external attacker could
//!    exploit to reach sensitive data?
//! 2. Which single remediation removes the most risk?
//!
//! ## Core Concepts
//!
//! - **Resource Graph**: A directed multi-relation graph over typed
//!   resources, built with [`graph::ResourceGraphBuilder`]
//! - **Policy Evaluator**: A pure capability decision over attached policy
//!   documents, tolerant of raw and heredoc-quoted JSON
//! - **Attack Graph**: An overlay whose edges encode attacker-usable
//!   transitions (network reach, identity assumption, permission grants,
//!   data flow)
//! - **Fix Prioritizer**: Bounded attack-path enumeration plus greedy
//!   path-breaking, yielding an ordered remediation list
//!
//! ## Quick Start
//!
//! ```
//! use breachgraph::graph::ResourceGraphBuilder;
//! use breachgraph::model::Resource;
//! use serde_json::json;
//!
//! let bucket = Resource::new("aws_s3_bucket", "training-data")
//!     .with_attribute("acl", json!("public-read"));
//!
//! let graph = ResourceGraphBuilder::new().add_resource(bucket).build();
//! let report = breachgraph::analyze(graph, Vec::new());
//!
//! // A world-readable bucket is a one-hop attack path.
//! let path = report.critical_path.expect("public bucket is reachable");
//! assert_eq!(path.risk_score, 40);
//! assert_eq!(report.remediations.len(), 1);
//! ```
//!
//! ## Determinism
//!
//! Every output is deterministic for a given input: node iteration is
//! id-sorted, edge application order is stable, and tie-breaks are
//! explicit. Running the full pipeline twice yields byte-identical JSON.
//!
//! ## Module Guide
//!
//! - [`model`] - Resources, relationships, findings, and severity levels
//! - [`graph`] - Resource graph storage and the deterministic builder
//! - [`policy`] - Policy document normalization and capability decisions
//! - [`attack`] - Attack graph overlay construction and exposure checks
//! - [`remediation`] - Reachability, greedy path-breaking, priority ranking
//! - [`engine`] - The analysis entry point and serializable report

pub mod attack;
pub mod engine;
pub mod graph;
pub mod model;
pub mod policy;
pub mod remediation;

pub use engine::{AnalysisEngine, AnalysisReport, EngineConfig, analyze};

/// Re-exports for convenient access to core types.
pub mod prelude {
    pub use crate::attack::{AttackEdge, AttackGraph, AttackMethod, AttackNode};
    pub use crate::engine::{AnalysisEngine, AnalysisReport, EngineConfig, analyze};
    pub use crate::graph::{ResourceGraph, ResourceGraphBuilder};
    pub use crate::model::{Relationship, Resource, ResourceKind, RuleResult, Severity};
    pub use crate::remediation::{AttackPath, AttackStep, PriorityFix, Remediation};
}
