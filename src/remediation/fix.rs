//! Greedy path-breaking remediation ordering.

use petgraph::stable_graph::NodeIndex;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::attack::{AttackGraph, AttackMethod};

use super::paths::enumerate_paths;

/// A single remediation: one attack edge to break, with the number of
/// currently enumerated paths it blocks.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Remediation {
    /// Synthetic identifier, `FIX-001` onward.
    pub id: String,
    /// Human-readable fix description.
    pub description: String,
    /// How many enumerated paths this edge participated in when selected.
    pub paths_blocked: usize,
    /// Source node id of the broken edge.
    pub edge_source: String,
    /// Target node id of the broken edge.
    pub edge_target: String,
    /// Risk annotation of the broken edge.
    pub risk_type: String,
}

#[derive(Clone, Copy, Default)]
struct EdgeStats {
    count: usize,
    longest: usize,
}

/// Compute a prioritized fix order that disconnects `Internet` from every
/// sink.
///
/// Greedy set-cover approximation over the bounded path set: each round
/// enumerates all simple paths, breaks the edge participating in the most
/// of them, and repeats on the reduced graph until no path remains. Ties
/// prefer the edge lying on the longest enumerated path, then the
/// lexicographically least `(source, target)` pair.
///
/// Works on a private copy; the input graph is left untouched.
#[must_use]
pub fn calculate_fix_order(
    attack: &AttackGraph,
    sinks: &[String],
    cutoff: usize,
) -> Vec<Remediation> {
    let mut working = attack.clone();
    let mut remediations = Vec::new();

    loop {
        let paths = enumerate_paths(&working, sinks, cutoff);
        if paths.is_empty() {
            break;
        }

        let mut stats: FxHashMap<(NodeIndex, NodeIndex), EdgeStats> = FxHashMap::default();
        for path in &paths {
            let span = path.len() - 1;
            for pair in path.windows(2) {
                let entry = stats.entry((pair[0], pair[1])).or_default();
                entry.count += 1;
                entry.longest = entry.longest.max(span);
            }
        }

        let Some((source, target, stat)) = select_edge(&working, &stats) else {
            break;
        };
        let source_id = working.node_at(source).id().to_string();
        let target_id = working.node_at(target).id().to_string();
        let Some(edge) = working.remove_edge(source, target) else {
            break;
        };

        debug!(
            source = %source_id,
            target = %target_id,
            paths_blocked = stat.count,
            "breaking attack edge"
        );
        remediations.push(Remediation {
            id: format!("FIX-{:03}", remediations.len() + 1),
            description: fix_description(edge.method, &source_id, &target_id),
            paths_blocked: stat.count,
            edge_source: source_id,
            edge_target: target_id,
            risk_type: edge.risk,
        });
    }

    remediations
}

/// The greedy choice: maximum participation, then longest path span, then
/// least `(source, target)` id pair.
fn select_edge(
    graph: &AttackGraph,
    stats: &FxHashMap<(NodeIndex, NodeIndex), EdgeStats>,
) -> Option<(NodeIndex, NodeIndex, EdgeStats)> {
    let mut best: Option<(NodeIndex, NodeIndex, EdgeStats, (&str, &str))> = None;
    for (&(source, target), &stat) in stats {
        let ids = (graph.node_at(source).id(), graph.node_at(target).id());
        let better = match &best {
            None => true,
            Some((_, _, current, current_ids)) => {
                stat.count > current.count
                    || (stat.count == current.count && stat.longest > current.longest)
                    || (stat.count == current.count
                        && stat.longest == current.longest
                        && ids < *current_ids)
            }
        };
        if better {
            best = Some((source, target, stat, ids));
        }
    }
    best.map(|(source, target, stat, _)| (source, target, stat))
}

/// Map an attack method to its remediation text.
fn fix_description(method: AttackMethod, source: &str, target: &str) -> String {
    match method {
        AttackMethod::NetworkReachability => {
            format!("Restrict Security Group on {target} (Remove 0.0.0.0/0)")
        }
        AttackMethod::PublicAclPolicy => {
            format!("Make S3 Bucket {target} Private (Block Public Access)")
        }
        AttackMethod::PublicEndpoint => {
            format!("Enable VPC Access Policy for Vector Store {target}")
        }
        AttackMethod::ImdsCredentialAccess => {
            format!("Enforce IMDSv2 on {source} to prevent credential theft")
        }
        AttackMethod::IamPermissionAllow => {
            format!("Scope down IAM Policy on {source} to deny access to {target}")
        }
        AttackMethod::PromptInjectionToolAbuse => {
            format!("Implement Input Guardrails on Agent {source} or restrict Role {target}")
        }
        AttackMethod::DataFlow => {
            format!("Encrypt Logs or Restrict Write Access from {source} to {target}")
        }
        AttackMethod::IdentityLink => {
            format!("Break relationship between {source} and {target}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attack::AttackEdge;
    use crate::model::Resource;

    fn permission_edge() -> AttackEdge {
        AttackEdge::new(AttackMethod::IamPermissionAllow, "Full Admin Access")
    }

    /// Internet -> instance -> role, role -> two buckets.
    fn fan_out() -> (AttackGraph, Vec<String>) {
        let mut graph = AttackGraph::new();
        let instance = graph.ensure_resource_node(&Resource::new("aws_instance", "web"));
        let role = graph.ensure_resource_node(&Resource::new("aws_iam_role", "admin"));
        let a = graph.ensure_resource_node(&Resource::new("aws_s3_bucket", "a"));
        let b = graph.ensure_resource_node(&Resource::new("aws_s3_bucket", "b"));
        graph.upsert_edge(
            graph.internet(),
            instance,
            AttackEdge::new(
                AttackMethod::NetworkReachability,
                "Exploit Public Service (SSRF/RCE)",
            ),
        );
        graph.upsert_edge(
            instance,
            role,
            AttackEdge::new(AttackMethod::ImdsCredentialAccess, "Lateral Movement"),
        );
        graph.upsert_edge(role, a, permission_edge());
        graph.upsert_edge(role, b, permission_edge());
        let sinks = vec!["aws_s3_bucket.a".to_string(), "aws_s3_bucket.b".to_string()];
        (graph, sinks)
    }

    #[test]
    fn breaks_the_most_shared_edge_first() {
        let (graph, sinks) = fan_out();
        let fixes = calculate_fix_order(&graph, &sinks, 10);

        // Both paths share Internet -> instance and instance -> role; the
        // lexicographically least shared pair starts at Internet.
        assert_eq!(fixes.len(), 1);
        assert_eq!(fixes[0].id, "FIX-001");
        assert_eq!(fixes[0].paths_blocked, 2);
        assert_eq!(fixes[0].edge_source, "Internet");
        assert_eq!(fixes[0].edge_target, "aws_instance.web");
        assert_eq!(
            fixes[0].description,
            "Restrict Security Group on aws_instance.web (Remove 0.0.0.0/0)"
        );
    }

    #[test]
    fn input_graph_is_not_mutated() {
        let (graph, sinks) = fan_out();
        let before = graph.edge_count();
        let _ = calculate_fix_order(&graph, &sinks, 10);
        assert_eq!(graph.edge_count(), before);
    }

    #[test]
    fn parallel_entries_need_multiple_fixes() {
        let mut graph = AttackGraph::new();
        let bucket = graph.ensure_resource_node(&Resource::new("aws_s3_bucket", "open"));
        let store = graph.ensure_resource_node(&Resource::new("aws_opensearch_domain", "kb"));
        graph.upsert_edge(
            graph.internet(),
            bucket,
            AttackEdge::new(AttackMethod::PublicAclPolicy, "Data Leakage"),
        );
        graph.upsert_edge(
            graph.internet(),
            store,
            AttackEdge::new(AttackMethod::PublicEndpoint, "Knowledge Base Theft"),
        );
        graph.upsert_edge(
            store,
            bucket,
            AttackEdge::new(AttackMethod::DataFlow, "Log Poisoning / Indirect Write"),
        );

        let sinks = vec!["aws_s3_bucket.open".to_string()];
        let fixes = calculate_fix_order(&graph, &sinks, 10);

        // Two disjoint routes into the bucket require two rounds.
        assert_eq!(fixes.len(), 2);
        assert_eq!(fixes[0].paths_blocked, 1);
        let ids: Vec<&str> = fixes.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["FIX-001", "FIX-002"]);
    }

    #[test]
    fn no_paths_means_no_fixes() {
        let mut graph = AttackGraph::new();
        graph.ensure_resource_node(&Resource::new("aws_s3_bucket", "island"));
        let sinks = vec!["aws_s3_bucket.island".to_string()];
        assert!(calculate_fix_order(&graph, &sinks, 10).is_empty());
    }

    #[test]
    fn unmapped_methods_fall_back_to_the_generic_template() {
        assert_eq!(
            fix_description(AttackMethod::IdentityLink, "a", "b"),
            "Break relationship between a and b"
        );
    }
}
