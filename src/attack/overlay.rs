//! The four-phase attack overlay over a resource graph.

use tracing::debug;

use crate::graph::ResourceGraph;
use crate::model::{Relationship, Resource, ResourceKind};
use crate::policy::{self, PolicyPayload};

use super::exposure;
use super::graph::{AttackEdge, AttackGraph, AttackMethod};

const RISK_EXPLOIT_PUBLIC_SERVICE: &str = "Exploit Public Service (SSRF/RCE)";
const RISK_DATA_LEAKAGE: &str = "Data Leakage";
const RISK_KNOWLEDGE_BASE_THEFT: &str = "Knowledge Base Theft";
const RISK_LATERAL_MOVEMENT: &str = "Lateral Movement";
const RISK_INDIRECT_PRIVILEGE_ESCALATION: &str = "Indirect Privilege Escalation";
const RISK_LOG_POISONING: &str = "Log Poisoning / Indirect Write";

/// Build the attack overlay for a resource graph.
///
/// Phases run in a fixed order over id-sorted resources and edges, so
/// equal inputs produce identical attack graphs.
#[must_use]
pub fn build_attack_graph(resources: &ResourceGraph) -> AttackGraph {
    let mut attack = AttackGraph::new();
    ingress_phase(resources, &mut attack);
    identity_phase(resources, &mut attack);
    permission_phase(resources, &mut attack);
    data_flow_phase(resources, &mut attack);
    debug!(
        nodes = attack.node_count(),
        edges = attack.edge_count(),
        "attack overlay complete"
    );
    attack
}

/// Phase 1: edges from `Internet` to directly reachable resources.
fn ingress_phase(resources: &ResourceGraph, attack: &mut AttackGraph) {
    for resource in resources.resources() {
        if resource.kind == ResourceKind::Instance
            && exposure::instance_publicly_exposed(resources, resource)
        {
            add_ingress(
                attack,
                resource,
                AttackMethod::NetworkReachability,
                RISK_EXPLOIT_PUBLIC_SERVICE,
            );
        }

        if resource.kind.is_storage_bucket() && exposure::bucket_publicly_accessible(resource) {
            add_ingress(
                attack,
                resource,
                AttackMethod::PublicAclPolicy,
                RISK_DATA_LEAKAGE,
            );
        }

        if resource.kind.is_vector_store()
            && exposure::vector_store_externally_exposed(resource)
        {
            add_ingress(
                attack,
                resource,
                AttackMethod::PublicEndpoint,
                RISK_KNOWLEDGE_BASE_THEFT,
            );
        }
    }
}

fn add_ingress(attack: &mut AttackGraph, resource: &Resource, method: AttackMethod, risk: &str) {
    let origin = attack.internet();
    let target = attack.ensure_resource_node(resource);
    debug!(target = %resource.id, %method, "ingress edge");
    attack.upsert_edge(origin, target, AttackEdge::new(method, risk));
}

/// Phase 2: identity-assumption relationships become attacker moves.
fn identity_phase(resources: &ResourceGraph, attack: &mut AttackGraph) {
    for (source, relationship, target) in resources.edges() {
        let (method, risk) = match relationship {
            Relationship::AssumesRole => {
                (AttackMethod::ImdsCredentialAccess, RISK_LATERAL_MOVEMENT)
            }
            Relationship::UsesIdentity => (
                AttackMethod::PromptInjectionToolAbuse,
                RISK_INDIRECT_PRIVILEGE_ESCALATION,
            ),
            Relationship::LinkedRole => (AttackMethod::IdentityLink, RISK_LATERAL_MOVEMENT),
            _ => continue,
        };
        let src = attack.ensure_resource_node(source);
        let dst = attack.ensure_resource_node(target);
        debug!(source = %source.id, target = %target.id, %method, "identity edge");
        attack.upsert_edge(src, dst, AttackEdge::new(method, risk));
    }
}

/// Phase 3: roles reach everything their attached policies grant a
/// capability against.
fn permission_phase(resources: &ResourceGraph, attack: &mut AttackGraph) {
    for role in resources.resources() {
        if role.kind != ResourceKind::IamRole {
            continue;
        }
        let payloads = attached_policies(resources, role);
        if payloads.is_empty() {
            continue;
        }
        for target in resources.resources() {
            if target.id == role.id {
                continue;
            }
            let Some(capability) = policy::evaluate(&payloads, target) else {
                continue;
            };
            let src = attack.ensure_resource_node(role);
            let dst = attack.ensure_resource_node(target);
            debug!(role = %role.id, target = %target.id, %capability, "permission edge");
            attack.upsert_edge(
                src,
                dst,
                AttackEdge::new(AttackMethod::IamPermissionAllow, capability.to_string()),
            );
        }
    }
}

/// The policy payloads reachable from a role through `has_policy` edges.
fn attached_policies(resources: &ResourceGraph, role: &Resource) -> Vec<PolicyPayload> {
    resources
        .related_targets(&role.id, Relationship::HasPolicy)
        .into_iter()
        .filter_map(|policy| policy.attribute("policy").and_then(PolicyPayload::from_value))
        .collect()
}

/// Phase 4: log shipping becomes an indirect write channel.
fn data_flow_phase(resources: &ResourceGraph, attack: &mut AttackGraph) {
    for (source, relationship, target) in resources.edges() {
        if relationship != Relationship::LogsTo {
            continue;
        }
        let src = attack.ensure_resource_node(source);
        let dst = attack.ensure_resource_node(target);
        debug!(source = %source.id, target = %target.id, "data flow edge");
        attack.upsert_edge(
            src,
            dst,
            AttackEdge::new(AttackMethod::DataFlow, RISK_LOG_POISONING),
        );
    }
}
