//! End-to-end scenarios over the full pipeline: resource graph in,
//! attack graph, critical path, and remediation order out.

use breachgraph::attack::{AttackMethod, INTERNET_ID};
use breachgraph::graph::{ResourceGraph, ResourceGraphBuilder};
use breachgraph::model::{Relationship, Resource, Severity};
use breachgraph::{AnalysisEngine, analyze};
use serde_json::json;

fn open_security_group(name: &str) -> Resource {
    Resource::new("aws_security_group", name)
        .with_attribute("ingress", json!([{"cidr_blocks": ["0.0.0.0/0"]}]))
}

fn s3_star_policy(name: &str) -> Resource {
    Resource::new("aws_iam_policy", name).with_attribute(
        "policy",
        json!(r#"{"Statement": [{"Effect": "Allow", "Action": "s3:*", "Resource": "*"}]}"#),
    )
}

fn admin_policy(name: &str) -> Resource {
    Resource::new("aws_iam_policy", name).with_attribute(
        "policy",
        json!(r#"{"Statement": [{"Effect": "Allow", "Action": "*", "Resource": "*"}]}"#),
    )
}

fn path_ids(path: &breachgraph::remediation::AttackPath) -> Vec<&str> {
    path.steps.iter().map(|step| step.id.as_str()).collect()
}

/// A web instance behind an open security group, assuming a role through
/// an instance profile, with an s3:* policy and a private bucket.
fn instance_role_bucket() -> ResourceGraph {
    ResourceGraphBuilder::new()
        .add_resource(Resource::new("aws_instance", "web"))
        .add_resource(open_security_group("open"))
        .add_resource(Resource::new("aws_iam_instance_profile", "web_profile"))
        .add_resource(Resource::new("aws_iam_role", "app"))
        .add_resource(s3_star_policy("s3_all"))
        .add_resource(Resource::new("aws_s3_bucket", "artifacts").with_attribute("acl", json!("private")))
        .relate("aws_instance.web", "aws_security_group.open", Relationship::ProtectedBy)
        .relate(
            "aws_instance.web",
            "aws_iam_instance_profile.web_profile",
            Relationship::AssumesRole,
        )
        .relate(
            "aws_iam_instance_profile.web_profile",
            "aws_iam_role.app",
            Relationship::LinkedRole,
        )
        .relate("aws_iam_role.app", "aws_iam_policy.s3_all", Relationship::HasPolicy)
        .build()
}

#[test]
fn public_bucket_alone() {
    let graph = ResourceGraphBuilder::new()
        .add_resource(Resource::new("aws_s3_bucket", "exposed").with_attribute("acl", json!("public-read")))
        .build();
    let report = analyze(graph, Vec::new());

    let path = report.critical_path.expect("public bucket must be reachable");
    assert_eq!(path_ids(&path), vec![INTERNET_ID, "aws_s3_bucket.exposed"]);
    assert_eq!(path.risk_score, 40);
    assert_eq!(path.severity, Severity::Critical);

    assert_eq!(report.remediations.len(), 1);
    let fix = &report.remediations[0];
    assert_eq!(fix.id, "FIX-001");
    assert_eq!(
        fix.description,
        "Make S3 Bucket aws_s3_bucket.exposed Private (Block Public Access)"
    );
    assert_eq!(fix.paths_blocked, 1);
    assert_eq!(fix.risk_type, "Data Leakage");
}

#[test]
fn instance_to_role_to_bucket() {
    let engine = AnalysisEngine::new(instance_role_bucket(), Vec::new());

    let path = engine.critical_path().expect("chain must be reachable");
    assert_eq!(
        path_ids(&path),
        vec![
            INTERNET_ID,
            "aws_instance.web",
            "aws_iam_instance_profile.web_profile",
            "aws_iam_role.app",
            "aws_s3_bucket.artifacts",
        ]
    );
    assert_eq!(path.risk_score, 100);

    // The single chain shares every edge, so the greedy pass breaks the
    // lexicographically least pair, the ingress edge, and is done.
    let fixes = engine.remediations();
    assert_eq!(fixes.len(), 1);
    assert_eq!(fixes[0].edge_source, INTERNET_ID);
    assert_eq!(fixes[0].edge_target, "aws_instance.web");
    assert_eq!(fixes[0].paths_blocked, 1);

    // The permission edge carries the capability as its risk.
    let edge = engine
        .attack_graph()
        .edge_between("aws_iam_role.app", "aws_s3_bucket.artifacts")
        .expect("role must reach the bucket");
    assert_eq!(edge.method, AttackMethod::IamPermissionAllow);
    assert_eq!(edge.risk, "Full S3 Access");
}

#[test]
fn private_subnet_hides_exposure() {
    let graph = ResourceGraphBuilder::new()
        .add_resource(Resource::new("aws_instance", "web"))
        .add_resource(open_security_group("open"))
        .add_resource(
            Resource::new("aws_subnet", "internal")
                .with_attribute("map_public_ip_on_launch", json!("false")),
        )
        .add_resource(Resource::new("aws_iam_instance_profile", "web_profile"))
        .add_resource(Resource::new("aws_iam_role", "app"))
        .add_resource(s3_star_policy("s3_all"))
        .add_resource(Resource::new("aws_s3_bucket", "artifacts"))
        .relate("aws_instance.web", "aws_security_group.open", Relationship::ProtectedBy)
        .relate("aws_instance.web", "aws_subnet.internal", Relationship::LocatedIn)
        .relate(
            "aws_instance.web",
            "aws_iam_instance_profile.web_profile",
            Relationship::AssumesRole,
        )
        .relate(
            "aws_iam_instance_profile.web_profile",
            "aws_iam_role.app",
            Relationship::LinkedRole,
        )
        .relate("aws_iam_role.app", "aws_iam_policy.s3_all", Relationship::HasPolicy)
        .build();
    let report = analyze(graph, Vec::new());

    assert!(
        report
            .attack_graph
            .edges
            .iter()
            .all(|edge| !(edge.source == INTERNET_ID && edge.target == "aws_instance.web")),
        "a hidden instance must not receive an ingress edge"
    );
    assert!(report.critical_path.is_none());
    assert!(report.remediations.is_empty());
}

#[test]
fn agent_with_identity_but_no_ingress() {
    let graph = ResourceGraphBuilder::new()
        .add_resource(Resource::new("aws_bedrock_agent", "helper"))
        .add_resource(Resource::new("aws_iam_role", "agent_role"))
        .add_resource(admin_policy("admin"))
        .add_resource(Resource::new("aws_s3_bucket", "agent_logs"))
        .relate(
            "aws_bedrock_agent.helper",
            "aws_iam_role.agent_role",
            Relationship::UsesIdentity,
        )
        .relate("aws_iam_role.agent_role", "aws_iam_policy.admin", Relationship::HasPolicy)
        .relate("aws_bedrock_agent.helper", "aws_s3_bucket.agent_logs", Relationship::LogsTo)
        .build();
    let engine = AnalysisEngine::new(graph, Vec::new());

    // The capability edges exist, but nothing reaches the agent from the
    // outside, so there is no attack path.
    let attack = engine.attack_graph();
    assert!(
        attack
            .edge_between("aws_bedrock_agent.helper", "aws_iam_role.agent_role")
            .is_some()
    );
    assert!(
        attack
            .edge_between("aws_iam_role.agent_role", "aws_s3_bucket.agent_logs")
            .is_some()
    );
    assert!(engine.critical_path().is_none());
    assert!(engine.remediations().is_empty());
}

#[test]
fn wildcard_admin_fans_out_to_every_target() {
    let graph = ResourceGraphBuilder::new()
        .add_resource(Resource::new("aws_instance", "web"))
        .add_resource(open_security_group("open"))
        .add_resource(Resource::new("aws_iam_role", "admin_role"))
        .add_resource(admin_policy("admin"))
        .add_resource(Resource::new("aws_s3_bucket", "alpha"))
        .add_resource(Resource::new("aws_s3_bucket", "beta"))
        .relate("aws_instance.web", "aws_security_group.open", Relationship::ProtectedBy)
        .relate("aws_instance.web", "aws_iam_role.admin_role", Relationship::AssumesRole)
        .relate("aws_iam_role.admin_role", "aws_iam_policy.admin", Relationship::HasPolicy)
        .build();
    let engine = AnalysisEngine::new(graph, Vec::new());
    let attack = engine.attack_graph();

    // Full admin grants the role an edge to every other resource.
    for target in [
        "aws_iam_policy.admin",
        "aws_instance.web",
        "aws_s3_bucket.alpha",
        "aws_s3_bucket.beta",
        "aws_security_group.open",
    ] {
        let edge = attack
            .edge_between("aws_iam_role.admin_role", target)
            .unwrap_or_else(|| panic!("admin role must reach {target}"));
        assert_eq!(edge.risk, "Full Admin Access");
    }

    // Both bucket paths run through the shared ingress edge, so the first
    // remediation blocks exactly the number of enumerated paths.
    let fixes = engine.remediations();
    assert_eq!(fixes[0].edge_source, INTERNET_ID);
    assert_eq!(fixes[0].edge_target, "aws_instance.web");
    assert_eq!(fixes[0].paths_blocked, 2);

    // Applying the whole sequence leaves nothing reachable.
    let mut working = attack.clone();
    for fix in &fixes {
        assert!(
            working
                .remove_edge_by_ids(&fix.edge_source, &fix.edge_target)
                .is_some()
        );
    }
    let sinks = engine.sinks().to_vec();
    assert!(breachgraph::remediation::enumerate_paths(&working, &sinks, 10).is_empty());
}

#[test]
fn cutoff_hides_long_chains() {
    // Internet -> instance -> r0 -> r1 -> ... -> r9 -> bucket: 12 edges.
    let mut builder = ResourceGraphBuilder::new()
        .add_resource(Resource::new("aws_instance", "web"))
        .add_resource(open_security_group("open"))
        .add_resource(Resource::new("aws_s3_bucket", "deep"))
        .relate("aws_instance.web", "aws_security_group.open", Relationship::ProtectedBy);
    for step in 0..10 {
        builder = builder.add_resource(Resource::new("aws_iam_role", format!("r{step}")));
    }
    builder = builder.relate("aws_instance.web", "aws_iam_role.r0", Relationship::AssumesRole);
    for step in 0..9 {
        builder = builder.relate(
            format!("aws_iam_role.r{step}"),
            format!("aws_iam_role.r{}", step + 1),
            Relationship::LinkedRole,
        );
    }
    let graph = builder
        .add_resource(s3_star_policy("s3_all"))
        .relate("aws_iam_role.r9", "aws_iam_policy.s3_all", Relationship::HasPolicy)
        .build();

    let report = analyze(graph, Vec::new());
    assert!(
        report.critical_path.is_none(),
        "a 12-edge chain lies beyond the 10-edge cutoff"
    );
    assert!(report.remediations.is_empty());
}

#[test]
fn attack_edges_have_structural_witnesses() {
    let graph = instance_role_bucket();
    let engine = AnalysisEngine::new(graph, Vec::new());
    let resource_edges: Vec<(String, Relationship, String)> = instance_role_bucket()
        .edges()
        .into_iter()
        .map(|(s, r, t)| (s.id.clone(), r, t.id.clone()))
        .collect();

    for edge in engine.attack_graph().export().edges {
        match edge.method {
            AttackMethod::NetworkReachability
            | AttackMethod::PublicAclPolicy
            | AttackMethod::PublicEndpoint => {
                assert_eq!(edge.source, INTERNET_ID);
            }
            AttackMethod::ImdsCredentialAccess => assert!(resource_edges.contains(&(
                edge.source.clone(),
                Relationship::AssumesRole,
                edge.target.clone()
            ))),
            AttackMethod::IdentityLink => assert!(resource_edges.contains(&(
                edge.source.clone(),
                Relationship::LinkedRole,
                edge.target.clone()
            ))),
            AttackMethod::PromptInjectionToolAbuse => assert!(resource_edges.contains(&(
                edge.source.clone(),
                Relationship::UsesIdentity,
                edge.target.clone()
            ))),
            AttackMethod::DataFlow => assert!(resource_edges.contains(&(
                edge.source.clone(),
                Relationship::LogsTo,
                edge.target.clone()
            ))),
            AttackMethod::IamPermissionAllow => {
                // Witnessed by a role with at least one attached policy.
                assert!(resource_edges.iter().any(|(source, relationship, _)| {
                    source == &edge.source && *relationship == Relationship::HasPolicy
                }));
            }
        }
    }
}

#[test]
fn private_bucket_alone_is_silent() {
    let graph = ResourceGraphBuilder::new()
        .add_resource(Resource::new("aws_s3_bucket", "sealed").with_attribute("acl", json!("private")))
        .build();
    let report = analyze(graph, Vec::new());

    // The bucket is a sink, but the origin has no outgoing edges.
    assert!(report.attack_graph.edges.is_empty());
    assert!(report.critical_path.is_none());
    assert!(report.remediations.is_empty());
    assert!(report.priority_fixes.is_empty());
}

#[test]
fn logs_to_targets_become_sinks() {
    let graph = ResourceGraphBuilder::new()
        .add_resource(Resource::new(
            "aws_bedrock_model_invocation_logging_configuration",
            "audit",
        ))
        .add_resource(Resource::new("aws_s3_bucket", "invocation_logs"))
        .add_resource(Resource::new("aws_s3_bucket", "plain"))
        .relate(
            "aws_bedrock_model_invocation_logging_configuration.audit",
            "aws_s3_bucket.invocation_logs",
            Relationship::LogsTo,
        )
        .build();
    let engine = AnalysisEngine::new(graph, Vec::new());
    assert_eq!(
        engine.sinks(),
        &[
            "aws_s3_bucket.invocation_logs".to_string(),
            "aws_s3_bucket.plain".to_string(),
        ]
    );
}
