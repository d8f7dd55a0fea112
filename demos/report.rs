//! Demo: Full Analysis of a Small Cloud Estate
//!
//! Builds a deliberately misconfigured environment, an internet-facing web
//! instance that assumes an over-privileged role next to a private training
//! bucket, runs the full analysis, and prints the resulting report.
//!
//! Running This Demo:
//! ```bash
//! cargo run --example report
//! ```

use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;

use breachgraph::graph::ResourceGraphBuilder;
use breachgraph::model::{Relationship, Resource, RuleResult, Severity};
use breachgraph::AnalysisEngine;

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();
}

fn main() {
    init_tracing();

    let graph = ResourceGraphBuilder::new()
        .add_resource(Resource::new("aws_instance", "web"))
        .add_resource(
            Resource::new("aws_security_group", "edge")
                .with_attribute("ingress", json!([{"cidr_blocks": ["0.0.0.0/0"]}])),
        )
        .add_resource(Resource::new("aws_iam_instance_profile", "web_profile"))
        .add_resource(Resource::new("aws_iam_role", "app"))
        .add_resource(Resource::new("aws_iam_policy", "s3_all").with_attribute(
            "policy",
            json!(r#"{"Statement": [{"Effect": "Allow", "Action": "s3:*", "Resource": "*"}]}"#),
        ))
        .add_resource(
            Resource::new("aws_s3_bucket", "training_data").with_attribute("acl", json!("private")),
        )
        .relate("aws_instance.web", "aws_security_group.edge", Relationship::ProtectedBy)
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

    let findings = vec![RuleResult::non_compliant(
        "NET-001",
        "aws_security_group.edge",
        Severity::High,
        "Security Group allows 0.0.0.0/0 ingress",
        "Restrict ingress to specific IPs.",
    )];

    let engine = AnalysisEngine::new(graph, findings);
    info!(
        edges = engine.attack_graph().edge_count(),
        "attack graph constructed"
    );

    match engine.critical_path() {
        Some(path) => {
            println!("critical path ({} risk): {path}", path.risk_score);
        }
        None => println!("no critical attack path found"),
    }

    println!("\nremediation order:");
    for fix in engine.remediations() {
        println!("  {}: {} (blocks {} paths)", fix.id, fix.description, fix.paths_blocked);
    }

    println!("\npriority ranking:");
    for fix in engine.priority_fixes() {
        println!("  #{} {} score {}", fix.rank, fix.resource, fix.risk_score);
        println!("     {}", fix.why_this_matters);
    }

    println!("\ngraphviz:\n{}", engine.attack_graph().to_dot());
}
