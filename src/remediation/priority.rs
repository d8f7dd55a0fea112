//! Deterministic per-resource fix ranking.
//!
//! Answers "if I can fix only one thing today, which fix reduces the most
//! real-world risk?" with a fixed scoring formula over path participation
//! and misconfiguration findings:
//!
//! ```text
//! risk score = (attack path count x 3)
//!            + (is entry point    x 5)
//!            + (priv. escalation  x 4)
//!            + (AI data exposure  x 6)
//!            + (internet exposed  x 5)
//! ```

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::attack::{AttackGraph, INTERNET_ID};
use crate::attack::exposure;
use crate::graph::ResourceGraph;
use crate::model::RuleResult;

/// Resource types that act as initial access points.
const ENTRY_POINT_TYPES: &[&str] = &[
    "aws_security_group",
    "aws_lb",
    "aws_api_gateway_rest_api",
    "aws_cloudfront_distribution",
];

/// Resource types that can enable privilege escalation.
const PRIV_ESC_TYPES: &[&str] = &[
    "aws_iam_role",
    "aws_iam_policy",
    "aws_iam_role_policy",
    "aws_iam_role_policy_attachment",
];

/// Resource types that hold or serve AI/ML data.
const AI_DATA_TYPES: &[&str] = &[
    "aws_s3_bucket",
    "aws_sagemaker_notebook_instance",
    "aws_sagemaker_model_package_group",
    "aws_bedrock_agent",
    "aws_bedrock_model_invocation_logging_configuration",
    "aws_opensearch_domain",
    "aws_dynamodb_table",
];

/// Naming conventions that suggest AI/ML workloads.
const AI_NAME_KEYWORDS: &[&str] = &[
    "sagemaker",
    "bedrock",
    "training",
    "model",
    "embedding",
    "vector",
    "llm",
    "ai",
    "ml",
];

/// Wildcard markers sniffed out of stringified policy attributes.
const WILDCARD_MARKERS: &[&str] = &[
    r#""Action": "*""#,
    r#""Action":"*""#,
    r#""Resource": "*""#,
    r#""Resource":"*""#,
];

/// A ranked fix recommendation for one resource.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityFix {
    /// Position in the ranking, 1 first.
    pub rank: usize,
    /// `type: name` label of the resource.
    pub resource: String,
    /// Deterministic risk score.
    pub risk_score: u32,
    /// Number of enumerated attack paths the resource participates in.
    pub breaks_attack_paths: usize,
    /// Attack stages this resource contributes to.
    pub attack_stages_blocked: Vec<String>,
    /// Generated explanation of the fix's impact.
    pub why_this_matters: String,
    /// Actionable recommendation for the resource type.
    pub recommended_fix: String,
}

/// Rank misconfigured and path-participating resources by risk reduction.
///
/// Candidates are the subjects of non-compliant findings plus every
/// non-`Internet` node on an enumerated path. Resources scoring zero are
/// omitted; ties order by resource id.
#[must_use]
pub fn prioritize(
    resources: &ResourceGraph,
    attack: &AttackGraph,
    paths: &[Vec<String>],
    findings: &[RuleResult],
) -> Vec<PriorityFix> {
    let mut participation: FxHashMap<&str, usize> = FxHashMap::default();
    for path in paths {
        for id in path {
            *participation.entry(id.as_str()).or_insert(0) += 1;
        }
    }

    let mut candidates: FxHashSet<&str> = findings
        .iter()
        .filter(|finding| !finding.is_compliant)
        .map(|finding| finding.resource_id.as_str())
        .collect();
    for path in paths {
        for id in path {
            if id != INTERNET_ID {
                candidates.insert(id.as_str());
            }
        }
    }

    let mut scored: Vec<(&str, u32)> = candidates
        .into_iter()
        .map(|id| (id, risk_score(resources, attack, &participation, id)))
        .filter(|&(_, score)| score > 0)
        .collect();
    scored.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    scored
        .into_iter()
        .enumerate()
        .map(|(position, (id, score))| {
            let stages = classify_stages(resources, attack, id);
            let path_count = participation.get(id).copied().unwrap_or(0);
            let short_name = id.rsplit('.').next().unwrap_or(id);
            PriorityFix {
                rank: position + 1,
                resource: format!("{}: {short_name}", resource_type(resources, id)),
                risk_score: score,
                breaks_attack_paths: path_count,
                why_this_matters: why_this_matters(resources, id, &stages, path_count),
                recommended_fix: recommended_fix(resources, id).to_string(),
                attack_stages_blocked: stages,
            }
        })
        .collect()
}

fn risk_score(
    resources: &ResourceGraph,
    attack: &AttackGraph,
    participation: &FxHashMap<&str, usize>,
    id: &str,
) -> u32 {
    let path_count = participation.get(id).copied().unwrap_or(0) as u32;
    let entry = u32::from(is_entry_point(resources, id));
    let priv_esc = u32::from(is_privilege_escalation(resources, id));
    let ai_data = u32::from(is_ai_data_exposure(resources, id));
    let internet = u32::from(is_internet_exposed(resources, attack, id));
    path_count * 3 + entry * 5 + priv_esc * 4 + ai_data * 6 + internet * 5
}

fn resource_type<'a>(resources: &'a ResourceGraph, id: &'a str) -> &'a str {
    match resources.resource(id) {
        Some(resource) => resource.kind.as_type_str(),
        None => id.split('.').next().unwrap_or("unknown"),
    }
}

fn is_entry_point(resources: &ResourceGraph, id: &str) -> bool {
    if ENTRY_POINT_TYPES.contains(&resource_type(resources, id)) {
        return true;
    }
    resources
        .resource(id)
        .is_some_and(exposure::security_group_open_to_world)
}

fn is_privilege_escalation(resources: &ResourceGraph, id: &str) -> bool {
    if !PRIV_ESC_TYPES.contains(&resource_type(resources, id)) {
        return false;
    }
    let Some(resource) = resources.resource(id) else {
        return false;
    };
    let policy_text = resource
        .attribute("policy")
        .map(value_to_text)
        .unwrap_or_default();
    if WILDCARD_MARKERS.iter().any(|marker| policy_text.contains(marker)) {
        return true;
    }
    resource
        .attribute("policy_arn")
        .map(value_to_text)
        .unwrap_or_default()
        .contains("AdministratorAccess")
}

fn is_ai_data_exposure(resources: &ResourceGraph, id: &str) -> bool {
    if AI_DATA_TYPES.contains(&resource_type(resources, id)) {
        return true;
    }
    let lowered = id.to_lowercase();
    AI_NAME_KEYWORDS.iter().any(|keyword| lowered.contains(keyword))
}

fn is_internet_exposed(resources: &ResourceGraph, attack: &AttackGraph, id: &str) -> bool {
    attack.edge_between(INTERNET_ID, id).is_some() || is_entry_point(resources, id)
}

fn classify_stages(resources: &ResourceGraph, attack: &AttackGraph, id: &str) -> Vec<String> {
    let mut stages = Vec::new();
    if is_entry_point(resources, id) || is_internet_exposed(resources, attack, id) {
        stages.push("Initial Access".to_string());
    }
    if is_privilege_escalation(resources, id) {
        stages.push("Privilege Escalation".to_string());
    }
    if attack.out_degree(id) > 1 {
        stages.push("Lateral Movement".to_string());
    }
    if is_ai_data_exposure(resources, id) {
        stages.push("AI Training Data Exfiltration".to_string());
    }
    if stages.is_empty() {
        stages.push("Misconfiguration".to_string());
    }
    stages
}

fn why_this_matters(
    resources: &ResourceGraph,
    id: &str,
    stages: &[String],
    path_count: usize,
) -> String {
    let mut reasons: Vec<String> = Vec::new();
    if stages.iter().any(|s| s == "Initial Access") {
        reasons.push("removes the attacker's entry point into the environment".to_string());
    }
    if stages.iter().any(|s| s == "Privilege Escalation") {
        reasons.push("prevents attackers from gaining elevated permissions".to_string());
    }
    if stages.iter().any(|s| s == "Lateral Movement") {
        reasons.push("blocks lateral movement to connected resources".to_string());
    }
    if stages.iter().any(|s| s == "AI Training Data Exfiltration") {
        reasons.push("protects sensitive AI/ML data and model artifacts".to_string());
    }
    if path_count > 1 {
        reasons.push(format!("breaks {path_count} distinct attack paths simultaneously"));
    }
    let short_type = resource_type(resources, id).trim_start_matches("aws_");
    format!("Fixing this {short_type} {}.", reasons.join(", "))
}

fn recommended_fix(resources: &ResourceGraph, id: &str) -> &'static str {
    match resource_type(resources, id) {
        "aws_security_group" => {
            "Restrict ingress rules to specific IPs. Remove 0.0.0.0/0 CIDR blocks. \
             Use VPC endpoints for internal traffic."
        }
        "aws_iam_role" => {
            "Apply least privilege. Remove wildcard (*) actions and resources. \
             Scope to specific services and ARNs."
        }
        "aws_iam_policy" => {
            "Remove overly permissive statements. Use condition keys to restrict access context."
        }
        "aws_iam_role_policy" => {
            "Scope policy to minimum required actions. Add resource constraints and conditions."
        }
        "aws_iam_role_policy_attachment" => {
            "Review attached managed policies. Replace AdministratorAccess with scoped policies."
        }
        "aws_s3_bucket" => {
            "Enable bucket versioning and encryption. Block public access. Use VPC endpoints."
        }
        "aws_s3_bucket_policy" => {
            "Remove Principal: * statements. Scope to specific IAM roles and conditions."
        }
        "aws_sagemaker_notebook_instance" => {
            "Disable direct internet access. Use VPC-only mode. Restrict IAM role permissions."
        }
        "aws_bedrock_agent" => {
            "Scope agent tools to minimum required permissions. Enable logging and monitoring."
        }
        "aws_opensearch_domain" => {
            "Enable fine-grained access control. Use VPC deployment. Restrict access policies."
        }
        "aws_instance" => {
            "Enable IMDSv2 (http_tokens = required). Use private subnets. \
             Minimize IAM role permissions."
        }
        _ => "Review and restrict permissions following the principle of least privilege.",
    }
}

fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
