//! Capability decision over normalized policy statements.

use std::fmt;

use crate::model::Resource;

use super::document::{PolicyDocument, PolicyPayload, Statement};

/// Actions that count as data access against a storage bucket.
const S3_DATA_ACTIONS: &[&str] = &["s3:GetObject", "s3:PutObject", "s3:*"];

/// Actions that invoke an agent.
const AGENT_INVOKE_ACTIONS: &[&str] = &["bedrock:InvokeAgent"];

/// Actions that invoke a model endpoint.
const MODEL_INVOKE_ACTIONS: &[&str] = &["bedrock:InvokeModel", "sagemaker:InvokeEndpoint"];

/// A coarse-grained permission level granted by one or more policy
/// statements against a target resource.
///
/// The display string doubles as the risk annotation on permission edges.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Capability {
    /// `Action: "*"` on `Resource: "*"`.
    FullAdmin,
    /// A whole-service wildcard such as `s3:*` on `Resource: "*"`. Carries
    /// the upper-cased service token.
    FullService(String),
    /// Object-level read or write on a storage bucket.
    S3DataAccess,
    /// Permission to invoke an agent.
    AgentInvocation,
    /// Permission to invoke a model endpoint.
    ModelInvocation,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FullAdmin => write!(f, "Full Admin Access"),
            Self::FullService(service) => write!(f, "Full {service} Access"),
            Self::S3DataAccess => write!(f, "S3 Data Access"),
            Self::AgentInvocation => write!(f, "Agent Invocation"),
            Self::ModelInvocation => write!(f, "Model Invocation"),
        }
    }
}

/// Decide whether any of the given policy payloads grants a capability
/// against the target resource.
///
/// Checks are ordered from broadest to most specific and the first match
/// wins; each check scans every statement of every document before the
/// next check runs. Malformed payloads contribute no statements, so this
/// function cannot fail.
#[must_use]
pub fn evaluate(payloads: &[PolicyPayload], target: &Resource) -> Option<Capability> {
    let documents: Vec<PolicyDocument> =
        payloads.iter().map(PolicyDocument::parse_lenient).collect();
    let statements: Vec<&Statement> = documents
        .iter()
        .flat_map(|doc| doc.statements.iter())
        .collect();
    if statements.is_empty() {
        return None;
    }

    if statements
        .iter()
        .any(|stmt| contains_literal(&stmt.actions, "*") && covers_all_resources(stmt))
    {
        return Some(Capability::FullAdmin);
    }

    if let Some(prefix) = target.kind.service_prefix() {
        let service_wildcard = format!("{prefix}:*");
        if statements
            .iter()
            .any(|stmt| contains_literal(&stmt.actions, &service_wildcard) && covers_all_resources(stmt))
        {
            return Some(Capability::FullService(prefix.to_uppercase()));
        }
    }

    if target.kind.is_storage_bucket()
        && statements.iter().any(|stmt| {
            matches_any_action(&stmt.actions, S3_DATA_ACTIONS)
                && resource_covers(&stmt.resources, &target.name)
        })
    {
        return Some(Capability::S3DataAccess);
    }

    if target.kind.is_ai_service() {
        if statements
            .iter()
            .any(|stmt| matches_any_action(&stmt.actions, AGENT_INVOKE_ACTIONS))
        {
            return Some(Capability::AgentInvocation);
        }
        if statements
            .iter()
            .any(|stmt| matches_any_action(&stmt.actions, MODEL_INVOKE_ACTIONS))
        {
            return Some(Capability::ModelInvocation);
        }
    }

    None
}

/// Whether an action pattern matches a concrete action: exact equality, or
/// a trailing-`*` prefix match.
fn action_matches(pattern: &str, action: &str) -> bool {
    if pattern == action {
        return true;
    }
    if pattern.ends_with('*') {
        return action.starts_with(pattern.trim_end_matches('*'));
    }
    false
}

/// Whether any statement action matches any of the named actions.
fn matches_any_action(actions: &[String], targets: &[&str]) -> bool {
    actions
        .iter()
        .any(|pattern| targets.iter().any(|action| action_matches(pattern, action)))
}

fn contains_literal(values: &[String], literal: &str) -> bool {
    values.iter().any(|v| v == literal)
}

fn covers_all_resources(stmt: &Statement) -> bool {
    contains_literal(&stmt.resources, "*")
}

/// Lenient bucket-resource check: a wildcard, or any resource pattern that
/// mentions the bucket name (ARNs qualify).
fn resource_covers(resources: &[String], bucket_name: &str) -> bool {
    resources
        .iter()
        .any(|r| r == "*" || r.contains(bucket_name))
}
