//! Core domain types for infrastructure analysis.
//!
//! This module defines the fundamental types shared by every stage of the
//! pipeline: normalized [`Resource`] records with their heterogeneous
//! attribute bags, the closed [`Relationship`] vocabulary of the resource
//! graph, and the [`RuleResult`] findings produced by an external rules
//! engine.
//!
//! # Examples
//!
//! ```rust
//! use breachgraph::model::{Resource, ResourceKind};
//! use serde_json::json;
//!
//! let bucket = Resource::new("aws_s3_bucket", "logs")
//!     .with_attribute("acl", json!("private"));
//!
//! assert_eq!(bucket.id, "aws_s3_bucket.logs");
//! assert!(bucket.kind.is_storage_bucket());
//! assert_eq!(bucket.kind.service_prefix(), Some("s3"));
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Heterogeneous attribute bag attached to a resource.
///
/// Attribute trees arrive from configuration parsers as arbitrary nests of
/// scalars, sequences, and keyed maps; [`serde_json::Value`] is exactly that
/// sum type, so defensive shape handling becomes explicit pattern matching.
pub type AttributeMap = Map<String, Value>;

/// The kind of a cloud resource.
///
/// Recognized kinds get a dedicated variant; anything else is preserved
/// verbatim in [`Other`](Self::Other) so unknown resource types still flow
/// through the graph and can participate in attack paths.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    /// `aws_instance`
    Instance,
    /// `aws_security_group`
    SecurityGroup,
    /// `aws_subnet`
    Subnet,
    /// `aws_s3_bucket`
    S3Bucket,
    /// `aws_iam_role`
    IamRole,
    /// `aws_iam_policy`
    IamPolicy,
    /// `aws_iam_instance_profile`
    IamInstanceProfile,
    /// `aws_sagemaker_endpoint`
    SagemakerEndpoint,
    /// `aws_bedrock_model_invocation_logging_configuration`
    BedrockInvocationLogging,
    /// `aws_bedrock_agent`
    BedrockAgent,
    /// `aws_opensearch_domain`
    OpensearchDomain,
    /// Any resource type without a dedicated variant.
    Other(String),
}

impl ResourceKind {
    /// Parse a resource type string into its kind.
    ///
    /// Unrecognized types become [`Other`](Self::Other), preserving the
    /// original string.
    #[must_use]
    pub fn from_type_str(type_str: &str) -> Self {
        match type_str {
            "aws_instance" => Self::Instance,
            "aws_security_group" => Self::SecurityGroup,
            "aws_subnet" => Self::Subnet,
            "aws_s3_bucket" => Self::S3Bucket,
            "aws_iam_role" => Self::IamRole,
            "aws_iam_policy" => Self::IamPolicy,
            "aws_iam_instance_profile" => Self::IamInstanceProfile,
            "aws_sagemaker_endpoint" => Self::SagemakerEndpoint,
            "aws_bedrock_model_invocation_logging_configuration" => Self::BedrockInvocationLogging,
            "aws_bedrock_agent" => Self::BedrockAgent,
            "aws_opensearch_domain" => Self::OpensearchDomain,
            other => Self::Other(other.to_string()),
        }
    }

    /// The canonical resource type string for this kind.
    #[must_use]
    pub fn as_type_str(&self) -> &str {
        match self {
            Self::Instance => "aws_instance",
            Self::SecurityGroup => "aws_security_group",
            Self::Subnet => "aws_subnet",
            Self::S3Bucket => "aws_s3_bucket",
            Self::IamRole => "aws_iam_role",
            Self::IamPolicy => "aws_iam_policy",
            Self::IamInstanceProfile => "aws_iam_instance_profile",
            Self::SagemakerEndpoint => "aws_sagemaker_endpoint",
            Self::BedrockInvocationLogging => {
                "aws_bedrock_model_invocation_logging_configuration"
            }
            Self::BedrockAgent => "aws_bedrock_agent",
            Self::OpensearchDomain => "aws_opensearch_domain",
            Self::Other(s) => s,
        }
    }

    /// Returns `true` for AI/ML service resources: SageMaker endpoints,
    /// Bedrock invocation-logging configurations, and Bedrock agents.
    #[must_use]
    pub fn is_ai_service(&self) -> bool {
        matches!(
            self,
            Self::SagemakerEndpoint | Self::BedrockInvocationLogging | Self::BedrockAgent
        )
    }

    /// Returns `true` if this is a Bedrock agent.
    #[must_use]
    pub fn is_agent(&self) -> bool {
        matches!(self, Self::BedrockAgent)
    }

    /// Returns `true` for vector stores: any type whose string contains
    /// `opensearch` or `vector`.
    #[must_use]
    pub fn is_vector_store(&self) -> bool {
        let type_str = self.as_type_str();
        type_str.contains("opensearch") || type_str.contains("vector")
    }

    /// Returns `true` for storage buckets.
    #[must_use]
    pub fn is_storage_bucket(&self) -> bool {
        matches!(self, Self::S3Bucket)
    }

    /// The cloud service token, i.e. the token after the first underscore
    /// in the type string (`aws_s3_bucket` yields `s3`).
    ///
    /// Returns `None` when the type string has no underscore.
    #[must_use]
    pub fn service_prefix(&self) -> Option<&str> {
        self.as_type_str().split('_').nth(1)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_type_str())
    }
}

impl From<&str> for ResourceKind {
    fn from(s: &str) -> Self {
        Self::from_type_str(s)
    }
}

/// A normalized cloud resource.
///
/// Resources are produced by an external parser and are immutable for the
/// duration of an analysis. The stable `id` has the form `<type>.<name>`
/// (or `data.<type>.<name>` for data sources).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    /// Stable identifier, `<type>.<name>` or `data.<type>.<name>`.
    pub id: String,
    /// Resource kind derived from the type string.
    pub kind: ResourceKind,
    /// The configuration-level resource name.
    pub name: String,
    /// Raw configuration attributes.
    #[serde(default)]
    pub attributes: AttributeMap,
}

impl Resource {
    /// Create a managed resource with id `<type>.<name>`.
    #[must_use]
    pub fn new(type_str: &str, name: impl Into<String>) -> Self {
        let name = name.into();
        let kind = ResourceKind::from_type_str(type_str);
        Self {
            id: format!("{}.{name}", kind.as_type_str()),
            kind,
            name,
            attributes: AttributeMap::new(),
        }
    }

    /// Create a data-source resource with id `data.<type>.<name>`.
    #[must_use]
    pub fn data(type_str: &str, name: impl Into<String>) -> Self {
        let name = name.into();
        let kind = ResourceKind::from_type_str(type_str);
        Self {
            id: format!("data.{}.{name}", kind.as_type_str()),
            kind,
            name,
            attributes: AttributeMap::new(),
        }
    }

    /// Attach an attribute, replacing any existing value under `key`.
    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    /// Look up an attribute by key.
    #[must_use]
    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }
}

/// The closed set of relationships between resources.
///
/// Edge labels are a finite enumeration rather than free-form strings so
/// overlay construction can match on them exhaustively.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Relationship {
    /// Compute shielded by a security group.
    ProtectedBy,
    /// Compute assuming an identity, typically via an instance profile.
    AssumesRole,
    /// An instance profile linked to its backing role.
    LinkedRole,
    /// An agent or service acting under an identity.
    UsesIdentity,
    /// Placement inside a network container such as a subnet.
    LocatedIn,
    /// An identity with an attached policy document.
    HasPolicy,
    /// A service shipping logs to a storage destination.
    LogsTo,
}

impl Relationship {
    /// The snake_case label for this relationship.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProtectedBy => "protected_by",
            Self::AssumesRole => "assumes_role",
            Self::LinkedRole => "linked_role",
            Self::UsesIdentity => "uses_identity",
            Self::LocatedIn => "located_in",
            Self::HasPolicy => "has_policy",
            Self::LogsTo => "logs_to",
        }
    }
}

impl fmt::Display for Relationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Severity level for findings and attack paths.
///
/// Ordered from lowest to highest so comparisons like
/// `severity >= Severity::High` work naturally.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Low risk, may warrant logging.
    Low,
    /// Medium risk, warrants investigation.
    Medium,
    /// High risk, should be fixed promptly.
    High,
    /// Critical, an exploitable exposure.
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

/// The result of a misconfiguration rule evaluated by an external rules
/// engine.
///
/// Findings are read-only inputs: they feed the priority ranking but never
/// change attack-graph topology.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleResult {
    /// Identifier of the rule that produced this finding.
    pub rule_id: String,
    /// Id of the resource the finding applies to.
    pub resource_id: String,
    /// Whether the resource passed the rule.
    pub is_compliant: bool,
    /// Finding severity.
    pub severity: Severity,
    /// Human-readable description of the finding.
    pub description: String,
    /// Suggested remediation text.
    pub remediation: String,
}

impl RuleResult {
    /// Convenience constructor for a failed rule check.
    #[must_use]
    pub fn non_compliant(
        rule_id: impl Into<String>,
        resource_id: impl Into<String>,
        severity: Severity,
        description: impl Into<String>,
        remediation: impl Into<String>,
    ) -> Self {
        Self {
            rule_id: rule_id.into(),
            resource_id: resource_id.into(),
            is_compliant: false,
            severity,
            description: description.into(),
            remediation: remediation.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn kind_round_trips_through_type_string() {
        for type_str in [
            "aws_instance",
            "aws_s3_bucket",
            "aws_iam_role",
            "aws_bedrock_model_invocation_logging_configuration",
            "aws_opensearch_domain",
            "azurerm_storage_account",
        ] {
            let kind = ResourceKind::from_type_str(type_str);
            assert_eq!(kind.as_type_str(), type_str);
        }
    }

    #[test]
    fn ai_service_predicate_matches_fixed_table() {
        assert!(ResourceKind::SagemakerEndpoint.is_ai_service());
        assert!(ResourceKind::BedrockInvocationLogging.is_ai_service());
        assert!(ResourceKind::BedrockAgent.is_ai_service());
        assert!(!ResourceKind::S3Bucket.is_ai_service());
        assert!(!ResourceKind::IamRole.is_ai_service());
    }

    #[test]
    fn vector_store_predicate_uses_substrings() {
        assert!(ResourceKind::OpensearchDomain.is_vector_store());
        assert!(ResourceKind::Other("aws_vector_index".into()).is_vector_store());
        assert!(!ResourceKind::Instance.is_vector_store());
    }

    #[test]
    fn service_prefix_is_token_after_first_underscore() {
        assert_eq!(ResourceKind::S3Bucket.service_prefix(), Some("s3"));
        assert_eq!(
            ResourceKind::BedrockInvocationLogging.service_prefix(),
            Some("bedrock")
        );
        assert_eq!(ResourceKind::Other("standalone".into()).service_prefix(), None);
    }

    #[test]
    fn resource_ids_follow_type_dot_name() {
        let bucket = Resource::new("aws_s3_bucket", "logs");
        assert_eq!(bucket.id, "aws_s3_bucket.logs");

        let doc = Resource::data("aws_iam_policy_document", "assume");
        assert_eq!(doc.id, "data.aws_iam_policy_document.assume");
    }

    #[test]
    fn attributes_are_replaceable() {
        let sg = Resource::new("aws_security_group", "open")
            .with_attribute("ingress", json!([{"cidr_blocks": ["10.0.0.0/8"]}]))
            .with_attribute("ingress", json!([{"cidr_blocks": ["0.0.0.0/0"]}]));
        let ingress = sg.attribute("ingress").unwrap();
        assert_eq!(ingress[0]["cidr_blocks"][0], "0.0.0.0/0");
    }

    #[test]
    fn severity_is_ordered() {
        assert!(Severity::Low < Severity::Medium);
        assert!(Severity::Medium < Severity::High);
        assert!(Severity::High < Severity::Critical);
    }

    #[test]
    fn severity_round_trips_json() {
        let json = serde_json::to_string(&Severity::Critical).unwrap();
        assert_eq!(json, r#""critical""#);
        let parsed: Severity = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, Severity::Critical);
    }

    #[test]
    fn relationship_labels_are_snake_case() {
        assert_eq!(Relationship::ProtectedBy.as_str(), "protected_by");
        assert_eq!(
            serde_json::to_string(&Relationship::LogsTo).unwrap(),
            r#""logs_to""#
        );
    }
}
