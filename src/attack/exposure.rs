//! Ingress exposure predicates.
//!
//! These checks decide which resources the `Internet` origin can reach
//! directly. Attribute shapes are whatever the configuration parser kept,
//! so every walk here pattern-matches defensively: an ingress block may be
//! an object, a sequence of objects, or a sequence of sequences, and
//! `cidr_blocks` may be nested one level.

use serde_json::Value;

use crate::graph::ResourceGraph;
use crate::model::{Relationship, Resource};

/// The anywhere CIDR.
pub const WORLD_CIDR: &str = "0.0.0.0/0";

/// Whether a compute instance is reachable from the internet.
///
/// An instance hides behind a private subnet when any `located_in` target
/// carries `map_public_ip_on_launch = "false"`; this is a heuristic (an
/// elastic IP could still expose it) but it removes false positives for
/// internal workloads. Otherwise the instance is exposed when any
/// `protected_by` security group has a world-open ingress rule.
#[must_use]
pub fn instance_publicly_exposed(graph: &ResourceGraph, instance: &Resource) -> bool {
    for subnet in graph.related_targets(&instance.id, Relationship::LocatedIn) {
        if let Some(value) = subnet.attribute("map_public_ip_on_launch") {
            if value_is_false(value) {
                return false;
            }
        }
    }

    graph
        .related_targets(&instance.id, Relationship::ProtectedBy)
        .into_iter()
        .any(security_group_open_to_world)
}

/// Whether a security group has an ingress rule open to the world.
#[must_use]
pub fn security_group_open_to_world(group: &Resource) -> bool {
    let Some(ingress) = group.attribute("ingress") else {
        return false;
    };
    let rules: Vec<&Value> = match ingress {
        Value::Array(items) => items.iter().collect(),
        other => vec![other],
    };
    for rule in rules {
        match rule {
            Value::Object(obj) => {
                if cidrs_contain_world(obj.get("cidr_blocks")) {
                    return true;
                }
            }
            Value::Array(nested) => {
                if nested
                    .iter()
                    .filter_map(Value::as_object)
                    .any(|obj| cidrs_contain_world(obj.get("cidr_blocks")))
                {
                    return true;
                }
            }
            _ => {}
        }
    }
    false
}

/// Whether a `cidr_blocks` value contains the world CIDR, tolerating one
/// level of nesting.
fn cidrs_contain_world(value: Option<&Value>) -> bool {
    let Some(Value::Array(items)) = value else {
        return false;
    };
    items.iter().any(|item| match item {
        Value::String(cidr) => cidr == WORLD_CIDR,
        Value::Array(nested) => nested
            .iter()
            .filter_map(Value::as_str)
            .any(|cidr| cidr == WORLD_CIDR),
        _ => false,
    })
}

/// Whether a storage bucket is publicly accessible through its ACL.
///
/// The `acl` attribute may arrive as a sequence; the first element counts.
#[must_use]
pub fn bucket_publicly_accessible(bucket: &Resource) -> bool {
    let acl = match bucket.attribute("acl") {
        Some(Value::Array(items)) => items.first().and_then(Value::as_str),
        Some(Value::String(value)) => Some(value.as_str()),
        _ => None,
    };
    matches!(acl, Some("public-read" | "public-read-write"))
}

/// Whether a vector store is reachable from outside.
///
/// Unconfigured access-policy data renders a store reachable, so this is
/// conservatively `true` for every vector store. A known over-approximation
/// until endpoint-policy attributes are modeled.
#[must_use]
pub fn vector_store_externally_exposed(_store: &Resource) -> bool {
    true
}

/// Whether an attribute value reads as the literal `false`.
///
/// Parsers deliver booleans both as JSON booleans and as strings, in any
/// casing.
fn value_is_false(value: &Value) -> bool {
    match value {
        Value::Bool(flag) => !flag,
        Value::String(text) => text.eq_ignore_ascii_case("false"),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::ResourceGraphBuilder;
    use serde_json::json;

    fn instance_with_sg(ingress: Value) -> ResourceGraph {
        ResourceGraphBuilder::new()
            .add_resource(Resource::new("aws_instance", "web"))
            .add_resource(
                Resource::new("aws_security_group", "edge").with_attribute("ingress", ingress),
            )
            .relate(
                "aws_instance.web",
                "aws_security_group.edge",
                Relationship::ProtectedBy,
            )
            .build()
    }

    #[test]
    fn open_ingress_exposes_the_instance() {
        let graph = instance_with_sg(json!([{"cidr_blocks": ["0.0.0.0/0"]}]));
        let instance = graph.resource("aws_instance.web").unwrap();
        assert!(instance_publicly_exposed(&graph, instance));
    }

    #[test]
    fn scoped_ingress_does_not_expose() {
        let graph = instance_with_sg(json!([{"cidr_blocks": ["10.0.0.0/8"]}]));
        let instance = graph.resource("aws_instance.web").unwrap();
        assert!(!instance_publicly_exposed(&graph, instance));
    }

    #[test]
    fn ingress_shapes_are_parsed_defensively() {
        // Single object instead of a sequence.
        let single = Resource::new("aws_security_group", "a")
            .with_attribute("ingress", json!({"cidr_blocks": ["0.0.0.0/0"]}));
        assert!(security_group_open_to_world(&single));

        // Sequence of sequences of objects.
        let nested = Resource::new("aws_security_group", "b")
            .with_attribute("ingress", json!([[{"cidr_blocks": ["0.0.0.0/0"]}]]));
        assert!(security_group_open_to_world(&nested));

        // Nested cidr_blocks.
        let nested_cidrs = Resource::new("aws_security_group", "c")
            .with_attribute("ingress", json!([{"cidr_blocks": [["0.0.0.0/0"]]}]));
        assert!(security_group_open_to_world(&nested_cidrs));

        // Missing and malformed shapes stay closed.
        let missing = Resource::new("aws_security_group", "d");
        assert!(!security_group_open_to_world(&missing));
        let scalar = Resource::new("aws_security_group", "e")
            .with_attribute("ingress", json!("0.0.0.0/0"));
        assert!(!security_group_open_to_world(&scalar));
    }

    #[test]
    fn private_subnet_hides_an_open_instance() {
        let graph = ResourceGraphBuilder::new()
            .add_resource(Resource::new("aws_instance", "web"))
            .add_resource(
                Resource::new("aws_security_group", "edge")
                    .with_attribute("ingress", json!([{"cidr_blocks": ["0.0.0.0/0"]}])),
            )
            .add_resource(
                Resource::new("aws_subnet", "private")
                    .with_attribute("map_public_ip_on_launch", json!("false")),
            )
            .relate(
                "aws_instance.web",
                "aws_security_group.edge",
                Relationship::ProtectedBy,
            )
            .relate("aws_instance.web", "aws_subnet.private", Relationship::LocatedIn)
            .build();
        let instance = graph.resource("aws_instance.web").unwrap();
        assert!(!instance_publicly_exposed(&graph, instance));
    }

    #[test]
    fn subnet_flag_matches_boolean_and_string_forms() {
        for flag in [json!(false), json!("false"), json!("False"), json!("FALSE")] {
            let subnet = Resource::new("aws_subnet", "s")
                .with_attribute("map_public_ip_on_launch", flag.clone());
            assert!(
                value_is_false(subnet.attribute("map_public_ip_on_launch").unwrap()),
                "{flag} should read as false"
            );
        }
        assert!(!value_is_false(&json!(true)));
        assert!(!value_is_false(&json!("true")));
        assert!(!value_is_false(&json!(0)));
    }

    #[test]
    fn bucket_acl_forms() {
        let public = Resource::new("aws_s3_bucket", "a").with_attribute("acl", json!("public-read"));
        assert!(bucket_publicly_accessible(&public));

        let public_rw = Resource::new("aws_s3_bucket", "b")
            .with_attribute("acl", json!(["public-read-write"]));
        assert!(bucket_publicly_accessible(&public_rw));

        let private = Resource::new("aws_s3_bucket", "c").with_attribute("acl", json!("private"));
        assert!(!bucket_publicly_accessible(&private));

        let unset = Resource::new("aws_s3_bucket", "d");
        assert!(!bucket_publicly_accessible(&unset));
    }
}
