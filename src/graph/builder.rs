//! Deterministic construction of the resource graph.

use petgraph::stable_graph::StableDiGraph;
use rustc_hash::FxHashMap;
use serde_json::Value;

use crate::model::{Relationship, Resource, ResourceKind};

use super::ResourceGraph;

/// Builder for the resource graph with a fluent API.
///
/// Resources are registered first, relationships afterwards; [`build`]
/// inserts nodes in id-sorted order so node indices are deterministic, then
/// applies relationships in registration order. A relationship whose
/// endpoint id is not registered is skipped with a warning rather than
/// failing the build.
///
/// [`build`]: Self::build
#[derive(Debug, Default)]
pub struct ResourceGraphBuilder {
    resources: Vec<Resource>,
    slots: FxHashMap<String, usize>,
    relations: Vec<(String, String, Relationship)>,
}

impl ResourceGraphBuilder {
    /// Creates a new, empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a resource. A resource with the same id replaces the
    /// earlier registration.
    #[must_use]
    pub fn add_resource(mut self, resource: Resource) -> Self {
        match self.slots.get(&resource.id) {
            Some(&slot) => self.resources[slot] = resource,
            None => {
                self.slots.insert(resource.id.clone(), self.resources.len());
                self.resources.push(resource);
            }
        }
        self
    }

    /// Registers every resource from an iterator.
    #[must_use]
    pub fn add_resources(mut self, resources: impl IntoIterator<Item = Resource>) -> Self {
        for resource in resources {
            self = self.add_resource(resource);
        }
        self
    }

    /// Records a relationship edge between two resource ids.
    #[must_use]
    pub fn relate(
        mut self,
        source: impl Into<String>,
        target: impl Into<String>,
        relationship: Relationship,
    ) -> Self {
        self.relations.push((source.into(), target.into(), relationship));
        self
    }

    /// Resolves a trivial configuration reference string to a registered
    /// resource id.
    ///
    /// Accepts `${aws_s3_bucket.foo.id}`, `aws_s3_bucket.foo.arn`, bare
    /// `aws_s3_bucket.foo`, and the `data.<type>.<name>` forms. Returns
    /// `None` for anything that does not name a registered resource.
    #[must_use]
    pub fn resolve_reference(&self, raw: &str) -> Option<String> {
        let cleaned = raw.replace("${", "").replace('}', "");
        let parts: Vec<&str> = cleaned.split('.').collect();
        if parts.len() < 2 {
            return None;
        }
        let candidate = if parts[0] == "data" {
            if parts.len() < 3 {
                return None;
            }
            format!("data.{}.{}", parts[1], parts[2])
        } else {
            format!("{}.{}", parts[0], parts[1])
        };
        self.slots.contains_key(&candidate).then_some(candidate)
    }

    /// Finds a registered storage bucket by its configured bucket name or
    /// its resource name.
    ///
    /// Log destinations reference buckets by name rather than by id, so
    /// this acts as a rudimentary symbol-table lookup for `logs_to` wiring.
    #[must_use]
    pub fn find_bucket_by_name(&self, bucket_name: &str) -> Option<String> {
        let mut candidates: Vec<&Resource> = self
            .resources
            .iter()
            .filter(|r| r.kind == ResourceKind::S3Bucket)
            .collect();
        candidates.sort_by(|a, b| a.id.cmp(&b.id));
        candidates
            .into_iter()
            .find(|r| {
                r.attribute("bucket").and_then(Value::as_str) == Some(bucket_name)
                    || r.name == bucket_name
            })
            .map(|r| r.id.clone())
    }

    /// Builds the graph.
    #[must_use]
    pub fn build(self) -> ResourceGraph {
        let Self {
            mut resources,
            slots: _,
            relations,
        } = self;
        resources.sort_by(|a, b| a.id.cmp(&b.id));

        let mut graph = StableDiGraph::default();
        let mut index = FxHashMap::default();
        for resource in resources {
            let id = resource.id.clone();
            let idx = graph.add_node(resource);
            index.insert(id, idx);
        }

        for (source, target, relationship) in relations {
            let (Some(&src), Some(&dst)) = (index.get(&source), index.get(&target)) else {
                tracing::warn!(
                    %source,
                    %target,
                    %relationship,
                    "skipping relationship with missing endpoint"
                );
                continue;
            };
            graph.add_edge(src, dst, relationship);
        }

        ResourceGraph::from_parts(graph, index)
    }
}
