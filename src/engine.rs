//! The analysis entry point and serializable report.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::attack::{AttackGraph, AttackGraphExport, build_attack_graph};
use crate::graph::ResourceGraph;
use crate::model::RuleResult;
use crate::remediation::{
    self, AttackPath, DEFAULT_PATH_CUTOFF, PriorityFix, Remediation,
};

/// Tuning knobs for an analysis.
///
/// The path cutoff bounds simple-path enumeration in edges. It defaults to
/// [`DEFAULT_PATH_CUTOFF`] and is a contract rather than a tunable: sinks
/// beyond the cutoff are reported as unreachable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Maximum number of edges on an enumerated path.
    pub path_cutoff: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            path_cutoff: DEFAULT_PATH_CUTOFF,
        }
    }
}

impl EngineConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the enumeration cutoff.
    #[must_use]
    pub fn with_path_cutoff(mut self, cutoff: usize) -> Self {
        self.path_cutoff = cutoff;
        self
    }
}

/// The full result of one analysis.
///
/// Serialization order is fixed and every collection is pre-sorted, so the
/// JSON form of a report is byte-identical across runs on equal input.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Snapshot of the attack graph for visualization.
    pub attack_graph: AttackGraphExport,
    /// The shortest path from `Internet` to a sink, when one exists.
    pub critical_path: Option<AttackPath>,
    /// Greedy path-breaking remediation order.
    pub remediations: Vec<Remediation>,
    /// Per-resource priority ranking.
    pub priority_fixes: Vec<PriorityFix>,
}

/// A single analysis over one resource graph.
///
/// Every analysis is a fresh engine instance; the attack overlay is built
/// eagerly at construction and stays read-only afterwards. The fix loop
/// simulates removals on its own private copy.
#[derive(Debug)]
pub struct AnalysisEngine {
    resources: ResourceGraph,
    findings: Vec<RuleResult>,
    attack: AttackGraph,
    sinks: Vec<String>,
    config: EngineConfig,
}

impl AnalysisEngine {
    /// Build an engine with the default configuration.
    #[must_use]
    pub fn new(resources: ResourceGraph, findings: Vec<RuleResult>) -> Self {
        Self::with_config(resources, findings, EngineConfig::default())
    }

    /// Build an engine with an explicit configuration.
    ///
    /// # Panics
    ///
    /// Panics if overlay construction violates the `Internet` origin
    /// invariant. That indicates a constructor bug, the one fatal class;
    /// every expected anomaly is absorbed instead.
    #[must_use]
    pub fn with_config(
        resources: ResourceGraph,
        findings: Vec<RuleResult>,
        config: EngineConfig,
    ) -> Self {
        let attack = build_attack_graph(&resources);
        assert!(
            attack.origin_is_valid(),
            "attack graph lost its Internet origin"
        );
        let sinks = remediation::sensitive_sinks(&resources);
        info!(
            resources = resources.node_count(),
            attack_edges = attack.edge_count(),
            sinks = sinks.len(),
            "attack overlay constructed"
        );
        Self {
            resources,
            findings,
            attack,
            sinks,
            config,
        }
    }

    /// The constructed attack graph, read-only.
    #[must_use]
    pub fn attack_graph(&self) -> &AttackGraph {
        &self.attack
    }

    /// The sensitive sinks of the analyzed resource graph, in id order.
    #[must_use]
    pub fn sinks(&self) -> &[String] {
        &self.sinks
    }

    /// The shortest attack path to any sink, if one exists within the
    /// cutoff.
    #[must_use]
    pub fn critical_path(&self) -> Option<AttackPath> {
        remediation::critical_path(&self.attack, &self.sinks, self.config.path_cutoff)
    }

    /// The greedy path-breaking remediation order.
    #[must_use]
    pub fn remediations(&self) -> Vec<Remediation> {
        remediation::calculate_fix_order(&self.attack, &self.sinks, self.config.path_cutoff)
    }

    /// The per-resource priority ranking.
    #[must_use]
    pub fn priority_fixes(&self) -> Vec<PriorityFix> {
        let paths = self.enumerated_path_ids();
        remediation::prioritize(&self.resources, &self.attack, &paths, &self.findings)
    }

    /// Run the complete analysis.
    #[must_use]
    pub fn analyze(&self) -> AnalysisReport {
        AnalysisReport {
            attack_graph: self.attack.export(),
            critical_path: self.critical_path(),
            remediations: self.remediations(),
            priority_fixes: self.priority_fixes(),
        }
    }

    fn enumerated_path_ids(&self) -> Vec<Vec<String>> {
        remediation::enumerate_paths(&self.attack, &self.sinks, self.config.path_cutoff)
            .iter()
            .map(|path| {
                path.iter()
                    .map(|&idx| self.attack.node_at(idx).id().to_string())
                    .collect()
            })
            .collect()
    }
}

/// Analyze a resource graph in one call.
#[must_use]
pub fn analyze(resources: ResourceGraph, findings: Vec<RuleResult>) -> AnalysisReport {
    AnalysisEngine::new(resources, findings).analyze()
}
