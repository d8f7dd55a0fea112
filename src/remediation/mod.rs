//! Reachability analysis and fix prioritization.
//!
//! Two complementary views over the attack graph:
//!
//! - [`paths`] enumerates bounded simple paths from `Internet` to the
//!   sensitive sinks and selects the shortest critical path
//! - [`fix`] greedily breaks the edge participating in the most paths until
//!   the origin is disconnected, yielding an ordered remediation list
//! - [`priority`] ranks individual resources by a deterministic risk
//!   formula over path participation and misconfiguration findings
//!
//! Path enumeration is worst-case exponential; the edge-count cutoff
//! (default 10) is the defense and is part of the contract: a sink beyond
//! the cutoff is reported as unreachable.

pub mod fix;
pub mod paths;
pub mod priority;

pub use fix::{Remediation, calculate_fix_order};
pub use paths::{AttackPath, AttackStep, critical_path, enumerate_paths, sensitive_sinks};
pub use priority::{PriorityFix, prioritize};

/// Default cutoff, in edges, for simple-path enumeration.
pub const DEFAULT_PATH_CUTOFF: usize = 10;
