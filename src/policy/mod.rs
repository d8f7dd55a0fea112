//! Policy document normalization and capability decisions.
//!
//! Identity policies arrive in whatever shape the configuration parser
//! preserved: already-structured maps, raw JSON strings, or heredoc-quoted
//! JSON strings. [`document`] normalizes all of these into a uniform
//! statement list; [`evaluate`] then decides whether the statements grant
//! one of a small set of coarse-grained [`Capability`] levels against a
//! target resource.
//!
//! Evaluation never fails: malformed documents are treated as empty and
//! grant nothing. This is deliberate, since a policy the engine cannot read
//! must not invent access the attacker may not have.
//!
//! # Examples
//!
//! ```
//! use breachgraph::model::Resource;
//! use breachgraph::policy::{self, Capability, PolicyPayload};
//!
//! let payload = PolicyPayload::Raw(
//!     r#"{"Statement": {"Effect": "Allow", "Action": "*", "Resource": "*"}}"#.to_string(),
//! );
//! let target = Resource::new("aws_s3_bucket", "data");
//!
//! let capability = policy::evaluate(&[payload], &target);
//! assert_eq!(capability, Some(Capability::FullAdmin));
//! ```

mod capability;
mod document;

pub use capability::{Capability, evaluate};
pub use document::{PolicyDocument, PolicyParseError, PolicyPayload, Statement};
