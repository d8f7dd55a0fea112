//! Normalization of policy payloads into statement lists.

use serde_json::{Map, Value};
use thiserror::Error;

/// A policy document as attached to a resource: either already structured
/// or a raw string that may be JSON or heredoc-quoted JSON.
#[derive(Clone, Debug, PartialEq)]
pub enum PolicyPayload {
    /// A parsed document, used as-is.
    Structured(Map<String, Value>),
    /// A raw string, normalized before parsing.
    Raw(String),
}

impl PolicyPayload {
    /// Convert a resource attribute into a payload.
    ///
    /// Objects become [`Structured`](Self::Structured), strings become
    /// [`Raw`](Self::Raw); any other shape is not a policy.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self::Structured(map.clone())),
            Value::String(raw) => Some(Self::Raw(raw.clone())),
            _ => None,
        }
    }
}

/// Errors raised while parsing a raw policy payload.
///
/// These never escape the evaluator: a document that fails to parse is
/// treated as empty and grants no capability.
#[derive(Debug, Error)]
pub enum PolicyParseError {
    /// The payload text is not valid JSON.
    #[error("policy document is not valid JSON: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },
    /// The payload parsed, but the top level is not a JSON object.
    #[error("policy document is not a JSON object")]
    NotAnObject,
}

/// A single `Allow` statement, normalized to string sequences.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Statement {
    /// Action patterns, possibly wildcarded.
    pub actions: Vec<String>,
    /// Resource patterns.
    pub resources: Vec<String>,
}

impl Statement {
    /// Normalize one statement object. Statements whose `Effect` is not
    /// `Allow` are dropped; a missing `Effect` defaults to `Allow`.
    fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let effect = obj.get("Effect").and_then(Value::as_str).unwrap_or("Allow");
        if effect != "Allow" {
            return None;
        }
        Some(Self {
            actions: string_list(obj.get("Action")),
            resources: string_list(obj.get("Resource")),
        })
    }
}

/// A normalized policy document: the `Allow` statements it contains.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PolicyDocument {
    /// Normalized statements in document order.
    pub statements: Vec<Statement>,
}

impl PolicyDocument {
    /// Parse a payload into a document.
    ///
    /// Raw strings are trimmed and stripped of `<<EOF` / `<<-EOF` heredoc
    /// framing before JSON parsing. The `Statement` field may be a single
    /// object or a sequence; both normalize to a sequence.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyParseError`] when a raw payload is not valid JSON or
    /// does not parse to an object.
    pub fn parse(payload: &PolicyPayload) -> Result<Self, PolicyParseError> {
        let doc: Map<String, Value> = match payload {
            PolicyPayload::Structured(map) => map.clone(),
            PolicyPayload::Raw(raw) => match serde_json::from_str(strip_heredoc(raw))? {
                Value::Object(map) => map,
                _ => return Err(PolicyParseError::NotAnObject),
            },
        };

        let statements = match doc.get("Statement") {
            Some(Value::Array(items)) => items.iter().filter_map(Statement::from_value).collect(),
            Some(single @ Value::Object(_)) => {
                Statement::from_value(single).into_iter().collect()
            }
            _ => Vec::new(),
        };
        Ok(Self { statements })
    }

    /// Parse a payload, absorbing failures into an empty document.
    #[must_use]
    pub fn parse_lenient(payload: &PolicyPayload) -> Self {
        Self::parse(payload).unwrap_or_else(|err| {
            tracing::warn!(%err, "treating malformed policy document as empty");
            Self::default()
        })
    }
}

/// Strip heredoc framing from a raw policy string.
///
/// Accepts `<<EOF` and `<<-EOF` introducers with a matching trailing `EOF`
/// terminator. Anything else passes through trimmed.
fn strip_heredoc(raw: &str) -> &str {
    let mut text = raw.trim();
    for introducer in ["<<-EOF", "<<EOF"] {
        if let Some(rest) = text.strip_prefix(introducer) {
            text = rest.trim_end();
            if let Some(body) = text.strip_suffix("EOF") {
                text = body;
            }
            break;
        }
    }
    text.trim()
}

/// Normalize a string-or-sequence field to a vector of strings.
fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::String(s)) => vec![s.clone()],
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_owned)
            .collect(),
        _ => Vec::new(),
    }
}
