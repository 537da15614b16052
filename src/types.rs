//! Core option types for resolution runs.

use serde::Serialize;
use serde_json::Value;

/// Returns the JSON type name for error messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// How the materializer emits the resolved document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Replace every reference node with its resolved value, producing a
    /// self-contained tree.
    #[default]
    Inline,
    /// Keep reference nodes and attach resolved-value lookups alongside,
    /// for tools that need provenance.
    Preserving,
}

impl Mode {
    /// Parse a mode from a string.
    ///
    /// Returns `None` for unknown values (caller should error).
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "inline" => Some(Mode::Inline),
            "preserving" => Some(Mode::Preserving),
            _ => None,
        }
    }
}

/// Options for a resolution run.
#[derive(Debug, Clone)]
pub struct ResolveOptions {
    /// Follow references into other documents. When false, external
    /// reference nodes pass through unresolved.
    pub follow_external: bool,
    /// Reference chain depth guard against pathological nesting.
    /// `None` leaves depth unbounded (but still finite: cycles are errors).
    pub max_depth: Option<usize>,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            follow_external: true,
            max_depth: None,
        }
    }
}

impl ResolveOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether external documents are followed.
    pub fn follow_external(mut self, follow: bool) -> Self {
        self.follow_external = follow;
        self
    }

    /// Cap reference chain depth.
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }
}
