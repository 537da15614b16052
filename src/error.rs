//! Error types for reference resolution and checking.

use thiserror::Error;

use crate::location::ContainerKind;

/// The failure kinds a resolution run can abort with.
///
/// Resolution is fail-fast: the first error aborts the run, and nothing is
/// ever downgraded to a warning.
#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error("malformed reference \"{reference}\": {reason}")]
    MalformedReference { reference: String, reason: String },

    // Transport failure (exit code 3). Retry policy belongs to the
    // injected fetcher, never here.
    #[error("cannot resolve {reference}: {message}")]
    UnresolvableReference { reference: String, message: String },

    #[error("{uri} is not a JSON document: {source}")]
    UnsupportedFormat {
        uri: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("pointer not found in {reference}: longest resolvable prefix is \"{prefix}\"")]
    PointerNotFound { reference: String, prefix: String },

    #[error("cyclic reference: {}", .cycle.join(" -> "))]
    CyclicReference { cycle: Vec<String> },

    #[error("invalid {kind} reference {reference}: {reason}")]
    InvalidReferenceLocation {
        reference: String,
        kind: ContainerKind,
        reason: String,
    },

    #[error("sibling keys alongside $ref at {pointer}: {}", .keys.join(", "))]
    ReferenceSiblingConflict { pointer: String, keys: Vec<String> },

    #[error("{reference} resolved to {actual}, expected a {kind} object")]
    TypeMismatch {
        reference: String,
        kind: ContainerKind,
        actual: String,
    },

    #[error("maximum reference depth {limit} exceeded at {reference}")]
    MaxDepthExceeded { reference: String, limit: usize },
}

/// A failed resolution run: what went wrong, and where.
///
/// `trail` is the chain of canonical references that was being resolved when
/// the failure occurred, outermost first, so callers can report a precise
/// location to the document author.
#[derive(Debug, Error)]
#[error("{kind}{}", fmt_trail(.trail))]
pub struct ResolveError {
    pub kind: ErrorKind,
    pub trail: Vec<String>,
}

fn fmt_trail(trail: &[String]) -> String {
    if trail.is_empty() {
        String::new()
    } else {
        format!(" (via {})", trail.join(" -> "))
    }
}

impl From<ErrorKind> for ResolveError {
    fn from(kind: ErrorKind) -> Self {
        ResolveError {
            kind,
            trail: Vec::new(),
        }
    }
}

impl ErrorKind {
    /// Attach the traversal path that led to this failure.
    pub fn at(self, trail: Vec<String>) -> ResolveError {
        ResolveError { kind: self, trail }
    }
}

impl ResolveError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self.kind {
            // Transport/IO
            ErrorKind::UnresolvableReference { .. } => 3,
            // Document/reference errors
            _ => 2,
        }
    }
}
