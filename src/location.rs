//! Canonical-location rules for references.
//!
//! Reusable entities live under designated root containers: models under
//! `definitions`, parameters under `parameters`, responses under
//! `responses`. Internal references must point into the matching container;
//! external references are exempt from the path-shape check (the target
//! file's layout is its author's business) but their resolved target must
//! still look like the expected kind of object. Operations are only ever
//! referenceable from another document.

use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::error::ErrorKind;
use crate::reference::CanonicalReference;
use crate::types::json_type_name;

/// The kind of reusable entity a reference names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerKind {
    Definitions,
    Parameters,
    Responses,
    Operation,
}

impl ContainerKind {
    /// Root container key internal references of this kind must sit under.
    /// Operations have none: they are externally referenceable only.
    pub fn root_key(self) -> Option<&'static str> {
        match self {
            ContainerKind::Definitions => Some("definitions"),
            ContainerKind::Parameters => Some("parameters"),
            ContainerKind::Responses => Some("responses"),
            ContainerKind::Operation => None,
        }
    }
}

impl fmt::Display for ContainerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ContainerKind::Definitions => "definition",
            ContainerKind::Parameters => "parameter",
            ContainerKind::Responses => "response",
            ContainerKind::Operation => "operation",
        };
        f.write_str(name)
    }
}

/// Check that an internal reference lands under its designated container.
///
/// # Errors
///
/// Returns `InvalidReferenceLocation` for internal operation references and
/// for pointers whose first token is not the expected container key.
pub fn validate_internal(
    reference: &CanonicalReference,
    kind: ContainerKind,
) -> Result<(), ErrorKind> {
    let Some(root_key) = kind.root_key() else {
        return Err(ErrorKind::InvalidReferenceLocation {
            reference: reference.to_string(),
            kind,
            reason: "operations may only be referenced from another document".to_string(),
        });
    };

    // Container key plus at least an entry name: "#/definitions" alone
    // names the container, not a reusable entity.
    let tokens = reference.pointer.as_ref().map(|p| p.tokens()).unwrap_or(&[]);
    if tokens.first().map(String::as_str) == Some(root_key) && tokens.len() >= 2 {
        Ok(())
    } else {
        Err(ErrorKind::InvalidReferenceLocation {
            reference: reference.to_string(),
            kind,
            reason: format!("internal {kind} references must point under #/{root_key}/"),
        })
    }
}

/// Check that a dereferenced external target is structurally plausible for
/// the expected kind.
///
/// # Errors
///
/// Returns `TypeMismatch` when the target is not an object, or is missing
/// the fields that make it recognizable as the expected kind.
pub fn check_target_shape(
    reference: &CanonicalReference,
    kind: ContainerKind,
    target: &Value,
) -> Result<(), ErrorKind> {
    let Some(map) = target.as_object() else {
        return Err(mismatch(reference, kind, json_type_name(target)));
    };

    match kind {
        ContainerKind::Parameters if !(map.contains_key("name") && map.contains_key("in")) => Err(
            mismatch(reference, kind, "an object without \"name\" and \"in\""),
        ),
        ContainerKind::Responses if !map.contains_key("description") => Err(mismatch(
            reference,
            kind,
            "an object without \"description\"",
        )),
        _ => Ok(()),
    }
}

fn mismatch(reference: &CanonicalReference, kind: ContainerKind, actual: &str) -> ErrorKind {
    ErrorKind::TypeMismatch {
        reference: reference.to_string(),
        kind,
        actual: actual.to_string(),
    }
}

/// Where a walk currently is inside a Swagger document. Decides which
/// [`ContainerKind`] a `$ref` found at that position names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Context {
    Root,
    Paths,
    PathItem,
    Operation,
    ParameterList,
    Parameter,
    ResponseMap,
    Response,
    SchemaMap,
    Schema,
    Neutral,
}

const METHODS: &[&str] = &["get", "put", "post", "delete", "options", "head", "patch"];

impl Context {
    /// Context to continue under after dereferencing a target of `kind`.
    pub(crate) fn for_kind(kind: ContainerKind) -> Context {
        match kind {
            ContainerKind::Definitions => Context::Schema,
            ContainerKind::Parameters => Context::Parameter,
            ContainerKind::Responses => Context::Response,
            ContainerKind::Operation => Context::PathItem,
        }
    }

    /// Context after descending into `key` of an object.
    pub(crate) fn child_key(self, key: &str) -> Context {
        match self {
            Context::Root => match key {
                "paths" => Context::Paths,
                "definitions" => Context::SchemaMap,
                "parameters" => Context::ParameterList,
                "responses" => Context::ResponseMap,
                _ => Context::Neutral,
            },
            Context::Paths => Context::PathItem,
            Context::PathItem => {
                if METHODS.contains(&key) {
                    Context::Operation
                } else if key == "parameters" {
                    Context::ParameterList
                } else {
                    Context::Neutral
                }
            }
            Context::Operation => match key {
                "parameters" => Context::ParameterList,
                "responses" => Context::ResponseMap,
                _ => Context::Neutral,
            },
            Context::ParameterList => Context::Parameter,
            Context::ResponseMap => Context::Response,
            Context::Parameter | Context::Response => {
                if key == "schema" {
                    Context::Schema
                } else {
                    Context::Neutral
                }
            }
            Context::SchemaMap => Context::Schema,
            Context::Schema => match key {
                "properties" | "definitions" => Context::SchemaMap,
                "items" | "additionalProperties" | "allOf" | "not" => Context::Schema,
                _ => Context::Neutral,
            },
            Context::Neutral => Context::Neutral,
        }
    }

    /// Context after descending into an array element.
    pub(crate) fn child_index(self) -> Context {
        match self {
            Context::ParameterList => Context::Parameter,
            // allOf branches
            Context::Schema => Context::Schema,
            _ => Context::Neutral,
        }
    }

    /// The entity kind a `$ref` sitting at this position names, if the
    /// position is constrained at all.
    pub(crate) fn ref_kind(self) -> Option<ContainerKind> {
        match self {
            Context::PathItem => Some(ContainerKind::Operation),
            Context::Parameter => Some(ContainerKind::Parameters),
            Context::Response => Some(ContainerKind::Responses),
            Context::Schema => Some(ContainerKind::Definitions),
            _ => None,
        }
    }
}
