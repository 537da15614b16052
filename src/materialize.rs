//! Emission of resolved documents.
//!
//! Once a [`ReferenceGraph`] exists, materialization is a pure tree
//! rewrite: inline mode substitutes every reference node with its resolved
//! value, preserving mode keeps the document verbatim and attaches the
//! graph's lookups alongside.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{ErrorKind, ResolveError};
use crate::reference::canonicalize;
use crate::resolver::{ReferenceGraph, ResolvedNode};
use crate::types::Mode;

/// A materialized document: the rewritten tree plus, in preserving mode,
/// the resolution lookups keyed by canonical reference.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedDocument {
    pub mode: Mode,
    pub root: Value,
    #[serde(skip_serializing_if = "std::collections::BTreeMap::is_empty")]
    pub resolutions: std::collections::BTreeMap<String, ResolvedNode>,
}

/// Rewrite `root` according to `mode`, using a graph produced by a prior
/// [`resolve`](crate::resolver::resolve) run over the same document.
///
/// # Errors
///
/// Fails when the document contains a reference the graph has no entry for,
/// which indicates the graph was built from a different tree.
pub fn materialize(
    graph: &ReferenceGraph,
    root: &Value,
    mode: Mode,
) -> Result<ResolvedDocument, ResolveError> {
    match mode {
        Mode::Inline => Ok(ResolvedDocument {
            mode,
            root: inline_value(graph, root, graph.root_uri())?,
            resolutions: Default::default(),
        }),
        Mode::Preserving => Ok(ResolvedDocument {
            mode,
            root: root.clone(),
            resolutions: graph.lookups().clone(),
        }),
    }
}

/// Substitute reference nodes bottom-up. Graph values are already fully
/// dereferenced, so a hit needs no further rewriting.
fn inline_value(graph: &ReferenceGraph, value: &Value, base: &str) -> Result<Value, ResolveError> {
    match value {
        Value::Object(map) => {
            if let Some(Value::String(target)) = map.get("$ref") {
                return inline_ref(graph, map, target, base);
            }
            let mut out = Map::new();
            for (key, child) in map {
                out.insert(key.clone(), inline_value(graph, child, base)?);
            }
            Ok(Value::Object(out))
        }
        Value::Array(arr) => arr
            .iter()
            .map(|item| inline_value(graph, item, base))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        other => Ok(other.clone()),
    }
}

fn inline_ref(
    graph: &ReferenceGraph,
    node: &Map<String, Value>,
    target: &str,
    base: &str,
) -> Result<Value, ResolveError> {
    let reference = canonicalize(base, target).map_err(ResolveError::from)?;
    let canonical = reference.to_string();

    if let Some(resolved) = graph.get(&canonical) {
        return Ok(resolved.value.clone());
    }

    // External references stay verbatim when resolution skipped them
    // (follow_external was off). A missing internal entry means the graph
    // does not belong to this tree.
    if !reference.is_internal_to(base) {
        return Ok(Value::Object(node.clone()));
    }

    Err(ResolveError::from(ErrorKind::UnresolvableReference {
        reference: canonical,
        message: "reference missing from resolution graph".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::NullFetcher;
    use crate::resolver::resolve;
    use crate::types::ResolveOptions;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "swagger": "2.0",
            "definitions": { "Pet": { "type": "object" } },
            "paths": { "/pets": { "get": { "responses": { "200": {
                "description": "ok",
                "schema": { "$ref": "#/definitions/Pet" }
            }}}}}
        })
    }

    #[test]
    fn inline_substitutes_reference_nodes() {
        let doc = sample();
        let graph = resolve(&doc, "", &NullFetcher, &ResolveOptions::default()).unwrap();

        let out = materialize(&graph, &doc, Mode::Inline).unwrap();
        assert_eq!(
            out.root["paths"]["/pets"]["get"]["responses"]["200"]["schema"],
            json!({ "type": "object" })
        );
        assert!(out.resolutions.is_empty());
    }

    #[test]
    fn inline_is_deterministic() {
        let doc = sample();
        let graph = resolve(&doc, "", &NullFetcher, &ResolveOptions::default()).unwrap();

        let a = materialize(&graph, &doc, Mode::Inline).unwrap();
        let b = materialize(&graph, &doc, Mode::Inline).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn preserving_keeps_document_verbatim() {
        let doc = sample();
        let graph = resolve(&doc, "", &NullFetcher, &ResolveOptions::default()).unwrap();

        let out = materialize(&graph, &doc, Mode::Preserving).unwrap();
        assert_eq!(out.root, doc);
        assert_eq!(out.resolutions.len(), 1);
        assert_eq!(
            out.resolutions["#/definitions/Pet"].value,
            json!({ "type": "object" })
        );
    }

    #[test]
    fn preserving_serializes_with_resolutions() {
        let doc = sample();
        let graph = resolve(&doc, "", &NullFetcher, &ResolveOptions::default()).unwrap();

        let out = materialize(&graph, &doc, Mode::Preserving).unwrap();
        let text = serde_json::to_string(&out).unwrap();
        assert!(text.contains("\"resolutions\""));
        assert!(text.contains("\"mode\":\"preserving\""));
    }

    #[test]
    fn inline_leaves_unfollowed_external_refs_in_place() {
        let doc = json!({
            "paths": { "/pets": { "get": { "responses": { "200": {
                "description": "ok",
                "schema": { "$ref": "common.json#/definitions/Pet" }
            }}}}}
        });
        let options = ResolveOptions::new().follow_external(false);
        let graph = resolve(&doc, "", &NullFetcher, &options).unwrap();

        let out = materialize(&graph, &doc, Mode::Inline).unwrap();
        assert_eq!(
            out.root["paths"]["/pets"]["get"]["responses"]["200"]["schema"],
            json!({ "$ref": "common.json#/definitions/Pet" })
        );
    }

    #[test]
    fn inline_fails_for_foreign_graph() {
        let doc = sample();
        let other = json!({ "definitions": {} });
        let graph = resolve(&other, "", &NullFetcher, &ResolveOptions::default()).unwrap();

        let err = materialize(&graph, &doc, Mode::Inline).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::UnresolvableReference { .. }));
    }
}
