//! Reference graph resolution.
//!
//! Depth-first traversal of a document tree that dereferences every `$ref`
//! node: canonicalize, enforce container locations, load external documents
//! through the cache, evaluate pointers, and recurse into the target with
//! the target document's own base URI as context. Resolved nodes are
//! memoized per canonical reference; the in-progress stack detects cycles
//! without producing false positives across independent branches.

use std::collections::BTreeMap;
use std::rc::Rc;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{ErrorKind, ResolveError};
use crate::fetcher::{Document, DocumentCache, Fetch};
use crate::location::{check_target_shape, validate_internal, Context};
use crate::reference::{canonicalize, CanonicalReference};
use crate::types::ResolveOptions;

/// Keys tolerated next to `$ref` as annotations. They are never merged into
/// the target: references carry no override data.
const ALLOWED_SIBLINGS: &[&str] = &["description", "summary"];

/// Where a resolved value came from, for diagnostics and provenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Origin {
    /// Base URI of the document holding the target (`""` for the root).
    pub uri: String,
    /// Pointer to the target within that document (`""` for its root).
    pub pointer: String,
}

/// The dereferenced value a reference ultimately points to.
///
/// The value is a read-only snapshot, fully dereferenced at creation and
/// never mutated by any referrer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedNode {
    pub value: Value,
    pub origin: Origin,
}

/// Every reference encountered in one resolution run, mapped to its
/// resolved node. Keys are canonical reference strings.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceGraph {
    root_uri: String,
    resolved: BTreeMap<String, ResolvedNode>,
}

impl ReferenceGraph {
    /// Base URI the root document was resolved under.
    pub fn root_uri(&self) -> &str {
        &self.root_uri
    }

    /// Look up a resolved node by canonical reference string.
    pub fn get(&self, canonical: &str) -> Option<&ResolvedNode> {
        self.resolved.get(canonical)
    }

    pub fn len(&self) -> usize {
        self.resolved.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resolved.is_empty()
    }

    /// Iterate resolved references in canonical (sorted) order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &ResolvedNode)> {
        self.resolved.iter()
    }

    pub(crate) fn lookups(&self) -> &BTreeMap<String, ResolvedNode> {
        &self.resolved
    }
}

/// Resolve every reference reachable from `root`.
///
/// `root_uri` identifies the root document (a path, a URL, or `""`);
/// references found inside externally fetched documents resolve against the
/// document that holds them, not against the root.
///
/// # Errors
///
/// Fails fast with the first [`ResolveError`] encountered; a partially
/// resolved graph is never returned.
pub fn resolve(
    root: &Value,
    root_uri: &str,
    fetcher: &dyn Fetch,
    options: &ResolveOptions,
) -> Result<ReferenceGraph, ResolveError> {
    let mut walker = Walker {
        cache: DocumentCache::new(root, root_uri, fetcher),
        options,
        resolved: BTreeMap::new(),
        in_progress: Vec::new(),
    };

    let root_doc = walker.cache.load(root_uri).map_err(ResolveError::from)?;
    walker.walk(&root_doc.root, &root_doc, "", Context::Root)?;

    Ok(ReferenceGraph {
        root_uri: root_uri.to_string(),
        resolved: walker.resolved,
    })
}

struct Walker<'a> {
    cache: DocumentCache<'a>,
    options: &'a ResolveOptions,
    resolved: BTreeMap<String, ResolvedNode>,
    /// Canonical references currently being resolved, outermost first.
    /// Stack discipline keeps cycle detection path-scoped.
    in_progress: Vec<String>,
}

impl Walker<'_> {
    fn fail(&self, kind: ErrorKind) -> ResolveError {
        kind.at(self.in_progress.clone())
    }

    /// Rebuild `value`, dereferencing every reference node found beneath it.
    /// `site` is the pointer to `value` within `doc`, for diagnostics.
    fn walk(
        &mut self,
        value: &Value,
        doc: &Rc<Document>,
        site: &str,
        ctx: Context,
    ) -> Result<Value, ResolveError> {
        match value {
            Value::Object(map) => {
                if let Some(Value::String(target)) = map.get("$ref") {
                    return self.resolve_ref(target, map, doc, site, ctx);
                }
                let mut out = Map::new();
                for (key, child) in map {
                    let child_site = format!("{site}/{key}");
                    let resolved = self.walk(child, doc, &child_site, ctx.child_key(key))?;
                    out.insert(key.clone(), resolved);
                }
                Ok(Value::Object(out))
            }
            Value::Array(arr) => {
                let mut out = Vec::with_capacity(arr.len());
                for (i, item) in arr.iter().enumerate() {
                    let child_site = format!("{site}/{i}");
                    out.push(self.walk(item, doc, &child_site, ctx.child_index())?);
                }
                Ok(Value::Array(out))
            }
            other => Ok(other.clone()),
        }
    }

    fn resolve_ref(
        &mut self,
        target: &str,
        node: &Map<String, Value>,
        doc: &Rc<Document>,
        site: &str,
        ctx: Context,
    ) -> Result<Value, ResolveError> {
        // References never carry override data: anything beyond annotations
        // next to $ref is a modeling error, not something to merge.
        let extras: Vec<String> = node
            .keys()
            .filter(|k| *k != "$ref" && !ALLOWED_SIBLINGS.contains(&k.as_str()))
            .cloned()
            .collect();
        if !extras.is_empty() {
            return Err(self.fail(ErrorKind::ReferenceSiblingConflict {
                pointer: site.to_string(),
                keys: extras,
            }));
        }

        let reference = canonicalize(&doc.uri, target).map_err(|kind| self.fail(kind))?;
        let canonical = reference.to_string();
        let kind = ctx.ref_kind();
        let internal = reference.is_internal_to(&doc.uri);

        if internal {
            if let Some(kind) = kind {
                validate_internal(&reference, kind).map_err(|k| self.fail(k))?;
            }
        } else if !self.options.follow_external {
            // Caller opted out: pass the reference node through untouched.
            return Ok(Value::Object(node.clone()));
        }

        if let Some(existing) = self.resolved.get(&canonical) {
            // Shape requirements depend on the use site, so a cached external
            // target must still pass the check for this site's kind.
            if !internal {
                if let Some(kind) = kind {
                    check_target_shape(&reference, kind, &existing.value)
                        .map_err(|k| self.fail(k))?;
                }
            }
            return Ok(existing.value.clone());
        }

        if self.in_progress.contains(&canonical) {
            let mut cycle = self.in_progress.clone();
            cycle.push(canonical);
            return Err(self.fail(ErrorKind::CyclicReference { cycle }));
        }

        if let Some(limit) = self.options.max_depth {
            if self.in_progress.len() >= limit {
                return Err(self.fail(ErrorKind::MaxDepthExceeded {
                    reference: canonical,
                    limit,
                }));
            }
        }

        let target_doc = if internal {
            Rc::clone(doc)
        } else {
            self.cache
                .load(&reference.base)
                .map_err(|k| self.fail(k))?
        };

        let target_value = self.locate(&reference, &canonical, &target_doc)?;

        // External targets escape the path-shape check but must still look
        // like the kind of entity the use site expects.
        if !internal {
            if let Some(kind) = kind {
                check_target_shape(&reference, kind, &target_value).map_err(|k| self.fail(k))?;
            }
        }

        // A referenced node may itself contain further references; resolve
        // them relative to the document that holds the target.
        let origin_pointer = reference
            .pointer
            .as_ref()
            .map(|p| p.to_string())
            .unwrap_or_default();
        let next_ctx = kind.map(Context::for_kind).unwrap_or(Context::Neutral);

        self.in_progress.push(canonical.clone());
        let walked = self.walk(&target_value, &target_doc, &origin_pointer, next_ctx);
        self.in_progress.pop();
        let value = walked?;

        self.resolved.insert(
            canonical,
            ResolvedNode {
                value: value.clone(),
                origin: Origin {
                    uri: target_doc.uri.clone(),
                    pointer: origin_pointer,
                },
            },
        );
        Ok(value)
    }

    /// Evaluate the reference's pointer inside its target document.
    fn locate(
        &self,
        reference: &CanonicalReference,
        canonical: &str,
        target_doc: &Document,
    ) -> Result<Value, ResolveError> {
        match &reference.pointer {
            Some(pointer) => match pointer.evaluate(&target_doc.root) {
                Ok(value) => Ok(value.clone()),
                Err(miss) => Err(self.fail(ErrorKind::PointerNotFound {
                    reference: canonical.to_string(),
                    prefix: miss.resolved_prefix,
                })),
            },
            None => {
                // Pointer-less reference: only unambiguous whole-document
                // targets are accepted; never guess an entry.
                if let Some(map) = target_doc.root.as_object() {
                    if map.len() > 1 {
                        return Err(self.fail(ErrorKind::MalformedReference {
                            reference: canonical.to_string(),
                            reason: "document has multiple top-level entries; a pointer is required"
                                .to_string(),
                        }));
                    }
                }
                Ok(target_doc.root.clone())
            }
        }
    }
}
