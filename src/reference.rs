//! Canonicalization of `$ref` strings into absolute references.
//!
//! A reference string is either an internal fragment (`#/definitions/Pet`),
//! an external URI with an optional fragment (`common.json#/definitions/Pet`,
//! `http://host/spec.json`), or malformed. Canonicalization resolves the URI
//! part against the referring document's base URI and validates the fragment
//! as a JSON Pointer, producing the identity used for caching and cycle
//! detection.

use std::fmt;

use url::Url;

use crate::error::ErrorKind;
use crate::pointer::JsonPointer;

/// A reference normalized to an absolute base URI plus a validated pointer.
///
/// Equality is structural: same resolved base URI string, same decoded
/// pointer token sequence.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalReference {
    /// Resolved base URI. `""` names the root document when the caller
    /// supplied no URI for it.
    pub base: String,
    /// Pointer into the target document; absent for whole-document refs.
    pub pointer: Option<JsonPointer>,
}

impl CanonicalReference {
    /// True when this reference targets the document identified by
    /// `current_base` itself.
    pub fn is_internal_to(&self, current_base: &str) -> bool {
        self.base == current_base
    }
}

impl fmt::Display for CanonicalReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.pointer {
            Some(pointer) => write!(f, "{}#{}", self.base, pointer),
            None => f.write_str(&self.base),
        }
    }
}

/// Normalize `ref_str` as found in a document with base URI `base_uri`.
///
/// # Errors
///
/// Returns [`ErrorKind::MalformedReference`] for fragments that are not
/// qualified JSON Pointers (`#` alone, `#Bare`), for bare names with no URI
/// shape, and for URIs that fail relative resolution.
pub fn canonicalize(base_uri: &str, ref_str: &str) -> Result<CanonicalReference, ErrorKind> {
    let (uri_part, fragment) = match ref_str.find('#') {
        Some(idx) => (&ref_str[..idx], Some(&ref_str[idx + 1..])),
        None => (ref_str, None),
    };

    let pointer = match fragment {
        Some(frag) => Some(parse_fragment(ref_str, frag)?),
        None => None,
    };

    let base = if uri_part.is_empty() {
        base_uri.to_string()
    } else {
        resolve_uri(base_uri, uri_part, ref_str, fragment.is_some())?
    };

    Ok(CanonicalReference { base, pointer })
}

fn parse_fragment(whole: &str, frag: &str) -> Result<JsonPointer, ErrorKind> {
    if frag.is_empty() {
        return Err(malformed(
            whole,
            "fragment must be a JSON Pointer; \"#\" alone names nothing",
        ));
    }
    if !frag.starts_with('/') {
        return Err(malformed(
            whole,
            &format!(
                "fragment \"{frag}\" is a bare name; a container-qualified pointer such as \"#/definitions/{frag}\" is required"
            ),
        ));
    }
    JsonPointer::parse(frag).map_err(|reason| malformed(whole, &reason))
}

fn resolve_uri(
    base_uri: &str,
    uri_part: &str,
    whole: &str,
    has_fragment: bool,
) -> Result<String, ErrorKind> {
    // Absolute URI: take it as the canonical base directly.
    if let Ok(url) = Url::parse(uri_part) {
        return Ok(url.to_string());
    }

    // A relative ref with no fragment and no path shape is a bare name,
    // not a document: authors must qualify what they mean.
    if !has_fragment && is_bare_name(uri_part) {
        return Err(malformed(
            whole,
            "bare name is neither a pointer fragment nor a document URI",
        ));
    }

    if uri_part.starts_with('/') {
        return Ok(uri_part.to_string());
    }

    // Relative to a URL base: standard URI relative resolution.
    if let Ok(base) = Url::parse(base_uri) {
        return base
            .join(uri_part)
            .map(|u| u.to_string())
            .map_err(|e| malformed(whole, &format!("cannot resolve against {base_uri}: {e}")));
    }

    // Relative to a plain path base: join against its directory.
    Ok(join_path(base_uri, uri_part))
}

fn is_bare_name(s: &str) -> bool {
    !s.contains('/') && !s.contains('.') && !s.contains(':')
}

fn join_path(base: &str, rel: &str) -> String {
    let dir = match base.rfind('/') {
        Some(idx) => &base[..idx + 1],
        None => "",
    };
    let absolute = dir.starts_with('/');
    let mut segments: Vec<&str> = dir.split('/').filter(|s| !s.is_empty() && *s != ".").collect();
    for seg in rel.split('/') {
        match seg {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    let joined = segments.join("/");
    if absolute {
        format!("/{joined}")
    } else {
        joined
    }
}

fn malformed(reference: &str, reason: &str) -> ErrorKind {
    ErrorKind::MalformedReference {
        reference: reference.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn internal_fragment() {
        let r = canonicalize("", "#/definitions/Pet").unwrap();
        assert_eq!(r.base, "");
        assert!(r.is_internal_to(""));
        assert_eq!(r.to_string(), "#/definitions/Pet");
    }

    #[test]
    fn internal_fragment_keeps_document_base() {
        let r = canonicalize("http://host/spec.json", "#/parameters/limit").unwrap();
        assert_eq!(r.base, "http://host/spec.json");
        assert!(r.is_internal_to("http://host/spec.json"));
    }

    #[test]
    fn relative_file_with_fragment() {
        let r = canonicalize("specs/root.json", "common.json#/definitions/Error").unwrap();
        assert_eq!(r.base, "specs/common.json");
        assert_eq!(r.to_string(), "specs/common.json#/definitions/Error");
    }

    #[test]
    fn parent_directory_traversal() {
        let r = canonicalize("specs/v2/root.json", "../shared/common.json").unwrap();
        assert_eq!(r.base, "specs/shared/common.json");
    }

    #[test]
    fn url_relative_resolution() {
        let r = canonicalize(
            "http://host/specs/root.json",
            "common.json#/definitions/Error",
        )
        .unwrap();
        assert_eq!(r.base, "http://host/specs/common.json");
    }

    #[test]
    fn absolute_url_replaces_base() {
        let r = canonicalize("specs/root.json", "http://host/operations.json#/health").unwrap();
        assert_eq!(r.base, "http://host/operations.json");
        assert!(!r.is_internal_to("specs/root.json"));
    }

    #[test]
    fn whole_document_reference_has_no_pointer() {
        let r = canonicalize("root.json", "common.json").unwrap();
        assert_eq!(r.base, "common.json");
        assert!(r.pointer.is_none());
        assert_eq!(r.to_string(), "common.json");
    }

    #[test]
    fn bare_name_is_rejected() {
        let err = canonicalize("", "MyModel").unwrap_err();
        assert!(matches!(err, ErrorKind::MalformedReference { .. }));
    }

    #[test]
    fn bare_fragment_is_rejected() {
        let err = canonicalize("", "#MyModel").unwrap_err();
        assert!(matches!(err, ErrorKind::MalformedReference { .. }));
    }

    #[test]
    fn lone_hash_is_rejected() {
        let err = canonicalize("", "#").unwrap_err();
        assert!(matches!(err, ErrorKind::MalformedReference { .. }));
    }

    #[test]
    fn extensionless_file_with_fragment_is_allowed() {
        // The fragment makes the intent unambiguous even without a path shape.
        let r = canonicalize("root.json", "common#/definitions/Error").unwrap();
        assert_eq!(r.base, "common");
    }

    #[test]
    fn equality_ignores_pointer_spelling() {
        let a = canonicalize("", "#/definitions/a~1b").unwrap();
        let b = canonicalize("", "#/definitions/a%7E1b").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn distinct_bases_are_not_equal() {
        let a = canonicalize("a.json", "#/definitions/X").unwrap();
        let b = canonicalize("b.json", "#/definitions/X").unwrap();
        assert_ne!(a, b);
    }
}
