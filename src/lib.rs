//! Reference resolution for Swagger 2.0 documents.
//!
//! Swagger documents factor shared structure into reusable entities
//! (definitions, parameters, responses, operations) connected by `$ref`
//! nodes: JSON Pointers into the same document or into other documents by
//! URI. This crate turns such a document into a fully dereferenced form:
//!
//! - [`resolve`] walks the tree, canonicalizes every reference, loads
//!   external documents through an injected [`Fetch`] transport, enforces
//!   container-location rules, and detects cycles, producing a
//!   [`ReferenceGraph`].
//! - [`materialize`] rewrites the document from that graph, either inlining
//!   every reference ([`Mode::Inline`]) or keeping the document verbatim
//!   with resolution lookups attached ([`Mode::Preserving`]).
//! - [`check`] statically scans files for broken references without
//!   building a graph, collecting diagnostics instead of failing fast.
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use swagref::{materialize, resolve, Mode, NullFetcher, ResolveOptions};
//!
//! let doc = json!({
//!     "swagger": "2.0",
//!     "definitions": { "Pet": { "type": "object" } },
//!     "paths": { "/pets": { "get": { "responses": { "200": {
//!         "description": "ok",
//!         "schema": { "$ref": "#/definitions/Pet" }
//!     }}}}}
//! });
//!
//! let graph = resolve(&doc, "", &NullFetcher, &ResolveOptions::default())?;
//! let out = materialize(&graph, &doc, Mode::Inline)?;
//!
//! assert_eq!(
//!     out.root["paths"]["/pets"]["get"]["responses"]["200"]["schema"],
//!     json!({ "type": "object" })
//! );
//! # Ok::<(), swagref::ResolveError>(())
//! ```

pub mod checker;
pub mod error;
pub mod fetcher;
pub mod location;
pub mod materialize;
pub mod pointer;
pub mod reference;
pub mod resolver;
pub mod types;

pub use checker::{check, check_file, CheckResult, Diagnostic, FileResult, FileStatus, Severity};
pub use error::{ErrorKind, ResolveError};
#[cfg(feature = "remote")]
pub use fetcher::HttpFetcher;
pub use fetcher::{Fetch, FileFetcher, NullFetcher, StandardFetcher};
pub use location::ContainerKind;
pub use materialize::{materialize, ResolvedDocument};
pub use pointer::JsonPointer;
pub use reference::{canonicalize, CanonicalReference};
pub use resolver::{resolve, Origin, ReferenceGraph, ResolvedNode};
pub use types::{Mode, ResolveOptions};
