//! Document transport and the per-run document cache.
//!
//! Transport is an injected capability: the resolver only ever asks a
//! [`Fetch`] implementation for raw bytes by URI. The cache guarantees each
//! base URI is fetched and parsed at most once per resolution run.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::rc::Rc;

use serde_json::Value;

use crate::error::ErrorKind;

#[cfg(feature = "remote")]
use std::time::Duration;

/// Default timeout for HTTP requests (10 seconds).
#[cfg(feature = "remote")]
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Injected transport capability: raw document bytes by URI.
///
/// Retry policy, if any, belongs to the implementation; a failed fetch is
/// surfaced as-is and never retried by the cache.
pub trait Fetch {
    /// Fetch the raw bytes of the document at `uri`.
    ///
    /// # Errors
    ///
    /// Returns a transport-level message (file not found, network failure)
    /// that the resolver wraps into `UnresolvableReference`.
    fn fetch(&self, uri: &str) -> Result<Vec<u8>, String>;
}

/// Reads documents from the local filesystem.
pub struct FileFetcher;

impl Fetch for FileFetcher {
    fn fetch(&self, uri: &str) -> Result<Vec<u8>, String> {
        let path = Path::new(uri);
        if !path.exists() {
            return Err(format!("file not found: {uri}"));
        }
        fs::read(path).map_err(|e| format!("cannot read {uri}: {e}"))
    }
}

/// Fetches documents over HTTP(S) with a fixed timeout.
///
/// Requires the `remote` feature (enabled by default).
#[cfg(feature = "remote")]
pub struct HttpFetcher;

#[cfg(feature = "remote")]
impl Fetch for HttpFetcher {
    fn fetch(&self, uri: &str) -> Result<Vec<u8>, String> {
        let client = reqwest::blocking::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| format!("failed to build HTTP client: {e}"))?;

        let response = client
            .get(uri)
            .send()
            .map_err(|e| format!("failed to fetch {uri}: {e}"))?;

        // Surface HTTP errors before reading the body
        let response = response
            .error_for_status()
            .map_err(|e| format!("failed to fetch {uri}: {e}"))?;

        response
            .bytes()
            .map(|b| b.to_vec())
            .map_err(|e| format!("failed to read {uri}: {e}"))
    }
}

/// Dispatches on URI scheme: http(s) URIs go to [`HttpFetcher`], everything
/// else to [`FileFetcher`]. Without the `remote` feature, http(s) URIs are
/// refused.
pub struct StandardFetcher;

impl Fetch for StandardFetcher {
    fn fetch(&self, uri: &str) -> Result<Vec<u8>, String> {
        if is_url(uri) {
            #[cfg(feature = "remote")]
            {
                HttpFetcher.fetch(uri)
            }
            #[cfg(not(feature = "remote"))]
            {
                Err(format!("remote fetch disabled at build time: {uri}"))
            }
        } else {
            FileFetcher.fetch(uri)
        }
    }
}

/// Refuses every fetch. For resolving documents with no external references.
pub struct NullFetcher;

impl Fetch for NullFetcher {
    fn fetch(&self, uri: &str) -> Result<Vec<u8>, String> {
        Err(format!("no transport available for {uri}"))
    }
}

/// Check if a string looks like a URL (starts with http:// or https://).
pub fn is_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}

/// An immutable parsed document identified by its canonical base URI.
#[derive(Debug, Clone)]
pub struct Document {
    /// Base URI this document was loaded from (`""` for a root document
    /// supplied without one).
    pub uri: String,
    /// Parsed JSON tree. Never mutated after load.
    pub root: Value,
}

/// Per-run document cache.
///
/// The root document is seeded by the caller and never fetched; every other
/// base URI is fetched and parsed exactly once for the lifetime of the run.
pub struct DocumentCache<'f> {
    fetcher: &'f dyn Fetch,
    docs: HashMap<String, Rc<Document>>,
}

impl<'f> DocumentCache<'f> {
    /// Create a cache seeded with the caller-supplied root document.
    pub fn new(root: &Value, root_uri: &str, fetcher: &'f dyn Fetch) -> Self {
        let mut docs = HashMap::new();
        docs.insert(
            root_uri.to_string(),
            Rc::new(Document {
                uri: root_uri.to_string(),
                root: root.clone(),
            }),
        );
        Self { fetcher, docs }
    }

    /// Load the document at `uri`, memoized per canonical base URI.
    ///
    /// # Errors
    ///
    /// Returns `UnresolvableReference` when the transport fails and
    /// `UnsupportedFormat` when the payload is not JSON (YAML documents are
    /// not reusable and are rejected here).
    pub fn load(&mut self, uri: &str) -> Result<Rc<Document>, ErrorKind> {
        if let Some(doc) = self.docs.get(uri) {
            return Ok(Rc::clone(doc));
        }

        let bytes =
            self.fetcher
                .fetch(uri)
                .map_err(|message| ErrorKind::UnresolvableReference {
                    reference: uri.to_string(),
                    message,
                })?;

        let root: Value =
            serde_json::from_slice(&bytes).map_err(|source| ErrorKind::UnsupportedFormat {
                uri: uri.to_string(),
                source,
            })?;

        let doc = Rc::new(Document {
            uri: uri.to_string(),
            root,
        });
        self.docs.insert(uri.to_string(), Rc::clone(&doc));
        Ok(doc)
    }
}
