//! RFC 6901 JSON Pointers: parsing, escaping, and read-only evaluation.

use std::fmt;

use serde_json::Value;

/// A parsed JSON Pointer: a sequence of reference tokens.
///
/// Tokens are stored decoded (`~1` -> `/`, `~0` -> `~`, percent escapes
/// removed), so equality is structural regardless of how the source string
/// spelled them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JsonPointer {
    tokens: Vec<String>,
}

/// Where pointer evaluation stopped early.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointerMiss {
    /// The longest prefix of the pointer that did resolve.
    pub resolved_prefix: String,
    /// The first token that failed to resolve.
    pub missing_token: String,
}

impl JsonPointer {
    /// Parse a pointer from its string form (`/a/b/0`).
    ///
    /// The empty string is the whole-document pointer; anything else must
    /// start with `/`.
    ///
    /// # Errors
    ///
    /// Returns the reason for rejection: missing leading slash, invalid `~`
    /// escape, or invalid percent escape.
    pub fn parse(raw: &str) -> Result<Self, String> {
        if raw.is_empty() {
            return Ok(Self { tokens: Vec::new() });
        }
        if !raw.starts_with('/') {
            return Err(format!("pointer must start with '/', got \"{raw}\""));
        }
        let mut tokens = Vec::new();
        for piece in raw[1..].split('/') {
            let decoded = percent_decode(piece)?;
            tokens.push(unescape_token(&decoded)?);
        }
        Ok(Self { tokens })
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn is_root(&self) -> bool {
        self.tokens.is_empty()
    }

    /// First token, if any. Used for container-location checks.
    pub fn first(&self) -> Option<&str> {
        self.tokens.first().map(String::as_str)
    }

    /// Walk `root` token by token. Evaluation never mutates the document.
    ///
    /// # Errors
    ///
    /// Returns a [`PointerMiss`] naming the first missing token and the
    /// longest prefix that did resolve.
    pub fn evaluate<'a>(&self, root: &'a Value) -> Result<&'a Value, PointerMiss> {
        let mut current = root;
        for (i, token) in self.tokens.iter().enumerate() {
            let next = match current {
                Value::Object(map) => map.get(token),
                Value::Array(arr) => array_index(token).and_then(|idx| arr.get(idx)),
                _ => None,
            };
            match next {
                Some(value) => current = value,
                None => {
                    return Err(PointerMiss {
                        resolved_prefix: render(&self.tokens[..i]),
                        missing_token: token.clone(),
                    });
                }
            }
        }
        Ok(current)
    }
}

impl fmt::Display for JsonPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render(&self.tokens))
    }
}

/// Re-escape tokens into `/a/b` string form.
fn render(tokens: &[String]) -> String {
    let mut out = String::new();
    for token in tokens {
        out.push('/');
        out.push_str(&token.replace('~', "~0").replace('/', "~1"));
    }
    out
}

/// Array tokens are non-negative integers without leading zeros.
fn array_index(token: &str) -> Option<usize> {
    if token.len() > 1 && token.starts_with('0') {
        return None;
    }
    token.parse().ok()
}

fn unescape_token(s: &str) -> Result<String, String> {
    if !s.contains('~') {
        return Ok(s.to_string());
    }
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '~' {
            match chars.next() {
                Some('0') => out.push('~'),
                Some('1') => out.push('/'),
                _ => {
                    return Err(format!(
                        "invalid escape in token \"{s}\": '~' must be followed by 0 or 1"
                    ));
                }
            }
        } else {
            out.push(c);
        }
    }
    Ok(out)
}

fn percent_decode(s: &str) -> Result<String, String> {
    if !s.contains('%') {
        return Ok(s.to_string());
    }
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = bytes
                .get(i + 1..i + 3)
                .and_then(|h| std::str::from_utf8(h).ok())
                .ok_or_else(|| format!("truncated percent escape in \"{s}\""))?;
            let byte = u8::from_str_radix(hex, 16)
                .map_err(|_| format!("invalid percent escape \"%{hex}\" in \"{s}\""))?;
            out.push(byte);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).map_err(|_| format!("percent escapes in \"{s}\" are not valid UTF-8"))
}
