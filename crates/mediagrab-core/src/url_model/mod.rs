//! URL modeling and filename derivation.
//!
//! Resolves raw `<img>` attribute values against the page URL and derives the
//! local filename each resolved URL is stored under.

mod path;

pub use path::filename_from_url_path;

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use url::Url;

/// Why a raw reference produced no download entry. None of these are errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// Attribute missing or blank.
    Empty,
    /// `data:` URI; the content is inline, there is nothing to fetch.
    InlineData,
    /// Could not be resolved against the base URL.
    Unparseable(String),
    /// Resolved to something other than http(s).
    UnsupportedScheme(String),
    /// Final path segment is empty (e.g. trailing `/`).
    InvalidName,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::Empty => write!(f, "empty reference"),
            Rejection::InlineData => write!(f, "inline data reference"),
            Rejection::Unparseable(e) => write!(f, "unparseable reference: {}", e),
            Rejection::UnsupportedScheme(s) => write!(f, "unsupported scheme: {}", s),
            Rejection::InvalidName => write!(f, "invalid name"),
        }
    }
}

/// An absolute, fetchable media URL plus the filename it is stored under.
///
/// Equality, ordering and hashing use the URL string only; the filename is
/// derived from it.
#[derive(Debug, Clone)]
pub struct ResolvedUrl {
    url: Url,
    filename: String,
}

impl ResolvedUrl {
    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }

    /// Last path segment of the URL, query stripped. Never empty.
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Where this URL is stored under `output_dir`.
    pub fn local_target(&self, output_dir: &Path) -> PathBuf {
        output_dir.join(&self.filename)
    }
}

impl PartialEq for ResolvedUrl {
    fn eq(&self, other: &Self) -> bool {
        self.url.as_str() == other.url.as_str()
    }
}

impl Eq for ResolvedUrl {}

impl Hash for ResolvedUrl {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.url.as_str().hash(state);
    }
}

impl PartialOrd for ResolvedUrl {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ResolvedUrl {
    fn cmp(&self, other: &Self) -> Ordering {
        self.url.as_str().cmp(other.url.as_str())
    }
}

impl fmt::Display for ResolvedUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.url.as_str())
    }
}

/// True if `raw` is an inline `data:` URI (case-insensitive, leading whitespace ignored).
pub fn is_inline_data(raw: &str) -> bool {
    let raw = raw.trim_start();
    raw.len() >= 5 && raw.as_bytes()[..5].eq_ignore_ascii_case(b"data:")
}

/// Resolves `raw` against `base` using standard relative-URL rules and derives its filename.
///
/// # Examples
///
/// - `("http://example.com/page", "/a.png")` → `http://example.com/a.png`, `a.png`
/// - `("http://example.com/page", "b.jpg?x=1")` → `http://example.com/b.jpg?x=1`, `b.jpg`
/// - `("https://example.com/", "//cdn.example.com/c.gif")` → `https://cdn.example.com/c.gif`
pub fn normalize(base: &Url, raw: &str) -> Result<ResolvedUrl, Rejection> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(Rejection::Empty);
    }
    if is_inline_data(raw) {
        return Err(Rejection::InlineData);
    }

    let mut url = base
        .join(raw)
        .map_err(|e| Rejection::Unparseable(e.to_string()))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(Rejection::UnsupportedScheme(url.scheme().to_string()));
    }
    url.set_fragment(None);

    let filename = filename_from_url_path(&url).ok_or(Rejection::InvalidName)?;
    Ok(ResolvedUrl { url, filename })
}
