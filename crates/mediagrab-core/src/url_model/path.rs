//! Filename extraction from URL path.

use url::Url;

/// Extracts the final path segment of `url` for use as a local filename.
///
/// The query and fragment never take part. Returns `None` when the final
/// segment is empty (root path, trailing `/`) or is `.`/`..`, and for URLs
/// without a hierarchical path.
pub fn filename_from_url_path(url: &Url) -> Option<String> {
    let segment = url.path_segments()?.last()?;
    if segment.is_empty() || segment == "." || segment == ".." {
        return None;
    }
    Some(segment.to_string())
}
