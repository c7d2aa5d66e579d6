//! Builds the unique media URL set for one run.

use std::collections::BTreeSet;
use url::Url;

use crate::extract::ImageElement;
use crate::url_model::{normalize, ResolvedUrl};

/// Resolves each element's admitted reference against `base` and collapses duplicates.
///
/// Only one reference per element is considered (see [`ImageElement::candidate`]).
/// Rejected references contribute nothing. No I/O.
pub fn build_url_set<'a, I>(elements: I, base: &Url) -> BTreeSet<ResolvedUrl>
where
    I: IntoIterator<Item = &'a ImageElement>,
{
    build_from_references(elements.into_iter().filter_map(ImageElement::candidate), base)
}

/// Same as [`build_url_set`] for references already picked one per element.
pub fn build_from_references<'a, I>(references: I, base: &Url) -> BTreeSet<ResolvedUrl>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut set = BTreeSet::new();
    for raw in references {
        match normalize(base, raw) {
            Ok(resolved) => {
                set.insert(resolved);
            }
            Err(reason) => {
                tracing::debug!(reference = raw, %reason, "reference skipped");
            }
        }
    }
    set
}
