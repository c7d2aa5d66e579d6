//! Retrieval of the page whose images are collected. Failure here is fatal to
//! an image run: without the page there is nothing to discover.

use thiserror::Error;
use url::Url;

use crate::http::{self, HttpSettings};

#[derive(Debug, Error)]
pub enum PageError {
    #[error("invalid page URL {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("failed to retrieve the page: {0}")]
    Transport(#[from] curl::Error),
    #[error("failed to retrieve the page: HTTP {0}")]
    Status(u32),
}

/// A fetched page: the URL it was finally served from and its markup.
#[derive(Debug, Clone)]
pub struct Page {
    /// Post-redirect URL; relative references resolve against this.
    pub url: Url,
    pub html: String,
}

/// Parses a user-supplied page URL.
pub fn parse_page_url(page_url: &str) -> Result<Url, PageError> {
    Url::parse(page_url.trim()).map_err(|source| PageError::InvalidUrl {
        url: page_url.to_string(),
        source,
    })
}

/// GETs `page_url` and decodes the body as (lossy) UTF-8.
/// Blocking; call from `spawn_blocking` when used from async code.
pub fn fetch_page(page_url: &str, settings: &HttpSettings) -> Result<Page, PageError> {
    let requested = parse_page_url(page_url)?;
    let response = http::get(requested.as_str(), settings)?;
    if !(200..300).contains(&response.status) {
        return Err(PageError::Status(response.status));
    }
    let url = Url::parse(&response.effective_url).unwrap_or(requested);
    tracing::debug!(url = %url, bytes = response.body.len(), "page fetched");
    Ok(Page {
        url,
        html: String::from_utf8_lossy(&response.body).into_owned(),
    })
}
