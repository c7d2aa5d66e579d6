//! Page → images pipeline: fetch page, extract `<img>` references, dedup,
//! download. Also the run-mode selection shared by the CLI.

use anyhow::Result;
use std::collections::BTreeSet;
use url::Url;

use crate::config::RunConfig;
use crate::coordinator::{self, Progress, RunStatistics};
use crate::dedup;
use crate::extract;
use crate::page::{self, Page};
use crate::url_model::ResolvedUrl;

/// What a run downloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Image,
    Video,
    Both,
}

impl Mode {
    pub fn images(self) -> bool {
        matches!(self, Mode::Image | Mode::Both)
    }

    pub fn videos(self) -> bool {
        matches!(self, Mode::Video | Mode::Both)
    }

    /// A keyword only filters videos, so an image-only request with a keyword
    /// becomes a video request. Returns the effective mode and whether it changed.
    pub fn with_keyword(self, keyword: Option<&str>) -> (Mode, bool) {
        match (self, keyword) {
            (Mode::Image, Some(k)) if !k.is_empty() => (Mode::Video, true),
            _ => (self, false),
        }
    }
}

/// Discovery result for one page.
#[derive(Debug, Clone)]
pub struct Discovery {
    /// Number of `<img>` elements on the page.
    pub elements_found: usize,
    pub urls: BTreeSet<ResolvedUrl>,
}

/// Extracts and deduplicates the image URLs of an already fetched page.
pub fn discover(page: &Page) -> Discovery {
    let elements = extract::extract_image_elements(&page.html);
    let urls = dedup::build_url_set(&elements, &page.url);
    Discovery {
        elements_found: elements.len(),
        urls,
    }
}

/// Outcome of an image run.
#[derive(Debug, Clone)]
pub struct ImageReport {
    pub page_url: Url,
    pub elements_found: usize,
    pub unique_urls: usize,
    pub stats: RunStatistics,
}

/// Fetches `page_url`, discovers its images and downloads them per `cfg`.
///
/// Only a failure to retrieve the page (or to prepare the output directory)
/// is an error; per-image failures are counted in the statistics.
/// Blocking; call from `spawn_blocking` when used from async code.
pub fn run_images(
    page_url: &str,
    cfg: &RunConfig,
    progress_tx: Option<&tokio::sync::mpsc::Sender<Progress>>,
) -> Result<ImageReport> {
    let page = page::fetch_page(page_url, &cfg.http())?;
    let discovery = discover(&page);
    tracing::info!(
        page = %page.url,
        elements = discovery.elements_found,
        unique = discovery.urls.len(),
        "images discovered"
    );
    let stats = coordinator::run(&discovery.urls, cfg, progress_tx)?;
    Ok(ImageReport {
        page_url: page.url,
        elements_found: discovery.elements_found,
        unique_urls: discovery.urls.len(),
        stats,
    })
}
