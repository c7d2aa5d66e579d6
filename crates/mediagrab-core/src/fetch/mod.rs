//! Fetch worker: one streaming GET per media URL.
//!
//! Skips without touching the network when the target already exists, aborts
//! before writing anything when the declared size is below the minimum, and
//! otherwise streams the body chunk by chunk into a hidden temp file that is
//! renamed onto the target on success.

mod outcome;

pub use outcome::{FetchOutcome, OutcomeKind, SkipReason};

use std::cell::RefCell;
use std::io;
use std::path::Path;
use thiserror::Error;

use crate::config::RunConfig;
use crate::http::{self, ResponseHead};
use crate::storage::PartFile;
use crate::url_model::ResolvedUrl;

/// libcurl receive buffer; the body reaches disk in chunks of at most this size.
const CHUNK_SIZE: usize = 8 * 1024;

/// Transfer failure for one URL. Converted to [`FetchOutcome::Errored`] at the worker boundary.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("{0}")]
    Transport(#[from] curl::Error),
    #[error("HTTP {0}")]
    Status(u32),
    #[error("no HTTP status received")]
    NoStatus,
    #[error("storage: {0}")]
    Storage(#[from] io::Error),
}

/// Why the response head rules out writing the body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Refusal {
    TooSmall(u64),
    Status(Option<u32>),
}

/// Non-2xx is refused first; then a declared length below `min_bytes` is too small.
/// A missing `Content-Length` always proceeds.
pub(crate) fn admit(head: &ResponseHead, min_bytes: u64) -> Result<(), Refusal> {
    if !head.is_success() {
        return Err(Refusal::Status(head.status));
    }
    match head.content_length {
        Some(len) if len < min_bytes => Err(Refusal::TooSmall(len)),
        _ => Ok(()),
    }
}

enum Completed {
    Written(u64),
    TooSmall(u64),
}

/// Why the write callback stopped the transfer.
enum Abort {
    Refused(Refusal),
    Storage(io::Error),
}

/// Fetches `url` into `cfg.output_dir` and classifies the result. Never panics
/// on transfer failures and never touches any other URL's target.
pub fn fetch_one(url: &ResolvedUrl, cfg: &RunConfig) -> FetchOutcome {
    let target = url.local_target(&cfg.output_dir);
    if target.exists() {
        return FetchOutcome::AlreadyExists;
    }

    let min = cfg.min_size_bytes();
    match transfer(url, &target, cfg) {
        Ok(Completed::Written(bytes)) => FetchOutcome::Downloaded { bytes },
        Ok(Completed::TooSmall(declared)) => {
            FetchOutcome::Skipped(SkipReason::TooSmall { declared, min })
        }
        Err(e) => FetchOutcome::Errored(e.to_string()),
    }
}

fn refused(refusal: Refusal) -> Result<Completed, FetchError> {
    match refusal {
        Refusal::TooSmall(declared) => Ok(Completed::TooSmall(declared)),
        Refusal::Status(Some(code)) => Err(FetchError::Status(code)),
        Refusal::Status(None) => Err(FetchError::NoStatus),
    }
}

fn transfer(url: &ResolvedUrl, target: &Path, cfg: &RunConfig) -> Result<Completed, FetchError> {
    let min = cfg.min_size_bytes();
    let head = RefCell::new(ResponseHead::default());
    let mut part = PartFile::new(target);
    let mut admitted = false;
    let mut abort: Option<Abort> = None;

    let mut easy = curl::easy::Easy::new();
    http::configure(&mut easy, url.as_str(), &cfg.http())?;
    easy.buffer_size(CHUNK_SIZE)?;

    let performed = {
        let mut transfer = easy.transfer();
        transfer.header_function(|line| {
            head.borrow_mut().observe(line);
            true
        })?;
        transfer.write_function(|data| {
            if !admitted {
                if let Err(refusal) = admit(&head.borrow(), min) {
                    abort = Some(Abort::Refused(refusal));
                    return Ok(0); // abort transfer
                }
                admitted = true;
            }
            match part.write(data) {
                Ok(()) => Ok(data.len()),
                Err(e) => {
                    abort = Some(Abort::Storage(e));
                    Ok(0)
                }
            }
        })?;
        transfer.perform()
    };

    match abort {
        Some(Abort::Refused(refusal)) => return refused(refusal),
        Some(Abort::Storage(e)) => return Err(FetchError::Storage(e)),
        None => {}
    }
    performed?;

    // Bodyless responses never reach the write callback.
    if !admitted {
        if let Err(refusal) = admit(&head.borrow(), min) {
            return refused(refusal);
        }
    }

    let bytes = part.finalize(target)?;
    tracing::debug!(url = %url, bytes, "downloaded");
    Ok(Completed::Written(bytes))
}
