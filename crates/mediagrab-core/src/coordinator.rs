//! Download coordinator: runs fetch workers over the unique URL set.
//!
//! Keeps up to `workers` fetches in flight; idle workers pull the next URL
//! from a shared queue. Outcomes come back over a channel and are tallied on
//! the calling thread only, so the statistics need no lock.

use anyhow::{Context, Result};
use std::collections::{BTreeSet, HashSet, VecDeque};
use std::panic::{self, AssertUnwindSafe};
use std::sync::{mpsc, Mutex};

use crate::config::RunConfig;
use crate::fetch::{self, FetchOutcome, OutcomeKind};
use crate::storage;
use crate::url_model::ResolvedUrl;

/// Completed / total outcomes so far. Reporting only; `completed` never decreases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
}

/// Outcome counts for one run plus a snapshot of the output directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStatistics {
    pub downloaded: usize,
    pub already_exists: usize,
    pub skipped: usize,
    pub errored: usize,
    /// Non-hidden files in the output directory after the run, earlier runs included.
    pub files_on_disk: usize,
}

impl RunStatistics {
    pub fn record(&mut self, outcome: &FetchOutcome) {
        let counter = match outcome.kind() {
            OutcomeKind::Downloaded => &mut self.downloaded,
            OutcomeKind::AlreadyExists => &mut self.already_exists,
            OutcomeKind::Skipped => &mut self.skipped,
            OutcomeKind::Errored => &mut self.errored,
        };
        *counter += 1;
    }

    /// Count recorded for one outcome kind.
    pub fn count(&self, kind: OutcomeKind) -> usize {
        match kind {
            OutcomeKind::Downloaded => self.downloaded,
            OutcomeKind::AlreadyExists => self.already_exists,
            OutcomeKind::Skipped => self.skipped,
            OutcomeKind::Errored => self.errored,
        }
    }

    /// Number of outcomes recorded.
    pub fn total(&self) -> usize {
        self.downloaded + self.already_exists + self.skipped + self.errored
    }
}

/// Fetches every URL in `urls` into `cfg.output_dir` with the real fetch worker.
/// Blocking; call from `spawn_blocking` when used from async code.
pub fn run(
    urls: &BTreeSet<ResolvedUrl>,
    cfg: &RunConfig,
    progress_tx: Option<&tokio::sync::mpsc::Sender<Progress>>,
) -> Result<RunStatistics> {
    run_with(urls, cfg, progress_tx, fetch::fetch_one)
}

/// [`run`] with a pluggable per-URL fetch function.
///
/// Every URL yields exactly one outcome, including when `fetch` panics
/// (recorded as `Errored`). A URL whose filename was already claimed by an
/// earlier URL in this run is recorded as `AlreadyExists` without being fetched.
///
/// Progress updates use `try_send`: when the receiver falls behind (e.g. many
/// collisions reported before any worker starts) updates are dropped, never
/// awaited. Statistics are unaffected.
pub fn run_with<F>(
    urls: &BTreeSet<ResolvedUrl>,
    cfg: &RunConfig,
    progress_tx: Option<&tokio::sync::mpsc::Sender<Progress>>,
    fetch: F,
) -> Result<RunStatistics>
where
    F: Fn(&ResolvedUrl, &RunConfig) -> FetchOutcome + Sync,
{
    std::fs::create_dir_all(&cfg.output_dir)
        .with_context(|| format!("create output dir {}", cfg.output_dir.display()))?;

    let total = urls.len();
    let mut stats = RunStatistics::default();
    let mut completed = 0usize;
    let mut report = |stats: &mut RunStatistics, outcome: &FetchOutcome| {
        stats.record(outcome);
        completed += 1;
        if let Some(tx) = progress_tx {
            let _ = tx.try_send(Progress { completed, total });
        }
    };

    let mut claimed: HashSet<&str> = HashSet::with_capacity(total);
    let mut queue: VecDeque<&ResolvedUrl> = VecDeque::with_capacity(total);
    for url in urls {
        if claimed.insert(url.filename()) {
            queue.push_back(url);
        } else {
            tracing::debug!(url = %url, filename = url.filename(), "filename already claimed this run");
            report(&mut stats, &FetchOutcome::AlreadyExists);
        }
    }

    let num_workers = cfg.workers.max(1).min(queue.len());
    tracing::info!(total, dispatched = queue.len(), workers = num_workers, "starting downloads");

    let work = Mutex::new(queue);
    let (tx, rx) = mpsc::channel::<(&ResolvedUrl, FetchOutcome)>();
    let fetch = &fetch;
    let work = &work;

    std::thread::scope(|scope| {
        for _ in 0..num_workers {
            let tx = tx.clone();
            scope.spawn(move || loop {
                let next = match work.lock() {
                    Ok(mut q) => q.pop_front(),
                    Err(poisoned) => poisoned.into_inner().pop_front(),
                };
                let Some(url) = next else {
                    break;
                };
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| fetch(url, cfg)))
                    .unwrap_or_else(|_| FetchOutcome::Errored("fetch worker panicked".to_string()));
                if tx.send((url, outcome)).is_err() {
                    break;
                }
            });
        }
        drop(tx);

        for (url, outcome) in rx {
            match &outcome {
                FetchOutcome::Errored(msg) => tracing::warn!(url = %url, "fetch failed: {}", msg),
                other => tracing::debug!(url = %url, "{}", other),
            }
            report(&mut stats, &outcome);
        }
    });

    stats.files_on_disk = storage::count_visible_files(&cfg.output_dir)
        .with_context(|| format!("list output dir {}", cfg.output_dir.display()))?;

    tracing::info!(
        downloaded = stats.downloaded,
        already_exists = stats.already_exists,
        skipped = stats.skipped,
        errored = stats.errored,
        files_on_disk = stats.files_on_disk,
        "downloads finished"
    );
    Ok(stats)
}
