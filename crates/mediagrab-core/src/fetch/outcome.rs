//! Classified result of one fetch.

use std::fmt;

/// Why a fetch was skipped by policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Declared `Content-Length` below the minimum size.
    TooSmall { declared: u64, min: u64 },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::TooSmall { declared, min } => {
                write!(f, "too small ({} < {} bytes)", declared, min)
            }
        }
    }
}

/// Exactly one of these is produced per URL per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Downloaded { bytes: u64 },
    /// Target file was already on disk (or claimed by an earlier URL this run).
    AlreadyExists,
    Skipped(SkipReason),
    /// Network, status or I/O failure. Terminal for this URL in this run.
    Errored(String),
}

impl FetchOutcome {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            FetchOutcome::Downloaded { .. } => OutcomeKind::Downloaded,
            FetchOutcome::AlreadyExists => OutcomeKind::AlreadyExists,
            FetchOutcome::Skipped(_) => OutcomeKind::Skipped,
            FetchOutcome::Errored(_) => OutcomeKind::Errored,
        }
    }
}

/// Payload-free discriminant of [`FetchOutcome`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutcomeKind {
    Downloaded,
    AlreadyExists,
    Skipped,
    Errored,
}

impl fmt::Display for FetchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchOutcome::Downloaded { bytes } => write!(f, "downloaded ({} bytes)", bytes),
            FetchOutcome::AlreadyExists => write!(f, "already exists"),
            FetchOutcome::Skipped(reason) => write!(f, "skipped: {}", reason),
            FetchOutcome::Errored(msg) => write!(f, "error: {}", msg),
        }
    }
}
