//! `mediagrab robots` – report the robots.txt advisory for a page.

use anyhow::{Context, Result};
use mediagrab_core::advisory::{self, Advice, AdvisoryReason};
use mediagrab_core::config::{MediagrabConfig, RunOverrides};
use std::time::Duration;

/// Runs the blocking advisory lookup off the async runtime.
pub(crate) async fn consult(url: &str, identity: &str, timeout: Duration) -> Result<Advice> {
    let url = url.to_string();
    let identity = identity.to_string();
    tokio::task::spawn_blocking(move || advisory::advise(&url, &identity, timeout))
        .await
        .context("robots advisory task failed")
}

pub(crate) fn describe(advice: &Advice) -> &'static str {
    match advice.reason {
        AdvisoryReason::PolicyAllowed => "allowed by robots.txt",
        AdvisoryReason::PolicyDenied => "disallowed by robots.txt",
        AdvisoryReason::PolicyUnavailable => "robots.txt unavailable (treated as allowed)",
    }
}

pub async fn run_robots(cfg: &MediagrabConfig, url: &str) -> Result<()> {
    let run = cfg.run_config(&RunOverrides::default());
    let advice = consult(url, &run.identity, run.timeout).await?;
    println!("{}: {}", url, describe(&advice));
    Ok(())
}
