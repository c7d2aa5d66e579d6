//! `mediagrab grab` – download the images and/or videos of a page.

use anyhow::{Context, Result};
use mediagrab_core::advisory::AdvisoryReason;
use mediagrab_core::config::{MediagrabConfig, RunConfig, RunOverrides};
use mediagrab_core::coordinator::Progress;
use mediagrab_core::fetch::OutcomeKind;
use mediagrab_core::pipeline::{self, ImageReport, Mode};
use mediagrab_core::video::{self, VideoError, VideoRequest};
use std::io::Write;
use std::path::PathBuf;

use super::robots;

/// Flags of one `grab` invocation.
#[derive(Debug, Clone)]
pub struct GrabOptions {
    pub url: String,
    pub mode: Mode,
    pub output: Option<PathBuf>,
    pub workers: Option<usize>,
    pub keyword: Option<String>,
    pub min_size_kb: Option<u64>,
}

pub async fn run_grab(cfg: &MediagrabConfig, opts: GrabOptions) -> Result<()> {
    let (mode, switched) = opts.mode.with_keyword(opts.keyword.as_deref());
    if switched {
        println!("Keyword given: switching to video mode.");
    }

    let run = cfg.run_config(&RunOverrides {
        output_dir: opts.output.clone(),
        workers: opts.workers,
        min_size_kb: opts.min_size_kb,
    });
    std::fs::create_dir_all(&run.output_dir)
        .with_context(|| format!("create output dir {}", run.output_dir.display()))?;

    let advice = robots::consult(&opts.url, &run.identity, run.timeout).await?;
    match advice.reason {
        AdvisoryReason::PolicyDenied => {
            println!(
                "Warning: {} is {}; continuing anyway.",
                opts.url,
                robots::describe(&advice)
            );
        }
        AdvisoryReason::PolicyUnavailable => {
            tracing::debug!(url = %opts.url, "robots.txt unavailable; proceeding");
        }
        AdvisoryReason::PolicyAllowed => {}
    }

    if mode.videos() {
        grab_videos(cfg, &run, &opts).await;
    }

    if mode.images() {
        let report = grab_images(&opts.url, run).await?;
        print_summary(&report);
    }

    Ok(())
}

/// Video failures are reported and never abort the invocation.
async fn grab_videos(cfg: &MediagrabConfig, run: &RunConfig, opts: &GrabOptions) {
    let request = VideoRequest::new(
        &opts.url,
        &run.output_dir,
        opts.keyword.as_deref(),
        cfg.cookies_file(),
    );
    if request.uses_cookies() {
        println!("Using cookies from {}", cfg.cookies_file().display());
    }
    println!("Downloading videos from {}", opts.url);
    match video::download_videos(cfg.video_program(), &request).await {
        Ok(()) => println!("Video download finished."),
        Err(err @ VideoError::AuthRequired { .. }) => {
            eprintln!("{}", err);
            eprintln!(
                "Hint: export your browser cookies for this site to {} (Netscape format) and retry.",
                cfg.cookies_file().display()
            );
        }
        Err(err) => eprintln!("{}", err),
    }
}

async fn grab_images(url: &str, run: RunConfig) -> Result<ImageReport> {
    let (progress_tx, mut progress_rx) = tokio::sync::mpsc::channel::<Progress>(64);
    let printer = tokio::spawn(async move {
        let mut shown = false;
        while let Some(p) = progress_rx.recv().await {
            print!("\rDownloading images: {}/{}", p.completed, p.total);
            let _ = std::io::stdout().flush();
            shown = true;
        }
        if shown {
            println!();
        }
    });

    let url = url.to_string();
    let result = tokio::task::spawn_blocking(move || {
        pipeline::run_images(&url, &run, Some(&progress_tx))
    })
    .await
    .context("image download task failed");

    let _ = printer.await;
    result?
}

fn print_summary(report: &ImageReport) {
    let s = &report.stats;
    println!(
        "Found {} <img> tags, identified {} unique images.",
        report.elements_found, report.unique_urls
    );
    for (label, kind) in [
        ("new", OutcomeKind::Downloaded),
        ("existing", OutcomeKind::AlreadyExists),
        ("skipped", OutcomeKind::Skipped),
        ("errors", OutcomeKind::Errored),
    ] {
        println!("  {:<9} {}", format!("{}:", label), s.count(kind));
    }
    println!("Total files in folder: {}", s.files_on_disk);
}
