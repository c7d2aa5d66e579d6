//! Integration test: whole image run (page fetch → extraction → dedup →
//! downloads) plus the robots advisory, against a local HTTP server.

mod common;

use common::media_server::{MediaServer, Route};
use mediagrab_core::advisory::{advise, Advice, AdvisoryReason};
use mediagrab_core::config::RunConfig;
use mediagrab_core::coordinator::Progress;
use mediagrab_core::pipeline::run_images;
use std::path::Path;
use std::time::Duration;
use tempfile::tempdir;

const UA: &str = "Mozilla/5.0 (X11; Linux x86_64) mediagrab-tests";

fn body(len: usize) -> Vec<u8> {
    (0u8..97).cycle().take(len).collect()
}

fn cfg(dir: &Path) -> RunConfig {
    RunConfig {
        output_dir: dir.to_path_buf(),
        workers: 3,
        min_size_kb: 5,
        timeout: Duration::from_secs(5),
        identity: UA.to_string(),
    }
}

const GALLERY: &str = r#"<!doctype html>
<html><body>
  <img src="/img/a.png">
  <img src="BASE/img/a.png">
  <img src="img/b.jpg?x=1">
  <img src="/placeholder.gif" data-src="/img/c.webp">
  <img src="/placeholder.gif" data-src="/img/ignored.webp" data-lazy-src="/img/d.jpg">
  <img src="data:image/png;base64,iVBORw0KGgo=">
  <img src="/img/">
  <img src="/img/tiny.png">
  <img src="/img/broken.jpg">
  <img src="/other/a.png">
</body></html>"#;

fn gallery_server() -> MediaServer {
    MediaServer::start_with(|base| {
        vec![
            ("/gallery/", Route::html(&GALLERY.replace("BASE", base))),
            ("/img/a.png", Route::ok(body(6 * 1024))),
            ("/gallery/img/b.jpg", Route::ok(body(9 * 1024))),
            ("/img/c.webp", Route::ok(body(12 * 1024))),
            ("/img/d.jpg", Route::ok(body(5 * 1024))),
            ("/img/ignored.webp", Route::ok(body(12 * 1024))),
            ("/placeholder.gif", Route::ok(body(12 * 1024))),
            ("/img/tiny.png", Route::ok(body(200))),
            ("/img/broken.jpg", Route::status(500)),
            ("/other/a.png", Route::ok(body(7 * 1024))),
        ]
    })
}

#[test]
fn image_run_counts_and_idempotent_rerun() {
    let server = gallery_server();
    let dir = tempdir().unwrap();
    let cfg = cfg(dir.path());

    let report = run_images(&server.url("/gallery/"), &cfg, None).unwrap();
    assert_eq!(report.elements_found, 10);
    // img/a.png, b.jpg?x=1, c.webp, d.jpg, tiny.png, broken.jpg, other/a.png
    assert_eq!(report.unique_urls, 7);
    let s = &report.stats;
    assert_eq!(s.downloaded, 4, "{s:?}");
    // other/a.png lands on the name already claimed by img/a.png.
    assert_eq!(s.already_exists, 1, "{s:?}");
    assert_eq!(s.skipped, 1, "{s:?}");
    assert_eq!(s.errored, 1, "{s:?}");
    assert_eq!(s.total(), report.unique_urls);
    assert_eq!(s.files_on_disk, 4);
    for name in ["a.png", "b.jpg", "c.webp", "d.jpg"] {
        assert!(dir.path().join(name).is_file(), "{name} missing");
    }
    assert!(!dir.path().join("tiny.png").exists());
    assert!(!dir.path().join("broken.jpg").exists());
    assert_eq!(server.hits("/placeholder.gif"), 0);
    assert_eq!(server.hits("/img/ignored.webp"), 0);
    assert_eq!(server.hits("/other/a.png"), 0);

    let media_hits = server.total_hits() - server.hits("/gallery/");
    let again = run_images(&server.url("/gallery/"), &cfg, None).unwrap();
    let s2 = &again.stats;
    assert_eq!(s2.downloaded, 0);
    assert_eq!(s2.already_exists, 5);
    assert_eq!(s2.files_on_disk, 4);
    // Only the skipped and failed images are requested again.
    let media_hits_after = server.total_hits() - server.hits("/gallery/");
    assert_eq!(media_hits_after - media_hits, 2);
}

#[test]
fn progress_reaches_total() {
    let server = gallery_server();
    let dir = tempdir().unwrap();
    let (tx, mut rx) = tokio::sync::mpsc::channel::<Progress>(64);
    let report = run_images(&server.url("/gallery/"), &cfg(dir.path()), Some(&tx)).unwrap();
    drop(tx);
    let mut last = None;
    while let Ok(p) = rx.try_recv() {
        last = Some(p);
    }
    assert_eq!(
        last,
        Some(Progress {
            completed: report.unique_urls,
            total: report.unique_urls
        })
    );
}

#[test]
fn page_failure_is_fatal_and_writes_nothing() {
    let server = MediaServer::start(vec![("/down", Route::status(500))]);
    let dir = tempdir().unwrap();
    let out = dir.path().join("media_download");
    let err = run_images(&server.url("/down"), &cfg(&out), None).unwrap_err();
    assert!(err.to_string().contains("HTTP 500"), "{err:#}");
    assert!(!out.exists());
}

#[test]
fn relative_references_resolve_against_redirect_free_page() {
    let server = MediaServer::start(vec![
        ("/p/index.html", Route::html(r#"<img data-lazy-src="../m/x.jpg" src="spacer.gif">"#)),
        ("/m/x.jpg", Route::ok(body(5 * 1024))),
    ]);
    let dir = tempdir().unwrap();
    let report = run_images(&server.url("/p/index.html"), &cfg(dir.path()), None).unwrap();
    assert_eq!(report.unique_urls, 1);
    assert_eq!(report.stats.downloaded, 1);
    assert!(dir.path().join("x.jpg").is_file());
    assert_eq!(server.hits("/p/spacer.gif"), 0);
}

#[test]
fn robots_denied() {
    let server = MediaServer::start(vec![(
        "/robots.txt",
        Route::text("User-agent: *\nDisallow: /private/\n"),
    )]);
    let advice = advise(&server.url("/private/page"), UA, Duration::from_secs(5));
    assert_eq!(
        advice,
        Advice {
            allowed: false,
            reason: AdvisoryReason::PolicyDenied
        }
    );
    let advice = advise(&server.url("/public/page"), UA, Duration::from_secs(5));
    assert_eq!(advice.reason, AdvisoryReason::PolicyAllowed);
}

#[test]
fn robots_missing_allows() {
    let server = MediaServer::start(vec![]);
    let advice = advise(&server.url("/page"), UA, Duration::from_secs(5));
    assert_eq!(advice.reason, AdvisoryReason::PolicyAllowed);
    assert!(advice.allowed);
    assert_eq!(server.hits("/robots.txt"), 1);
}

#[test]
fn robots_timeout_fails_open() {
    let server = MediaServer::start(vec![(
        "/robots.txt",
        Route::text("User-agent: *\nDisallow: /\n").delayed(Duration::from_secs(4)),
    )]);
    let advice = advise(&server.url("/page"), UA, Duration::from_secs(1));
    assert_eq!(advice, Advice::unavailable());
}

#[test]
fn robots_malformed_fails_open() {
    let server = MediaServer::start(vec![("/robots.txt", Route::ok(vec![0xff, 0xfe, 0xfd, 0x00]))]);
    let advice = advise(&server.url("/page"), UA, Duration::from_secs(5));
    assert!(advice.allowed);
    assert_eq!(advice.reason, AdvisoryReason::PolicyUnavailable);
}
