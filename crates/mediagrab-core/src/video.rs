//! External video downloader (yt-dlp compatible command line).
//!
//! The program is opaque: it gets the page URL, an output template under the
//! output directory, an optional title filter and, when present, a cookie
//! file. Failures are only classified for user messaging.

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Debug, Error)]
pub enum VideoError {
    #[error("video downloader `{program}` not found; install it or set video_program in the config")]
    NotInstalled { program: String },
    #[error("could not run video downloader: {0}")]
    Spawn(#[source] io::Error),
    #[error("the site blocked the download (authentication required): {detail}")]
    AuthRequired { detail: String },
    #[error("video download failed: {detail}")]
    Failed { detail: String },
}

/// What a failure message looks like to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Auth,
    Generic,
}

/// Auth-looking failures are only reported as such when no cookie file was used;
/// with cookies the hint to export them would be wrong.
pub fn classify_failure(stderr: &str, used_cookies: bool) -> FailureKind {
    if used_cookies {
        return FailureKind::Generic;
    }
    let lower = stderr.to_lowercase();
    if ["sign in", "logged-in", "403"].iter().any(|m| lower.contains(m)) {
        FailureKind::Auth
    } else {
        FailureKind::Generic
    }
}

/// One invocation of the video downloader.
#[derive(Debug, Clone)]
pub struct VideoRequest {
    pub page_url: String,
    pub output_dir: PathBuf,
    /// Case-insensitive title regex.
    pub keyword: Option<String>,
    /// Cookie file, only set when it exists on disk.
    pub cookies_file: Option<PathBuf>,
}

impl VideoRequest {
    /// Builds a request, attaching `cookies_candidate` only if that file exists.
    pub fn new(
        page_url: &str,
        output_dir: &Path,
        keyword: Option<&str>,
        cookies_candidate: &Path,
    ) -> Self {
        Self {
            page_url: page_url.to_string(),
            output_dir: output_dir.to_path_buf(),
            keyword: keyword.filter(|k| !k.is_empty()).map(str::to_string),
            cookies_file: cookies_candidate
                .is_file()
                .then(|| cookies_candidate.to_path_buf()),
        }
    }

    pub fn uses_cookies(&self) -> bool {
        self.cookies_file.is_some()
    }

    /// Command-line arguments, URL last.
    pub fn args(&self) -> Vec<OsString> {
        let mut template = self.output_dir.clone().into_os_string();
        template.push("/%(title)s.%(ext)s");

        let mut args: Vec<OsString> = vec![
            "--format".into(),
            "bestvideo+bestaudio/best".into(),
            "--merge-output-format".into(),
            "mp4".into(),
            "--output".into(),
            template,
            "--restrict-filenames".into(),
            "--no-warnings".into(),
        ];
        if let Some(keyword) = &self.keyword {
            args.push("--match-title".into());
            args.push(format!("(?i){}", keyword).into());
        }
        if let Some(cookies) = &self.cookies_file {
            args.push("--cookies".into());
            args.push(cookies.clone().into_os_string());
        }
        args.push(self.page_url.clone().into());
        args
    }
}

/// Runs `program` for `request`. Its stdout (progress) is passed through;
/// stderr is echoed and kept for failure classification.
pub async fn download_videos(program: &str, request: &VideoRequest) -> Result<(), VideoError> {
    tracing::info!(program, url = %request.page_url, cookies = request.uses_cookies(), "starting video downloader");

    let mut child = tokio::process::Command::new(program)
        .args(request.args())
        .stdin(Stdio::null())
        .stdout(Stdio::inherit())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => VideoError::NotInstalled {
                program: program.to_string(),
            },
            _ => VideoError::Spawn(e),
        })?;

    let stderr_reader = child.stderr.take().map(|pipe| {
        tokio::spawn(async move {
            let mut buf = String::new();
            let mut lines = BufReader::new(pipe).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                eprintln!("{}", line);
                buf.push_str(&line);
                buf.push('\n');
            }
            buf
        })
    });

    let status = child.wait().await.map_err(VideoError::Spawn)?;
    let stderr = match stderr_reader {
        Some(handle) => handle.await.unwrap_or_default(),
        None => String::new(),
    };

    if status.success() {
        tracing::info!(url = %request.page_url, "video downloader finished");
        return Ok(());
    }

    let detail = last_error_line(&stderr)
        .unwrap_or_else(|| format!("{} exited with {}", program, status));
    tracing::warn!(url = %request.page_url, %status, "video downloader failed: {}", detail);
    match classify_failure(&stderr, request.uses_cookies()) {
        FailureKind::Auth => Err(VideoError::AuthRequired { detail }),
        FailureKind::Generic => Err(VideoError::Failed { detail }),
    }
}

/// Last `ERROR:` line, or else the last non-empty line, of downloader stderr.
fn last_error_line(stderr: &str) -> Option<String> {
    let lines = || stderr.lines().map(str::trim).filter(|l| !l.is_empty());
    lines()
        .filter(|l| l.starts_with("ERROR"))
        .last()
        .or_else(|| lines().last())
        .map(str::to_string)
}
