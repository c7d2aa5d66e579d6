use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Browser-like client identity sent on every request and used for robots.txt matching.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Default output directory (relative to the working directory).
pub const DEFAULT_OUTPUT_DIR: &str = "media_download";

/// Default external video downloader program.
pub const DEFAULT_VIDEO_PROGRAM: &str = "yt-dlp";

/// Default cookie file handed to the video downloader when present.
pub const DEFAULT_COOKIES_FILE: &str = "cookies.txt";

/// Global configuration loaded from `~/.config/mediagrab/config.toml`.
/// Missing fields take their defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MediagrabConfig {
    /// Directory downloaded media is written to.
    pub output_dir: PathBuf,
    /// Number of concurrent image fetches.
    pub workers: usize,
    /// Images whose declared size is below this many KiB are skipped.
    pub min_size_kb: u64,
    /// Connect and stall timeout for every HTTP request, in seconds.
    pub timeout_secs: u64,
    /// `User-Agent` sent on every request.
    pub user_agent: String,
    /// External video downloader program; defaults to `yt-dlp` on PATH.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_program: Option<String>,
    /// Netscape cookie file for the video downloader; defaults to `cookies.txt`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cookies_file: Option<PathBuf>,
}

impl Default for MediagrabConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            workers: 5,
            min_size_kb: 5,
            timeout_secs: 10,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            video_program: None,
            cookies_file: None,
        }
    }
}

/// Per-invocation values that take precedence over the config file (CLI flags).
#[derive(Debug, Clone, Default)]
pub struct RunOverrides {
    pub output_dir: Option<PathBuf>,
    pub workers: Option<usize>,
    pub min_size_kb: Option<u64>,
}

/// Immutable settings for one run, passed into every component.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub output_dir: PathBuf,
    /// Worker pool size; always at least 1.
    pub workers: usize,
    pub min_size_kb: u64,
    pub timeout: Duration,
    pub identity: String,
}

impl RunConfig {
    /// Size threshold in bytes below which a declared `Content-Length` is skipped.
    pub fn min_size_bytes(&self) -> u64 {
        self.min_size_kb.saturating_mul(1024)
    }

    pub fn http(&self) -> crate::http::HttpSettings {
        crate::http::HttpSettings {
            user_agent: self.identity.clone(),
            timeout: self.timeout,
        }
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        MediagrabConfig::default().run_config(&RunOverrides::default())
    }
}

impl MediagrabConfig {
    /// Merge CLI overrides on top of file values into a `RunConfig`.
    pub fn run_config(&self, overrides: &RunOverrides) -> RunConfig {
        RunConfig {
            output_dir: overrides
                .output_dir
                .clone()
                .unwrap_or_else(|| self.output_dir.clone()),
            workers: overrides.workers.unwrap_or(self.workers).max(1),
            min_size_kb: overrides.min_size_kb.unwrap_or(self.min_size_kb),
            timeout: Duration::from_secs(self.timeout_secs.max(1)),
            identity: self.user_agent.clone(),
        }
    }

    pub fn video_program(&self) -> &str {
        self.video_program.as_deref().unwrap_or(DEFAULT_VIDEO_PROGRAM)
    }

    pub fn cookies_file(&self) -> &Path {
        self.cookies_file
            .as_deref()
            .unwrap_or_else(|| Path::new(DEFAULT_COOKIES_FILE))
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("mediagrab")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<MediagrabConfig> {
    let path = config_path()?;
    load_or_init_at(&path)
}

/// Like `load_or_init` but at an explicit path.
pub fn load_or_init_at(path: &Path) -> Result<MediagrabConfig> {
    if !path.exists() {
        let default_cfg = MediagrabConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml).with_context(|| format!("write {}", path.display()))?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: MediagrabConfig =
        toml::from_str(&data).with_context(|| format!("parse {}", path.display()))?;
    Ok(cfg)
}
