//! Shared libcurl plumbing: one place that applies identity and timeouts to
//! every easy handle, plus response-header tracking.

use std::str;
use std::time::Duration;

/// Maximum redirects followed for any request.
const MAX_REDIRECTS: u32 = 10;

/// Client identity and timeouts applied to every outbound GET.
#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub user_agent: String,
    /// Connect timeout, and the stall window for reads.
    pub timeout: Duration,
}

/// Applies URL, identity, redirect and timeout options to `easy`.
///
/// libcurl has no per-read timeout; a transfer that moves less than one byte
/// per second for the whole `timeout` window is aborted instead.
pub fn configure(
    easy: &mut curl::easy::Easy,
    url: &str,
    settings: &HttpSettings,
) -> Result<(), curl::Error> {
    easy.url(url)?;
    easy.get(true)?;
    easy.useragent(&settings.user_agent)?;
    easy.follow_location(true)?;
    easy.max_redirections(MAX_REDIRECTS)?;
    easy.connect_timeout(settings.timeout)?;
    easy.low_speed_limit(1)?;
    easy.low_speed_time(settings.timeout)?;
    Ok(())
}

/// Status line and headers of the most recent response seen on a transfer.
///
/// With redirects, libcurl reports every hop's headers; a new status line
/// resets the state so only the final response counts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseHead {
    pub status: Option<u32>,
    pub content_length: Option<u64>,
}

impl ResponseHead {
    /// Feed one raw header line as delivered by libcurl's header callback.
    pub fn observe(&mut self, raw: &[u8]) {
        let Ok(line) = str::from_utf8(raw) else {
            return;
        };
        let line = line.trim();
        if line.is_empty() {
            return;
        }
        if line.starts_with("HTTP/") {
            *self = ResponseHead {
                status: line
                    .split_whitespace()
                    .nth(1)
                    .and_then(|code| code.parse::<u32>().ok()),
                content_length: None,
            };
            return;
        }
        if let Some((name, value)) = line.split_once(':') {
            if name.trim().eq_ignore_ascii_case("content-length") {
                self.content_length = value.trim().parse::<u64>().ok();
            }
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.status, Some(200..=299))
    }
}

/// A fully buffered response (small documents: pages, robots.txt).
#[derive(Debug, Clone)]
pub struct Response {
    pub status: u32,
    /// URL after redirects.
    pub effective_url: String,
    pub body: Vec<u8>,
}

/// Performs a GET and buffers the whole body. Any status is returned as-is.
pub fn get(url: &str, settings: &HttpSettings) -> Result<Response, curl::Error> {
    let mut body = Vec::new();
    let mut easy = curl::easy::Easy::new();
    configure(&mut easy, url, settings)?;
    {
        let mut transfer = easy.transfer();
        transfer.write_function(|data| {
            body.extend_from_slice(data);
            Ok(data.len())
        })?;
        transfer.perform()?;
    }
    let status = easy.response_code()?;
    let effective_url = easy
        .effective_url()?
        .map(str::to_string)
        .unwrap_or_else(|| url.to_string());
    Ok(Response {
        status,
        effective_url,
        body,
    })
}
