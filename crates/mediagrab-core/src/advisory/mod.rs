//! Best-effort robots.txt advisory, consulted once per run.
//!
//! The answer is informational: callers may warn, but nothing in the
//! download path is gated on it. Any failure to obtain or read the policy
//! fails open (`allowed = true`, reason `PolicyUnavailable`).

mod robots;

pub use robots::RobotsTxt;

use std::time::Duration;
use url::Url;

use crate::http::{self, HttpSettings};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvisoryReason {
    /// A policy was read and permits the fetch (or the site publishes none).
    PolicyAllowed,
    /// A policy was read and disallows the fetch.
    PolicyDenied,
    /// The policy could not be obtained or read.
    PolicyUnavailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Advice {
    pub allowed: bool,
    pub reason: AdvisoryReason,
}

impl Advice {
    pub const fn unavailable() -> Self {
        Self {
            allowed: true,
            reason: AdvisoryReason::PolicyUnavailable,
        }
    }

    fn from_policy(allowed: bool) -> Self {
        Self {
            allowed,
            reason: if allowed {
                AdvisoryReason::PolicyAllowed
            } else {
                AdvisoryReason::PolicyDenied
            },
        }
    }
}

/// `/robots.txt` at the origin of `page`, for http(s) pages.
pub fn robots_url(page: &Url) -> Option<Url> {
    if page.scheme() != "http" && page.scheme() != "https" {
        return None;
    }
    page.join("/robots.txt").ok()
}

/// Path and query of `page` as matched against robots rules.
fn request_path(page: &Url) -> String {
    match page.query() {
        Some(q) => format!("{}?{}", page.path(), q),
        None => page.path().to_string(),
    }
}

/// Evaluates a robots.txt response for `page`. Pure; used by [`advise`].
pub fn evaluate(status: u32, body: &[u8], page: &Url, identity: &str) -> Advice {
    match status {
        200..=299 => match std::str::from_utf8(body) {
            Ok(text) => {
                let policy = RobotsTxt::parse(text);
                Advice::from_policy(policy.is_allowed(identity, &request_path(page)))
            }
            Err(_) => Advice::unavailable(),
        },
        // No policy published.
        400..=499 => Advice::from_policy(true),
        _ => Advice::unavailable(),
    }
}

/// Looks up the page origin's robots.txt and reports whether `identity` may fetch `page_url`.
/// Blocking; call from `spawn_blocking` when used from async code.
pub fn advise(page_url: &str, identity: &str, timeout: Duration) -> Advice {
    let Ok(page) = Url::parse(page_url.trim()) else {
        tracing::debug!(page_url, "robots advisory: unparseable page URL");
        return Advice::unavailable();
    };
    let Some(robots) = robots_url(&page) else {
        return Advice::unavailable();
    };
    let settings = HttpSettings {
        user_agent: identity.to_string(),
        timeout,
    };
    match http::get(robots.as_str(), &settings) {
        Ok(response) => {
            let advice = evaluate(response.status, &response.body, &page, identity);
            tracing::debug!(url = %robots, status = response.status, ?advice, "robots advisory");
            advice
        }
        Err(e) => {
            tracing::debug!(url = %robots, "robots.txt unavailable: {}", e);
            Advice::unavailable()
        }
    }
}
