//! Minimal HTTP/1.1 server for integration tests.
//!
//! Serves a fixed set of routes (path → status, body, length header policy),
//! closes every connection after one response, and counts requests per path.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

/// How the `Content-Length` header is sent.
#[derive(Debug, Clone, Copy)]
pub enum Length {
    /// Actual body length.
    Exact,
    /// No header; body delimited by connection close.
    Omit,
    /// This value, whatever the body length; the connection closes after the body.
    Declared(u64),
}

#[derive(Debug, Clone)]
pub struct Route {
    pub status: u16,
    pub body: Vec<u8>,
    pub length: Length,
    pub content_type: &'static str,
    /// Wait this long before sending anything.
    pub delay: Option<Duration>,
    /// `Location` header value.
    pub location: Option<String>,
}

impl Route {
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            body: body.into(),
            length: Length::Exact,
            content_type: "application/octet-stream",
            delay: None,
            location: None,
        }
    }

    pub fn html(body: &str) -> Self {
        Self {
            content_type: "text/html; charset=utf-8",
            ..Self::ok(body.as_bytes().to_vec())
        }
    }

    pub fn text(body: &str) -> Self {
        Self {
            content_type: "text/plain",
            ..Self::ok(body.as_bytes().to_vec())
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            ..Self::ok(b"error".to_vec())
        }
    }

    /// `302 Found` to `location` with an empty body.
    pub fn redirect(location: &str) -> Self {
        Self {
            status: 302,
            location: Some(location.to_string()),
            ..Self::ok(Vec::new())
        }
    }

    /// Claims `declared` bytes but sends only the body, then closes.
    pub fn truncated(mut self, declared: u64) -> Self {
        self.length = Length::Declared(declared);
        self
    }

    pub fn without_length(mut self) -> Self {
        self.length = Length::Omit;
        self
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

pub struct MediaServer {
    /// e.g. "http://127.0.0.1:12345"
    pub base: String,
    hits: Arc<Mutex<HashMap<String, usize>>>,
}

impl MediaServer {
    /// Starts a server in a background thread. Unknown paths get 404.
    /// The server runs until the process exits.
    pub fn start(routes: Vec<(&str, Route)>) -> Self {
        Self::start_with(|_| routes)
    }

    /// Like [`MediaServer::start`], but routes are built once the base URL is
    /// known, so bodies can reference the server itself.
    pub fn start_with<'a>(build: impl FnOnce(&str) -> Vec<(&'a str, Route)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let port = listener.local_addr().unwrap().port();
        let base = format!("http://127.0.0.1:{}", port);
        let routes = build(&base);
        let routes: Arc<HashMap<String, Route>> = Arc::new(
            routes
                .into_iter()
                .map(|(p, r)| (p.to_string(), r))
                .collect(),
        );
        let hits = Arc::new(Mutex::new(HashMap::new()));
        let hits_srv = Arc::clone(&hits);
        thread::spawn(move || {
            for stream in listener.incoming().flatten() {
                let routes = Arc::clone(&routes);
                let hits = Arc::clone(&hits_srv);
                thread::spawn(move || handle(stream, &routes, &hits));
            }
        });
        MediaServer { base, hits }
    }

    /// Absolute URL for `path` (which starts with `/`).
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    /// Requests received for `path` (query included as sent).
    pub fn hits(&self, path: &str) -> usize {
        self.hits.lock().unwrap().get(path).copied().unwrap_or(0)
    }

    /// Requests received for all paths.
    pub fn total_hits(&self) -> usize {
        self.hits.lock().unwrap().values().sum()
    }
}

fn handle(mut stream: TcpStream, routes: &HashMap<String, Route>, hits: &Mutex<HashMap<String, usize>>) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(5)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(5)));
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        match stream.read(&mut chunk) {
            Ok(0) | Err(_) => return,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }
    let request = String::from_utf8_lossy(&buf);
    let target = request
        .lines()
        .next()
        .and_then(|l| l.split_whitespace().nth(1))
        .unwrap_or("/")
        .to_string();
    *hits.lock().unwrap().entry(target.clone()).or_insert(0) += 1;

    let path = target.split('?').next().unwrap_or("/");
    let route = routes.get(&target).or_else(|| routes.get(path));
    let Some(route) = route else {
        let _ = stream.write_all(
            b"HTTP/1.1 404 Not Found\r\nContent-Length: 9\r\nConnection: close\r\n\r\nnot found",
        );
        return;
    };

    if let Some(delay) = route.delay {
        thread::sleep(delay);
    }

    let mut head = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nConnection: close\r\n",
        route.status,
        reason(route.status),
        route.content_type
    );
    match route.length {
        Length::Exact => head.push_str(&format!("Content-Length: {}\r\n", route.body.len())),
        Length::Declared(n) => head.push_str(&format!("Content-Length: {}\r\n", n)),
        Length::Omit => {}
    }
    if let Some(location) = &route.location {
        head.push_str(&format!("Location: {}\r\n", location));
    }
    head.push_str("\r\n");
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(&route.body);
    let _ = stream.flush();
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        302 => "Found",
        403 => "Forbidden",
        404 => "Not Found",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Status",
    }
}
