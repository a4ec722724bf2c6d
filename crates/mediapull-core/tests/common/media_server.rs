//! Minimal HTTP/1.1 server standing in for the listing API and the CDN.
//!
//! `GET /v1_1/<account>/resources/image` serves scripted listing pages
//! (basic auth required, `next_cursor` selects the page). `GET /img/<name>`
//! serves image bodies; unknown images get 404. Every listing query string
//! is recorded for assertions.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

/// `Authorization` value for key `key`, secret `secret`.
pub const GOOD_AUTH: &str = "Basic a2V5OnNlY3JldA==";

/// One listing page: (public_id, body) pairs plus whether another page follows.
#[derive(Debug, Clone)]
pub struct Page {
    pub images: Vec<(String, Vec<u8>)>,
    pub has_more: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ServerOptions {
    /// Listing responds with this status instead of a page.
    pub listing_status: Option<u16>,
    /// Image ids that are listed but answer 404.
    pub missing: Vec<String>,
}

pub struct MediaServer {
    pub base_url: String,
    pub listing_queries: Arc<Mutex<Vec<String>>>,
}

impl MediaServer {
    pub fn api_base(&self) -> String {
        format!("{}/v1_1", self.base_url)
    }

    pub fn queries(&self) -> Vec<String> {
        self.listing_queries.lock().unwrap().clone()
    }
}

struct State {
    base_url: String,
    pages: Vec<Page>,
    bodies: HashMap<String, Vec<u8>>,
    opts: ServerOptions,
    queries: Arc<Mutex<Vec<String>>>,
}

/// Starts a server in a background thread. It runs until the process exits.
pub fn start(pages: Vec<Page>, opts: ServerOptions) -> MediaServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let base_url = format!("http://127.0.0.1:{}", port);
    let queries = Arc::new(Mutex::new(Vec::new()));

    let mut bodies = HashMap::new();
    for page in &pages {
        for (id, body) in &page.images {
            if !opts.missing.contains(id) {
                bodies.insert(format!("{}.png", id), body.clone());
            }
        }
    }
    let state = Arc::new(State {
        base_url: base_url.clone(),
        pages,
        bodies,
        opts,
        queries: Arc::clone(&queries),
    });

    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let state = Arc::clone(&state);
            thread::spawn(move || handle(stream, &state));
        }
    });

    MediaServer {
        base_url,
        listing_queries: queries,
    }
}

fn handle(mut stream: TcpStream, state: &State) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) | Err(_) => return,
        Ok(n) => n,
    };
    let request = match std::str::from_utf8(&buf[..n]) {
        Ok(s) => s,
        Err(_) => return,
    };
    let (target, auth) = parse_request(request);
    let (path, query) = target.split_once('?').unwrap_or((target, ""));

    if path.contains("/resources/") {
        state.queries.lock().unwrap().push(query.to_string());
        if auth.as_deref() != Some(GOOD_AUTH) {
            let body = br#"{"error":{"message":"bad key"}}"#;
            respond(&mut stream, "401 Unauthorized", "application/json", body, "");
            return;
        }
        if let Some(status) = state.opts.listing_status {
            let line = format!("{} Scripted", status);
            respond(&mut stream, &line, "text/plain", b"scripted failure", "");
            return;
        }
        let index = cursor_of(query)
            .and_then(|c| c.strip_prefix("cursor-").map(str::to_string))
            .and_then(|i| i.parse::<usize>().ok())
            .unwrap_or(0);
        let Some(page) = state.pages.get(index) else {
            respond(&mut stream, "400 Bad Request", "text/plain", b"bad cursor", "");
            return;
        };
        let body = page_json(state, page, index);
        respond(
            &mut stream,
            "200 OK",
            "application/json",
            body.as_bytes(),
            "X-FeatureRateLimit-Limit: 500\r\nX-FeatureRateLimit-Remaining: 499\r\n",
        );
        return;
    }

    if let Some(name) = path.strip_prefix("/img/") {
        match state.bodies.get(name) {
            Some(body) => respond(&mut stream, "200 OK", "image/png", body, ""),
            None => respond(&mut stream, "404 Not Found", "text/plain", b"not found", ""),
        }
        return;
    }

    respond(&mut stream, "404 Not Found", "text/plain", b"not found", "");
}

fn page_json(state: &State, page: &Page, index: usize) -> String {
    let resources: Vec<serde_json::Value> = page
        .images
        .iter()
        .map(|(id, body)| {
            serde_json::json!({
                "public_id": id,
                "format": "png",
                "bytes": body.len(),
                "secure_url": format!("{}/img/{}.png", state.base_url, id),
                "resource_type": "image",
                "width": 10,
                "height": 10
            })
        })
        .collect();
    let mut doc = serde_json::json!({ "resources": resources });
    if page.has_more {
        doc["next_cursor"] = serde_json::Value::String(format!("cursor-{}", index + 1));
    }
    doc.to_string()
}

fn respond(stream: &mut TcpStream, status: &str, content_type: &str, body: &[u8], extra: &str) {
    let head = format!(
        "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\n{}Connection: close\r\n\r\n",
        status,
        content_type,
        body.len(),
        extra
    );
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(body);
}

/// Returns (request target, Authorization header).
fn parse_request(request: &str) -> (&str, Option<String>) {
    let mut target = "";
    let mut auth = None;
    for (i, line) in request.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            break;
        }
        if i == 0 {
            target = line.split_whitespace().nth(1).unwrap_or("");
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            if name.trim().eq_ignore_ascii_case("authorization") {
                auth = Some(value.trim().to_string());
            }
        }
    }
    (target, auth)
}

fn cursor_of(query: &str) -> Option<&str> {
    query
        .split('&')
        .filter_map(|kv| kv.split_once('='))
        .find(|(k, _)| *k == "next_cursor")
        .map(|(_, v)| v)
}
