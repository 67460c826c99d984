//! Minimal HTTP/1.1 server for integration tests.
//!
//! Serves a fixed set of paths. A route can lie about its length (declares a
//! larger `Content-Length` than it sends, then closes) to simulate a dropped
//! connection, or answer with an error status.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

#[derive(Debug, Clone)]
pub struct Route {
    pub status: u16,
    pub body: Vec<u8>,
    /// Advertised length; defaults to the real body length.
    pub declared_len: Option<usize>,
}

impl Route {
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            body: body.into(),
            declared_len: None,
        }
    }

    pub fn status(code: u16) -> Self {
        Self {
            status: code,
            body: b"error".to_vec(),
            declared_len: None,
        }
    }

    /// Sends `body` but claims `declared` bytes.
    pub fn truncated(body: impl Into<Vec<u8>>, declared: usize) -> Self {
        Self {
            status: 200,
            body: body.into(),
            declared_len: Some(declared),
        }
    }
}

/// Running server: base URL plus per-path hit counters.
pub struct MediaServer {
    pub base: String,
    hits: Arc<Mutex<HashMap<String, Arc<AtomicUsize>>>>,
}

impl MediaServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path.trim_start_matches('/'))
    }

    pub fn hits(&self, path: &str) -> usize {
        let key = format!("/{}", path.trim_start_matches('/'));
        self.hits
            .lock()
            .unwrap()
            .get(&key)
            .map(|c| c.load(Ordering::SeqCst))
            .unwrap_or(0)
    }
}

/// Starts a server in a background thread. Paths are matched exactly
/// (`/feed.xml`); anything else is a 404. Runs until the process exits.
pub fn start(routes: Vec<(&str, Route)>) -> MediaServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let routes: Arc<HashMap<String, Route>> = Arc::new(
        routes
            .into_iter()
            .map(|(p, r)| (format!("/{}", p.trim_start_matches('/')), r))
            .collect(),
    );
    let hits: Arc<Mutex<HashMap<String, Arc<AtomicUsize>>>> = Arc::default();
    let hits_srv = Arc::clone(&hits);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let routes = Arc::clone(&routes);
            let hits = Arc::clone(&hits_srv);
            thread::spawn(move || handle(stream, &routes, &hits));
        }
    });
    MediaServer {
        base: format!("http://127.0.0.1:{}/", port),
        hits,
    }
}

fn reason(code: u16) -> &'static str {
    match code {
        200 => "OK",
        404 => "Not Found",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Status",
    }
}

fn handle(
    mut stream: std::net::TcpStream,
    routes: &HashMap<String, Route>,
    hits: &Mutex<HashMap<String, Arc<AtomicUsize>>>,
) {
    let _ = stream.set_read_timeout(Some(std::time::Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(std::time::Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) | Err(_) => return,
        Ok(n) => n,
    };
    let Ok(request) = std::str::from_utf8(&buf[..n]) else {
        return;
    };
    let path = request
        .lines()
        .next()
        .and_then(|l| l.split_whitespace().nth(1))
        .unwrap_or("/")
        .split('?')
        .next()
        .unwrap_or("/")
        .to_string();
    hits.lock()
        .unwrap()
        .entry(path.clone())
        .or_default()
        .fetch_add(1, Ordering::SeqCst);

    let route = routes.get(&path).cloned().unwrap_or_else(|| Route::status(404));
    let declared = route.declared_len.unwrap_or(route.body.len());
    let head = format!(
        "HTTP/1.1 {} {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        route.status,
        reason(route.status),
        declared
    );
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(&route.body);
    let _ = stream.flush();
}
