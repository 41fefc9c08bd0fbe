//! Minimal HTTP/1.1 server for integration tests.
//!
//! Serves fixed `(status, body)` pairs by request path; unknown paths get 404.
//! A path may carry a sequence of responses, served in order with the last
//! one repeating. Every request is recorded so tests can assert what was
//! (not) fetched.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::thread;

#[derive(Clone)]
pub struct TestServer {
    pub base: String,
    hits: Arc<Mutex<Vec<String>>>,
}

impl TestServer {
    /// Absolute URL for `path` (which starts with `/`).
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    /// Paths requested so far, in arrival order.
    pub fn hits(&self) -> Vec<String> {
        self.hits.lock().unwrap().clone()
    }
}

type Routes = HashMap<String, Vec<(u16, String)>>;

/// Starts a server in a background thread. Runs until the process exits.
pub fn start(routes: &[(&str, u16, &str)]) -> TestServer {
    let seqs: Vec<(&str, Vec<(u16, &str)>)> =
        routes.iter().map(|(p, s, b)| (*p, vec![(*s, *b)])).collect();
    start_with_sequences(&seqs)
}

/// Like `start`, but each path answers its responses in order.
pub fn start_with_sequences(routes: &[(&str, Vec<(u16, &str)>)]) -> TestServer {
    let routes: Arc<Routes> = Arc::new(
        routes
            .iter()
            .map(|(p, seq)| {
                let seq = seq.iter().map(|(s, b)| (*s, b.to_string())).collect();
                (p.to_string(), seq)
            })
            .collect(),
    );
    let hits = Arc::new(Mutex::new(Vec::new()));
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    {
        let hits = Arc::clone(&hits);
        thread::spawn(move || {
            for stream in listener.incoming().flatten() {
                let routes = Arc::clone(&routes);
                let hits = Arc::clone(&hits);
                thread::spawn(move || handle(stream, &routes, &hits));
            }
        });
    }
    TestServer {
        base: format!("http://127.0.0.1:{}", port),
        hits,
    }
}

fn handle(
    mut stream: std::net::TcpStream,
    routes: &Routes,
    hits: &Mutex<Vec<String>>,
) {
    let _ = stream.set_read_timeout(Some(std::time::Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(std::time::Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) | Err(_) => return,
        Ok(n) => n,
    };
    let request = String::from_utf8_lossy(&buf[..n]);
    let path = request
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or("/")
        .to_string();
    let seen = {
        let mut hits = hits.lock().unwrap();
        let seen = hits.iter().filter(|p| **p == path).count();
        hits.push(path.clone());
        seen
    };

    let (status, body) = routes
        .get(&path)
        .and_then(|seq| seq.get(seen.min(seq.len().saturating_sub(1))))
        .cloned()
        .unwrap_or((404, "not found".to_string()));
    let reason = match status {
        200 => "OK",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "Status",
    };
    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        reason,
        body.len(),
        body
    );
    let _ = stream.write_all(response.as_bytes());
}
