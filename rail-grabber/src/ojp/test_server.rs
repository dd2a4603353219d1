//! Minimal in-process planner stand-in for client tests.
//!
//! Speaks just enough HTTP/1.1 for reqwest: keep-alive connections,
//! Content-Length bodies, a session cookie on the search page.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

const SEARCH_PAGE: &str = "<html><body>search</body></html>";

pub(crate) struct TestServer {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<String>>>,
}

impl TestServer {
    /// Serve `plan_body` for every plan request.
    pub(crate) async fn start(plan_body: &str) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let body: Arc<str> = Arc::from(plan_body);

        let recorded = Arc::clone(&requests);
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                tokio::spawn(serve_connection(
                    stream,
                    Arc::clone(&body),
                    Arc::clone(&recorded),
                ));
            }
        });

        Self { addr, requests }
    }

    /// Accept connections but never answer.
    pub(crate) async fn start_silent() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((stream, _)) = listener.accept().await {
                held.push(stream);
            }
        });

        Self {
            addr,
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub(crate) fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub(crate) fn count_requests(&self, prefix: &str) -> usize {
        let requests = self.requests.lock().unwrap();
        requests.iter().filter(|r| r.starts_with(prefix)).count()
    }

    pub(crate) fn find_request(&self, prefix: &str) -> Option<String> {
        let requests = self.requests.lock().unwrap();
        requests.iter().find(|r| r.starts_with(prefix)).cloned()
    }
}

/// A base URL on which nothing is listening.
pub(crate) async fn unreachable_base_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

async fn serve_connection(
    mut stream: TcpStream,
    plan_body: Arc<str>,
    requests: Arc<Mutex<Vec<String>>>,
) {
    let mut buf = Vec::new();

    while let Some(request) = read_request(&mut stream, &mut buf).await {
        let response = if request.starts_with("GET") {
            format!(
                "HTTP/1.1 200 OK\r\nSet-Cookie: JSESSIONID=test-session; Path=/\r\nContent-Type: text/html\r\nContent-Length: {}\r\n\r\n{}",
                SEARCH_PAGE.len(),
                SEARCH_PAGE
            )
        } else {
            format!(
                "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: {}\r\n\r\n{}",
                plan_body.len(),
                plan_body
            )
        };

        requests.lock().unwrap().push(request);

        if stream.write_all(response.as_bytes()).await.is_err() {
            return;
        }
    }
}

async fn read_request(stream: &mut TcpStream, buf: &mut Vec<u8>) -> Option<String> {
    loop {
        if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            let head = String::from_utf8_lossy(&buf[..end]).to_string();
            let total = end + 4 + content_length(&head);
            if buf.len() >= total {
                let request = String::from_utf8_lossy(&buf[..total]).to_string();
                buf.drain(..total);
                return Some(request);
            }
        }

        let mut chunk = [0u8; 4096];
        let n = stream.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
}

fn content_length(head: &str) -> usize {
    head.lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse().ok())
        .unwrap_or(0)
}
