//! Test utilities for the downloader
//!
//! - [`init_test_logging`] - `Once`-guarded tracing setup
//! - [`TestServer`] - a local HTTP server with canned responses, so listing,
//!   metadata and download code can be exercised without external network
//!
//! # Example
//!
//! ```rust,no_run
//! use jnu_exam::test_utils::{Route, TestServer};
//!
//! # async fn example() {
//! let server = TestServer::start(vec![("/tree.json", Route::ok(br#"{"name":"root","dirs":[]}"#.to_vec()))]).await;
//! let url = server.url("/tree.json");
//! // ... fetch `url` ...
//! assert_eq!(server.hits("/tree.json"), 1);
//! # }
//! ```

use dashmap::DashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Once};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Uses `level` when given, otherwise `RUST_LOG`; with neither, logging stays
/// off. Safe to call from every test.
///
/// ```bash
/// RUST_LOG=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .try_init();
    });
}

/// A canned HTTP response.
#[derive(Debug, Clone)]
pub struct Route {
    pub status: u16,
    pub body: Vec<u8>,
    /// Send a `Content-Length` header. Without it the body runs until the
    /// connection closes and clients see an unknown length.
    pub content_length: bool,
}

impl Route {
    /// `200 OK` with `body`.
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            body: body.into(),
            content_length: true,
        }
    }

    /// `200 OK` with `body` and no `Content-Length`.
    pub fn ok_without_length(body: impl Into<Vec<u8>>) -> Self {
        Self {
            content_length: false,
            ..Self::ok(body)
        }
    }

    /// An empty response with `status`.
    pub fn status(status: u16) -> Self {
        Self {
            status,
            body: Vec::new(),
            content_length: true,
        }
    }
}

/// Local HTTP/1.1 server answering GETs from a fixed route table.
///
/// Unknown paths get `404`. Every request is counted per path. The server stops
/// when dropped.
pub struct TestServer {
    addr: SocketAddr,
    routes: Arc<DashMap<String, Route>>,
    hits: Arc<DashMap<String, usize>>,
    handle: JoinHandle<()>,
}

impl TestServer {
    /// Bind to an ephemeral port on 127.0.0.1 and start serving.
    pub async fn start(routes: Vec<(&str, Route)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind test server");
        let addr = listener.local_addr().expect("test server address");
        let routes: Arc<DashMap<String, Route>> = Arc::new(
            routes.into_iter().map(|(path, route)| (path.to_string(), route)).collect(),
        );
        let hits = Arc::new(DashMap::new());

        let handle = {
            let routes = Arc::clone(&routes);
            let hits = Arc::clone(&hits);
            tokio::spawn(async move {
                while let Ok((stream, _)) = listener.accept().await {
                    let routes = Arc::clone(&routes);
                    let hits = Arc::clone(&hits);
                    tokio::spawn(async move {
                        let _ = serve(stream, &routes, &hits).await;
                    });
                }
            })
        };

        Self {
            addr,
            routes,
            hits,
            handle,
        }
    }

    /// Add or replace a route. Useful when a body has to mention the server's
    /// own address.
    pub fn route(&self, path: &str, route: Route) {
        self.routes.insert(path.to_string(), route);
    }

    /// Absolute URL for `path` on this server.
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// How many requests `path` has received.
    pub fn hits(&self, path: &str) -> usize {
        self.hits.get(path).map(|count| *count).unwrap_or(0)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn serve(
    mut stream: TcpStream,
    routes: &DashMap<String, Route>,
    hits: &DashMap<String, usize>,
) -> std::io::Result<()> {
    let mut request = Vec::new();
    let mut buf = [0u8; 1024];
    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = stream.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        request.extend_from_slice(&buf[..n]);
    }

    let request = String::from_utf8_lossy(&request);
    let path = request
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or("/")
        .to_string();
    *hits.entry(path.clone()).or_insert(0) += 1;

    let route = routes
        .get(&path)
        .map(|route| route.clone())
        .unwrap_or_else(|| Route::status(404));
    let reason = match route.status {
        200 => "OK",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "Status",
    };

    let mut head = format!("HTTP/1.1 {} {}\r\n", route.status, reason);
    if route.content_length {
        head.push_str(&format!("Content-Length: {}\r\n", route.body.len()));
    }
    head.push_str("Connection: close\r\n\r\n");

    stream.write_all(head.as_bytes()).await?;
    stream.write_all(&route.body).await?;
    stream.shutdown().await
}
