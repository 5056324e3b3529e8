//! Shared utilities for integration testing.

use std::net::SocketAddr;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use charset_proxy::config::{CharsetConfig, ProxyConfig, RewriteConfig, RouteConfig};
use charset_proxy::{HttpServer, Shutdown};

/// What the mock upstream answers with.
#[derive(Clone)]
pub struct MockResponse {
    pub status: u16,
    pub content_type: Option<&'static str>,
    pub body: &'static [u8],
    /// Send the body with `Transfer-Encoding: chunked` instead of a length.
    pub chunked: bool,
}

/// Start a mock upstream that answers every request with `response`.
///
/// Returns its address and a receiver of the raw request heads it saw.
pub async fn start_upstream(
    response: MockResponse,
) -> (SocketAddr, mpsc::UnboundedReceiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let response = response.clone();
            let tx = tx.clone();
            tokio::spawn(async move {
                let head = read_head(&mut socket).await;
                let _ = tx.send(head);

                let mut out = format!("HTTP/1.1 {} Mock\r\n", response.status);
                if let Some(ct) = response.content_type {
                    out.push_str(&format!("Content-Type: {}\r\n", ct));
                }
                let bytes = if response.chunked {
                    out.push_str("Transfer-Encoding: chunked\r\nConnection: close\r\n\r\n");
                    let mut bytes = out.into_bytes();
                    if !response.body.is_empty() {
                        let size = format!("{:x}\r\n", response.body.len());
                        bytes.extend_from_slice(size.as_bytes());
                        bytes.extend_from_slice(response.body);
                        bytes.extend_from_slice(b"\r\n");
                    }
                    bytes.extend_from_slice(b"0\r\n\r\n");
                    bytes
                } else {
                    out.push_str(&format!(
                        "Content-Length: {}\r\nConnection: close\r\n\r\n",
                        response.body.len()
                    ));
                    let mut bytes = out.into_bytes();
                    bytes.extend_from_slice(response.body);
                    bytes
                };
                let _ = socket.write_all(&bytes).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    (addr, rx)
}

async fn read_head(socket: &mut tokio::net::TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

/// A catch-all route to `upstream` converting `from` → utf-8.
pub fn route(name: &str, upstream: SocketAddr, from: &str) -> RouteConfig {
    RouteConfig {
        name: name.into(),
        host: None,
        path_prefix: Some("/".into()),
        upstream: upstream.to_string(),
        priority: 0,
        max_body_bytes: 1024 * 1024,
        rewrite: RewriteConfig {
            charset: CharsetConfig {
                from: from.into(),
                to: "utf-8".into(),
            },
        },
    }
}

/// Start the proxy on an ephemeral port.
pub async fn start_proxy(routes: Vec<RouteConfig>) -> (SocketAddr, Shutdown) {
    let mut config = ProxyConfig::default();
    config.routes = routes;

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server = HttpServer::new(config);
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    (addr, shutdown)
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
