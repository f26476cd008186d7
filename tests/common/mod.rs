//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Response, StatusCode};
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use shell_protocol::files::fs::{FileKind, FileSystem, TokioFs};
use shell_protocol::http::fetch::{FetchError, Fetcher, NetFetcher};
use shell_protocol::http::request::RequestInit;

/// Start a mock backend that answers every request with its request line and
/// headers, one per line. Returns the bound address.
pub async fn start_echo_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    tokio::spawn(async move {
                        let mut head = Vec::new();
                        let mut buf = [0u8; 1024];
                        while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                            match socket.read(&mut buf).await {
                                Ok(0) | Err(_) => return,
                                Ok(n) => head.extend_from_slice(&buf[..n]),
                            }
                        }
                        let head = String::from_utf8_lossy(&head);
                        let body: String = head
                            .split("\r\n")
                            .filter(|line| !line.is_empty())
                            .map(|line| format!("{}\n", line.trim_end_matches(" HTTP/1.1")))
                            .collect();

                        let response_str = format!(
                            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nContent-Type: text/plain\r\nX-Backend: echo\r\nConnection: close\r\n\r\n{}",
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response_str.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// A built bundle on disk:
/// `index.html`, `404.html`, `docs/index.html`, `assets/app.js`,
/// `ignore/me/file.txt` and an empty `empty/` directory.
pub fn bundle(with_error_page: bool) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(root, "index.html", "<h1>home</h1>");
    write(root, "docs/index.html", "<h1>docs</h1>");
    write(root, "assets/app.js", "console.log('app')");
    write(root, "ignore/me/file.txt", "local file");
    std::fs::create_dir_all(root.join("empty")).unwrap();
    if with_error_page {
        write(root, "404.html", "<h1>not found</h1>");
    }
    dir
}

fn write(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, contents).unwrap();
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// [`FileSystem`] that records every path it is asked about.
#[derive(Debug, Default)]
pub struct CountingFs {
    stats: Mutex<Vec<PathBuf>>,
}

impl CountingFs {
    pub fn stats(&self) -> Vec<PathBuf> {
        self.stats.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.stats.lock().unwrap().len()
    }
}

#[async_trait]
impl FileSystem for CountingFs {
    async fn stat(&self, path: &Path) -> Option<FileKind> {
        self.stats.lock().unwrap().push(path.to_path_buf());
        TokioFs.stat(path).await
    }
}

/// [`Fetcher`] that answers `http:` URLs itself and reads `file:` URLs from
/// disk, recording every call.
#[derive(Debug, Default)]
pub struct RecordingFetcher {
    calls: Mutex<Vec<(String, RequestInit)>>,
    disk: NetFetcher,
}

impl RecordingFetcher {
    pub fn calls(&self) -> Vec<(String, RequestInit)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn http_calls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .map(|(url, _)| url)
            .filter(|url| url.starts_with("http"))
            .collect()
    }
}

#[async_trait]
impl Fetcher for RecordingFetcher {
    async fn fetch(&self, url: &str, init: RequestInit) -> Result<Response<Body>, FetchError> {
        self.calls.lock().unwrap().push((url.to_string(), init.clone()));
        if url.starts_with("file:") {
            return self.disk.fetch(url, init).await;
        }
        let mut response = Response::new(Body::from(format!("proxied:{url}")));
        *response.status_mut() = StatusCode::CREATED;
        Ok(response)
    }
}
