//! The HTTP host in front of a registered scheme router.

mod common;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use shell_protocol::config::EnvSource;
use shell_protocol::http::HttpServer;
use shell_protocol::lifecycle::Shutdown;
use shell_protocol::routing::{ProxyRule, ProxyTable};
use shell_protocol::scheme::{register_handler, RouterOptions, SchemeRegistry};
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use common::{bundle, start_echo_backend};

struct Host {
    addr: SocketAddr,
    shutdown: Arc<Shutdown>,
    task: JoinHandle<Result<(), std::io::Error>>,
    _bundle: TempDir,
}

async fn start_host(with_error_page: bool, table: ProxyTable) -> Host {
    let dir = bundle(with_error_page);
    let registry = Arc::new(SchemeRegistry::new());
    register_handler(
        registry.as_ref(),
        "app",
        dir.path(),
        table,
        RouterOptions::default().env(EnvSource::fixed([("VITE_DEV_URL", "http://localhost:3000")])),
    )
    .unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Arc::new(Shutdown::new());
    let server = HttpServer::new(registry, "app", shutdown.clone());
    let task = tokio::spawn(server.run(listener));

    Host {
        addr,
        shutdown,
        task,
        _bundle: dir,
    }
}

#[tokio::test]
async fn test_serves_bundle_over_http() {
    let host = start_host(true, ProxyTable::new()).await;
    let client = reqwest::Client::new();

    let res = client.get(format!("http://{}/docs", host.addr)).send().await.unwrap();
    assert_eq!(res.status(), 200);
    assert!(res.headers().contains_key("x-request-id"));
    assert_eq!(res.text().await.unwrap(), "<h1>docs</h1>");

    let res = client
        .get(format!("http://{}/missing?x=1", host.addr))
        .send()
        .await
        .unwrap();
    assert_eq!(res.text().await.unwrap(), "<h1>not found</h1>");

    let res = client
        .get(format!("http://{}/..%2F..%2Fetc%2Fpasswd", host.addr))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 400);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "Bad Request - Unsafe Path");

    host.shutdown.trigger("test complete");
    drop(client);
    tokio::time::timeout(Duration::from_secs(5), host.task)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn test_proxies_and_reports_upstream_failure() {
    let backend = start_echo_backend().await;
    let table = ProxyTable::new()
        .route("/api", ProxyRule::redirect(format!("http://{backend}")))
        .route("/down", ProxyRule::redirect("http://127.0.0.1:1"));
    let host = start_host(true, table).await;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("http://{}/api/items", host.addr))
        .header("x-token", "abc")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.headers()["x-backend"], "echo");
    let body = res.text().await.unwrap();
    assert!(body.starts_with("GET /api/items\n"), "{body}");
    assert!(body.contains("x-token: abc"), "{body}");

    let res = client.get(format!("http://{}/down/x", host.addr)).send().await.unwrap();
    assert_eq!(res.status(), 502);
    assert!(!host.shutdown.is_triggered());
}

#[tokio::test]
async fn test_missing_error_page_stops_host() {
    let host = start_host(false, ProxyTable::new()).await;
    let client = reqwest::Client::new();

    let res = client.get(format!("http://{}/missing", host.addr)).send().await.unwrap();
    assert_eq!(res.status(), 500);
    let body: serde_json::Value = res.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("404.html"));
    drop(client);

    tokio::time::timeout(Duration::from_secs(5), host.task)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert!(host.shutdown.is_triggered());
}

#[tokio::test]
async fn test_unregistered_scheme() {
    let registry = Arc::new(SchemeRegistry::new());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = HttpServer::new(registry, "app", Arc::new(Shutdown::new()));
    tokio::spawn(server.run(listener));

    let res = reqwest::get(format!("http://{addr}/index.html")).await.unwrap();
    assert_eq!(res.status(), 404);
}
