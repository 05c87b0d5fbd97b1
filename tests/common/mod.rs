//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::time::Duration;

use axum::{http::StatusCode, routing::post, Json, Router};
use satellite_mirror::config::AppConfig;
use satellite_mirror::http::HttpServer;
use satellite_mirror::lifecycle::Shutdown;
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

/// Start a mock satellite on an ephemeral port.
///
/// Every notification POSTed to `/requests` is forwarded on the returned
/// channel; the satellite answers with `status`.
pub async fn start_satellite(status: StatusCode) -> (SocketAddr, mpsc::UnboundedReceiver<Value>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let app = Router::new().route(
        "/requests",
        post(move |Json(notification): Json<Value>| {
            let tx = tx.clone();
            async move {
                let _ = tx.send(notification);
                status
            }
        }),
    );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (addr, rx)
}

/// An address nothing listens on.
pub async fn unreachable_satellite() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

/// Serve `app` mirrored to `satellite`; returns its address and a shutdown handle.
pub async fn start_app(satellite: SocketAddr, app: Router) -> (SocketAddr, Shutdown) {
    let mut config = AppConfig::default();
    config.mirror.satellite_host = format!("http://{satellite}");
    config.mirror.timeout_secs = 2;

    let server = HttpServer::new(config, app).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });
    (addr, shutdown)
}

/// Wait for the next notification, failing the test after a few seconds.
pub async fn next_notification(rx: &mut mpsc::UnboundedReceiver<Value>) -> Value {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("satellite received nothing")
        .expect("satellite channel closed")
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}
