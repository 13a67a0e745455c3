//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use throttle_proxy::config::validate;
use throttle_proxy::observability::GatewayMetrics;
use throttle_proxy::{Gateway, HttpServer, Shutdown};

/// Serve `router` as a mock upstream on an ephemeral port.
pub async fn start_backend(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    addr
}

/// A port with nothing listening on it.
pub fn closed_port() -> SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap()
}

/// A running gateway under test.
pub struct TestProxy {
    pub addr: SocketAddr,
    pub gateway: Gateway,
    pub metrics: Arc<GatewayMetrics>,
    pub shutdown: Shutdown,
}

impl TestProxy {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Wait until every permit is back, failing after a few seconds.
    pub async fn wait_until_idle(&self) {
        let gate = self.gateway.gate();
        tokio::time::timeout(Duration::from_secs(5), async {
            while gate.available() != gate.capacity() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("permits were not returned");
    }
}

impl Drop for TestProxy {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Start a gateway with `capacity` permits forwarding to `upstream`.
pub async fn start_proxy(upstream: SocketAddr, capacity: i64) -> TestProxy {
    let config = validate(&format!("http://{upstream}"), 1, capacity).unwrap();
    let metrics = Arc::new(GatewayMetrics::new().unwrap());
    let server = HttpServer::new(&config, Arc::clone(&metrics)).unwrap();
    let gateway = server.gateway().clone();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    TestProxy {
        addr,
        gateway,
        metrics,
        shutdown,
    }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

/// Value of the first sample of `name` carrying all `labels` in a
/// Prometheus text exposition.
pub fn sample_value(rendered: &str, name: &str, labels: &[(&str, &str)]) -> Option<f64> {
    rendered
        .lines()
        .filter(|line| line.starts_with(&format!("{name}{{")))
        .find(|line| {
            labels
                .iter()
                .all(|(k, v)| line.contains(&format!("{k}=\"{v}\"")))
        })
        .and_then(|line| line.rsplit(' ').next())
        .and_then(|value| value.parse().ok())
}
