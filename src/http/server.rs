//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router: `/metrics` plus a catch-all proxy route
//! - Wire up middleware (request ID, tracing)
//! - Serve on a bound listener until shutdown

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::{any, get},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::config::GatewayConfig;
use crate::gateway::Gateway;
use crate::http::forward::{RewriteError, Transport, UpstreamClient};
use crate::http::request::request_id_layer;
use crate::observability::GatewayMetrics;

/// Path serving the Prometheus exposition. Not subject to admission.
pub const METRICS_PATH: &str = "/metrics";

const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// HTTP server for the gateway.
pub struct HttpServer<T = UpstreamClient> {
    gateway: Gateway<T>,
}

impl HttpServer<UpstreamClient> {
    /// Create a server forwarding to the configured upstream.
    pub fn new(config: &GatewayConfig, metrics: Arc<GatewayMetrics>) -> Result<Self, RewriteError> {
        let transport = UpstreamClient::new(config.target(), config.connect_timeout())?;
        Ok(Self::with_transport(config, metrics, transport))
    }
}

impl<T: Transport> HttpServer<T> {
    /// Create a server with a custom forwarding transport.
    pub fn with_transport(config: &GatewayConfig, metrics: Arc<GatewayMetrics>, transport: T) -> Self {
        Self {
            gateway: Gateway::new(config.capacity(), metrics, transport),
        }
    }

    pub fn gateway(&self) -> &Gateway<T> {
        &self.gateway
    }

    /// Build the Axum router with all middleware layers.
    pub fn router(&self) -> Router {
        Router::new()
            .route(METRICS_PATH, get(metrics_handler::<T>))
            .route("/", any(proxy_handler::<T>))
            .route("/{*path}", any(proxy_handler::<T>))
            .with_state(self.gateway.clone())
            .layer(
                ServiceBuilder::new()
                    .layer(request_id_layer())
                    .layer(TraceLayer::new_for_http()),
            )
    }

    /// Run the server, accepting connections on the given listener until
    /// `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            capacity = self.gateway.gate().capacity(),
            "HTTP server starting"
        );

        let app = self.router().into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Main proxy handler: every path except `/metrics`.
async fn proxy_handler<T: Transport>(
    State(gateway): State<Gateway<T>>,
    request: Request<Body>,
) -> Response {
    gateway.handle(request).await
}

async fn metrics_handler<T: Transport>(State(gateway): State<Gateway<T>>) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE)],
        gateway.metrics().render(),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::validate;
    use tower::ServiceExt;

    #[derive(Clone)]
    struct OkTransport;

    impl Transport for OkTransport {
        async fn forward(&self, request: Request<Body>) -> Response<Body> {
            (StatusCode::OK, request.uri().path().to_string()).into_response()
        }
    }

    fn server() -> HttpServer<OkTransport> {
        let config = validate("http://127.0.0.1:8000", 9000, 1).unwrap();
        HttpServer::with_transport(&config, Arc::new(GatewayMetrics::new().unwrap()), OkTransport)
    }

    #[tokio::test]
    async fn any_method_and_path_is_proxied() {
        let server = server();
        for (method, path) in [("GET", "/"), ("POST", "/a/b"), ("DELETE", "/x?y=1")] {
            let request = Request::builder().method(method).uri(path).body(Body::empty()).unwrap();
            let response = server.router().oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK, "{method} {path}");
        }
    }

    #[tokio::test]
    async fn metrics_bypass_admission() {
        let server = server();
        assert!(server.gateway().gate().try_acquire());

        let request = Request::get(METRICS_PATH).body(Body::empty()).unwrap();
        let response = server.router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let request = Request::get("/").body(Body::empty()).unwrap();
        let response = server.router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

        server.gateway().gate().release();
    }

    #[tokio::test]
    async fn request_id_is_assigned() {
        #[derive(Clone)]
        struct IdEcho;

        impl Transport for IdEcho {
            async fn forward(&self, request: Request<Body>) -> Response<Body> {
                let id = crate::http::request::request_id(&request).to_string();
                (StatusCode::OK, id).into_response()
            }
        }

        let config = validate("http://127.0.0.1:8000", 9000, 1).unwrap();
        let server =
            HttpServer::with_transport(&config, Arc::new(GatewayMetrics::new().unwrap()), IdEcho);
        let request = Request::get("/").body(Body::empty()).unwrap();
        let response = server.router().oneshot(request).await.unwrap();

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let id = std::str::from_utf8(&body).unwrap();
        assert!(uuid::Uuid::parse_str(id).is_ok(), "got {id}");
    }
}
