//! Upstream forwarding transport.
//!
//! # Responsibilities
//! - Rewrite the request URI onto the configured upstream
//! - Relay the upstream response (status, headers, body) back unchanged
//! - Map transport failures to 502 Bad Gateway
//!
//! # Design Decisions
//! - Bodies are streamed in both directions, never buffered
//! - No retries and no total request timeout; only the TCP connect is bounded
//! - Outbound requests always use HTTP/1.1
//! - https targets are verified against the webpki root set

use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{
        uri::{Authority, PathAndQuery, Scheme},
        Request, Response, StatusCode, Uri, Version,
    },
    response::IntoResponse,
};
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use url::Url;

use crate::http::headers::{append_forwarded_for, strip_hop_by_hop, strip_request_hop_by_hop};

/// Body returned when the upstream cannot be reached.
pub const UPSTREAM_FAILED_BODY: &str = "Upstream request failed";

/// Relays one request/response pair to a fixed upstream.
pub trait Transport: Clone + Send + Sync + 'static {
    /// Forward `request` and return whatever response should reach the
    /// client. Failures are expressed as responses, not errors.
    fn forward(&self, request: Request<Body>) -> impl Future<Output = Response<Body>> + Send;
}

/// Error building an upstream URI.
#[derive(Debug, thiserror::Error)]
pub enum RewriteError {
    #[error("target has no host")]
    MissingHost,
    #[error("unsupported target scheme `{0}`")]
    UnsupportedScheme(String),
    #[error("tls setup failed: {0}")]
    Tls(#[from] rustls::Error),
    #[error("invalid upstream uri component: {0}")]
    InvalidUri(#[from] axum::http::uri::InvalidUri),
    #[error("invalid upstream uri: {0}")]
    Uri(#[from] axum::http::Error),
}

/// Single-host reverse-proxy transport over a pooled hyper client.
#[derive(Clone)]
pub struct UpstreamClient {
    client: Client<HttpsConnector<HttpConnector>, Body>,
    scheme: Scheme,
    authority: Authority,
    base_path: String,
    base_query: Option<String>,
}

impl UpstreamClient {
    /// Create a transport for `target`, which must be a validated http or https URL.
    pub fn new(target: &Url, connect_timeout: Duration) -> Result<Self, RewriteError> {
        let scheme = match target.scheme() {
            "http" => Scheme::HTTP,
            "https" => Scheme::HTTPS,
            other => return Err(RewriteError::UnsupportedScheme(other.to_string())),
        };
        let host = target.host_str().ok_or(RewriteError::MissingHost)?;
        let authority = match target.port_or_known_default() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };

        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(connect_timeout));
        connector.set_nodelay(true);
        connector.enforce_http(false);

        let connector = HttpsConnectorBuilder::new()
            .with_provider_and_webpki_roots(rustls::crypto::ring::default_provider())?
            .https_or_http()
            .enable_http1()
            .wrap_connector(connector);

        let client = Client::builder(TokioExecutor::new()).build(connector);

        Ok(Self {
            client,
            scheme,
            authority: authority.parse()?,
            base_path: target.path().to_string(),
            base_query: target.query().map(str::to_string),
        })
    }

    /// Map an inbound URI onto the upstream: the target's base path is
    /// joined with the request path and the two queries are concatenated.
    pub fn rewrite_uri(&self, uri: &Uri) -> Result<Uri, RewriteError> {
        let path = join_paths(&self.base_path, uri.path());
        let query = match (self.base_query.as_deref(), uri.query()) {
            (Some(a), Some(b)) if !a.is_empty() && !b.is_empty() => Some(format!("{a}&{b}")),
            (Some(a), Some(b)) => Some(format!("{a}{b}")),
            (Some(q), None) | (None, Some(q)) => Some(q.to_string()),
            (None, None) => None,
        };

        let path_and_query: PathAndQuery = match query {
            Some(q) => format!("{path}?{q}").parse()?,
            None => path.parse()?,
        };

        Ok(Uri::builder()
            .scheme(self.scheme.clone())
            .authority(self.authority.clone())
            .path_and_query(path_and_query)
            .build()?)
    }
}

impl Transport for UpstreamClient {
    async fn forward(&self, request: Request<Body>) -> Response<Body> {
        let (mut parts, body) = request.into_parts();

        parts.uri = match self.rewrite_uri(&parts.uri) {
            Ok(uri) => uri,
            Err(e) => {
                tracing::warn!(uri = %parts.uri, error = %e, "Cannot rewrite request uri");
                return (StatusCode::BAD_GATEWAY, UPSTREAM_FAILED_BODY).into_response();
            }
        };
        parts.version = Version::HTTP_11;

        strip_request_hop_by_hop(&mut parts.headers);
        if let Some(ConnectInfo(peer)) = parts.extensions.get::<ConnectInfo<SocketAddr>>() {
            append_forwarded_for(&mut parts.headers, peer.ip());
        }

        let upstream_uri = parts.uri.clone();
        match self.client.request(Request::from_parts(parts, body)).await {
            Ok(response) => {
                let (mut parts, body) = response.into_parts();
                strip_hop_by_hop(&mut parts.headers);
                Response::from_parts(parts, Body::new(body))
            }
            Err(e) => {
                tracing::warn!(upstream = %upstream_uri, error = %e, "Upstream error");
                (StatusCode::BAD_GATEWAY, UPSTREAM_FAILED_BODY).into_response()
            }
        }
    }
}

impl std::fmt::Debug for UpstreamClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpstreamClient")
            .field("scheme", &self.scheme)
            .field("authority", &self.authority)
            .field("base_path", &self.base_path)
            .finish_non_exhaustive()
    }
}

/// Join two path segments with exactly one slash between them.
fn join_paths(base: &str, path: &str) -> String {
    match (base.ends_with('/'), path.starts_with('/')) {
        (true, true) => format!("{}{}", base, &path[1..]),
        (false, false) => format!("{base}/{path}"),
        _ => format!("{base}{path}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(target: &str) -> UpstreamClient {
        UpstreamClient::new(&Url::parse(target).unwrap(), Duration::from_secs(1)).unwrap()
    }

    #[test]
    fn join_paths_single_slash() {
        assert_eq!(join_paths("/", "/a"), "/a");
        assert_eq!(join_paths("/api", "/a"), "/api/a");
        assert_eq!(join_paths("/api/", "/a"), "/api/a");
        assert_eq!(join_paths("/api", "a"), "/api/a");
    }

    #[tokio::test]
    async fn rewrites_onto_target() {
        let upstream = client("http://127.0.0.1:8000");
        let uri: Uri = "/v1/items?limit=5".parse().unwrap();
        assert_eq!(
            upstream.rewrite_uri(&uri).unwrap().to_string(),
            "http://127.0.0.1:8000/v1/items?limit=5"
        );
    }

    #[tokio::test]
    async fn keeps_target_base_path_and_query() {
        let upstream = client("http://10.1.2.3:9000/base?key=abc");
        let uri: Uri = "/items?limit=5".parse().unwrap();
        assert_eq!(
            upstream.rewrite_uri(&uri).unwrap().to_string(),
            "http://10.1.2.3:9000/base/items?key=abc&limit=5"
        );
    }

    #[tokio::test]
    async fn explicit_default_port_kept_in_authority() {
        let upstream = client("http://example.com:80");
        let uri: Uri = "/".parse().unwrap();
        assert_eq!(
            upstream.rewrite_uri(&uri).unwrap().authority().unwrap().as_str(),
            "example.com:80"
        );
    }

    #[tokio::test]
    async fn https_target_keeps_scheme() {
        let upstream = client("https://example.com:443/api");
        let uri: Uri = "/items".parse().unwrap();
        assert_eq!(
            upstream.rewrite_uri(&uri).unwrap().to_string(),
            "https://example.com:443/api/items"
        );
    }

    #[test]
    fn non_http_scheme_is_refused() {
        let target = Url::parse("ftp://example.com:21").unwrap();
        assert!(matches!(
            UpstreamClient::new(&target, Duration::from_secs(1)),
            Err(RewriteError::UnsupportedScheme(scheme)) if scheme == "ftp"
        ));
    }

    #[tokio::test]
    async fn unreachable_upstream_is_bad_gateway() {
        // Bind then drop to get a port with nothing listening.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let upstream = client(&format!("http://{addr}"));
        let response = upstream
            .forward(Request::get("/").body(Body::empty()).unwrap())
            .await;
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
