//! Header manipulation for forwarded requests.
//!
//! # Responsibilities
//! - Strip hop-by-hop headers in both directions
//! - Append the client IP to X-Forwarded-For
//!
//! # Design Decisions
//! - The inbound Host header is kept as-is
//! - Headers listed in `Connection` are treated as hop-by-hop too
//! - `TE: trailers` survives on requests; every other TE value is dropped
//! - Protocol upgrades are not relayed: `Upgrade` is stripped, so a
//!   WebSocket handshake reaches the upstream as a plain request

use std::net::IpAddr;

use axum::http::{header, HeaderMap, HeaderName, HeaderValue};

pub static X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");

/// Headers that apply to a single connection and must not be relayed.
const HOP_BY_HOP: [&str; 9] = [
    "connection",
    "keep-alive",
    "proxy-connection",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Remove hop-by-hop headers, including any named by `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let listed: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in listed {
        headers.remove(name);
    }
    for name in HOP_BY_HOP {
        headers.remove(name);
    }
}

/// Strip hop-by-hop headers from an outbound request, keeping
/// `TE: trailers` if the client asked for it.
pub fn strip_request_hop_by_hop(headers: &mut HeaderMap) {
    let trailers = headers
        .get_all(header::TE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .any(|token| token.trim().eq_ignore_ascii_case("trailers"));

    strip_hop_by_hop(headers);

    if trailers {
        headers.insert(header::TE, HeaderValue::from_static("trailers"));
    }
}

/// Append `client` to X-Forwarded-For, joining any prior values.
pub fn append_forwarded_for(headers: &mut HeaderMap, client: IpAddr) {
    let prior: Vec<&str> = headers
        .get_all(&X_FORWARDED_FOR)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .collect();

    let value = if prior.is_empty() {
        client.to_string()
    } else {
        format!("{}, {}", prior.join(", "), client)
    };

    if let Ok(value) = HeaderValue::from_str(&value) {
        headers.insert(X_FORWARDED_FOR.clone(), value);
    }
}
