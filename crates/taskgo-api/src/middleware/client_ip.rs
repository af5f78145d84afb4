//! Client identity resolution for admission control and logging.

use std::net::{IpAddr, SocketAddr};

use axum::extract::ConnectInfo;
use axum::http::{HeaderMap, Request};

/// Identity used when neither the transport nor the proxy headers say who
/// the client is.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Derives the client identity for a request.
///
/// The transport peer address (port stripped) wins. Without it, the
/// apparent client IP behind a single reverse-proxy hop is used.
pub fn client_identity<B>(request: &Request<B>) -> String {
    if let Some(ConnectInfo(addr)) = request.extensions().get::<ConnectInfo<SocketAddr>>() {
        return addr.ip().to_canonical().to_string();
    }

    apparent_client_ip(request.headers())
        .map(|ip| ip.to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

/// Best-effort client IP from proxy headers.
///
/// Takes the last `X-Forwarded-For` entry, the one appended by the proxy in
/// front of us, then falls back to `X-Real-IP`. Malformed values are skipped.
pub fn apparent_client_ip(headers: &HeaderMap) -> Option<IpAddr> {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.rsplit(',').next())
        .and_then(parse_host);

    forwarded.or_else(|| {
        headers
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .and_then(parse_host)
    })
}

/// Parses a bare IP or an `ip:port` pair, dropping the port.
pub fn parse_host(raw: &str) -> Option<IpAddr> {
    let raw = raw.trim();
    raw.parse::<IpAddr>()
        .or_else(|_| raw.parse::<SocketAddr>().map(|addr| addr.ip()))
        .ok()
        .map(|ip| ip.to_canonical())
}
