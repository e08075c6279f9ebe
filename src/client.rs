use axum::http::HeaderMap;
use std::net::SocketAddr;

// Picks the key the limiter buckets a caller under.
// Proxy headers are only read behind a trusted proxy, otherwise any caller
// could pick their own key. Falls back to "unknown" if nothing is there.
pub fn client_id(headers: &HeaderMap, peer: Option<SocketAddr>, trust_proxy: bool) -> String {
    let header = |name: &str| headers.get(name).and_then(|h| h.to_str().ok());

    let forwarded = || {
        // the proxy appends the address it saw, so the rightmost entry is its own
        header("x-forwarded-for")
            .and_then(|s| s.rsplit(',').map(str::trim).find(|ip| !ip.is_empty()))
            .or_else(|| header("x-real-ip").map(str::trim).filter(|ip| !ip.is_empty()))
            .map(str::to_string)
    };

    trust_proxy
        .then(forwarded)
        .flatten()
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}
