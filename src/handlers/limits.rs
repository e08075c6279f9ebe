use axum::{Json, extract::{ConnectInfo, State}, http::{Extensions, HeaderMap}};
use std::net::SocketAddr;
use std::sync::Arc;
use crate::client::client_id;
use crate::models::RemainingResponse;
use crate::state::AppState;

// How many submissions the caller has left, read only
pub async fn remaining_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    extensions: Extensions,
) -> Json<RemainingResponse> {
    let peer = extensions.get::<ConnectInfo<SocketAddr>>().map(|ci| ci.0);
    let client = client_id(&headers, peer, state.trust_proxy_headers);
    let remaining = state.rate_limiter.remaining(&client);

    Json(RemainingResponse {
        client,
        remaining,
        limit: state.rate_limiter.config().max_requests,
    })
}
