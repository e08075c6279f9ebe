use axum::{
    Json,
    extract::{ConnectInfo, State, rejection::JsonRejection},
    http::{Extensions, HeaderMap, StatusCode},
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::oneshot;
use crate::client::client_id;
use crate::error::GatewayError;
use crate::metrics::{RATE_LIMITED_TOTAL, SUBMISSIONS_TOTAL, SUBMISSION_LATENCY, TRACKED_CLIENTS};
use crate::models::{ContactAccepted, ContactSubmission, ForwardJob};
use crate::state::AppState;

pub async fn contact_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    extensions: Extensions,
    payload: Result<Json<ContactSubmission>, JsonRejection>,
) -> Result<(StatusCode, Json<ContactAccepted>), GatewayError> {
    SUBMISSIONS_TOTAL.inc();

    let peer = extensions.get::<ConnectInfo<SocketAddr>>().map(|ci| ci.0);
    let client = client_id(&headers, peer, state.trust_proxy_headers);
    let limiter = &state.rate_limiter;

    // every attempt counts, malformed bodies included
    let allowed = limiter.check(&client);
    TRACKED_CLIENTS.set(limiter.len() as f64);
    if !allowed {
        RATE_LIMITED_TOTAL.inc();
        let retry_after = limiter
            .blocked_for(&client)
            .unwrap_or(limiter.config().block_duration);
        return Err(GatewayError::RateLimited { retry_after });
    }

    let Json(submission) = payload?;
    let row = submission.into_row()?;

    let start_time = Instant::now();
    let (response_tx, response_rx) = oneshot::channel();

    state
        .forward_tx
        .send(ForwardJob { row, response_tx })
        .await
        .map_err(|_| GatewayError::QueueClosed)?;

    let result = response_rx.await.map_err(|_| GatewayError::WorkerDropped)?;

    SUBMISSION_LATENCY.observe(start_time.elapsed().as_secs_f64());

    result?;
    tracing::info!(client = %client, "contact message stored");

    Ok((
        StatusCode::CREATED,
        Json(ContactAccepted {
            status: "received".to_string(),
            remaining: limiter.remaining(&client),
        }),
    ))
}
