use std::sync::Arc;
use tokio::sync::mpsc;
use crate::models::ForwardJob;
use crate::rate_limit::RateLimiter;
// app's shared state

pub struct AppState {
    pub rate_limiter: Arc<RateLimiter>,   // shared with the sweeper
    pub forward_tx: mpsc::Sender<ForwardJob>, // queue into the forward worker
    pub trust_proxy_headers: bool,        // key clients by proxy headers, not the peer
}
