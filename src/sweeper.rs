use std::sync::Arc;
use tokio::time::{Duration, MissedTickBehavior, interval};

use crate::metrics::{EVICTED_TOTAL, TRACKED_CLIENTS};
use crate::rate_limit::RateLimiter;

// Sweep function - drops stale limiter entries on every tick
pub async fn sweeper(limiter: Arc<RateLimiter>, every: Duration) {
    let mut interval = interval(every);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    tracing::info!(interval = ?every, "rate limit sweeper started");

    loop {
        interval.tick().await;

        let removed = limiter.sweep();
        if removed > 0 {
            EVICTED_TOTAL.inc_by(removed as f64);
            tracing::debug!(removed, tracked = limiter.len(), "evicted stale rate limit entries");
        }
        TRACKED_CLIENTS.set(limiter.len() as f64);
    }
}
