use lazy_static::lazy_static;
use prometheus::{Counter, Gauge, Histogram, register_counter, register_gauge, register_histogram};


lazy_static! {
    pub static ref SUBMISSIONS_TOTAL: Counter =
        register_counter!("contact_submissions_total", "Total contact submissions received").unwrap();
    pub static ref RATE_LIMITED_TOTAL: Counter =
        register_counter!("contact_rate_limited_total", "Submissions rejected by the rate limiter").unwrap();
    pub static ref FORWARD_FAILURES: Counter =
        register_counter!("contact_forward_failures_total", "Submissions the store did not accept").unwrap();
    pub static ref EVICTED_TOTAL: Counter =
        register_counter!("rate_limit_evicted_total", "Stale rate limit entries removed by the sweeper").unwrap();
    pub static ref TRACKED_CLIENTS: Gauge =
        register_gauge!("rate_limit_tracked_clients", "Clients currently tracked by the rate limiter").unwrap();
    pub static ref SUBMISSION_LATENCY: Histogram = register_histogram!(
        "contact_submission_latency_seconds",
        "Time to forward an accepted submission in seconds"
    )
    .unwrap();
}
