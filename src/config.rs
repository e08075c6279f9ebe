use clap::Parser;
use std::time::Duration;

use crate::rate_limit::RateLimitConfig;

// CLI argument structure, every flag can also come from the environment
#[derive(Parser, Debug, Clone)]
#[command(name = "contact-gateway")]
#[command(about = "Rate limited intake for portfolio contact messages")]
pub struct Args {
    // Port to run the server on
    #[arg(short, long, env = "GATEWAY_PORT", default_value_t = 8080)]
    pub port: u16,

    // Base url of the table store, e.g. "https://xyz.supabase.co"
    #[arg(short, long, env = "STORE_URL", default_value = "http://localhost:54321")]
    pub store_url: String,

    // API key sent to the table store
    #[arg(long, env = "STORE_KEY")]
    pub store_key: Option<String>,

    // Rate limit max requests per window
    #[arg(long, env = "RATE_LIMIT", default_value_t = 10)]
    pub rate_limit: u32,

    // Rate limit window in seconds
    #[arg(long, env = "RATE_WINDOW", default_value_t = 60)]
    pub rate_window: u64,

    // How long a client stays blocked after going over the limit, in seconds
    #[arg(long, env = "BLOCK_DURATION", default_value_t = 3600)]
    pub block_duration: u64,

    // Seconds between stale entry sweeps, 0 turns the sweeper off
    #[arg(long, env = "SWEEP_INTERVAL", default_value_t = 60)]
    pub sweep_interval: u64,

    // Read the client address from x-forwarded-for / x-real-ip.
    // Only safe when a reverse proxy in front sets those headers.
    #[arg(long, env = "TRUST_PROXY_HEADERS")]
    pub trust_proxy_headers: bool,

    // Capacity of the forwarding queue
    #[arg(long, env = "QUEUE_SIZE", default_value_t = 100)]
    pub queue_size: usize,
}

impl Args {
    pub fn rate_limit_config(&self) -> RateLimitConfig {
        RateLimitConfig {
            max_requests: self.rate_limit,
            window: Duration::from_secs(self.rate_window),
            block_duration: Duration::from_secs(self.block_duration),
        }
    }

    pub fn sweep_interval(&self) -> Option<Duration> {
        (self.sweep_interval > 0).then(|| Duration::from_secs(self.sweep_interval))
    }
}
