use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::time::{Duration, Instant};

// Rate limit entry - tracks requests per client id
#[derive(Debug, Clone, Copy)]
pub struct RateLimitEntry {
    pub count: u32,
    pub window_start: Instant, // start of the counting window, or of the block
    pub blocked: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    pub max_requests: u32,      // max requests allowed per window
    pub window: Duration,       // length of the counting window
    pub block_duration: Duration, // cool-down once the limit is exceeded
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 10,
            window: Duration::from_secs(60),
            block_duration: Duration::from_secs(60 * 60),
        }
    }
}

/// Per-client fixed window limiter with an escalating block.
///
/// A client gets `max_requests` per `window`. The request that goes over the
/// limit blocks the client for `block_duration`, measured from that request.
/// While blocked every check is denied, no matter how often it is retried.
pub struct RateLimiter {
    entries: DashMap<String, RateLimitEntry>,
    config: RateLimitConfig,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            entries: DashMap::new(),
            config,
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    // Number of tracked clients
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Records one request for `client_id` and returns whether it is allowed.
    pub fn check(&self, client_id: &str) -> bool {
        self.check_at(client_id, Instant::now())
    }

    pub fn check_at(&self, client_id: &str, now: Instant) -> bool {
        // the entry guard holds the shard lock for the whole read-modify-write
        let mut occupied = match self.entries.entry(client_id.to_string()) {
            Entry::Vacant(vacant) => {
                vacant.insert(RateLimitEntry {
                    count: 1,
                    window_start: now,
                    blocked: false,
                });
                return true;
            }
            Entry::Occupied(occupied) => occupied,
        };
        let entry = occupied.get_mut();
        let elapsed = now.saturating_duration_since(entry.window_start);

        if entry.blocked {
            if elapsed > self.config.block_duration {
                entry.blocked = false;
                entry.count = 1;
                entry.window_start = now;
                tracing::info!(client = client_id, "rate limit block expired");
                return true;
            }
            return false;
        }

        // window expired..? start a new one with this request
        if elapsed > self.config.window {
            entry.count = 1;
            entry.window_start = now;
            return true;
        }

        entry.count = entry.count.saturating_add(1);
        if entry.count > self.config.max_requests {
            entry.blocked = true;
            entry.window_start = now;
            tracing::warn!(
                client = client_id,
                block_secs = self.config.block_duration.as_secs(),
                "rate limit exceeded, client blocked"
            );
            return false;
        }

        true
    }

    /// Requests left in the current window. Never changes state.
    pub fn remaining(&self, client_id: &str) -> u32 {
        self.remaining_at(client_id, Instant::now())
    }

    pub fn remaining_at(&self, client_id: &str, now: Instant) -> u32 {
        let Some(entry) = self.entries.get(client_id) else {
            return 0;
        };
        if entry.blocked {
            return 0;
        }
        if now.saturating_duration_since(entry.window_start) > self.config.window {
            return self.config.max_requests;
        }
        self.config.max_requests.saturating_sub(entry.count)
    }

    /// Time left in the client's block, `None` when it is not blocked.
    pub fn blocked_for(&self, client_id: &str) -> Option<Duration> {
        self.blocked_for_at(client_id, Instant::now())
    }

    pub fn blocked_for_at(&self, client_id: &str, now: Instant) -> Option<Duration> {
        let entry = self.entries.get(client_id)?;
        if !entry.blocked {
            return None;
        }
        let elapsed = now.saturating_duration_since(entry.window_start);
        (elapsed <= self.config.block_duration).then(|| self.config.block_duration - elapsed)
    }

    // Drops entries that a check would treat like a first sight: unblocked ones
    // past their window, blocked ones past their block. Returns how many went.
    pub fn sweep(&self) -> usize {
        self.sweep_at(Instant::now())
    }

    pub fn sweep_at(&self, now: Instant) -> usize {
        let RateLimitConfig { window, block_duration, .. } = self.config;
        let mut removed = 0;
        self.entries.retain(|_, entry| {
            let elapsed = now.saturating_duration_since(entry.window_start);
            let keep = if entry.blocked {
                elapsed <= block_duration
            } else {
                elapsed <= window
            };
            if !keep {
                removed += 1;
            }
            keep
        });
        removed
    }
}
