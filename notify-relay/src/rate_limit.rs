//! Rate Limiting
//!
//! Token bucket rate limiter keeping any one client from flooding the
//! messaging provider through the relay.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

/// Token bucket for rate limiting a single client.
#[derive(Debug)]
struct TokenBucket {
    /// Current number of tokens.
    tokens: f64,
    /// Maximum tokens (bucket capacity).
    max_tokens: f64,
    /// Tokens added per second.
    refill_rate: f64,
    /// Last time tokens were updated.
    last_update: Instant,
}

impl TokenBucket {
    fn new(max_tokens: u32, refill_rate: f64) -> Self {
        TokenBucket {
            tokens: max_tokens as f64,
            max_tokens: max_tokens as f64,
            refill_rate,
            last_update: Instant::now(),
        }
    }

    /// Refills tokens based on elapsed time.
    fn refill(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_update).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.refill_rate).min(self.max_tokens);
        self.last_update = now;
    }

    /// Tries to consume one token.
    ///
    /// Returns true if successful, false if rate limited.
    fn try_consume(&mut self) -> bool {
        self.refill();
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    fn idle_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_update)
    }
}

/// Default cap on the number of clients tracked at once.
pub const DEFAULT_MAX_CLIENTS: usize = 10_000;

/// A bucket idle this long has refilled completely, so forgetting it
/// loses nothing.
const REFILL_WINDOW: Duration = Duration::from_secs(60);

/// Rate limiter for multiple clients.
pub struct RateLimiter {
    /// Per-client token buckets.
    buckets: RwLock<HashMap<String, TokenBucket>>,
    /// Maximum requests per minute; zero disables limiting.
    max_per_minute: u32,
    /// Maximum number of buckets held at once.
    max_clients: usize,
}

impl RateLimiter {
    /// Creates a new rate limiter.
    ///
    /// `max_per_minute` is the maximum number of sends allowed per minute per client.
    pub fn new(max_per_minute: u32) -> Self {
        RateLimiter {
            buckets: RwLock::new(HashMap::new()),
            max_per_minute,
            max_clients: DEFAULT_MAX_CLIENTS,
        }
    }

    /// Caps the number of tracked clients.
    pub fn with_max_clients(mut self, max_clients: usize) -> Self {
        self.max_clients = max_clients.max(1);
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.max_per_minute > 0
    }

    /// Tries to consume a token for this client.
    ///
    /// Returns true if allowed, false if rate limited. When the client
    /// table is full, refilled buckets are evicted first; if none are,
    /// unknown clients are refused until space frees up.
    pub fn consume(&self, client_id: &str) -> bool {
        if !self.is_enabled() {
            return true;
        }
        let mut buckets = self.buckets.write().unwrap();
        if !buckets.contains_key(client_id) && buckets.len() >= self.max_clients {
            let now = Instant::now();
            buckets.retain(|_, bucket| bucket.idle_for(now) < REFILL_WINDOW);
            if buckets.len() >= self.max_clients {
                return false;
            }
        }
        let bucket = buckets.entry(client_id.to_string()).or_insert_with(|| {
            TokenBucket::new(self.max_per_minute, self.max_per_minute as f64 / 60.0)
        });
        bucket.try_consume()
    }

    /// Number of clients currently tracked.
    pub fn tracked_clients(&self) -> usize {
        self.buckets.read().unwrap().len()
    }

    /// Removes buckets untouched for at least `max_idle`.
    ///
    /// Returns the number of buckets removed.
    pub fn cleanup_inactive(&self, max_idle: Duration) -> usize {
        let now = Instant::now();
        let mut buckets = self.buckets.write().unwrap();
        let before = buckets.len();
        buckets.retain(|_, bucket| bucket.idle_for(now) < max_idle);
        before - buckets.len()
    }
}
