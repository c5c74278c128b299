//! Per-category token buckets for outbound requests.
//!
//! Each [`Category`] has its own bucket. [`RateLimiter::acquire`] takes one
//! token, waiting for a refill if the bucket is empty, and gives up once the
//! configured `max_wait` would be exceeded. A rate-limit response from IG
//! drains the bucket and blocks the category via [`RateLimiter::penalize`].

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

use crate::client::config::{BucketConfig, RateLimitConfig};
use crate::client::endpoint::Category;
use crate::{Error, Result};

// Guards against float drift leaving a bucket at 0.99999.. tokens.
const EPSILON: f64 = 1e-9;
const MIN_WAIT: Duration = Duration::from_millis(1);

#[derive(Debug)]
struct Bucket {
    capacity: f64,
    refill_per_sec: f64,
    tokens: f64,
    last_refill: Instant,
    blocked_until: Option<Instant>,
}

impl Bucket {
    fn new(config: BucketConfig, now: Instant) -> Self {
        let refill_per_sec = config.refill_per_sec();
        let capacity = if refill_per_sec.is_finite() {
            f64::from(config.capacity)
        } else {
            0.0
        };
        Self {
            capacity,
            refill_per_sec,
            tokens: capacity,
            last_refill: now,
            blocked_until: None,
        }
    }

    fn is_unlimited(&self) -> bool {
        self.capacity == 0.0
    }

    fn refill(&mut self, now: Instant) {
        if let Some(until) = self.blocked_until {
            if now < until {
                return;
            }
            // The block has lapsed: one request may pass, then normal refill.
            self.blocked_until = None;
            self.tokens = self.tokens.max(1.0).min(self.capacity.max(1.0));
            self.last_refill = until;
        }
        if self.is_unlimited() {
            return;
        }

        let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.refill_per_sec).min(self.capacity);
        self.last_refill = now;
    }

    /// Take one token, or report how long until one is available.
    fn try_take(&mut self, now: Instant) -> std::result::Result<(), Duration> {
        self.refill(now);

        if let Some(until) = self.blocked_until {
            return Err((until - now).max(MIN_WAIT));
        }
        if self.is_unlimited() {
            return Ok(());
        }
        if self.tokens + EPSILON >= 1.0 {
            self.tokens = (self.tokens - 1.0).max(0.0);
            return Ok(());
        }

        let deficit = 1.0 - self.tokens;
        Err(Duration::from_secs_f64(deficit / self.refill_per_sec).max(MIN_WAIT))
    }

    fn drain(&mut self, now: Instant, block: Duration) {
        self.tokens = 0.0;
        self.last_refill = now;
        self.blocked_until = Some(now + block);
    }
}

#[derive(Debug)]
struct Buckets {
    trading: Bucket,
    non_trading: Bucket,
}

impl Buckets {
    fn get_mut(&mut self, category: Category) -> &mut Bucket {
        match category {
            Category::Trading => &mut self.trading,
            Category::NonTrading => &mut self.non_trading,
        }
    }
}

/// Client-side rate limiter shared by every request of one client.
///
/// # Example
///
/// ```no_run
/// use ig_rest_rs::client::{Category, RateLimiter};
/// use ig_rest_rs::RateLimitConfig;
///
/// # async fn example() -> ig_rest_rs::Result<()> {
/// let limiter = RateLimiter::new(&RateLimitConfig::default());
/// limiter.acquire(Category::Trading).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct RateLimiter {
    buckets: Mutex<Buckets>,
    max_wait: Duration,
    default_backoff: Duration,
}

impl RateLimiter {
    /// Create a limiter with full buckets.
    pub fn new(config: &RateLimitConfig) -> Self {
        let now = Instant::now();
        Self {
            buckets: Mutex::new(Buckets {
                trading: Bucket::new(config.trading, now),
                non_trading: Bucket::new(config.non_trading, now),
            }),
            max_wait: config.max_wait,
            default_backoff: config.default_backoff,
        }
    }

    /// Take one token for `category`, waiting for a refill if needed.
    ///
    /// Returns the instant the token was granted. Fails with
    /// [`Error::RateLimitExceeded`] as soon as the required wait would push
    /// the total past `max_wait`.
    pub async fn acquire(&self, category: Category) -> Result<Instant> {
        let deadline = Instant::now() + self.max_wait;

        loop {
            let now = Instant::now();
            let wait = {
                let mut buckets = self.buckets.lock().await;
                match buckets.get_mut(category).try_take(now) {
                    Ok(()) => return Ok(now),
                    Err(wait) => wait,
                }
            };

            if now + wait > deadline {
                warn!(%category, ?wait, "rate limit budget exhausted");
                return Err(Error::RateLimitExceeded {
                    retry_after: Some(wait),
                });
            }

            debug!(%category, ?wait, "waiting for rate limit token");
            sleep(wait).await;
        }
    }

    /// Drain `category` and block it for `retry_after`, or the configured
    /// default backoff when the provider gave no hint.
    pub async fn penalize(&self, category: Category, retry_after: Option<Duration>) {
        let block = retry_after.unwrap_or(self.default_backoff);
        warn!(%category, ?block, "provider rate limit hit; draining bucket");

        let mut buckets = self.buckets.lock().await;
        buckets.get_mut(category).drain(Instant::now(), block);
    }

    /// Tokens currently available for `category`. Unlimited buckets report
    /// infinity.
    pub async fn available(&self, category: Category) -> f64 {
        let mut buckets = self.buckets.lock().await;
        let bucket = buckets.get_mut(category);
        bucket.refill(Instant::now());
        if bucket.is_unlimited() && bucket.blocked_until.is_none() {
            f64::INFINITY
        } else {
            bucket.tokens
        }
    }

    /// Remaining block on `category` after a provider rate-limit response.
    pub async fn blocked_for(&self, category: Category) -> Option<Duration> {
        let buckets = self.buckets.lock().await;
        let bucket = match category {
            Category::Trading => &buckets.trading,
            Category::NonTrading => &buckets.non_trading,
        };
        let now = Instant::now();
        bucket
            .blocked_until
            .filter(|until| *until > now)
            .map(|until| until - now)
    }
}
