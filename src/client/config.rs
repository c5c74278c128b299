//! Client configuration options.

use std::time::Duration;

use rand::Rng;

use crate::client::endpoint::Category;
use crate::{Error, ErrorKind, Result};

/// Configuration for the IG client.
///
/// # Example
///
/// ```
/// use ig_rest_rs::{ClientConfig, RetryPolicy};
/// use std::time::Duration;
///
/// let config = ClientConfig::default()
///     .with_timeout(Duration::from_secs(60))
///     .with_user_agent("my-app/1.0")
///     .with_retry(RetryPolicy::default().with_max_attempts(5));
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Per-request HTTP timeout
    pub timeout: Duration,
    /// User-Agent header value
    pub user_agent: String,
    /// Retry policy applied by the dispatcher
    pub retry: RetryPolicy,
    /// Client-side request budgets
    pub rate_limit: RateLimitConfig,
    /// Lifetime assumed for `CST`/`X-SECURITY-TOKEN` sessions
    pub session_ttl: Duration,
    /// Subtracted from every token lifetime so sessions are renewed early
    pub refresh_margin: Duration,
    /// Overrides the environment's gateway URL
    pub base_url: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: format!("ig-rest-rs/{} (Rust)", env!("CARGO_PKG_VERSION")),
            retry: RetryPolicy::default(),
            rate_limit: RateLimitConfig::default(),
            session_ttl: Duration::from_secs(6 * 60 * 60),
            refresh_margin: Duration::from_secs(5),
            base_url: None,
        }
    }
}

impl ClientConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the User-Agent header.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Set the rate limit configuration.
    pub fn with_rate_limit(mut self, rate_limit: RateLimitConfig) -> Self {
        self.rate_limit = rate_limit;
        self
    }

    /// Set the assumed lifetime of security-token sessions.
    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    /// Set the safety margin subtracted from token lifetimes.
    pub fn with_refresh_margin(mut self, margin: Duration) -> Self {
        self.refresh_margin = margin;
        self
    }

    /// Send requests to `url` instead of the environment's gateway.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Check the configuration for values the client cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.retry.max_attempts == 0 {
            return Err(Error::Config("retry.max_attempts must be at least 1".into()));
        }
        if !self.retry.multiplier.is_finite() || self.retry.multiplier < 1.0 {
            return Err(Error::Config("retry.multiplier must be a finite value >= 1.0".into()));
        }
        if let Some(ref url) = self.base_url {
            url::Url::parse(url)?;
        }
        Ok(())
    }
}

/// Retry policy for the request dispatcher.
///
/// `max_attempts` counts every dispatch attempt, including the first one.
/// An attempt ends in an HTTP send or in a refusal by the local rate
/// limiter. The delay before retry `n` (0-indexed) is
/// `initial_backoff * multiplier^n` with optional jitter, capped at
/// `max_backoff`.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of dispatch attempts, including the first
    pub max_attempts: u32,
    /// Delay before the first retry
    pub initial_backoff: Duration,
    /// Upper bound for any single delay
    pub max_backoff: Duration,
    /// Growth factor between consecutive delays
    pub multiplier: f64,
    /// Randomize each delay by up to ±25%
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(30),
            multiplier: 2.0,
            jitter: true,
        }
    }
}

impl RetryPolicy {
    /// A policy that sends every request exactly once.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }

    /// Set the maximum number of attempts.
    pub fn with_max_attempts(mut self, max: u32) -> Self {
        self.max_attempts = max;
        self
    }

    /// Set the initial backoff duration.
    pub fn with_initial_backoff(mut self, duration: Duration) -> Self {
        self.initial_backoff = duration;
        self
    }

    /// Set the maximum backoff duration.
    pub fn with_max_backoff(mut self, duration: Duration) -> Self {
        self.max_backoff = duration;
        self
    }

    /// Enable or disable jitter.
    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Calculate the delay before retry number `retry` (0-indexed).
    pub fn backoff_for_attempt(&self, retry: u32) -> Duration {
        let max = self.max_backoff.as_millis() as f64;
        let base = self.initial_backoff.as_millis() as f64 * self.multiplier.powi(retry as i32);
        let capped = if base.is_finite() { base.min(max) } else { max };

        let millis = if self.jitter && capped > 0.0 {
            let spread = capped * 0.25;
            rand::thread_rng().gen_range((capped - spread)..=(capped + spread))
        } else {
            capped
        };

        Duration::from_millis(millis.clamp(0.0, max) as u64)
    }

    /// Whether an error of this kind may be retried at all.
    ///
    /// Authentication failures are handled separately by the dispatcher's
    /// one-shot re-login.
    pub fn is_retryable(&self, kind: ErrorKind) -> bool {
        matches!(
            kind,
            ErrorKind::Transport | ErrorKind::Server | ErrorKind::RateLimitExceeded
        )
    }
}

/// Token-bucket parameters for one endpoint category.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BucketConfig {
    /// Maximum burst size. Zero disables limiting for the category.
    pub capacity: u32,
    /// Time to refill the bucket from empty to full
    pub per: Duration,
}

impl BucketConfig {
    /// `capacity` requests per `per`.
    pub fn new(capacity: u32, per: Duration) -> Self {
        Self { capacity, per }
    }

    /// A bucket that never limits.
    pub fn unlimited() -> Self {
        Self {
            capacity: 0,
            per: Duration::from_secs(60),
        }
    }

    /// Tokens added per second.
    pub fn refill_per_sec(&self) -> f64 {
        if self.per.is_zero() {
            f64::INFINITY
        } else {
            f64::from(self.capacity) / self.per.as_secs_f64()
        }
    }
}

/// Client-side request budgets, one bucket per [`Category`].
///
/// Defaults follow IG's published allowances: 100 trading requests and 30
/// non-trading requests per minute per account.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Bucket for order/position writes
    pub trading: BucketConfig,
    /// Bucket for everything else
    pub non_trading: BucketConfig,
    /// Longest a single `acquire` may wait
    pub max_wait: Duration,
    /// Block applied after a provider rate-limit response without `Retry-After`
    pub default_backoff: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            trading: BucketConfig::new(100, Duration::from_secs(60)),
            non_trading: BucketConfig::new(30, Duration::from_secs(60)),
            max_wait: Duration::from_secs(30),
            default_backoff: Duration::from_secs(10),
        }
    }
}

impl RateLimitConfig {
    /// Disable client-side limiting entirely.
    pub fn unlimited() -> Self {
        Self {
            trading: BucketConfig::unlimited(),
            non_trading: BucketConfig::unlimited(),
            ..Default::default()
        }
    }

    /// Parameters for one category.
    pub fn bucket(&self, category: Category) -> BucketConfig {
        match category {
            Category::Trading => self.trading,
            Category::NonTrading => self.non_trading,
        }
    }

    /// Set the trading bucket.
    pub fn with_trading(mut self, bucket: BucketConfig) -> Self {
        self.trading = bucket;
        self
    }

    /// Set the non-trading bucket.
    pub fn with_non_trading(mut self, bucket: BucketConfig) -> Self {
        self.non_trading = bucket;
        self
    }

    /// Set the maximum wait per acquire.
    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = max_wait;
        self
    }

    /// Set the fallback block applied after a provider rate-limit response.
    pub fn with_default_backoff(mut self, backoff: Duration) -> Self {
        self.default_backoff = backoff;
        self
    }
}
