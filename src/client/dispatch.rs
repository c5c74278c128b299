//! Request dispatch: authentication, rate limiting, classification and retry.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::HeaderValue;
use tokio::time::{sleep, timeout_at, Instant};
use tracing::{debug, warn};

use crate::auth::{AuthHeaders, SessionManager};
use crate::client::classify::{classify_status, classify_transport};
use crate::client::config::RetryPolicy;
use crate::client::endpoint::{Endpoint, HttpMethod, Request, Response};
use crate::client::rate_limit::RateLimiter;
use crate::{Error, ErrorKind, Result};

/// Sends [`Request`]s on behalf of the services.
///
/// Each call obtains session headers (logging in if needed), takes a
/// rate-limit token, sends, classifies the outcome and retries transient
/// failures according to the [`RetryPolicy`]. A request rejected with an
/// authentication error is retried once after a forced re-login.
pub struct Dispatcher {
    http: reqwest::Client,
    base_url: String,
    session: Arc<SessionManager>,
    limiter: Arc<RateLimiter>,
    retry: RetryPolicy,
}

impl Dispatcher {
    /// Create a dispatcher sharing `session` and `limiter` with its client.
    pub fn new(
        http: reqwest::Client,
        base_url: impl Into<String>,
        session: Arc<SessionManager>,
        limiter: Arc<RateLimiter>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session,
            limiter,
            retry,
        }
    }

    /// Execute `request`, retrying transient failures.
    ///
    /// At most `retry.max_attempts` attempts are made. An attempt either
    /// sends the request or is refused by the local rate limiter. Logins
    /// performed by the session manager are not counted.
    ///
    /// The rate-limit token is taken before the session headers are read,
    /// so a session that expires while waiting for a token is renewed
    /// before anything is sent.
    pub async fn execute(&self, request: &Request) -> Result<Response> {
        let endpoint = request.endpoint();
        let path = request.path()?;
        let url = format!("{}{}", self.base_url, path);
        let max_attempts = self.retry.max_attempts.max(1);

        let mut attempt: u32 = 0;
        let mut reauthenticated = false;

        loop {
            attempt += 1;

            if let Err(err) = self.limiter.acquire(endpoint.category).await {
                if attempt >= max_attempts || !self.retry.is_retryable(err.kind()) {
                    warn!(%path, attempts = attempt, error = %err, "rate limit budget exhausted");
                    return Err(err);
                }
                // The limiter already refused to wait this long; back off by
                // policy and ask again.
                let delay = self.retry.backoff_for_attempt(attempt - 1);
                warn!(%path, attempt, ?delay, error = %err, "rate limit budget exhausted; retrying");
                sleep(delay).await;
                continue;
            }

            let auth = match self.auth_for(endpoint).await {
                Ok(auth) => auth,
                Err(err) => {
                    // Session endpoints failing transiently are worth another
                    // try; bad credentials are not.
                    if err.is_auth_error()
                        || attempt >= max_attempts
                        || !self.retry.is_retryable(err.kind())
                    {
                        return Err(err);
                    }
                    let delay = self.retry_delay(&err, attempt);
                    warn!(%path, attempt, ?delay, error = %err, "login failed; retrying");
                    sleep(delay).await;
                    continue;
                }
            };

            debug!(method = ?endpoint.method, %path, attempt, "sending request");
            let err = match self.send(request, &url, auth.as_ref()).await {
                Ok(response) => {
                    debug!(%path, status = response.status(), "request succeeded");
                    return Ok(response);
                }
                Err(err) => err,
            };

            let should_retry = match err.kind() {
                ErrorKind::Authentication => {
                    if let Some(auth) = &auth {
                        self.session.invalidate_generation(auth.generation()).await;
                    }
                    let retry = auth.is_some() && !reauthenticated;
                    reauthenticated = true;
                    retry
                }
                ErrorKind::RateLimitExceeded => {
                    self.limiter
                        .penalize(endpoint.category, retry_after_of(&err))
                        .await;
                    true
                }
                kind => self.retry.is_retryable(kind),
            };

            if !should_retry {
                debug!(%path, attempt, error = %err, "request failed; not retryable");
                return Err(err);
            }
            if attempt >= max_attempts {
                warn!(%path, attempts = attempt, error = %err, "retry attempts exhausted");
                return Err(err);
            }

            if err.is_auth_error() {
                warn!(%path, attempt, "session rejected; logging in again");
                continue;
            }

            let delay = self.retry_delay(&err, attempt);
            warn!(%path, attempt, ?delay, error = %err, "request failed; retrying");
            sleep(delay).await;
        }
    }

    /// Execute `request`, giving up with [`Error::Timeout`] at `deadline`.
    ///
    /// Reaching the deadline drops the in-flight work, including any HTTP
    /// request being sent.
    pub async fn execute_with_deadline(
        &self,
        request: &Request,
        deadline: Instant,
    ) -> Result<Response> {
        match timeout_at(deadline, self.execute(request)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(path = request.endpoint().path, "request deadline reached");
                Err(Error::Timeout)
            }
        }
    }

    /// The retry policy in use.
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    async fn auth_for(&self, endpoint: &Endpoint) -> Result<Option<AuthHeaders>> {
        if endpoint.requires_auth {
            self.session.current_headers().await.map(Some)
        } else {
            Ok(None)
        }
    }

    /// Backoff before the retry following `attempt` (1-indexed). A longer
    /// provider `Retry-After` wins.
    fn retry_delay(&self, err: &Error, attempt: u32) -> Duration {
        let backoff = self.retry.backoff_for_attempt(attempt.saturating_sub(1));
        match retry_after_of(err) {
            Some(retry_after) => retry_after.max(backoff),
            None => backoff,
        }
    }

    async fn send(
        &self,
        request: &Request,
        url: &str,
        auth: Option<&AuthHeaders>,
    ) -> Result<Response> {
        let endpoint = request.endpoint();
        let mut headers = self.session.base_headers(endpoint.version)?;
        if let Some(auth) = auth {
            headers.extend(auth.headers().clone());
        }

        // IG rejects DELETE bodies; it accepts POST with an override header.
        let method = if endpoint.method == HttpMethod::Delete && request.body().is_some() {
            headers.insert("_method", HeaderValue::from_static("DELETE"));
            reqwest::Method::POST
        } else {
            endpoint.method.as_reqwest()
        };

        let mut builder = self.http.request(method, url).headers(headers);
        if !request.query_params().is_empty() {
            builder = builder.query(request.query_params());
        }
        if let Some(body) = request.body() {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| classify_transport(&e))?;
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| classify_transport(&e))?;

        if (200..300).contains(&status) {
            Ok(Response::new(status, headers, body.to_vec()))
        } else {
            Err(classify_status(status, &headers, &body))
        }
    }
}

fn retry_after_of(err: &Error) -> Option<Duration> {
    match err {
        Error::RateLimitExceeded { retry_after } => *retry_after,
        _ => None,
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("base_url", &self.base_url)
            .field("retry", &self.retry)
            .finish()
    }
}
