//! Error types for the IG REST API client.
//!
//! Every failure surfaced by the client is one [`Error`] value. The
//! [`ErrorKind`] returned by [`Error::kind`] collapses the variants onto the
//! closed taxonomy the dispatcher uses for its retry decisions.

use std::time::Duration;

use thiserror::Error;

/// A specialized `Result` type for IG operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for all IG API operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid credentials, or a 401 that persisted after one forced re-login.
    #[error("Authentication failed: {reason}")]
    Authentication {
        /// Provider error code or a description of the failure
        reason: String,
    },

    /// Request budget exhausted, either locally or as reported by IG.
    #[error("Rate limit exceeded{}", fmt_retry_after(.retry_after))]
    RateLimitExceeded {
        /// How long the provider (or the local limiter) asked us to wait
        retry_after: Option<Duration>,
    },

    /// The request was rejected by IG as malformed (4xx other than auth/rate-limit).
    #[error("Validation error: status={status}, code={code:?}, message={message}")]
    Validation {
        /// HTTP status code
        status: u16,
        /// IG `errorCode`, if the body carried one
        code: Option<String>,
        /// Human-readable message
        message: String,
    },

    /// IG answered with a 5xx status.
    #[error("Server error: status={status}, code={code:?}")]
    Server {
        /// HTTP status code
        status: u16,
        /// IG `errorCode`, if the body carried one
        code: Option<String>,
    },

    /// Network or connection failure.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The request or the caller's deadline timed out.
    #[error("Request timeout")]
    Timeout,

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid input provided to a function
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// URL parsing error
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// A lookup performed on the client side found nothing.
    #[error("Not found: {0}")]
    NotFound(String),
}

/// Closed classification of [`Error`] values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Invalid credentials or irrecoverable 401.
    Authentication,
    /// Request budget exhausted.
    RateLimitExceeded,
    /// Provider rejected the request as malformed.
    Validation,
    /// Provider 5xx.
    Server,
    /// Network failure or timeout.
    Transport,
    /// Failure detected locally before or after talking to IG.
    Client,
}

fn fmt_retry_after(retry_after: &Option<Duration>) -> String {
    match retry_after {
        Some(d) => format!("; retry after {:?}", d),
        None => String::new(),
    }
}

impl Error {
    /// Map this error onto the closed taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Authentication { .. } => ErrorKind::Authentication,
            Error::RateLimitExceeded { .. } => ErrorKind::RateLimitExceeded,
            Error::Validation { .. } => ErrorKind::Validation,
            Error::Server { .. } => ErrorKind::Server,
            Error::Transport(_) | Error::Timeout => ErrorKind::Transport,
            Error::Json(_)
            | Error::InvalidInput(_)
            | Error::Config(_)
            | Error::UrlParse(_)
            | Error::NotFound(_) => ErrorKind::Client,
        }
    }

    /// Returns `true` if this error is potentially transient and the
    /// operation could be retried.
    ///
    /// # Example
    ///
    /// ```
    /// use ig_rest_rs::Error;
    ///
    /// fn handle_error(err: Error) {
    ///     if err.is_retryable() {
    ///         println!("Retrying operation...");
    ///     }
    /// }
    /// ```
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Transport | ErrorKind::Server | ErrorKind::RateLimitExceeded
        )
    }

    /// Returns `true` if this is an authentication-related error.
    pub fn is_auth_error(&self) -> bool {
        matches!(self, Error::Authentication { .. })
    }

    /// Returns `true` if this error indicates a client-side issue
    /// (invalid input, bad request, etc.).
    pub fn is_client_error(&self) -> bool {
        matches!(self.kind(), ErrorKind::Validation | ErrorKind::Client)
    }

    /// Returns `true` if this error indicates a server-side issue.
    pub fn is_server_error(&self) -> bool {
        matches!(self, Error::Server { .. })
    }

    /// The IG `errorCode` carried by the failed response, if any.
    pub fn error_code(&self) -> Option<&str> {
        match self {
            Error::Validation { code, .. } | Error::Server { code, .. } => code.as_deref(),
            _ => None,
        }
    }
}
