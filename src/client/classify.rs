//! Mapping of HTTP outcomes onto [`Error`].
//!
//! Classification only. Retry decisions belong to the dispatcher.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, RETRY_AFTER};
use serde_json::Value;

use crate::Error;

/// IG reports exhausted allowances with codes like
/// `error.public-api.exceeded-account-allowance`.
const ALLOWANCE_MARKER: &str = "exceeded-";
const SECURITY_PREFIX: &str = "error.security.";

/// Classify a non-success HTTP response.
pub fn classify_status(status: u16, headers: &HeaderMap, body: &[u8]) -> Error {
    let payload: Value = serde_json::from_slice(body).unwrap_or_default();
    let code = payload
        .get("errorCode")
        .and_then(Value::as_str)
        .map(String::from);

    let is_allowance = code
        .as_deref()
        .is_some_and(|c| c.contains(ALLOWANCE_MARKER));
    let is_security = code
        .as_deref()
        .is_some_and(|c| c.starts_with(SECURITY_PREFIX));

    if status == 429 || is_allowance {
        return Error::RateLimitExceeded {
            retry_after: retry_after(headers),
        };
    }

    if status == 401 || (status == 403 && is_security) {
        return Error::Authentication {
            reason: code.unwrap_or_else(|| format!("HTTP {}", status)),
        };
    }

    if (400..500).contains(&status) {
        let message = payload
            .get("message")
            .and_then(Value::as_str)
            .map(String::from)
            .or_else(|| code.clone())
            .unwrap_or_else(|| String::from_utf8_lossy(body).trim().to_string());
        return Error::Validation {
            status,
            code,
            message,
        };
    }

    Error::Server { status, code }
}

/// Classify a failure reported by the HTTP transport.
pub fn classify_transport(err: &reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::Timeout
    } else {
        Error::Transport(err.to_string())
    }
}

/// Parse `Retry-After` as delta-seconds or an HTTP date.
pub fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    let value = headers.get(RETRY_AFTER)?.to_str().ok()?.trim();

    if let Ok(secs) = value.parse::<u64>() {
        return Some(Duration::from_secs(secs));
    }

    let at = DateTime::parse_from_rfc2822(value).ok()?.with_timezone(&Utc);
    Some((at - Utc::now()).to_std().unwrap_or(Duration::ZERO))
}
