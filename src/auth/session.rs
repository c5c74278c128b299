//! Session management for IG API authentication.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::auth::{AuthMode, Credentials};
use crate::client::classify::{classify_status, classify_transport};
use crate::client::Endpoint;
use crate::{AccountId, Environment, Error, Result};

pub(crate) const API_KEY_HEADER: &str = "X-IG-API-KEY";
pub(crate) const VERSION_HEADER: &str = "Version";
const CST_HEADER: &str = "CST";
const SECURITY_TOKEN_HEADER: &str = "X-SECURITY-TOKEN";
const ACCOUNT_ID_HEADER: &str = "IG-ACCOUNT-ID";

/// Public, token-free view of the current session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    /// Active account
    pub account_id: AccountId,
    /// IG client identifier
    pub client_id: Option<String>,
    /// Account currency (security-token logins only)
    pub currency: Option<String>,
    /// Streaming endpoint advertised at login
    pub lightstreamer_endpoint: Option<String>,
    /// When the session stops being used for requests
    pub expires_at: DateTime<Utc>,
}

/// Headers proving an authenticated session, plus the session generation
/// they were taken from.
#[derive(Clone)]
pub struct AuthHeaders {
    headers: HeaderMap,
    generation: u64,
}

impl AuthHeaders {
    /// The header map to attach to a request.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Generation of the session these headers belong to.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl std::fmt::Debug for AuthHeaders {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthHeaders")
            .field("headers", &"[REDACTED]")
            .field("generation", &self.generation)
            .finish()
    }
}

enum Tokens {
    SecurityToken {
        cst: SecretString,
        security_token: SecretString,
    },
    OAuth {
        access_token: SecretString,
        refresh_token: SecretString,
        token_type: String,
    },
}

struct SessionState {
    tokens: Tokens,
    account_id: AccountId,
    client_id: Option<String>,
    currency: Option<String>,
    lightstreamer_endpoint: Option<String>,
    expires_at: DateTime<Utc>,
    generation: u64,
}

impl SessionState {
    fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    fn info(&self) -> SessionInfo {
        SessionInfo {
            account_id: self.account_id.clone(),
            client_id: self.client_id.clone(),
            currency: self.currency.clone(),
            lightstreamer_endpoint: self.lightstreamer_endpoint.clone(),
            expires_at: self.expires_at,
        }
    }

    fn refresh_token(&self) -> Option<&SecretString> {
        match &self.tokens {
            Tokens::OAuth { refresh_token, .. } => Some(refresh_token),
            Tokens::SecurityToken { .. } => None,
        }
    }
}

#[derive(Default)]
struct Slot {
    session: Option<SessionState>,
    generation: u64,
}

impl Slot {
    fn install(&mut self, mut state: SessionState) -> &SessionState {
        self.generation += 1;
        state.generation = self.generation;
        self.session.insert(state)
    }
}

/// Owner of the authentication state of one client.
///
/// A single async mutex guards the session. Login and refresh run while
/// holding it, so concurrent callers that find no valid session queue
/// behind the one performing the login and then reuse its result.
pub struct SessionManager {
    credentials: Credentials,
    http: reqwest::Client,
    base_url: String,
    session_ttl: Duration,
    refresh_margin: Duration,
    slot: Mutex<Slot>,
}

impl SessionManager {
    /// Create a manager with no session. Nothing is sent until the first
    /// call that needs headers.
    pub fn new(
        credentials: Credentials,
        http: reqwest::Client,
        base_url: impl Into<String>,
        session_ttl: Duration,
        refresh_margin: Duration,
    ) -> Self {
        Self {
            credentials,
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session_ttl,
            refresh_margin,
            slot: Mutex::new(Slot::default()),
        }
    }

    /// Perform a full login, replacing any existing session.
    pub async fn login(&self) -> Result<SessionInfo> {
        let mut slot = self.slot.lock().await;
        let state = self.authenticate().await?;
        Ok(slot.install(state).info())
    }

    /// Headers for a valid session, logging in or refreshing first if the
    /// session is absent or expired.
    pub async fn current_headers(&self) -> Result<AuthHeaders> {
        let mut slot = self.slot.lock().await;

        let needs_renewal = slot
            .session
            .as_ref()
            .map_or(true, |s| s.is_expired_at(Utc::now()));
        if needs_renewal {
            let state = self.renew(slot.session.as_ref()).await?;
            slot.install(state);
        }

        match slot.session.as_ref() {
            Some(session) => self.auth_headers(session),
            None => Err(Error::Authentication {
                reason: "no session available".to_string(),
            }),
        }
    }

    /// Renew the session now: an OAuth refresh when a refresh token is
    /// held, a full login otherwise.
    pub async fn refresh(&self) -> Result<SessionInfo> {
        let mut slot = self.slot.lock().await;
        let state = self.renew(slot.session.as_ref()).await?;
        Ok(slot.install(state).info())
    }

    /// Drop the current session. The next call needing headers logs in.
    pub async fn invalidate(&self) {
        let mut slot = self.slot.lock().await;
        if slot.session.take().is_some() {
            debug!("session invalidated");
        }
    }

    /// Drop the session only if it is still the one with `generation`.
    ///
    /// Returns `true` if a session was dropped.
    pub(crate) async fn invalidate_generation(&self, generation: u64) -> bool {
        let mut slot = self.slot.lock().await;
        let is_current = slot
            .session
            .as_ref()
            .is_some_and(|s| s.generation == generation);
        if is_current {
            slot.session = None;
            debug!(generation, "stale session invalidated");
        }
        is_current
    }

    /// End the session on the server and clear it locally.
    ///
    /// Local state is cleared even if the server call fails.
    pub async fn logout(&self) -> Result<()> {
        let mut slot = self.slot.lock().await;
        let Some(session) = slot.session.take() else {
            return Ok(());
        };

        let mut headers = self.auth_headers(&session)?.headers;
        headers.extend(self.base_headers(Endpoint::LOGOUT.version)?);
        let url = format!("{}{}", self.base_url, Endpoint::LOGOUT.path);

        let response = self
            .http
            .delete(&url)
            .headers(headers)
            .send()
            .await
            .map_err(|e| classify_transport(&e))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let headers = response.headers().clone();
            let body = response
                .bytes()
                .await
                .map_err(|e| classify_transport(&e))?;
            return Err(classify_status(status, &headers, &body));
        }

        info!(identifier = %self.credentials.identifier(), "logged out");
        Ok(())
    }

    /// Snapshot of the current session, if any.
    pub async fn session_info(&self) -> Option<SessionInfo> {
        self.slot.lock().await.session.as_ref().map(SessionState::info)
    }

    /// Returns `true` if a session is held and not expired.
    pub async fn is_logged_in(&self) -> bool {
        self.slot
            .lock()
            .await
            .session
            .as_ref()
            .is_some_and(|s| !s.is_expired_at(Utc::now()))
    }

    /// Environment the credentials target.
    pub fn environment(&self) -> Environment {
        self.credentials.environment()
    }

    /// Headers every IG request carries, authenticated or not.
    pub(crate) fn base_headers(&self, version: u8) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, sensitive(self.credentials.api_key())?);
        headers.insert(VERSION_HEADER, HeaderValue::from(u16::from(version)));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/json; charset=UTF-8"),
        );
        Ok(headers)
    }

    // Private helpers

    fn auth_headers(&self, session: &SessionState) -> Result<AuthHeaders> {
        let mut headers = HeaderMap::new();
        match &session.tokens {
            Tokens::SecurityToken {
                cst,
                security_token,
            } => {
                headers.insert(CST_HEADER, sensitive(cst.expose_secret())?);
                headers.insert(
                    SECURITY_TOKEN_HEADER,
                    sensitive(security_token.expose_secret())?,
                );
            }
            Tokens::OAuth {
                access_token,
                token_type,
                ..
            } => {
                let value = format!("{} {}", token_type, access_token.expose_secret());
                headers.insert(AUTHORIZATION, sensitive(&value)?);
                headers.insert(
                    ACCOUNT_ID_HEADER,
                    HeaderValue::from_str(session.account_id.as_str()).map_err(|_| {
                        Error::Authentication {
                            reason: "account id is not a valid header value".to_string(),
                        }
                    })?,
                );
            }
        }
        Ok(AuthHeaders {
            headers,
            generation: session.generation,
        })
    }

    async fn renew(&self, current: Option<&SessionState>) -> Result<SessionState> {
        if let Some(session) = current {
            if let Some(refresh_token) = session.refresh_token() {
                match self.refresh_oauth(session, refresh_token).await {
                    Ok(state) => return Ok(state),
                    Err(err) => {
                        warn!(error = %err, "token refresh failed; falling back to login");
                    }
                }
            }
        }
        self.authenticate().await
    }

    async fn authenticate(&self) -> Result<SessionState> {
        info!(
            identifier = %self.credentials.identifier(),
            environment = %self.credentials.environment(),
            "logging in"
        );

        let body = serde_json::json!({
            "identifier": self.credentials.identifier(),
            "password": self.credentials.password(),
        });

        let state = match self.credentials.auth_mode() {
            AuthMode::SecurityToken => {
                let (headers, body) = self.post_session(Endpoint::LOGIN_V2, &body).await?;
                let login: LoginV2Response = serde_json::from_slice(&body)?;
                let cst = required_header(&headers, CST_HEADER)?;
                let security_token = required_header(&headers, SECURITY_TOKEN_HEADER)?;

                SessionState {
                    tokens: Tokens::SecurityToken {
                        cst: SecretString::from(cst),
                        security_token: SecretString::from(security_token),
                    },
                    account_id: AccountId::new(login.current_account_id),
                    client_id: login.client_id,
                    currency: login.currency_iso_code,
                    lightstreamer_endpoint: login.lightstreamer_endpoint,
                    expires_at: expiry(Utc::now(), self.session_ttl, self.refresh_margin),
                    generation: 0,
                }
            }
            AuthMode::OAuth => {
                let (_, body) = self.post_session(Endpoint::LOGIN_V3, &body).await?;
                let login: LoginV3Response = serde_json::from_slice(&body)?;
                let ttl = Duration::from_secs(login.oauth_token.expires_in);

                SessionState {
                    tokens: login.oauth_token.into_tokens(),
                    account_id: AccountId::new(login.account_id),
                    client_id: login.client_id,
                    currency: None,
                    lightstreamer_endpoint: login.lightstreamer_endpoint,
                    expires_at: expiry(Utc::now(), ttl, self.refresh_margin),
                    generation: 0,
                }
            }
        };

        info!(account_id = %state.account_id, expires_at = %state.expires_at, "logged in");
        Ok(state)
    }

    async fn refresh_oauth(
        &self,
        session: &SessionState,
        refresh_token: &SecretString,
    ) -> Result<SessionState> {
        debug!(account_id = %session.account_id, "refreshing access token");

        let body = serde_json::json!({ "refresh_token": refresh_token.expose_secret() });
        let (_, body) = self.post_session(Endpoint::REFRESH_TOKEN, &body).await?;
        let token: OAuthToken = serde_json::from_slice(&body)?;
        let ttl = Duration::from_secs(token.expires_in);

        Ok(SessionState {
            tokens: token.into_tokens(),
            account_id: session.account_id.clone(),
            client_id: session.client_id.clone(),
            currency: session.currency.clone(),
            lightstreamer_endpoint: session.lightstreamer_endpoint.clone(),
            expires_at: expiry(Utc::now(), ttl, self.refresh_margin),
            generation: 0,
        })
    }

    /// POST to a session endpoint. Provider rejections (4xx other than rate
    /// limiting) become [`Error::Authentication`].
    async fn post_session(
        &self,
        endpoint: Endpoint,
        body: &serde_json::Value,
    ) -> Result<(HeaderMap, Vec<u8>)> {
        let url = format!("{}{}", self.base_url, endpoint.path);
        let response = self
            .http
            .post(&url)
            .headers(self.base_headers(endpoint.version)?)
            .json(body)
            .send()
            .await
            .map_err(|e| classify_transport(&e))?;

        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| classify_transport(&e))?;

        if (200..300).contains(&status) {
            return Ok((headers, bytes.to_vec()));
        }

        Err(match classify_status(status, &headers, &bytes) {
            Error::Validation { code, message, .. } => Error::Authentication {
                reason: code.unwrap_or(message),
            },
            other => other,
        })
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("credentials", &self.credentials)
            .field("base_url", &self.base_url)
            .field("tokens", &"[REDACTED]")
            .finish()
    }
}

fn sensitive(value: &str) -> Result<HeaderValue> {
    let mut header = HeaderValue::from_str(value)
        .map_err(|_| Error::InvalidInput("Invalid token format".to_string()))?;
    header.set_sensitive(true);
    Ok(header)
}

fn required_header(headers: &HeaderMap, name: &'static str) -> Result<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(String::from)
        .ok_or_else(|| Error::Authentication {
            reason: format!("login response is missing the {} header", name),
        })
}

/// `now + ttl - margin`, never earlier than `now`.
fn expiry(now: DateTime<Utc>, ttl: Duration, margin: Duration) -> DateTime<Utc> {
    let lifetime = chrono::Duration::from_std(ttl.saturating_sub(margin))
        .unwrap_or_else(|_| chrono::Duration::days(365));
    now.checked_add_signed(lifetime).unwrap_or(now)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginV2Response {
    current_account_id: String,
    #[serde(default)]
    client_id: Option<String>,
    #[serde(default)]
    currency_iso_code: Option<String>,
    #[serde(default)]
    lightstreamer_endpoint: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginV3Response {
    account_id: String,
    #[serde(default)]
    client_id: Option<String>,
    #[serde(default)]
    lightstreamer_endpoint: Option<String>,
    oauth_token: OAuthToken,
}

#[derive(Deserialize)]
struct OAuthToken {
    access_token: String,
    refresh_token: String,
    #[serde(default = "default_token_type")]
    token_type: String,
    #[serde(deserialize_with = "seconds_from_str_or_int")]
    expires_in: u64,
}

impl std::fmt::Debug for OAuthToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthToken")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

impl OAuthToken {
    fn into_tokens(self) -> Tokens {
        Tokens::OAuth {
            access_token: SecretString::from(self.access_token),
            refresh_token: SecretString::from(self.refresh_token),
            token_type: self.token_type,
        }
    }
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

fn seconds_from_str_or_int<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(u64),
        Str(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Int(n) => Ok(n),
        Raw::Str(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}
