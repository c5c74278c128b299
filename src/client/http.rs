//! The IG client handle.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use tokio::time::Instant;

use crate::api::{
    AccountsService, HistoryService, MarketsService, PositionsService, PricesService,
    WatchlistsService, WorkingOrdersService,
};
use crate::auth::{Credentials, SessionInfo, SessionManager};
use crate::{Environment, Result};

use super::config::ClientConfig;
use super::dispatch::Dispatcher;
use super::endpoint::{Request, Response};
use super::rate_limit::RateLimiter;

/// The main client for interacting with the IG REST API.
///
/// The client owns one session, one rate limiter and one dispatcher;
/// services obtained from it share them. Cloning is cheap and yields a
/// handle to the same state.
///
/// # Example
///
/// ```no_run
/// use ig_rest_rs::{ClientConfig, Credentials, Environment, IgClient};
///
/// # async fn example() -> ig_rest_rs::Result<()> {
/// let credentials = Credentials::new("api-key", "username", "password", Environment::Demo);
/// let client = IgClient::connect(credentials, ClientConfig::default()).await?;
///
/// let accounts = client.accounts().list().await?;
/// let positions = client.positions().list().await?;
/// println!("{} accounts, {} open positions", accounts.len(), positions.len());
/// # Ok(())
/// # }
/// ```
pub struct IgClient {
    pub(crate) inner: Arc<ClientInner>,
}

pub(crate) struct ClientInner {
    pub(crate) session: Arc<SessionManager>,
    pub(crate) limiter: Arc<RateLimiter>,
    pub(crate) dispatcher: Dispatcher,
    pub(crate) config: ClientConfig,
}

impl IgClient {
    /// Create a client without logging in. The first request logs in.
    pub fn new(credentials: Credentials, config: ClientConfig) -> Result<Self> {
        config.validate()?;

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| crate::Error::Config(format!("failed to build HTTP client: {}", e)))?;

        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| credentials.environment().api_base_url().to_string());

        let session = Arc::new(SessionManager::new(
            credentials,
            http.clone(),
            base_url.clone(),
            config.session_ttl,
            config.refresh_margin,
        ));
        let limiter = Arc::new(RateLimiter::new(&config.rate_limit));
        let dispatcher = Dispatcher::new(
            http,
            base_url,
            session.clone(),
            limiter.clone(),
            config.retry.clone(),
        );

        Ok(Self {
            inner: Arc::new(ClientInner {
                session,
                limiter,
                dispatcher,
                config,
            }),
        })
    }

    /// Create a client and log in immediately.
    pub async fn connect(credentials: Credentials, config: ClientConfig) -> Result<Self> {
        let client = Self::new(credentials, config)?;
        client.inner.session.login().await?;
        Ok(client)
    }

    /// Create a demo or live client from `IG_*` environment variables.
    ///
    /// See [`Credentials::from_env`].
    pub fn from_env() -> Result<Self> {
        Self::new(Credentials::from_env()?, ClientConfig::default())
    }

    /// Get the accounts service.
    pub fn accounts(&self) -> AccountsService {
        AccountsService::new(self.inner.clone())
    }

    /// Get the markets service.
    pub fn markets(&self) -> MarketsService {
        MarketsService::new(self.inner.clone())
    }

    /// Get the historical prices service.
    pub fn prices(&self) -> PricesService {
        PricesService::new(self.inner.clone())
    }

    /// Get the positions and deals service.
    pub fn positions(&self) -> PositionsService {
        PositionsService::new(self.inner.clone())
    }

    /// Get the working orders service.
    pub fn working_orders(&self) -> WorkingOrdersService {
        WorkingOrdersService::new(self.inner.clone())
    }

    /// Get the watchlists service.
    pub fn watchlists(&self) -> WatchlistsService {
        WatchlistsService::new(self.inner.clone())
    }

    /// Get the activity and transaction history service.
    pub fn history(&self) -> HistoryService {
        HistoryService::new(self.inner.clone())
    }

    /// Send a raw request through the dispatcher.
    ///
    /// Useful for endpoints without a dedicated service method.
    pub async fn execute(&self, request: &Request) -> Result<Response> {
        self.inner.dispatcher.execute(request).await
    }

    /// Send a raw request, failing with [`crate::Error::Timeout`] at `deadline`.
    pub async fn execute_with_deadline(
        &self,
        request: &Request,
        deadline: Instant,
    ) -> Result<Response> {
        self.inner
            .dispatcher
            .execute_with_deadline(request, deadline)
            .await
    }

    /// End the session on IG and clear it locally.
    pub async fn logout(&self) -> Result<()> {
        self.inner.session.logout().await
    }

    /// Snapshot of the current session, if logged in.
    pub async fn session_info(&self) -> Option<SessionInfo> {
        self.inner.session.session_info().await
    }

    /// Get a reference to the session manager.
    pub fn session(&self) -> &SessionManager {
        &self.inner.session
    }

    /// Get a reference to the rate limiter.
    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.inner.limiter
    }

    /// Get a reference to the dispatcher.
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.inner.dispatcher
    }

    /// The configuration the client was built with.
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Get the current environment.
    pub fn environment(&self) -> Environment {
        self.inner.session.environment()
    }
}

impl ClientInner {
    /// Execute `request` and decode the JSON body.
    pub(crate) async fn fetch<T: DeserializeOwned>(&self, request: &Request) -> Result<T> {
        self.dispatcher.execute(request).await?.json()
    }

    /// Execute `request`, discarding the body.
    pub(crate) async fn send(&self, request: &Request) -> Result<()> {
        self.dispatcher.execute(request).await.map(|_| ())
    }
}

impl Clone for IgClient {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl std::fmt::Debug for IgClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IgClient")
            .field("environment", &self.environment())
            .field("config", &self.inner.config)
            .finish()
    }
}
