//! Watchlists service.

use std::sync::Arc;

use serde::Serialize;

use crate::client::{ClientInner, Endpoint, Request};
use crate::models::watchlist::StatusResponse;
use crate::models::{CreatedWatchlist, Epic, MarketSummary, OperationStatus, Watchlist, WatchlistId};
use crate::{Error, Result};

/// Service for watchlist operations.
///
/// # Example
///
/// ```no_run
/// use ig_rest_rs::Epic;
///
/// # async fn example(client: ig_rest_rs::IgClient) -> ig_rest_rs::Result<()> {
/// let created = client
///     .watchlists()
///     .create("FX majors", &[Epic::new("CS.D.EURUSD.MINI.IP")])
///     .await?;
///
/// let fx = client.watchlists().find_by_name("FX majors").await?;
/// let markets = client.watchlists().get(&fx.id).await?;
/// # Ok(())
/// # }
/// ```
pub struct WatchlistsService {
    inner: Arc<ClientInner>,
}

impl WatchlistsService {
    pub(crate) fn new(inner: Arc<ClientInner>) -> Self {
        Self { inner }
    }

    /// Get all watchlists of the active account.
    pub async fn list(&self) -> Result<Vec<Watchlist>> {
        #[derive(serde::Deserialize)]
        struct Response {
            #[serde(default)]
            watchlists: Vec<Watchlist>,
        }

        let response: Response = self.inner.fetch(&Request::new(Endpoint::WATCHLISTS)).await?;
        Ok(response.watchlists)
    }

    /// Get the markets of a watchlist.
    pub async fn get(&self, id: &WatchlistId) -> Result<Vec<MarketSummary>> {
        #[derive(serde::Deserialize)]
        struct Response {
            #[serde(default)]
            markets: Vec<MarketSummary>,
        }

        let request = Request::new(Endpoint::WATCHLIST).path_param("watchlistId", id);
        let response: Response = self.inner.fetch(&request).await?;
        Ok(response.markets)
    }

    /// Find a watchlist by its name.
    ///
    /// Fails with [`Error::NotFound`] if no watchlist has that name.
    pub async fn find_by_name(&self, name: &str) -> Result<Watchlist> {
        self.list()
            .await?
            .into_iter()
            .find(|w| w.name == name)
            .ok_or_else(|| Error::NotFound(format!("No watchlist named '{}'", name)))
    }

    /// Create a watchlist, optionally pre-populated with `epics`.
    pub async fn create(&self, name: &str, epics: &[Epic]) -> Result<CreatedWatchlist> {
        #[derive(Serialize)]
        struct Body<'a> {
            name: &'a str,
            #[serde(skip_serializing_if = "Option::is_none")]
            epics: Option<&'a [Epic]>,
        }

        let body = Body {
            name,
            epics: (!epics.is_empty()).then_some(epics),
        };
        let request = Request::new(Endpoint::CREATE_WATCHLIST).json(&body)?;
        self.inner.fetch(&request).await
    }

    /// Delete a watchlist.
    pub async fn delete(&self, id: &WatchlistId) -> Result<OperationStatus> {
        let request = Request::new(Endpoint::DELETE_WATCHLIST).path_param("watchlistId", id);
        self.status(&request).await
    }

    /// Add a market to a watchlist.
    pub async fn add_market(&self, id: &WatchlistId, epic: &Epic) -> Result<OperationStatus> {
        #[derive(Serialize)]
        struct Body<'a> {
            epic: &'a Epic,
        }

        let request = Request::new(Endpoint::ADD_TO_WATCHLIST)
            .path_param("watchlistId", id)
            .json(&Body { epic })?;
        self.status(&request).await
    }

    /// Remove a market from a watchlist.
    pub async fn remove_market(&self, id: &WatchlistId, epic: &Epic) -> Result<OperationStatus> {
        let request = Request::new(Endpoint::REMOVE_FROM_WATCHLIST)
            .path_param("watchlistId", id)
            .path_param("epic", epic);
        self.status(&request).await
    }

    async fn status(&self, request: &Request) -> Result<OperationStatus> {
        let response: StatusResponse = self.inner.fetch(request).await?;
        Ok(response.status)
    }
}
