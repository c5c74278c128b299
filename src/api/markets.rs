//! Markets service.

use std::sync::Arc;

use crate::client::{ClientInner, Endpoint, Request};
use crate::models::{Epic, MarketDetails, MarketSummary};
use crate::{Error, Result};

/// Service for market search and instrument details.
///
/// # Example
///
/// ```no_run
/// # async fn example(client: ig_rest_rs::IgClient) -> ig_rest_rs::Result<()> {
/// let market = client.markets().search_first("FTSE 100").await?;
/// let details = client.markets().get(&market.epic).await?;
/// println!("Min deal size: {}", details.dealing_rules.min_deal_size.value);
/// # Ok(())
/// # }
/// ```
pub struct MarketsService {
    inner: Arc<ClientInner>,
}

impl MarketsService {
    pub(crate) fn new(inner: Arc<ClientInner>) -> Self {
        Self { inner }
    }

    /// Search markets whose name or epic matches `term`.
    pub async fn search(&self, term: &str) -> Result<Vec<MarketSummary>> {
        #[derive(serde::Deserialize)]
        struct Response {
            #[serde(default)]
            markets: Vec<MarketSummary>,
        }

        let request = Request::new(Endpoint::MARKET_SEARCH).query("searchTerm", term);
        let response: Response = self.inner.fetch(&request).await?;
        Ok(response.markets)
    }

    /// The best match for `term`.
    ///
    /// Fails with [`Error::NotFound`] if the search has no results.
    pub async fn search_first(&self, term: &str) -> Result<MarketSummary> {
        self.search(term)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::NotFound(format!("No market matches '{}'", term)))
    }

    /// Instrument details, dealing rules and latest prices for `epic`.
    pub async fn get(&self, epic: &Epic) -> Result<MarketDetails> {
        let request = Request::new(Endpoint::MARKET).path_param("epic", epic);
        self.inner.fetch(&request).await
    }
}
