//! Positions and deals service.

use std::sync::Arc;

use tracing::info;

use crate::client::{ClientInner, Endpoint, Request};
use crate::models::{
    ClosePositionRequest, DealConfirmation, DealId, DealReference, DealReferenceResponse,
    OpenPosition, OpenPositionRequest, UpdatePositionRequest,
};
use crate::{Error, Result};

/// Service for open positions and OTC deals.
///
/// Deal submissions return a [`DealReference`] as soon as IG accepts the
/// request for processing. Use [`confirm`](Self::confirm) to learn whether
/// the deal was actually accepted.
///
/// # Example
///
/// ```no_run
/// use ig_rest_rs::models::{ClosePositionBuilder, Direction, OpenPositionBuilder};
/// use rust_decimal_macros::dec;
///
/// # async fn example(client: ig_rest_rs::IgClient) -> ig_rest_rs::Result<()> {
/// let market = client.markets().search_first("EUR/USD").await?;
/// let request = OpenPositionBuilder::new(&market, Direction::Buy, dec!(1))
///     .stop_distance(dec!(20))
///     .limit_distance(dec!(40))
///     .build()?;
///
/// let reference = client.positions().open(&request).await?;
/// let confirmation = client.positions().confirm(&reference).await?;
///
/// if confirmation.is_accepted() {
///     let position = client.positions().find_by_deal_reference(&reference).await?;
///     let close = ClosePositionBuilder::new(&position).build()?;
///     client.positions().close(&close).await?;
/// }
/// # Ok(())
/// # }
/// ```
pub struct PositionsService {
    inner: Arc<ClientInner>,
}

impl PositionsService {
    pub(crate) fn new(inner: Arc<ClientInner>) -> Self {
        Self { inner }
    }

    /// List all open positions of the active account.
    pub async fn list(&self) -> Result<Vec<OpenPosition>> {
        #[derive(serde::Deserialize)]
        struct Response {
            #[serde(default)]
            positions: Vec<OpenPosition>,
        }

        let response: Response = self.inner.fetch(&Request::new(Endpoint::POSITIONS)).await?;
        Ok(response.positions)
    }

    /// Get one open position.
    pub async fn get(&self, deal_id: &DealId) -> Result<OpenPosition> {
        let request = Request::new(Endpoint::POSITION).path_param("dealId", deal_id);
        self.inner.fetch(&request).await
    }

    /// Find the open position that was opened with `reference`.
    ///
    /// Fails with [`Error::NotFound`] if no open position carries it.
    pub async fn find_by_deal_reference(&self, reference: &DealReference) -> Result<OpenPosition> {
        self.list()
            .await?
            .into_iter()
            .find(|p| p.position.deal_reference.as_ref() == Some(reference))
            .ok_or_else(|| {
                Error::NotFound(format!("No open position with deal reference '{}'", reference))
            })
    }

    /// Submit a deal opening a position.
    pub async fn open(&self, order: &OpenPositionRequest) -> Result<DealReference> {
        let request = Request::new(Endpoint::OPEN_POSITION).json(order)?;
        let response: DealReferenceResponse = self.inner.fetch(&request).await?;

        info!(
            epic = %order.epic,
            direction = ?order.direction,
            size = %order.size,
            deal_reference = %response.deal_reference,
            "position open submitted"
        );
        Ok(response.deal_reference)
    }

    /// Submit a deal closing (part of) a position.
    pub async fn close(&self, order: &ClosePositionRequest) -> Result<DealReference> {
        let request = Request::new(Endpoint::CLOSE_POSITION).json(order)?;
        let response: DealReferenceResponse = self.inner.fetch(&request).await?;

        info!(
            deal_id = %order.deal_id,
            size = %order.size,
            deal_reference = %response.deal_reference,
            "position close submitted"
        );
        Ok(response.deal_reference)
    }

    /// Amend the stop and limit of a position.
    pub async fn update(
        &self,
        deal_id: &DealId,
        update: &UpdatePositionRequest,
    ) -> Result<DealReference> {
        let request = Request::new(Endpoint::UPDATE_POSITION)
            .path_param("dealId", deal_id)
            .json(update)?;
        let response: DealReferenceResponse = self.inner.fetch(&request).await?;

        info!(
            deal_id = %deal_id,
            deal_reference = %response.deal_reference,
            "position update submitted"
        );
        Ok(response.deal_reference)
    }

    /// Outcome of the deal submitted with `reference`.
    pub async fn confirm(&self, reference: &DealReference) -> Result<DealConfirmation> {
        let request = Request::new(Endpoint::CONFIRM).path_param("dealReference", reference);
        self.inner.fetch(&request).await
    }
}
