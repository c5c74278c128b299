//! Historical prices service.

use std::sync::Arc;

use chrono::NaiveDateTime;

use crate::client::{ClientInner, Endpoint, Request};
use crate::models::{Epic, PriceAllowance, PriceHistory, Resolution};
use crate::Result;

/// Timestamp format of the price history path segments.
const PATH_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A one-hour daily window on a long-expired market. Fetching it costs no
/// data points but still reports the allowance.
const ALLOWANCE_PROBE: (&str, &str, &str) = (
    "DO.D.EURO.19.IP",
    "2020-01-01 11:00:00",
    "2020-01-01 12:00:00",
);

/// Service for historical price data.
///
/// Every candle returned counts against a weekly data allowance.
///
/// # Example
///
/// ```no_run
/// use chrono::NaiveDate;
/// use ig_rest_rs::Epic;
/// use ig_rest_rs::models::Resolution;
///
/// # async fn example(client: ig_rest_rs::IgClient) -> ig_rest_rs::Result<()> {
/// let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
/// let history = client
///     .prices()
///     .history(
///         &Epic::new("CS.D.EURUSD.MINI.IP"),
///         Resolution::Hour,
///         day.and_hms_opt(8, 0, 0).unwrap(),
///         day.and_hms_opt(16, 0, 0).unwrap(),
///     )
///     .await?;
/// println!("{} candles, {} left", history.prices.len(), history.allowance.remaining_allowance);
/// # Ok(())
/// # }
/// ```
pub struct PricesService {
    inner: Arc<ClientInner>,
}

impl PricesService {
    pub(crate) fn new(inner: Arc<ClientInner>) -> Self {
        Self { inner }
    }

    /// Candles for `epic` at `resolution` between `from` and `to`.
    pub async fn history(
        &self,
        epic: &Epic,
        resolution: Resolution,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> Result<PriceHistory> {
        let request = Request::new(Endpoint::PRICES)
            .path_param("epic", epic)
            .path_param("resolution", resolution)
            .path_param("from", from.format(PATH_TIME_FORMAT))
            .path_param("to", to.format(PATH_TIME_FORMAT));
        self.inner.fetch(&request).await
    }

    /// The current historical data allowance.
    pub async fn allowance(&self) -> Result<PriceAllowance> {
        let (epic, from, to) = ALLOWANCE_PROBE;
        let request = Request::new(Endpoint::PRICES)
            .path_param("epic", epic)
            .path_param("resolution", Resolution::Day)
            .path_param("from", from)
            .path_param("to", to);
        let history: PriceHistory = self.inner.fetch(&request).await?;
        Ok(history.allowance)
    }
}
