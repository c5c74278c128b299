//! Open positions, working orders and deal confirmations.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::enums::{DealStatus, Direction, WorkingOrderType};
use super::market::MarketSummary;
use super::primitives::{DealId, DealReference, Epic};

/// An open position together with its market.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenPosition {
    /// Position data
    pub position: Position,
    /// Market the position is held in
    pub market: MarketSummary,
}

/// Position data.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    /// Size of one contract
    #[serde(default)]
    pub contract_size: Option<Decimal>,
    /// Local time the position was opened
    #[serde(default)]
    pub created_date: Option<String>,
    /// UTC time the position was opened
    #[serde(default, rename = "createdDateUTC")]
    pub created_date_utc: Option<String>,
    /// Permanent deal identifier
    pub deal_id: DealId,
    /// Reference the position was opened with
    #[serde(default)]
    pub deal_reference: Option<DealReference>,
    /// Deal size
    pub size: Decimal,
    /// Buy or sell
    pub direction: Direction,
    /// Opening level
    pub level: Decimal,
    /// Take-profit level
    #[serde(default)]
    pub limit_level: Option<Decimal>,
    /// Stop-loss level
    #[serde(default)]
    pub stop_level: Option<Decimal>,
    /// Trailing stop increment
    #[serde(default)]
    pub trailing_step: Option<Decimal>,
    /// Trailing stop distance
    #[serde(default)]
    pub trailing_stop_distance: Option<Decimal>,
    /// Position currency ISO code
    #[serde(default)]
    pub currency: Option<String>,
    /// Whether the stop is guaranteed
    #[serde(default)]
    pub controlled_risk: bool,
    /// Premium paid for a guaranteed stop
    #[serde(default)]
    pub limited_risk_premium: Option<Decimal>,
}

impl OpenPosition {
    /// Deal identifier of the position.
    pub fn deal_id(&self) -> &DealId {
        &self.position.deal_id
    }
}

/// A pending entry order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkingOrder {
    /// Order data
    pub working_order_data: WorkingOrderData,
    /// Market the order is placed in
    pub market_data: MarketSummary,
}

/// Working order data.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkingOrderData {
    /// Deal identifier
    pub deal_id: DealId,
    /// Buy or sell
    pub direction: Direction,
    /// Instrument epic
    pub epic: Epic,
    /// Order size
    pub order_size: Decimal,
    /// Trigger level
    pub order_level: Decimal,
    /// Limit or stop entry
    pub order_type: WorkingOrderType,
    /// Fill strategy, e.g. `GOOD_TILL_CANCELLED`
    #[serde(default)]
    pub time_in_force: Option<String>,
    /// Expiry (`yyyy/MM/dd hh:mm`) for good-till-date orders
    #[serde(default)]
    pub good_till_date: Option<String>,
    /// Expiry in ISO format
    #[serde(default, rename = "goodTillDateISO")]
    pub good_till_date_iso: Option<String>,
    /// Local creation time
    #[serde(default)]
    pub created_date: Option<String>,
    /// UTC creation time
    #[serde(default, rename = "createdDateUTC")]
    pub created_date_utc: Option<String>,
    /// Whether a guaranteed stop is attached
    #[serde(default)]
    pub guaranteed_stop: bool,
    /// Stop distance
    #[serde(default)]
    pub stop_distance: Option<Decimal>,
    /// Limit distance
    #[serde(default)]
    pub limit_distance: Option<Decimal>,
    /// Order currency
    #[serde(default)]
    pub currency_code: Option<String>,
    /// Whether this is a direct market access order
    #[serde(default)]
    pub dma: bool,
}

/// Immediate answer to a deal submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DealReferenceResponse {
    /// Reference to pass to `confirm`
    pub deal_reference: DealReference,
}

/// Outcome of a deal, looked up by its reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DealConfirmation {
    /// Deal reference
    pub deal_reference: DealReference,
    /// Deal identifier (present once accepted)
    #[serde(default)]
    pub deal_id: Option<DealId>,
    /// Accepted or rejected
    pub deal_status: DealStatus,
    /// Rejection reason or `SUCCESS`
    #[serde(default)]
    pub reason: Option<String>,
    /// Position status, e.g. `OPEN`, `CLOSED`, `AMENDED`
    #[serde(default)]
    pub status: Option<String>,
    /// Instrument epic
    #[serde(default)]
    pub epic: Option<Epic>,
    /// Expiry period
    #[serde(default)]
    pub expiry: Option<String>,
    /// Direction
    #[serde(default)]
    pub direction: Option<Direction>,
    /// Fill level
    #[serde(default)]
    pub level: Option<Decimal>,
    /// Deal size
    #[serde(default)]
    pub size: Option<Decimal>,
    /// Stop level
    #[serde(default)]
    pub stop_level: Option<Decimal>,
    /// Limit level
    #[serde(default)]
    pub limit_level: Option<Decimal>,
    /// Stop distance
    #[serde(default)]
    pub stop_distance: Option<Decimal>,
    /// Limit distance
    #[serde(default)]
    pub limit_distance: Option<Decimal>,
    /// Whether the stop is guaranteed
    #[serde(default)]
    pub guaranteed_stop: bool,
    /// Whether the stop trails
    #[serde(default)]
    pub trailing_stop: bool,
    /// Realised profit (closures)
    #[serde(default)]
    pub profit: Option<Decimal>,
    /// Currency of `profit`
    #[serde(default)]
    pub profit_currency: Option<String>,
    /// Deals affected by this one
    #[serde(default)]
    pub affected_deals: Vec<AffectedDeal>,
    /// Time of the deal
    #[serde(default)]
    pub date: Option<String>,
}

impl DealConfirmation {
    /// Returns `true` if IG accepted the deal.
    pub fn is_accepted(&self) -> bool {
        self.deal_status == DealStatus::Accepted
    }
}

/// A deal touched by another deal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AffectedDeal {
    /// Deal identifier
    pub deal_id: DealId,
    /// What happened to it, e.g. `FULLY_CLOSED`
    pub status: String,
}
