//! Enumeration types for the IG API.
//!
//! IG serialises enums as SCREAMING_SNAKE_CASE strings. Enums that describe
//! provider state carry an `Unknown` catch-all so new values do not break
//! decoding.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Deal direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    /// Buy / long
    Buy,
    /// Sell / short
    Sell,
}

impl Direction {
    /// The direction that closes a position opened in this direction.
    pub fn opposite(&self) -> Direction {
        match self {
            Direction::Buy => Direction::Sell,
            Direction::Sell => Direction::Buy,
        }
    }
}

/// Candle resolution for historical prices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Resolution {
    /// One second
    Second,
    /// One minute
    Minute,
    /// Two minutes
    #[serde(rename = "MINUTE_2")]
    Minute2,
    /// Three minutes
    #[serde(rename = "MINUTE_3")]
    Minute3,
    /// Five minutes
    #[serde(rename = "MINUTE_5")]
    Minute5,
    /// Ten minutes
    #[serde(rename = "MINUTE_10")]
    Minute10,
    /// Fifteen minutes
    #[serde(rename = "MINUTE_15")]
    Minute15,
    /// Thirty minutes
    #[serde(rename = "MINUTE_30")]
    Minute30,
    /// One hour
    Hour,
    /// Two hours
    #[serde(rename = "HOUR_2")]
    Hour2,
    /// Three hours
    #[serde(rename = "HOUR_3")]
    Hour3,
    /// Four hours
    #[serde(rename = "HOUR_4")]
    Hour4,
    /// One day
    Day,
    /// One week
    Week,
    /// One month
    Month,
}

impl Resolution {
    /// The path segment IG expects for this resolution.
    pub fn as_str(&self) -> &'static str {
        match self {
            Resolution::Second => "SECOND",
            Resolution::Minute => "MINUTE",
            Resolution::Minute2 => "MINUTE_2",
            Resolution::Minute3 => "MINUTE_3",
            Resolution::Minute5 => "MINUTE_5",
            Resolution::Minute10 => "MINUTE_10",
            Resolution::Minute15 => "MINUTE_15",
            Resolution::Minute30 => "MINUTE_30",
            Resolution::Hour => "HOUR",
            Resolution::Hour2 => "HOUR_2",
            Resolution::Hour3 => "HOUR_3",
            Resolution::Hour4 => "HOUR_4",
            Resolution::Day => "DAY",
            Resolution::Week => "WEEK",
            Resolution::Month => "MONTH",
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Order type for OTC deals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderType {
    /// Fill at the prevailing market price
    Market,
    /// Fill at the given level or better
    Limit,
    /// Request-for-quote order
    Quote,
}

/// Fill strategy for OTC deals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimeInForce {
    /// Fill the whole size or nothing
    #[default]
    FillOrKill,
    /// Fill what can be filled and cancel the rest
    ExecuteAndEliminate,
}

/// Trading state of a market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MarketStatus {
    /// Open for trading
    Tradeable,
    /// Closed
    Closed,
    /// Open for edits only
    EditsOnly,
    /// Offline
    Offline,
    /// In auction
    OnAuction,
    /// In auction, no edits allowed
    OnAuctionNoEdits,
    /// Trading suspended
    Suspended,
    /// Value not known to this client
    #[serde(other)]
    Unknown,
}

impl MarketStatus {
    /// Returns `true` if the market is closed for new deals.
    pub fn is_closed(&self) -> bool {
        matches!(self, MarketStatus::Closed)
    }
}

/// Kind of IG trading account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountType {
    /// Contract for difference account
    Cfd,
    /// Spread betting account
    Spreadbet,
    /// Physical share dealing account
    Physical,
    /// Value not known to this client
    #[serde(other)]
    Unknown,
}

/// Outcome of a submitted deal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DealStatus {
    /// Deal accepted
    Accepted,
    /// Deal rejected
    Rejected,
    /// Value not known to this client
    #[serde(other)]
    Unknown,
}

/// Type of a working order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkingOrderType {
    /// Limit entry order
    Limit,
    /// Stop entry order
    Stop,
}

/// Status field returned by IG for simple write operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationStatus {
    /// The operation succeeded
    Success,
    /// The operation succeeded but the watchlist was not fully populated
    SuccessNotAllInstrumentsAdded,
    /// The operation failed
    Failure,
    /// Value not known to this client
    #[serde(other)]
    Unknown,
}

impl OperationStatus {
    /// Returns `true` for any success status.
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            OperationStatus::Success | OperationStatus::SuccessNotAllInstrumentsAdded
        )
    }
}

/// Unit of a dealing rule value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleUnit {
    /// Price points
    Points,
    /// Percentage of the level
    Percentage,
    /// Value not known to this client
    #[serde(other)]
    Unknown,
}
