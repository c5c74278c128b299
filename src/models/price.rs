//! Historical price candles.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Response of `GET /prices/{epic}/{resolution}/{from}/{to}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceHistory {
    /// Candles in chronological order
    #[serde(default)]
    pub prices: Vec<PriceCandle>,
    /// Instrument type
    #[serde(default)]
    pub instrument_type: Option<String>,
    /// Historical data allowance after this request
    pub allowance: PriceAllowance,
}

/// One candle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceCandle {
    /// Local snapshot time, `yyyy/MM/dd hh:mm:ss`
    pub snapshot_time: String,
    /// Opening prices
    pub open_price: Price,
    /// Closing prices
    pub close_price: Price,
    /// Highest prices
    pub high_price: Price,
    /// Lowest prices
    pub low_price: Price,
    /// Traded volume (exchange-traded instruments only)
    #[serde(default)]
    pub last_traded_volume: Option<Decimal>,
}

/// Bid/ask pair of one candle point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Price {
    /// Bid
    #[serde(default)]
    pub bid: Option<Decimal>,
    /// Ask
    #[serde(default)]
    pub ask: Option<Decimal>,
    /// Last traded price (exchange-traded instruments only)
    #[serde(default)]
    pub last_traded: Option<Decimal>,
}

impl Price {
    /// Midpoint of bid and ask, if both are present.
    pub fn mid(&self) -> Option<Decimal> {
        Some((self.bid? + self.ask?) / Decimal::TWO)
    }
}

/// Historical price data allowance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceAllowance {
    /// Data points left in the current period
    pub remaining_allowance: i64,
    /// Data points allowed per period
    pub total_allowance: i64,
    /// Seconds until the allowance resets
    pub allowance_expiry: i64,
}
