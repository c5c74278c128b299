//! Market search results, instrument details and dealing rules.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::enums::{Direction, MarketStatus, RuleUnit};
use super::primitives::Epic;
use crate::{Error, Result};

/// Market summary as returned by searches, positions and working orders.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketSummary {
    /// Instrument epic
    pub epic: Epic,
    /// Readable name, e.g. `EUR/USD Mini`
    #[serde(default)]
    pub instrument_name: String,
    /// Instrument type, e.g. `CURRENCIES`
    #[serde(default)]
    pub instrument_type: Option<String>,
    /// Expiry period, `-` for rolling markets
    #[serde(default)]
    pub expiry: Option<String>,
    /// Current trading state
    pub market_status: MarketStatus,
    /// Bid price
    #[serde(default)]
    pub bid: Option<Decimal>,
    /// Offer price
    #[serde(default)]
    pub offer: Option<Decimal>,
    /// High of the day
    #[serde(default)]
    pub high: Option<Decimal>,
    /// Low of the day
    #[serde(default)]
    pub low: Option<Decimal>,
    /// Net change since the open
    #[serde(default)]
    pub net_change: Option<Decimal>,
    /// Percentage change since the open
    #[serde(default)]
    pub percentage_change: Option<Decimal>,
    /// Price delay in minutes
    #[serde(default)]
    pub delay_time: Option<Decimal>,
    /// Multiplier giving the actual pip value
    #[serde(default)]
    pub scaling_factor: Option<Decimal>,
    /// Whether streaming prices are available
    #[serde(default)]
    pub streaming_prices_available: bool,
    /// Local time of the last price update
    #[serde(default)]
    pub update_time: Option<String>,
    /// UTC time of the last price update
    #[serde(default, rename = "updateTimeUTC")]
    pub update_time_utc: Option<String>,
}

impl MarketSummary {
    /// The price a new deal in `direction` would be filled against.
    pub fn dealing_price(&self, direction: Direction) -> Option<Decimal> {
        match direction {
            Direction::Buy => self.offer,
            Direction::Sell => self.bid,
        }
    }
}

/// Full market details from `GET /markets/{epic}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketDetails {
    /// Static instrument data
    pub instrument: Instrument,
    /// Minimum sizes and distances
    pub dealing_rules: DealingRules,
    /// Latest prices
    pub snapshot: MarketSnapshot,
}

/// Static description of an instrument.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instrument {
    /// Instrument epic
    pub epic: Epic,
    /// Readable name
    pub name: String,
    /// Expiry period
    #[serde(default)]
    pub expiry: Option<String>,
    /// Instrument type
    #[serde(rename = "type", default)]
    pub instrument_type: Option<String>,
    /// Value of one lot
    #[serde(default)]
    pub lot_size: Option<Decimal>,
    /// Contract size
    #[serde(default)]
    pub contract_size: Option<String>,
    /// Currencies the instrument can be dealt in
    #[serde(default)]
    pub currencies: Vec<Currency>,
    /// Whether `forceOpen` is accepted
    #[serde(default)]
    pub force_open_allowed: bool,
    /// Whether stops and limits may be attached
    #[serde(default)]
    pub stops_limits_allowed: bool,
    /// Whether guaranteed stops are offered
    #[serde(default)]
    pub controlled_risk_allowed: bool,
    /// Whether streaming prices are available
    #[serde(default)]
    pub streaming_prices_available: bool,
}

impl Instrument {
    /// The currency IG marks as default, if any.
    pub fn default_currency(&self) -> Option<&Currency> {
        self.currencies.iter().find(|c| c.is_default)
    }
}

/// A currency an instrument can be dealt in.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Currency {
    /// ISO code
    pub code: String,
    /// Display symbol
    #[serde(default)]
    pub symbol: Option<String>,
    /// Whether this is the instrument's default currency
    #[serde(default)]
    pub is_default: bool,
}

/// Latest prices for a market.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketSnapshot {
    /// Current trading state
    pub market_status: MarketStatus,
    /// Bid price
    #[serde(default)]
    pub bid: Option<Decimal>,
    /// Offer price
    #[serde(default)]
    pub offer: Option<Decimal>,
    /// High of the day
    #[serde(default)]
    pub high: Option<Decimal>,
    /// Low of the day
    #[serde(default)]
    pub low: Option<Decimal>,
    /// Net change since the open
    #[serde(default)]
    pub net_change: Option<Decimal>,
    /// Percentage change since the open
    #[serde(default)]
    pub percentage_change: Option<Decimal>,
    /// Time of the last price update
    #[serde(default)]
    pub update_time: Option<String>,
    /// Price delay in minutes
    #[serde(default)]
    pub delay_time: Option<Decimal>,
    /// Number of decimal places in prices
    #[serde(default)]
    pub decimal_places_factor: Option<u32>,
    /// Multiplier giving the actual pip value
    #[serde(default)]
    pub scaling_factor: Option<Decimal>,
}

/// A dealing rule value with its unit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RuleValue {
    /// Points or percentage
    pub unit: RuleUnit,
    /// The rule's value
    pub value: Decimal,
}

/// Minimum sizes and stop/limit distances IG accepts for a market.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DealingRules {
    /// Smallest deal size
    pub min_deal_size: RuleValue,
    /// Smallest trailing stop increment
    #[serde(default)]
    pub min_step_distance: Option<RuleValue>,
    /// Smallest distance for a normal stop or limit
    pub min_normal_stop_or_limit_distance: RuleValue,
    /// Largest distance for a stop or limit
    pub max_stop_or_limit_distance: RuleValue,
    /// Smallest distance for a guaranteed stop
    #[serde(default)]
    pub min_controlled_risk_stop_distance: Option<RuleValue>,
}

impl DealingRules {
    /// Reject sizes below the market minimum.
    pub fn check_size(&self, size: Decimal) -> Result<()> {
        if size < self.min_deal_size.value {
            return Err(Error::InvalidInput(format!(
                "Deal size {} is below the market minimum of {}",
                size, self.min_deal_size.value
            )));
        }
        Ok(())
    }

    /// Reject stop/limit distances outside the market bounds.
    ///
    /// Only point-based rules are enforced; percentage rules need a level
    /// to be meaningful and are left to IG.
    pub fn check_distance(&self, what: &str, distance: Decimal) -> Result<()> {
        let min = self.min_normal_stop_or_limit_distance;
        let max = self.max_stop_or_limit_distance;

        if min.unit == RuleUnit::Points && distance < min.value {
            return Err(Error::InvalidInput(format!(
                "{} {} is below the market minimum of {}",
                what, distance, min.value
            )));
        }
        if max.unit == RuleUnit::Points && distance > max.value {
            return Err(Error::InvalidInput(format!(
                "{} {} is above the market maximum of {}",
                what, distance, max.value
            )));
        }
        Ok(())
    }

    /// Reject trailing stop increments below the market minimum.
    pub fn check_step(&self, increment: Decimal) -> Result<()> {
        match self.min_step_distance {
            Some(min) if min.unit == RuleUnit::Points && increment < min.value => {
                Err(Error::InvalidInput(format!(
                    "Trailing stop increment {} is below the market minimum of {}",
                    increment, min.value
                )))
            }
            _ => Ok(()),
        }
    }
}
