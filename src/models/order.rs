//! Deal requests for opening, closing and amending OTC positions.
//!
//! Requests are produced by builders that apply IG's dealing constraints
//! locally, so an invalid deal fails with [`Error::InvalidInput`] before
//! anything is sent.

use rust_decimal::Decimal;
use serde::Serialize;

use super::enums::{Direction, MarketStatus, OrderType, TimeInForce};
use super::market::{DealingRules, MarketSummary};
use super::position::OpenPosition;
use super::primitives::{DealId, DealReference, Epic};
use crate::{Error, Result};

const DEFAULT_CURRENCY: &str = "GBP";
const ROLLING_EXPIRY: &str = "-";

/// Body of `POST /positions/otc`.
///
/// Use [`OpenPositionBuilder`] to construct one.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenPositionRequest {
    /// Caller-chosen reference
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deal_reference: Option<DealReference>,
    /// Instrument epic
    pub epic: Epic,
    /// Expiry period
    pub expiry: String,
    /// Buy or sell
    pub direction: Direction,
    /// Deal size
    #[serde(with = "rust_decimal::serde::float")]
    pub size: Decimal,
    /// Market, limit or quote
    pub order_type: OrderType,
    /// Fill level for limit orders
    #[serde(
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub level: Option<Decimal>,
    /// Fill strategy
    pub time_in_force: TimeInForce,
    /// Whether the stop is guaranteed
    pub guaranteed_stop: bool,
    /// Open a new position instead of netting against an opposite one
    pub force_open: bool,
    /// Deal currency
    pub currency_code: String,
    /// Take-profit level
    #[serde(
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub limit_level: Option<Decimal>,
    /// Take-profit distance
    #[serde(
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub limit_distance: Option<Decimal>,
    /// Stop-loss level
    #[serde(
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub stop_level: Option<Decimal>,
    /// Stop-loss distance
    #[serde(
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub stop_distance: Option<Decimal>,
    /// Whether the stop trails the price
    pub trailing_stop: bool,
    /// Trailing stop increment
    #[serde(
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub trailing_stop_increment: Option<Decimal>,
}

/// Builder for [`OpenPositionRequest`].
///
/// # Example
///
/// ```no_run
/// use ig_rest_rs::models::{Direction, OpenPositionBuilder};
/// use rust_decimal_macros::dec;
///
/// # async fn example(client: ig_rest_rs::IgClient) -> ig_rest_rs::Result<()> {
/// let market = client.markets().search_first("EUR/USD").await?;
/// let request = OpenPositionBuilder::new(&market, Direction::Buy, dec!(1))
///     .stop_distance(dec!(20))
///     .limit_distance(dec!(40))
///     .build()?;
/// let reference = client.positions().open(&request).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct OpenPositionBuilder {
    epic: Epic,
    expiry: String,
    market_status: MarketStatus,
    dealing_price: Option<Decimal>,
    direction: Direction,
    size: Decimal,
    deal_reference: Option<DealReference>,
    order_type: OrderType,
    level: Option<Decimal>,
    time_in_force: TimeInForce,
    guaranteed_stop: bool,
    force_open: bool,
    currency_code: String,
    limit_level: Option<Decimal>,
    limit_distance: Option<Decimal>,
    stop_level: Option<Decimal>,
    stop_distance: Option<Decimal>,
    trailing_increment: Option<Decimal>,
    trailing: bool,
    rules: Option<DealingRules>,
}

impl OpenPositionBuilder {
    /// Start a market order of `size` in `direction` on `market`.
    pub fn new(market: &MarketSummary, direction: Direction, size: Decimal) -> Self {
        Self {
            epic: market.epic.clone(),
            expiry: market
                .expiry
                .clone()
                .unwrap_or_else(|| ROLLING_EXPIRY.to_string()),
            market_status: market.market_status,
            dealing_price: market.dealing_price(direction),
            direction,
            size,
            deal_reference: None,
            order_type: OrderType::Market,
            level: None,
            time_in_force: TimeInForce::FillOrKill,
            guaranteed_stop: false,
            force_open: true,
            currency_code: DEFAULT_CURRENCY.to_string(),
            limit_level: None,
            limit_distance: None,
            stop_level: None,
            stop_distance: None,
            trailing_increment: None,
            trailing: false,
            rules: None,
        }
    }

    /// Attach a caller-chosen deal reference.
    pub fn deal_reference(mut self, reference: impl Into<DealReference>) -> Self {
        self.deal_reference = Some(reference.into());
        self
    }

    /// Fill at `level` or better instead of at market.
    pub fn limit_order(mut self, level: Decimal) -> Self {
        self.order_type = OrderType::Limit;
        self.level = Some(level);
        self
    }

    /// Set the fill strategy.
    pub fn time_in_force(mut self, tif: TimeInForce) -> Self {
        self.time_in_force = tif;
        self
    }

    /// Request a guaranteed stop.
    pub fn guaranteed_stop(mut self, guaranteed: bool) -> Self {
        self.guaranteed_stop = guaranteed;
        self
    }

    /// Open alongside, rather than net against, opposite positions.
    pub fn force_open(mut self, force_open: bool) -> Self {
        self.force_open = force_open;
        self
    }

    /// Deal in `currency` (ISO code).
    pub fn currency(mut self, currency: impl Into<String>) -> Self {
        self.currency_code = currency.into();
        self
    }

    /// Take profit at an absolute level.
    pub fn limit_level(mut self, level: Decimal) -> Self {
        self.limit_level = Some(level);
        self
    }

    /// Take profit at a distance in points.
    pub fn limit_distance(mut self, distance: Decimal) -> Self {
        self.limit_distance = Some(distance);
        self
    }

    /// Stop out at an absolute level.
    pub fn stop_level(mut self, level: Decimal) -> Self {
        self.stop_level = Some(level);
        self
    }

    /// Stop out at a distance in points.
    pub fn stop_distance(mut self, distance: Decimal) -> Self {
        self.stop_distance = Some(distance);
        self
    }

    /// Use a trailing stop `distance` points away that moves in steps of
    /// `increment`.
    pub fn trailing_stop(mut self, distance: Decimal, increment: Decimal) -> Self {
        self.trailing = true;
        self.stop_distance = Some(distance);
        self.trailing_increment = Some(increment);
        self
    }

    /// Also check the deal against the market's dealing rules.
    pub fn dealing_rules(mut self, rules: &DealingRules) -> Self {
        self.rules = Some(rules.clone());
        self
    }

    /// Build the request, validating all fields.
    pub fn build(self) -> Result<OpenPositionRequest> {
        if self.market_status.is_closed() {
            return Err(Error::InvalidInput(
                "Cannot place order on CLOSED market".to_string(),
            ));
        }
        if self.size <= Decimal::ZERO {
            return Err(Error::InvalidInput(
                "Order size must be greater than 0".to_string(),
            ));
        }

        exactly_one("limit_level", self.limit_level, "limit_distance", self.limit_distance)?;

        if self.trailing {
            if self.stop_level.is_some() {
                return Err(Error::InvalidInput(
                    "Trailing stops take a stop distance, not a stop level".to_string(),
                ));
            }
            if self.guaranteed_stop {
                return Err(Error::InvalidInput(
                    "Guaranteed stops cannot trail".to_string(),
                ));
            }
        } else {
            exactly_one("stop_level", self.stop_level, "stop_distance", self.stop_distance)?;
        }

        if self.order_type == OrderType::Limit && self.level.is_none() {
            return Err(Error::InvalidInput(
                "Limit orders require a level".to_string(),
            ));
        }

        if let Some(ref rules) = self.rules {
            self.check_rules(rules)?;
        }

        Ok(OpenPositionRequest {
            deal_reference: self.deal_reference,
            epic: self.epic,
            expiry: self.expiry,
            direction: self.direction,
            size: self.size,
            order_type: self.order_type,
            level: self.level,
            time_in_force: self.time_in_force,
            guaranteed_stop: self.guaranteed_stop,
            force_open: self.force_open,
            currency_code: self.currency_code,
            limit_level: self.limit_level,
            limit_distance: self.limit_distance,
            stop_level: self.stop_level,
            stop_distance: self.stop_distance,
            trailing_stop: self.trailing,
            trailing_stop_increment: self.trailing_increment,
        })
    }

    fn check_rules(&self, rules: &DealingRules) -> Result<()> {
        rules.check_size(self.size)?;
        if let Some(distance) = self.limit_distance {
            rules.check_distance("Limit distance", distance)?;
        }
        if let Some(distance) = self.stop_distance {
            rules.check_distance("Stop distance", distance)?;
        }
        // Levels are checked as their distance from the current dealing price.
        if let Some(price) = self.dealing_price {
            if let Some(level) = self.limit_level {
                rules.check_distance("Limit level distance", (level - price).abs())?;
            }
            if let Some(level) = self.stop_level {
                rules.check_distance("Stop level distance", (level - price).abs())?;
            }
        }
        if let Some(increment) = self.trailing_increment {
            rules.check_step(increment)?;
        }
        Ok(())
    }
}

/// Body of the position close request (`DELETE /positions/otc`).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClosePositionRequest {
    /// Position to close
    pub deal_id: DealId,
    /// Opposite of the position's direction
    pub direction: Direction,
    /// Size to close
    #[serde(with = "rust_decimal::serde::float")]
    pub size: Decimal,
    /// Market or limit
    pub order_type: OrderType,
    /// Fill level for limit closes
    #[serde(
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub level: Option<Decimal>,
    /// Fill strategy
    pub time_in_force: TimeInForce,
}

/// Builder for [`ClosePositionRequest`]. Closes the whole position unless
/// a smaller size is given.
#[derive(Debug, Clone)]
pub struct ClosePositionBuilder {
    deal_id: DealId,
    market_status: MarketStatus,
    position_size: Decimal,
    direction: Direction,
    size: Decimal,
    order_type: OrderType,
    level: Option<Decimal>,
    time_in_force: TimeInForce,
}

impl ClosePositionBuilder {
    /// Start closing `position` in full.
    pub fn new(position: &OpenPosition) -> Self {
        Self {
            deal_id: position.position.deal_id.clone(),
            market_status: position.market.market_status,
            position_size: position.position.size,
            direction: position.position.direction.opposite(),
            size: position.position.size,
            order_type: OrderType::Market,
            level: None,
            time_in_force: TimeInForce::FillOrKill,
        }
    }

    /// Close only `size` of the position.
    pub fn size(mut self, size: Decimal) -> Self {
        self.size = size;
        self
    }

    /// Close at `level` or better instead of at market.
    pub fn limit_order(mut self, level: Decimal) -> Self {
        self.order_type = OrderType::Limit;
        self.level = Some(level);
        self
    }

    /// Set the fill strategy.
    pub fn time_in_force(mut self, tif: TimeInForce) -> Self {
        self.time_in_force = tif;
        self
    }

    /// Build the request, validating all fields.
    pub fn build(self) -> Result<ClosePositionRequest> {
        if self.market_status.is_closed() {
            return Err(Error::InvalidInput(
                "Cannot close position on CLOSED market".to_string(),
            ));
        }
        if self.size <= Decimal::ZERO {
            return Err(Error::InvalidInput(
                "Close size must be greater than 0".to_string(),
            ));
        }
        if self.size > self.position_size {
            return Err(Error::InvalidInput(format!(
                "Close size {} exceeds position size {}",
                self.size, self.position_size
            )));
        }

        Ok(ClosePositionRequest {
            deal_id: self.deal_id,
            direction: self.direction,
            size: self.size,
            order_type: self.order_type,
            level: self.level,
            time_in_force: self.time_in_force,
        })
    }
}

/// Body of `PUT /positions/otc/{dealId}`.
///
/// Levels left unset by the builder keep the position's current values; a
/// `null` level removes the stop or limit.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePositionRequest {
    /// New take-profit level
    #[serde(with = "rust_decimal::serde::float_option")]
    pub limit_level: Option<Decimal>,
    /// New stop-loss level
    #[serde(with = "rust_decimal::serde::float_option")]
    pub stop_level: Option<Decimal>,
    /// Whether the stop trails
    pub trailing_stop: bool,
    /// Trailing stop distance
    #[serde(
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub trailing_stop_distance: Option<Decimal>,
    /// Trailing stop increment
    #[serde(
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub trailing_stop_increment: Option<Decimal>,
}

/// Builder for [`UpdatePositionRequest`].
#[derive(Debug, Clone)]
pub struct UpdatePositionBuilder {
    deal_id: DealId,
    market_status: MarketStatus,
    current_limit: Option<Decimal>,
    current_stop: Option<Decimal>,
    limit_level: Option<Decimal>,
    stop_level: Option<Decimal>,
    trailing: Option<(Decimal, Decimal)>,
}

impl UpdatePositionBuilder {
    /// Start amending `position`.
    pub fn new(position: &OpenPosition) -> Self {
        Self {
            deal_id: position.position.deal_id.clone(),
            market_status: position.market.market_status,
            current_limit: position.position.limit_level,
            current_stop: position.position.stop_level,
            limit_level: None,
            stop_level: None,
            trailing: None,
        }
    }

    /// Move the take-profit level.
    pub fn limit_level(mut self, level: Decimal) -> Self {
        self.limit_level = Some(level);
        self
    }

    /// Move the stop-loss level.
    pub fn stop_level(mut self, level: Decimal) -> Self {
        self.stop_level = Some(level);
        self
    }

    /// Make the stop trail `distance` points behind in steps of `increment`.
    pub fn trailing_stop(mut self, distance: Decimal, increment: Decimal) -> Self {
        self.trailing = Some((distance, increment));
        self
    }

    /// The position being amended.
    pub fn deal_id(&self) -> &DealId {
        &self.deal_id
    }

    /// Build the request, validating all fields.
    pub fn build(self) -> Result<UpdatePositionRequest> {
        if self.market_status.is_closed() {
            return Err(Error::InvalidInput(
                "Cannot update position on CLOSED market".to_string(),
            ));
        }
        if self.limit_level.is_none() && self.stop_level.is_none() && self.trailing.is_none() {
            return Err(Error::InvalidInput(
                "Update must change the limit level, stop level or trailing stop".to_string(),
            ));
        }
        let stop_level = self.stop_level.or(self.current_stop);
        if self.trailing.is_some() && stop_level.is_none() {
            return Err(Error::InvalidInput(
                "Trailing stops need a stop level".to_string(),
            ));
        }

        Ok(UpdatePositionRequest {
            limit_level: self.limit_level.or(self.current_limit),
            stop_level,
            trailing_stop: self.trailing.is_some(),
            trailing_stop_distance: self.trailing.map(|(distance, _)| distance),
            trailing_stop_increment: self.trailing.map(|(_, increment)| increment),
        })
    }
}

fn exactly_one(
    a_name: &str,
    a: Option<Decimal>,
    b_name: &str,
    b: Option<Decimal>,
) -> Result<()> {
    match (a, b) {
        (Some(_), Some(_)) => Err(Error::InvalidInput(format!(
            "Only one of {} or {} can be set",
            a_name, b_name
        ))),
        (None, None) => Err(Error::InvalidInput(format!(
            "One of {} or {} must be set",
            a_name, b_name
        ))),
        _ => Ok(()),
    }
}
