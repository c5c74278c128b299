//! # ig-rest-rs
//!
//! An async Rust client for the IG Markets REST trading API.
//!
//! At its core is a resilient request pipeline: every call runs through a
//! session manager that logs in and renews tokens on demand, a per-category
//! token-bucket rate limiter, and a dispatcher that classifies failures and
//! retries the transient ones. A thin service layer on top exposes IG's
//! resources as typed calls.
//!
//! ## Features
//!
//! - **Authentication**: `CST`/`X-SECURITY-TOKEN` (v2) and OAuth (v3) logins,
//!   single-flight renewal and a one-shot re-login on rejected sessions
//! - **Rate limiting**: client-side budgets for trading and non-trading requests
//! - **Retries**: bounded exponential backoff honouring `Retry-After`
//! - **Services**: accounts, markets, prices, positions, working orders,
//!   watchlists and history
//! - **Order builders**: deal requests validated locally before they are sent
//! - **Type Safety**: Strongly-typed models with `rust_decimal` prices
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ig_rest_rs::{ClientConfig, Credentials, Environment, IgClient};
//!
//! #[tokio::main]
//! async fn main() -> ig_rest_rs::Result<()> {
//!     let credentials = Credentials::new("api-key", "username", "password", Environment::Demo);
//!     let client = IgClient::connect(credentials, ClientConfig::default()).await?;
//!
//!     let accounts = client.accounts().list().await?;
//!     println!("Found {} accounts", accounts.len());
//!
//!     for position in client.positions().list().await? {
//!         println!(
//!             "{} {:?} {} @ {}",
//!             position.market.epic,
//!             position.position.direction,
//!             position.position.size,
//!             position.position.level
//!         );
//!     }
//!
//!     client.logout().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Opening a Position
//!
//! ```rust,no_run
//! use ig_rest_rs::{ClientConfig, Credentials, IgClient};
//! use ig_rest_rs::models::{Direction, OpenPositionBuilder};
//! use rust_decimal_macros::dec;
//!
//! #[tokio::main]
//! async fn main() -> ig_rest_rs::Result<()> {
//!     let client = IgClient::new(Credentials::from_env()?, ClientConfig::default())?;
//!
//!     let market = client.markets().search_first("EUR/USD").await?;
//!     let rules = client.markets().get(&market.epic).await?.dealing_rules;
//!
//!     let order = OpenPositionBuilder::new(&market, Direction::Buy, dec!(1))
//!         .stop_distance(dec!(20))
//!         .limit_distance(dec!(40))
//!         .dealing_rules(&rules)
//!         .build()?;
//!
//!     let reference = client.positions().open(&order).await?;
//!     let confirmation = client.positions().confirm(&reference).await?;
//!     println!("Deal {:?}: {:?}", confirmation.deal_id, confirmation.deal_status);
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

pub mod api;
pub mod auth;
pub mod client;
pub mod error;
pub mod models;

// Re-export primary types at crate root for convenience
pub use error::{Error, ErrorKind, Result};
pub use models::{AccountId, DealId, DealReference, Environment, Epic, WatchlistId};
pub use client::{
    BucketConfig, ClientConfig, IgClient, RateLimitConfig, RateLimiter, RetryPolicy,
};
pub use auth::{AuthMode, Credentials, SessionInfo, SessionManager};

/// Prelude module for convenient imports.
///
/// ```rust
/// use ig_rest_rs::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{Error, ErrorKind, Result};
    pub use crate::models::{
        // Primitives
        AccountId, DealId, DealReference, Environment, Epic, WatchlistId,
        // Enums
        Direction, MarketStatus, OrderType, Resolution, TimeInForce,
        // Models
        Account, DealConfirmation, MarketDetails, MarketSummary, OpenPosition,
        PriceHistory, Watchlist, WorkingOrder,
        // Deal requests
        ClosePositionBuilder, OpenPositionBuilder, UpdatePositionBuilder,
    };
    pub use crate::client::{ClientConfig, IgClient, RateLimitConfig, RetryPolicy};
    pub use crate::auth::{AuthMode, Credentials};
}
