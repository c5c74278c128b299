//! Data models for the IG REST API.
//!
//! Models are organized by domain:
//!
//! - [`primitives`] - Identifier newtypes like `Epic`, `DealId` and the `Environment`
//! - [`enums`] - Directions, resolutions, market states, etc.
//! - [`account`] - Accounts and balances
//! - [`market`] - Market summaries, instrument details and dealing rules
//! - [`price`] - Historical price candles and the data allowance
//! - [`position`] - Open positions, working orders and deal confirmations
//! - [`order`] - Builders for opening, closing and amending positions
//! - [`watchlist`] - Watchlists
//! - [`history`] - Activity and transaction history

pub mod primitives;
pub mod enums;
pub mod account;
pub mod market;
pub mod price;
pub mod position;
pub mod order;
pub mod watchlist;
pub mod history;

// Re-export commonly used types
pub use primitives::*;
pub use enums::*;
pub use account::*;
pub use market::*;
pub use price::*;
pub use position::*;
pub use order::*;
pub use watchlist::{CreatedWatchlist, Watchlist};
pub use history::{
    Activity, ActivityMetadata, ActivityPage, ActivityQuery, Paging, Transaction,
    TransactionQuery, TransactionType,
};
