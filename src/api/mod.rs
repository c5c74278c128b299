//! API service modules for IG endpoints.
//!
//! Each service covers one resource family and is obtained from an
//! [`IgClient`](crate::IgClient) accessor. Services only build requests and
//! decode responses; sessions, rate limits and retries are handled by the
//! client's dispatcher.

mod accounts;
mod history;
mod markets;
mod positions;
mod prices;
mod watchlists;
mod working_orders;

pub use accounts::AccountsService;
pub use history::HistoryService;
pub use markets::MarketsService;
pub use positions::PositionsService;
pub use prices::PricesService;
pub use watchlists::WatchlistsService;
pub use working_orders::WorkingOrdersService;
