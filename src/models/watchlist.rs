//! Watchlist models.

use serde::{Deserialize, Serialize};

use super::enums::OperationStatus;
use super::primitives::WatchlistId;

/// A watchlist of the active account.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Watchlist {
    /// Watchlist identifier
    pub id: WatchlistId,
    /// Watchlist name
    pub name: String,
    /// Whether markets can be added or removed
    #[serde(default)]
    pub editable: bool,
    /// Whether the watchlist can be deleted (IG spells it `deleteable`)
    #[serde(default, rename = "deleteable")]
    pub deletable: bool,
    /// Whether this is a predefined system watchlist
    #[serde(default)]
    pub default_system_watchlist: bool,
}

/// Answer to a watchlist creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedWatchlist {
    /// Identifier of the new watchlist
    pub watchlist_id: WatchlistId,
    /// Whether all requested epics were added
    pub status: OperationStatus,
}

/// `{"status": ...}` answer to simple write operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct StatusResponse {
    pub status: OperationStatus,
}
