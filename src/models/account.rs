//! Account models.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::enums::AccountType;
use super::primitives::AccountId;

/// One trading account of the logged-in client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Account identifier
    pub account_id: AccountId,
    /// Name shown in the IG dashboard
    pub account_name: String,
    /// User-defined alias
    #[serde(default)]
    pub account_alias: Option<String>,
    /// Account status, e.g. `ENABLED`
    #[serde(default)]
    pub status: Option<String>,
    /// CFD, spread bet or physical
    pub account_type: AccountType,
    /// Whether this is the preferred (default) account
    #[serde(default)]
    pub preferred: bool,
    /// Monetary summary
    #[serde(default)]
    pub balance: Option<AccountBalance>,
    /// Base currency ISO code
    #[serde(default)]
    pub currency: Option<String>,
    /// Whether funds can be transferred out
    #[serde(default)]
    pub can_transfer_from: bool,
    /// Whether funds can be transferred in
    #[serde(default)]
    pub can_transfer_to: bool,
}

/// Monetary summary of an account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountBalance {
    /// Balance excluding open position P/L
    pub balance: Decimal,
    /// Margin deposited for open positions
    pub deposit: Decimal,
    /// Running profit and loss
    pub profit_loss: Decimal,
    /// Funds available for new positions
    pub available: Decimal,
}
