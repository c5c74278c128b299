//! Account activity and transaction history.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::primitives::{DealId, Epic};

/// Timestamp format IG expects in history queries.
pub(crate) const QUERY_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// One account activity item.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    /// Activity time
    pub date: String,
    /// Instrument epic
    #[serde(default)]
    pub epic: Option<Epic>,
    /// Period, e.g. `DFB` or `02-SEP-11`
    #[serde(default)]
    pub period: Option<String>,
    /// Deal identifier
    #[serde(default)]
    pub deal_id: Option<DealId>,
    /// Channel that triggered it, e.g. `WEB`, `PUBLIC_WEB_API`
    #[serde(default)]
    pub channel: Option<String>,
    /// Activity type, e.g. `POSITION`, `WORKING_ORDER`
    #[serde(rename = "type")]
    pub activity_type: String,
    /// `ACCEPTED`, `REJECTED` or `UNKNOWN`
    #[serde(default)]
    pub status: Option<String>,
    /// Readable description
    #[serde(default)]
    pub description: Option<String>,
    /// Extra detail, present for detailed queries
    #[serde(default)]
    pub details: Option<serde_json::Value>,
}

/// One page of `GET /history/activity`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityPage {
    /// Activities on this page
    #[serde(default)]
    pub activities: Vec<Activity>,
    /// Paging metadata
    #[serde(default)]
    pub metadata: Option<ActivityMetadata>,
}

impl ActivityPage {
    /// Link to the next page, if there is one.
    pub fn next_link(&self) -> Option<&str> {
        self.metadata
            .as_ref()?
            .paging
            .as_ref()?
            .next
            .as_deref()
            .filter(|next| !next.is_empty())
    }
}

/// Activity paging metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityMetadata {
    /// Paging information
    #[serde(default)]
    pub paging: Option<Paging>,
}

/// Cursor-style paging information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paging {
    /// Items on this page
    #[serde(default)]
    pub size: Option<u32>,
    /// Relative link to the next page
    #[serde(default)]
    pub next: Option<String>,
}

/// Filter for activity history.
///
/// # Example
///
/// ```
/// use chrono::NaiveDate;
/// use ig_rest_rs::models::ActivityQuery;
///
/// let from = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
/// let query = ActivityQuery::since(from).detailed(true).page_size(100);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityQuery {
    /// Start of the range
    pub from: NaiveDateTime,
    /// End of the range (defaults to now on IG's side)
    pub to: Option<NaiveDateTime>,
    /// Include the `details` object
    pub detailed: bool,
    /// Restrict to one deal
    pub deal_id: Option<DealId>,
    /// FIQL filter, e.g. `channel==SYSTEM;type==POSITION`
    pub filter: Option<String>,
    /// Items per page
    pub page_size: Option<u32>,
}

impl ActivityQuery {
    /// Activity from `from` until now.
    pub fn since(from: NaiveDateTime) -> Self {
        Self {
            from,
            to: None,
            detailed: false,
            deal_id: None,
            filter: None,
            page_size: None,
        }
    }

    /// Set the end of the range.
    pub fn until(mut self, to: NaiveDateTime) -> Self {
        self.to = Some(to);
        self
    }

    /// Request detailed activity.
    pub fn detailed(mut self, detailed: bool) -> Self {
        self.detailed = detailed;
        self
    }

    /// Restrict to one deal.
    pub fn deal_id(mut self, deal_id: impl Into<DealId>) -> Self {
        self.deal_id = Some(deal_id.into());
        self
    }

    /// Apply a FIQL filter.
    pub fn filter(mut self, fiql: impl Into<String>) -> Self {
        self.filter = Some(fiql.into());
        self
    }

    /// Set the page size.
    pub fn page_size(mut self, size: u32) -> Self {
        self.page_size = Some(size);
        self
    }

    pub(crate) fn to_query(&self) -> Vec<(String, String)> {
        let mut query = vec![
            ("from".to_string(), self.from.format(QUERY_TIME_FORMAT).to_string()),
            ("detailed".to_string(), self.detailed.to_string()),
        ];
        if let Some(to) = self.to {
            query.push(("to".to_string(), to.format(QUERY_TIME_FORMAT).to_string()));
        }
        if let Some(ref deal_id) = self.deal_id {
            query.push(("dealId".to_string(), deal_id.to_string()));
        }
        if let Some(ref filter) = self.filter {
            query.push(("filter".to_string(), filter.clone()));
        }
        if let Some(size) = self.page_size {
            query.push(("pageSize".to_string(), size.to_string()));
        }
        query
    }
}

/// One account transaction.
///
/// IG formats levels, sizes and P/L as display strings (e.g. `"+2.5"`,
/// `"£12.50"`); they are kept verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Local date
    pub date: String,
    /// UTC date
    #[serde(default)]
    pub date_utc: Option<String>,
    /// UTC date the position was opened
    #[serde(default)]
    pub open_date_utc: Option<String>,
    /// Instrument name
    pub instrument_name: String,
    /// Period
    #[serde(default)]
    pub period: Option<String>,
    /// Profit and loss
    #[serde(default)]
    pub profit_and_loss: Option<String>,
    /// Transaction type, e.g. `DEAL`, `DEPO`, `WITH`
    pub transaction_type: String,
    /// Reference
    #[serde(default)]
    pub reference: Option<String>,
    /// Opening level
    #[serde(default)]
    pub open_level: Option<String>,
    /// Closing level
    #[serde(default)]
    pub close_level: Option<String>,
    /// Signed size (`+` buy, `-` sell)
    #[serde(default)]
    pub size: Option<String>,
    /// Currency
    #[serde(default)]
    pub currency: Option<String>,
    /// Whether this was a cash transaction
    #[serde(default)]
    pub cash_transaction: bool,
}

/// Transaction type filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    /// Everything
    #[default]
    All,
    /// Deals only
    AllDeal,
    /// Deposits
    Deposit,
    /// Withdrawals
    Withdrawal,
}

impl TransactionType {
    fn as_str(&self) -> &'static str {
        match self {
            TransactionType::All => "ALL",
            TransactionType::AllDeal => "ALL_DEAL",
            TransactionType::Deposit => "DEPOSIT",
            TransactionType::Withdrawal => "WITHDRAWAL",
        }
    }
}

/// Filter for transaction history.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionQuery {
    /// Start of the range
    pub from: NaiveDateTime,
    /// End of the range
    pub to: Option<NaiveDateTime>,
    /// Transaction type filter
    pub transaction_type: TransactionType,
    /// Items per page (0 disables paging on IG's side)
    pub page_size: Option<u32>,
}

impl TransactionQuery {
    /// Transactions from `from` until now.
    pub fn since(from: NaiveDateTime) -> Self {
        Self {
            from,
            to: None,
            transaction_type: TransactionType::All,
            page_size: None,
        }
    }

    /// Set the end of the range.
    pub fn until(mut self, to: NaiveDateTime) -> Self {
        self.to = Some(to);
        self
    }

    /// Filter by type.
    pub fn transaction_type(mut self, transaction_type: TransactionType) -> Self {
        self.transaction_type = transaction_type;
        self
    }

    /// Set the page size.
    pub fn page_size(mut self, size: u32) -> Self {
        self.page_size = Some(size);
        self
    }

    pub(crate) fn to_query(&self) -> Vec<(String, String)> {
        let mut query = vec![
            ("from".to_string(), self.from.format(QUERY_TIME_FORMAT).to_string()),
            ("type".to_string(), self.transaction_type.as_str().to_string()),
        ];
        if let Some(to) = self.to {
            query.push(("to".to_string(), to.format(QUERY_TIME_FORMAT).to_string()));
        }
        if let Some(size) = self.page_size {
            query.push(("pageSize".to_string(), size.to_string()));
        }
        query
    }
}
