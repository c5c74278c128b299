//! Activity and transaction history service.

use std::sync::Arc;

use crate::client::{ClientInner, Endpoint, Page, PaginatedStream, Request};
use crate::models::{Activity, ActivityPage, ActivityQuery, Transaction, TransactionQuery};
use crate::Result;

/// Service for account history.
///
/// # Example
///
/// ```no_run
/// use chrono::NaiveDate;
/// use ig_rest_rs::models::{TransactionQuery, TransactionType};
///
/// # async fn example(client: ig_rest_rs::IgClient) -> ig_rest_rs::Result<()> {
/// let from = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
/// let deposits = client
///     .history()
///     .transactions(&TransactionQuery::since(from).transaction_type(TransactionType::Deposit))
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct HistoryService {
    inner: Arc<ClientInner>,
}

impl HistoryService {
    pub(crate) fn new(inner: Arc<ClientInner>) -> Self {
        Self { inner }
    }

    /// First page of account activity matching `query`.
    pub async fn activity(&self, query: &ActivityQuery) -> Result<ActivityPage> {
        self.inner.fetch(&activity_request(query)).await
    }

    /// All account activity matching `query`, fetched page by page as the
    /// stream is polled.
    pub fn activity_stream(&self, query: ActivityQuery) -> PaginatedStream<Activity> {
        let inner = self.inner.clone();

        PaginatedStream::new(activity_request(&query), move |request: Request| {
            Box::pin(fetch_activity_page(inner.clone(), request))
        })
    }

    /// Transactions matching `query`.
    pub async fn transactions(&self, query: &TransactionQuery) -> Result<Vec<Transaction>> {
        #[derive(serde::Deserialize)]
        struct Response {
            #[serde(default)]
            transactions: Vec<Transaction>,
        }

        let mut request = Request::new(Endpoint::TRANSACTIONS);
        for (name, value) in query.to_query() {
            request = request.query(name, value);
        }
        let response: Response = self.inner.fetch(&request).await?;
        Ok(response.transactions)
    }
}

async fn fetch_activity_page(inner: Arc<ClientInner>, request: Request) -> Result<Page<Activity>> {
    let page: ActivityPage = inner.fetch(&request).await?;
    let next = page.next_link().map(next_page_request);
    Ok(Page {
        items: page.activities,
        next,
    })
}

fn activity_request(query: &ActivityQuery) -> Request {
    query
        .to_query()
        .into_iter()
        .fold(Request::new(Endpoint::ACTIVITY), |request, (name, value)| {
            request.query(name, value)
        })
}

/// Turn IG's relative next-page link into a request.
///
/// The link repeats the original filter plus a cursor. Its `version`
/// parameter is dropped since the version travels as a header.
fn next_page_request(link: &str) -> Request {
    let query = link.split_once('?').map_or("", |(_, query)| query);
    url::form_urlencoded::parse(query.as_bytes())
        .filter(|(name, _)| name != "version")
        .fold(Request::new(Endpoint::ACTIVITY), |request, (name, value)| {
            request.query(name.into_owned(), value)
        })
}
