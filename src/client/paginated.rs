//! Paginated stream for lazy iteration over API results.
//!
//! IG pages history results with a cursor: each page carries a relative
//! link to the next one. [`PaginatedStream`] follows those links on demand
//! and yields the items one by one.

use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures_util::Stream;

use super::endpoint::Request;
use crate::Result;

/// One fetched page.
#[derive(Debug)]
pub struct Page<T> {
    /// The items in this page.
    pub items: Vec<T>,
    /// Request for the following page, `None` on the last page.
    pub next: Option<Request>,
}

/// Type alias for a boxed future used internally.
type BoxFuture<'a, T> = Pin<Box<dyn std::future::Future<Output = T> + Send + 'a>>;

type FetchPage<T> = Box<dyn Fn(Request) -> BoxFuture<'static, Result<Page<T>>> + Send + Sync>;

/// A stream that lazily fetches pages from a cursor-paged endpoint.
///
/// The stream ends after the last page, or after yielding the first error.
///
/// # Example
///
/// ```no_run
/// use chrono::NaiveDate;
/// use futures_util::StreamExt;
/// use ig_rest_rs::models::ActivityQuery;
///
/// # async fn example(client: ig_rest_rs::IgClient) -> ig_rest_rs::Result<()> {
/// let from = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
/// let mut stream = client.history().activity_stream(ActivityQuery::since(from).page_size(50));
///
/// while let Some(result) = stream.next().await {
///     let activity = result?;
///     println!("{} {}", activity.date, activity.activity_type);
/// }
/// # Ok(())
/// # }
/// ```
pub struct PaginatedStream<T> {
    /// Function to fetch the page a request points at.
    fetch_page: FetchPage<T>,
    /// Items of the current page not yet yielded.
    current_items: VecDeque<T>,
    /// Request for the next page, None if exhausted.
    next_request: Option<Request>,
    /// Current in-flight fetch future.
    pending_fetch: Option<BoxFuture<'static, Result<Page<T>>>>,
}

impl<T> PaginatedStream<T>
where
    T: Send + 'static,
{
    /// Create a stream starting at `first`.
    pub fn new<F>(first: Request, fetch_page: F) -> Self
    where
        F: Fn(Request) -> BoxFuture<'static, Result<Page<T>>> + Send + Sync + 'static,
    {
        Self {
            fetch_page: Box::new(fetch_page),
            current_items: VecDeque::new(),
            next_request: Some(first),
            pending_fetch: None,
        }
    }
}

impl<T> Stream for PaginatedStream<T> {
    type Item = Result<T>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = &mut *self;

        loop {
            if let Some(item) = this.current_items.pop_front() {
                return Poll::Ready(Some(Ok(item)));
            }

            if let Some(ref mut fut) = this.pending_fetch {
                match fut.as_mut().poll(cx) {
                    Poll::Ready(Ok(page)) => {
                        this.pending_fetch = None;
                        this.current_items = page.items.into();
                        this.next_request = page.next;

                        if this.current_items.is_empty() && this.next_request.is_none() {
                            return Poll::Ready(None);
                        }
                        continue;
                    }
                    Poll::Ready(Err(e)) => {
                        this.pending_fetch = None;
                        this.next_request = None; // Stop on error
                        return Poll::Ready(Some(Err(e)));
                    }
                    Poll::Pending => {
                        return Poll::Pending;
                    }
                }
            }

            match this.next_request.take() {
                Some(request) => {
                    this.pending_fetch = Some((this.fetch_page)(request));
                }
                None => return Poll::Ready(None),
            }
        }
    }
}

impl<T> Unpin for PaginatedStream<T> {}

impl<T> std::fmt::Debug for PaginatedStream<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaginatedStream")
            .field("buffered", &self.current_items.len())
            .field("next_request", &self.next_request)
            .field("fetching", &self.pending_fetch.is_some())
            .finish()
    }
}
