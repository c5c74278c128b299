//! Endpoint descriptors and the request/response types exchanged with the
//! dispatcher.
//!
//! Every IG operation is described once by a static [`Endpoint`]. A
//! [`Request`] fills in the path parameters, query and body for one call,
//! and a successful call yields a read-only [`Response`].

use std::fmt;

use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::{Error, Result};

/// Rate-limit class of an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Deal placement, amendment and closure
    Trading,
    /// Everything else (accounts, markets, prices, history, watchlists)
    NonTrading,
}

impl Category {
    /// All categories, in a stable order.
    pub const ALL: [Category; 2] = [Category::Trading, Category::NonTrading];
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Trading => write!(f, "trading"),
            Category::NonTrading => write!(f, "non-trading"),
        }
    }
}

/// HTTP methods used by the IG API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    /// GET
    Get,
    /// POST
    Post,
    /// PUT
    Put,
    /// DELETE
    Delete,
}

impl HttpMethod {
    pub(crate) fn as_reqwest(&self) -> reqwest::Method {
        match self {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

/// Static description of one IG operation.
///
/// `path` is a template relative to the gateway URL; `{name}` segments are
/// filled from [`Request::path_param`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoint {
    /// Path template, e.g. `/positions/otc/{dealId}`
    pub path: &'static str,
    /// HTTP method
    pub method: HttpMethod,
    /// Value of the `Version` header
    pub version: u8,
    /// Rate-limit category
    pub category: Category,
    /// Whether session tokens must be attached
    pub requires_auth: bool,
}

impl Endpoint {
    const fn new(
        path: &'static str,
        method: HttpMethod,
        version: u8,
        category: Category,
    ) -> Self {
        Self {
            path,
            method,
            version,
            category,
            requires_auth: true,
        }
    }

    // Session
    pub(crate) const LOGIN_V2: Endpoint = Endpoint {
        requires_auth: false,
        ..Endpoint::new("/session", HttpMethod::Post, 2, Category::NonTrading)
    };
    pub(crate) const LOGIN_V3: Endpoint = Endpoint {
        requires_auth: false,
        ..Endpoint::new("/session", HttpMethod::Post, 3, Category::NonTrading)
    };
    pub(crate) const REFRESH_TOKEN: Endpoint = Endpoint {
        requires_auth: false,
        ..Endpoint::new("/session/refresh-token", HttpMethod::Post, 1, Category::NonTrading)
    };
    pub(crate) const LOGOUT: Endpoint =
        Endpoint::new("/session", HttpMethod::Delete, 1, Category::NonTrading);
    /// Switch the active account.
    pub const SWITCH_ACCOUNT: Endpoint =
        Endpoint::new("/session", HttpMethod::Put, 1, Category::NonTrading);

    // Accounts
    /// List accounts.
    pub const ACCOUNTS: Endpoint =
        Endpoint::new("/accounts", HttpMethod::Get, 1, Category::NonTrading);

    // Markets and prices
    /// Search markets by term.
    pub const MARKET_SEARCH: Endpoint =
        Endpoint::new("/markets", HttpMethod::Get, 1, Category::NonTrading);
    /// Market details for one epic.
    pub const MARKET: Endpoint =
        Endpoint::new("/markets/{epic}", HttpMethod::Get, 3, Category::NonTrading);
    /// Historical prices for a date range.
    pub const PRICES: Endpoint = Endpoint::new(
        "/prices/{epic}/{resolution}/{from}/{to}",
        HttpMethod::Get,
        2,
        Category::NonTrading,
    );

    // Positions and deals
    /// List open positions.
    pub const POSITIONS: Endpoint =
        Endpoint::new("/positions", HttpMethod::Get, 2, Category::NonTrading);
    /// One open position.
    pub const POSITION: Endpoint =
        Endpoint::new("/positions/{dealId}", HttpMethod::Get, 2, Category::NonTrading);
    /// Open an OTC position.
    pub const OPEN_POSITION: Endpoint =
        Endpoint::new("/positions/otc", HttpMethod::Post, 2, Category::Trading);
    /// Close (fully or partially) an OTC position.
    pub const CLOSE_POSITION: Endpoint =
        Endpoint::new("/positions/otc", HttpMethod::Delete, 1, Category::Trading);
    /// Amend stops/limits of an OTC position.
    pub const UPDATE_POSITION: Endpoint =
        Endpoint::new("/positions/otc/{dealId}", HttpMethod::Put, 2, Category::Trading);
    /// Deal confirmation.
    pub const CONFIRM: Endpoint =
        Endpoint::new("/confirms/{dealReference}", HttpMethod::Get, 1, Category::NonTrading);
    /// List working orders.
    pub const WORKING_ORDERS: Endpoint =
        Endpoint::new("/workingorders", HttpMethod::Get, 2, Category::NonTrading);

    // Watchlists
    /// List watchlists.
    pub const WATCHLISTS: Endpoint =
        Endpoint::new("/watchlists", HttpMethod::Get, 1, Category::NonTrading);
    /// Create a watchlist.
    pub const CREATE_WATCHLIST: Endpoint =
        Endpoint::new("/watchlists", HttpMethod::Post, 1, Category::NonTrading);
    /// Markets of one watchlist.
    pub const WATCHLIST: Endpoint =
        Endpoint::new("/watchlists/{watchlistId}", HttpMethod::Get, 1, Category::NonTrading);
    /// Delete a watchlist.
    pub const DELETE_WATCHLIST: Endpoint =
        Endpoint::new("/watchlists/{watchlistId}", HttpMethod::Delete, 1, Category::NonTrading);
    /// Add a market to a watchlist.
    pub const ADD_TO_WATCHLIST: Endpoint =
        Endpoint::new("/watchlists/{watchlistId}", HttpMethod::Put, 1, Category::NonTrading);
    /// Remove a market from a watchlist.
    pub const REMOVE_FROM_WATCHLIST: Endpoint = Endpoint::new(
        "/watchlists/{watchlistId}/{epic}",
        HttpMethod::Delete,
        1,
        Category::NonTrading,
    );

    // History
    /// Account activity.
    pub const ACTIVITY: Endpoint =
        Endpoint::new("/history/activity", HttpMethod::Get, 3, Category::NonTrading);
    /// Account transactions.
    pub const TRANSACTIONS: Endpoint =
        Endpoint::new("/history/transactions", HttpMethod::Get, 2, Category::NonTrading);
}

/// One call against an [`Endpoint`].
///
/// # Example
///
/// ```
/// use ig_rest_rs::client::{Endpoint, Request};
///
/// let request = Request::new(Endpoint::MARKET).path_param("epic", "IX.D.FTSE.DAILY.IP");
/// assert_eq!(request.path().unwrap(), "/markets/IX.D.FTSE.DAILY.IP");
/// ```
#[derive(Debug, Clone)]
pub struct Request {
    endpoint: Endpoint,
    path_params: Vec<(&'static str, String)>,
    query: Vec<(String, String)>,
    body: Option<serde_json::Value>,
}

impl Request {
    /// Start a request for `endpoint`.
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            path_params: Vec::new(),
            query: Vec::new(),
            body: None,
        }
    }

    /// Fill the `{name}` placeholder of the path template.
    pub fn path_param(mut self, name: &'static str, value: impl ToString) -> Self {
        self.path_params.push((name, value.to_string()));
        self
    }

    /// Append a query parameter.
    pub fn query(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((name.into(), value.to_string()));
        self
    }

    /// Append a query parameter when `value` is present.
    pub fn query_opt<V: ToString>(self, name: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(v) => self.query(name, v),
            None => self,
        }
    }

    /// Attach a JSON body.
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    /// The endpoint this request targets.
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Query parameters in insertion order.
    pub fn query_params(&self) -> &[(String, String)] {
        &self.query
    }

    /// The JSON body, if any.
    pub fn body(&self) -> Option<&serde_json::Value> {
        self.body.as_ref()
    }

    /// Expand the path template, URL-encoding every parameter.
    pub fn path(&self) -> Result<String> {
        let template = self.endpoint.path;
        let mut path = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(start) = rest.find('{') {
            let end = rest[start..].find('}').map(|i| start + i).ok_or_else(|| {
                Error::InvalidInput(format!("Unterminated placeholder in path '{}'", template))
            })?;
            let name = &rest[start + 1..end];
            let value = self
                .path_params
                .iter()
                .find(|(n, _)| *n == name)
                .map(|(_, v)| v)
                .ok_or_else(|| {
                    Error::InvalidInput(format!("Missing path parameter '{}'", name))
                })?;
            if value.is_empty() {
                return Err(Error::InvalidInput(format!(
                    "Path parameter '{}' must not be empty",
                    name
                )));
            }

            path.push_str(&rest[..start]);
            path.push_str(&urlencoding::encode(value));
            rest = &rest[end + 1..];
        }
        path.push_str(rest);
        Ok(path)
    }
}

/// A successful response from the IG API.
///
/// Services decode it with [`Response::json`]; it is never mutated after the
/// dispatcher hands it out.
#[derive(Debug, Clone)]
pub struct Response {
    status: u16,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl Response {
    pub(crate) fn new(status: u16, headers: HeaderMap, body: Vec<u8>) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// HTTP status code.
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Response headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// A header value, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Raw body bytes.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Body as text (lossy).
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Decode the body as JSON. An empty body decodes as `null`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        let body: &[u8] = if self.body.iter().all(u8::is_ascii_whitespace) {
            b"null"
        } else {
            &self.body
        };
        Ok(serde_json::from_slice(body)?)
    }

    /// The IG `errorCode` field, if the body has one.
    pub fn error_code(&self) -> Option<String> {
        serde_json::from_slice::<serde_json::Value>(&self.body)
            .ok()?
            .get("errorCode")?
            .as_str()
            .map(String::from)
    }
}
