//! HTTP client and request pipeline for the IG REST API.
//!
//! [`IgClient`] is the entry point. Every service call becomes a
//! [`Request`] against a static [`Endpoint`] and goes through the
//! [`Dispatcher`], which attaches session headers, waits on the
//! [`RateLimiter`], classifies failures and retries the transient ones.
//!
//! # Example
//!
//! ```no_run
//! use ig_rest_rs::{ClientConfig, Credentials, Environment, IgClient};
//! use ig_rest_rs::client::{Endpoint, Request};
//!
//! # async fn example() -> ig_rest_rs::Result<()> {
//! let credentials = Credentials::new("api-key", "username", "password", Environment::Demo);
//! let client = IgClient::new(credentials, ClientConfig::default())?;
//!
//! // Raw access to an endpoint
//! let response = client.execute(&Request::new(Endpoint::ACCOUNTS)).await?;
//! println!("{}", response.text());
//! # Ok(())
//! # }
//! ```

pub mod classify;
mod config;
mod dispatch;
pub mod endpoint;
mod http;
pub mod paginated;
mod rate_limit;

pub use config::{BucketConfig, ClientConfig, RateLimitConfig, RetryPolicy};
pub use dispatch::Dispatcher;
pub use endpoint::{Category, Endpoint, HttpMethod, Request, Response};
pub use http::IgClient;
pub use paginated::{Page, PaginatedStream};
pub use rate_limit::RateLimiter;
pub(crate) use http::ClientInner;
