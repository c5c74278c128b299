//! Authentication and session management for the IG API.
//!
//! IG offers two login flows, both started with `POST /session`:
//!
//! 1. **Security token** (`Version: 2`, the default) - the response carries
//!    `CST` and `X-SECURITY-TOKEN` headers valid for several hours.
//! 2. **OAuth** (`Version: 3`) - the response carries a short-lived access
//!    token and a refresh token. The [`SessionManager`] refreshes it before
//!    it expires and falls back to a full login if the refresh fails.
//!
//! ```no_run
//! use ig_rest_rs::{AuthMode, ClientConfig, Credentials, Environment, IgClient};
//!
//! # async fn example() -> ig_rest_rs::Result<()> {
//! let credentials = Credentials::new("api-key", "username", "password", Environment::Demo)
//!     .with_auth_mode(AuthMode::OAuth);
//!
//! let client = IgClient::new(credentials, ClientConfig::default())?;
//! let session = client.session().login().await?;
//! println!("Logged into {}", session.account_id);
//! # Ok(())
//! # }
//! ```

mod credentials;
mod session;

pub use credentials::{AuthMode, Credentials};
pub use session::{AuthHeaders, SessionInfo, SessionManager};
