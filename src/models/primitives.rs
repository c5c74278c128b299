//! Primitive types and newtypes for type-safe API interactions.
//!
//! IG identifies almost everything with opaque strings. These wrappers keep
//! an epic from being passed where a deal id is expected.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            #[doc = concat!("Create a new `", stringify!($name), "`.")]
            pub fn new(s: impl Into<String>) -> Self {
                Self(s.into())
            }

            /// Get the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}

string_id! {
    /// An IG account identifier (e.g. `Z3JYYT`).
    ///
    /// # Example
    ///
    /// ```
    /// use ig_rest_rs::AccountId;
    ///
    /// let account = AccountId::new("Z3JYYT");
    /// println!("Account: {}", account);
    /// ```
    AccountId
}

string_id! {
    /// An instrument epic (e.g. `CS.D.EURUSD.MINI.IP`).
    ///
    /// # Example
    ///
    /// ```
    /// use ig_rest_rs::Epic;
    ///
    /// let epic = Epic::new("CS.D.EURUSD.MINI.IP");
    /// assert_eq!(epic.as_str(), "CS.D.EURUSD.MINI.IP");
    /// ```
    Epic
}

string_id! {
    /// Permanent identifier of an open position or working order.
    DealId
}

string_id! {
    /// Caller-chosen or IG-issued reference for a deal submission.
    DealReference
}

string_id! {
    /// Watchlist identifier.
    WatchlistId
}

/// Environment configuration for the IG API.
///
/// Determines which gateway to use - demo or live.
///
/// # Example
///
/// ```
/// use ig_rest_rs::Environment;
///
/// let env = Environment::Demo;
/// println!("API URL: {}", env.api_base_url());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    /// Demo environment with simulated funds.
    #[default]
    Demo,
    /// Live environment - real trading with real money.
    Live,
}

impl Environment {
    /// Get the base URL for REST API requests.
    pub fn api_base_url(&self) -> &'static str {
        match self {
            Environment::Demo => "https://demo-api.ig.com/gateway/deal",
            Environment::Live => "https://api.ig.com/gateway/deal",
        }
    }

    /// Returns `true` if this is the live environment.
    pub fn is_live(&self) -> bool {
        matches!(self, Environment::Live)
    }

    /// Returns `true` if this is the demo environment.
    pub fn is_demo(&self) -> bool {
        matches!(self, Environment::Demo)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Demo => write!(f, "demo"),
            Environment::Live => write!(f, "live"),
        }
    }
}

impl std::str::FromStr for Environment {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "demo" => Ok(Environment::Demo),
            "live" | "prod" | "production" => Ok(Environment::Live),
            other => Err(crate::Error::Config(format!(
                "Unknown environment '{}'. Expected 'demo' or 'live'",
                other
            ))),
        }
    }
}
