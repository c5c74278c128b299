//! API credentials for IG authentication.

use std::env;
use std::fmt;

use secrecy::{ExposeSecret, SecretString};

use crate::{Environment, Error, Result};

/// How the client authenticates against `/session`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthMode {
    /// `Version: 2` login returning `CST` and `X-SECURITY-TOKEN` headers.
    #[default]
    SecurityToken,
    /// `Version: 3` login returning a short-lived OAuth access/refresh pair.
    OAuth,
}

impl std::str::FromStr for AuthMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cst" | "security-token" | "v2" => Ok(AuthMode::SecurityToken),
            "oauth" | "v3" => Ok(AuthMode::OAuth),
            other => Err(Error::Config(format!(
                "Unknown auth mode '{}'. Expected 'cst' or 'oauth'",
                other
            ))),
        }
    }
}

/// Immutable login credentials.
///
/// Secrets are held as [`SecretString`] and never appear in `Debug` output.
///
/// # Example
///
/// ```
/// use ig_rest_rs::{Credentials, Environment};
///
/// let credentials = Credentials::new("api-key", "username", "password", Environment::Demo);
/// assert_eq!(credentials.identifier(), "username");
/// ```
#[derive(Clone)]
pub struct Credentials {
    api_key: SecretString,
    identifier: String,
    password: SecretString,
    environment: Environment,
    auth_mode: AuthMode,
}

impl Credentials {
    /// Create credentials for the default (`CST`/security token) login flow.
    pub fn new(
        api_key: impl Into<String>,
        identifier: impl Into<String>,
        password: impl Into<String>,
        environment: Environment,
    ) -> Self {
        Self {
            api_key: SecretString::from(api_key.into()),
            identifier: identifier.into(),
            password: SecretString::from(password.into()),
            environment,
            auth_mode: AuthMode::default(),
        }
    }

    /// Switch the login flow.
    pub fn with_auth_mode(mut self, mode: AuthMode) -> Self {
        self.auth_mode = mode;
        self
    }

    /// Build credentials from `IG_API_KEY`, `IG_IDENTIFIER`, `IG_PASSWORD`,
    /// and the optional `IG_ENVIRONMENT` (`demo`/`live`) and
    /// `IG_AUTH_MODE` (`cst`/`oauth`).
    pub fn from_env() -> Result<Self> {
        let api_key = required_var("IG_API_KEY")?;
        let identifier = required_var("IG_IDENTIFIER")?;
        let password = required_var("IG_PASSWORD")?;

        let environment = match env::var("IG_ENVIRONMENT") {
            Ok(value) => value.parse()?,
            Err(_) => Environment::Demo,
        };
        let auth_mode = match env::var("IG_AUTH_MODE") {
            Ok(value) => value.parse()?,
            Err(_) => AuthMode::SecurityToken,
        };

        Ok(Self::new(api_key, identifier, password, environment).with_auth_mode(auth_mode))
    }

    /// The login identifier (username).
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Target environment.
    pub fn environment(&self) -> Environment {
        self.environment
    }

    /// Login flow in use.
    pub fn auth_mode(&self) -> AuthMode {
        self.auth_mode
    }

    pub(crate) fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }

    pub(crate) fn password(&self) -> &str {
        self.password.expose_secret()
    }
}

fn required_var(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("{} must be set", name)))
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"[REDACTED]")
            .field("identifier", &self.identifier)
            .field("password", &"[REDACTED]")
            .field("environment", &self.environment)
            .field("auth_mode", &self.auth_mode)
            .finish()
    }
}
