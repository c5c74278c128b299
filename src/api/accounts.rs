//! Accounts service.

use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::auth::SessionInfo;
use crate::client::{ClientInner, Endpoint, Request};
use crate::models::{Account, AccountId};
use crate::{Error, Result};

/// Service for account-related operations.
///
/// # Example
///
/// ```no_run
/// # async fn example(client: ig_rest_rs::IgClient) -> ig_rest_rs::Result<()> {
/// let accounts = client.accounts().list().await?;
/// for account in &accounts {
///     println!("{}: {}", account.account_id, account.account_name);
/// }
/// # Ok(())
/// # }
/// ```
pub struct AccountsService {
    inner: Arc<ClientInner>,
}

impl AccountsService {
    pub(crate) fn new(inner: Arc<ClientInner>) -> Self {
        Self { inner }
    }

    /// The active session, logging in first if there is none.
    pub async fn session(&self) -> Result<SessionInfo> {
        self.inner.session.current_headers().await?;
        self.inner
            .session
            .session_info()
            .await
            .ok_or_else(|| Error::Authentication {
                reason: "session was cleared".to_string(),
            })
    }

    /// List all accounts of the logged-in client.
    pub async fn list(&self) -> Result<Vec<Account>> {
        #[derive(serde::Deserialize)]
        struct Response {
            accounts: Vec<Account>,
        }

        let response: Response = self.inner.fetch(&Request::new(Endpoint::ACCOUNTS)).await?;
        Ok(response.accounts)
    }

    /// Make `account_id` the active and default account.
    ///
    /// The current session is dropped afterwards; the next request logs in
    /// again and lands on the new account.
    pub async fn switch(&self, account_id: &AccountId) -> Result<()> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Body<'a> {
            account_id: &'a AccountId,
            default_account: bool,
        }

        let request = Request::new(Endpoint::SWITCH_ACCOUNT).json(&Body {
            account_id,
            default_account: true,
        })?;
        self.inner.send(&request).await?;
        self.inner.session.invalidate().await;

        info!(account = %account_id, "switched active account");
        Ok(())
    }
}
