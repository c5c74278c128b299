//! Working orders service.

use std::sync::Arc;

use crate::client::{ClientInner, Endpoint, Request};
use crate::models::WorkingOrder;
use crate::Result;

/// Service for pending entry orders.
pub struct WorkingOrdersService {
    inner: Arc<ClientInner>,
}

impl WorkingOrdersService {
    pub(crate) fn new(inner: Arc<ClientInner>) -> Self {
        Self { inner }
    }

    /// List all working orders of the active account.
    pub async fn list(&self) -> Result<Vec<WorkingOrder>> {
        #[derive(serde::Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Response {
            #[serde(default)]
            working_orders: Vec<WorkingOrder>,
        }

        let response: Response = self
            .inner
            .fetch(&Request::new(Endpoint::WORKING_ORDERS))
            .await?;
        Ok(response.working_orders)
    }
}
