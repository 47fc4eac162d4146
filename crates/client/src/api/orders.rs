//! Order endpoints: checkout and account order history.
//!
//! Payment-gateway details live entirely on the remote side; the client
//! submits delivery details and reads back opaque order statuses.

use reqwest::Method;
use tracing::instrument;
use url::Url;

use super::types::{Order, OrderRequest, Page};
use super::{ApiClient, ApiError};

impl ApiClient {
    /// Place an order from the current server-side cart contents.
    ///
    /// Signed-in only; guests must log in before checkout.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` without a valid credential, or
    /// another `ApiError` if the request fails.
    #[instrument(skip(self, details))]
    pub async fn place_order(&self, details: &OrderRequest) -> Result<Order, ApiError> {
        let url = self.endpoint("orders")?;
        self.send(self.request(Method::POST, url).json(details))
            .await
    }

    /// List the account's order history, following pagination links.
    ///
    /// # Errors
    ///
    /// Returns an error if any page request fails.
    #[instrument(skip(self))]
    pub async fn list_orders(&self) -> Result<Vec<Order>, ApiError> {
        let mut orders = Vec::new();
        let mut next: Option<Url> = Some(self.endpoint("orders")?);

        while let Some(url) = next {
            let page: Page<Order> = self.send(self.request(Method::GET, url)).await?;
            orders.extend(page.results);
            next = page.next.as_deref().map(Url::parse).transpose()?;
        }

        Ok(orders)
    }
}
