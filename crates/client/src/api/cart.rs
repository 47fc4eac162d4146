//! Cart endpoints.
//!
//! Never cached: cart state is mutable and the full-list fetch is the
//! authoritative view for signed-in users. Guest flows call the same
//! single-item endpoints to obtain the canonical server-computed
//! `total_price`, but never the full-list fetch.

use reqwest::Method;
use tavola_core::{LineItemId, ProductId};
use tracing::instrument;
use url::Url;

use super::types::{AddItemRequest, CartLineItem, Page, UpdateItemRequest};
use super::{ApiClient, ApiError};

impl ApiClient {
    /// Fetch the full cart, following pagination links.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` when the credential is absent or
    /// rejected, or another `ApiError` if any page request fails.
    #[instrument(skip(self))]
    pub async fn fetch_cart(&self) -> Result<Vec<CartLineItem>, ApiError> {
        let mut items = Vec::new();
        let mut next: Option<Url> = Some(self.endpoint("cart")?);

        while let Some(url) = next {
            let page: Page<CartLineItem> = self.send(self.request(Method::GET, url)).await?;
            items.extend(page.results);
            next = page.next.as_deref().map(Url::parse).transpose()?;
        }

        Ok(items)
    }

    /// Add a product to the cart.
    ///
    /// The server merges quantity into an existing line item for the same
    /// product id, so this is also the merge primitive used on login.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn add_cart_item(
        &self,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<CartLineItem, ApiError> {
        let url = self.endpoint("cart")?;
        let body = AddItemRequest {
            product_id,
            quantity,
        };
        self.send(self.request(Method::POST, url).json(&body)).await
    }

    /// Set the absolute quantity of a cart line item.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn update_cart_item(
        &self,
        item_id: LineItemId,
        quantity: u32,
    ) -> Result<CartLineItem, ApiError> {
        let url = self.endpoint(&format!("cart/{item_id}"))?;
        let body = UpdateItemRequest { quantity };
        self.send(self.request(Method::PATCH, url).json(&body))
            .await
    }

    /// Delete a cart line item.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails; deleting an id the server does
    /// not know yields `ApiError::NotFound`.
    #[instrument(skip(self))]
    pub async fn remove_cart_item(&self, item_id: LineItemId) -> Result<(), ApiError> {
        let url = self.endpoint(&format!("cart/{item_id}"))?;
        self.send_no_content(self.request(Method::DELETE, url))
            .await
    }
}
