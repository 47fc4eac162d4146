//! Menu catalog endpoints.
//!
//! Read-only, so responses are cached for 5 minutes. Search results are not
//! cached; the key space is unbounded and hit rates are poor.

use reqwest::Method;
use tavola_core::ProductId;
use tracing::{debug, instrument};
use url::Url;

use super::cache::CacheValue;
use super::types::{Page, Product};
use super::{ApiClient, ApiError};

impl ApiClient {
    /// List menu products, optionally filtered by category or search term.
    ///
    /// Follows pagination links and returns the full listing.
    ///
    /// # Errors
    ///
    /// Returns an error if any page request fails.
    #[instrument(skip(self))]
    pub async fn list_menu(
        &self,
        category: Option<&str>,
        search: Option<&str>,
    ) -> Result<Vec<Product>, ApiError> {
        let cache_key = format!("menu:{}", category.unwrap_or(""));

        // Check cache (only for non-search listings)
        if search.is_none()
            && let Some(CacheValue::Menu(products)) = self.cache().get(&cache_key).await
        {
            debug!("cache hit for menu listing");
            return Ok(products);
        }

        let mut url = self.endpoint("menu/items")?;
        if let Some(category) = category {
            url.query_pairs_mut().append_pair("category", category);
        }
        if let Some(search) = search {
            url.query_pairs_mut().append_pair("search", search);
        }

        let mut products = Vec::new();
        let mut next: Option<Url> = Some(url);
        while let Some(page_url) = next {
            let page: Page<Product> = self.send(self.request(Method::GET, page_url)).await?;
            products.extend(page.results);
            next = page.next.as_deref().map(Url::parse).transpose()?;
        }

        if search.is_none() {
            self.cache()
                .insert(cache_key, CacheValue::Menu(products.clone()))
                .await;
        }

        Ok(products)
    }

    /// Get a single menu product by id.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the product does not exist, or another
    /// `ApiError` if the request fails.
    #[instrument(skip(self))]
    pub async fn get_menu_item(&self, product_id: ProductId) -> Result<Product, ApiError> {
        let cache_key = format!("product:{product_id}");

        if let Some(CacheValue::Product(product)) = self.cache().get(&cache_key).await {
            debug!("cache hit for product");
            return Ok(*product);
        }

        let url = self.endpoint(&format!("menu/items/{product_id}"))?;
        let product: Product = self.send(self.request(Method::GET, url)).await?;

        self.cache()
            .insert(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    /// Invalidate all cached menu data.
    pub async fn invalidate_menu_cache(&self) {
        self.cache().invalidate_all();
        self.cache().run_pending_tasks().await;
    }
}
