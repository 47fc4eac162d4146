//! Cart reconciliation manager.
//!
//! Presents a single, consistent cart abstraction regardless of
//! authentication state, and migrates guest-cart contents into a signed-in
//! user's cart exactly once per login.
//!
//! # Scope rules
//!
//! - Signed-in: the remote API is authoritative. Every mutation goes through
//!   the single-item endpoint and is followed by exactly one full refetch.
//!   The local store is never read.
//! - Guest: the local store is authoritative, but every mutation still
//!   round-trips through the single-item endpoints so the server computes
//!   the canonical `total_price`. The full-list fetch is never called.
//!
//! # Failure contract
//!
//! There are no optimistic updates: `items` changes only after network
//! confirmation, so a failed operation leaves the cart exactly as it was.
//! Failures are logged and swallowed at the operation boundary; callers get
//! no `Result` and are expected to let the user reissue the action.

use std::collections::HashMap;

use tavola_core::{LineItemId, Money};
use thiserror::Error;
use tokio::task::JoinSet;
use tracing::instrument;

use crate::api::types::{CartLineItem, Product};
use crate::api::{ApiClient, ApiError};
use crate::auth::TokenProvider;
use crate::store::{LocalStore, StoreError, keys};

/// Failures internal to a cart operation; logged, never propagated.
#[derive(Debug, Error)]
enum CartOpError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// The cart reconciliation manager.
///
/// Owns the in-memory line items and mediates all mutations, shadowing them
/// in the local store for guests and delegating to the remote cart for
/// signed-in users.
pub struct CartManager {
    api: ApiClient,
    store: LocalStore,
    tokens: TokenProvider,
    /// Order is arrival/merge order; not guaranteed to match server order
    /// after a refetch.
    items: Vec<CartLineItem>,
    signed_in: bool,
    /// Cooperative flag for UI controls, not a lock. The manager does not
    /// serialize overlapping calls; callers disable themselves while busy.
    busy: bool,
    /// Set on every successful add; the UI layer reads and resets it to
    /// open the cart panel.
    panel_open: bool,
}

impl CartManager {
    /// Construct the manager and run the initialization protocol.
    ///
    /// Signed-in (credential present): merge any persisted guest items into
    /// the remote cart, clear the local entry unconditionally, then fetch the
    /// full cart. A rejected credential signs the session out.
    ///
    /// Guest: load the persisted guest cart with no network calls.
    #[instrument(skip_all)]
    pub async fn initialize(api: ApiClient, store: LocalStore, tokens: TokenProvider) -> Self {
        let signed_in = tokens.is_signed_in();
        let mut manager = Self {
            api,
            store,
            tokens,
            items: Vec::new(),
            signed_in,
            busy: false,
            panel_open: false,
        };

        manager.busy = true;
        if signed_in {
            manager.init_signed_in().await;
        } else {
            manager.init_guest();
        }
        manager.busy = false;

        manager
    }

    async fn init_signed_in(&mut self) {
        // Migrate any previously accumulated guest items. Individual
        // failures are isolated: the remaining items still merge.
        let guest_items: Vec<CartLineItem> = match self.store.get(keys::CART) {
            Ok(items) => items.unwrap_or_default(),
            Err(e) => {
                tracing::warn!(error = %e, "unreadable guest cart; skipping merge");
                Vec::new()
            }
        };

        for item in &guest_items {
            if let Err(e) = self
                .api
                .add_cart_item(item.product.id, item.quantity)
                .await
            {
                tracing::warn!(
                    product_id = %item.product.id,
                    quantity = item.quantity,
                    error = %e,
                    "guest item failed to merge and will be lost"
                );
            }
        }

        // Cleared unconditionally, even after partial failures. An accepted
        // data-loss risk: a failed item's data is gone once this runs.
        if let Err(e) = self.store.remove(keys::CART) {
            tracing::warn!(error = %e, "failed to clear guest cart entry");
        }

        match self.api.fetch_cart().await {
            Ok(items) => self.items = items,
            Err(ApiError::Unauthorized) => {
                // A stale token must not be retried silently: end the session.
                tracing::warn!("stored credential rejected; signing out");
                self.tokens.clear();
                self.signed_in = false;
                self.items = Vec::new();
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to fetch cart after merge");
            }
        }
    }

    fn init_guest(&mut self) {
        self.items = match self.store.get(keys::CART) {
            Ok(Some(items)) => items,
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!(error = %e, "unreadable guest cart; starting empty");
                Vec::new()
            }
        };
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Add `quantity` of `product` to the cart.
    ///
    /// Adding an already-present product increases quantity rather than
    /// duplicating the row: the server merges for signed-in users, and the
    /// guest path updates the existing line item found in local state.
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    pub async fn add_item(&mut self, product: &Product, quantity: u32) {
        self.busy = true;
        if let Err(e) = self.try_add_item(product, quantity).await {
            tracing::error!(product_id = %product.id, error = %e, "failed to add item to cart");
        }
        self.busy = false;
    }

    async fn try_add_item(&mut self, product: &Product, quantity: u32) -> Result<(), CartOpError> {
        if self.signed_in {
            self.api.add_cart_item(product.id, quantity).await?;
            self.items = self.api.fetch_cart().await?;
        } else if let Some(existing) = self.items.iter().find(|i| i.product.id == product.id) {
            let merged = existing.quantity.saturating_add(quantity);
            let updated = self.api.update_cart_item(existing.id, merged).await?;
            self.splice(updated);
            self.persist()?;
        } else {
            let created = self.api.add_cart_item(product.id, quantity).await?;
            self.items.push(created);
            self.persist()?;
        }

        self.panel_open = true;
        Ok(())
    }

    /// Set the quantity of a line item. A target below 1 is rejected as a
    /// no-op; removal is a separate, explicit operation.
    #[instrument(skip(self))]
    pub async fn update_quantity(&mut self, item_id: LineItemId, quantity: u32) {
        if quantity < 1 {
            tracing::debug!(item_id = %item_id, "ignoring update below quantity floor");
            return;
        }

        self.busy = true;
        if let Err(e) = self.try_update_quantity(item_id, quantity).await {
            tracing::error!(item_id = %item_id, error = %e, "failed to update quantity");
        }
        self.busy = false;
    }

    async fn try_update_quantity(
        &mut self,
        item_id: LineItemId,
        quantity: u32,
    ) -> Result<(), CartOpError> {
        // The guest path also round-trips through the API: local storage is
        // a persistence cache of API responses, not an offline store.
        let updated = self.api.update_cart_item(item_id, quantity).await?;

        if self.signed_in {
            self.items = self.api.fetch_cart().await?;
        } else {
            self.splice(updated);
            self.persist()?;
        }
        Ok(())
    }

    /// Commit several quantity edits at once (the "bulk save" pattern on the
    /// cart page, distinct from inline +/- controls).
    ///
    /// Updates are issued concurrently; each is independently keyed by item
    /// id, so completion order does not matter. Signed-in carts refetch once
    /// after all updates settle; guest carts persist once. Entries below the
    /// quantity floor are skipped.
    #[instrument(skip(self, updates), fields(count = updates.len()))]
    pub async fn update_quantities(&mut self, updates: &[(LineItemId, u32)]) {
        if updates.is_empty() {
            return;
        }

        self.busy = true;
        if let Err(e) = self.try_update_quantities(updates).await {
            tracing::error!(error = %e, "failed to commit bulk quantity update");
        }
        self.busy = false;
    }

    async fn try_update_quantities(
        &mut self,
        updates: &[(LineItemId, u32)],
    ) -> Result<(), CartOpError> {
        let mut tasks = JoinSet::new();
        for &(item_id, quantity) in updates {
            if quantity < 1 {
                tracing::debug!(item_id = %item_id, "skipping bulk entry below quantity floor");
                continue;
            }
            let api = self.api.clone();
            tasks.spawn(async move { api.update_cart_item(item_id, quantity).await });
        }

        // Nothing survived the floor: no mutation was sent, so no refetch
        if tasks.is_empty() {
            return Ok(());
        }

        let mut confirmed = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(item)) => confirmed.push(item),
                Ok(Err(e)) => tracing::error!(error = %e, "cart line update failed"),
                Err(e) => tracing::error!(error = %e, "cart line update task failed"),
            }
        }

        if self.signed_in {
            self.items = self.api.fetch_cart().await?;
        } else {
            for item in confirmed {
                self.splice(item);
            }
            self.persist()?;
        }
        Ok(())
    }

    /// Remove a line item from the cart.
    ///
    /// Removing an id that is not present does not throw: the delete call's
    /// failure is caught and logged, and `items` is left unchanged.
    #[instrument(skip(self))]
    pub async fn remove_item(&mut self, item_id: LineItemId) {
        self.busy = true;
        if let Err(e) = self.try_remove_item(item_id).await {
            tracing::error!(item_id = %item_id, error = %e, "failed to remove item from cart");
        }
        self.busy = false;
    }

    async fn try_remove_item(&mut self, item_id: LineItemId) -> Result<(), CartOpError> {
        self.api.remove_cart_item(item_id).await?;

        if self.signed_in {
            self.items = self.api.fetch_cart().await?;
        } else {
            self.items.retain(|i| i.id != item_id);
            self.persist()?;
        }
        Ok(())
    }

    // =========================================================================
    // Derived values and accessors
    // =========================================================================

    /// The current line items, in arrival/merge order.
    #[must_use]
    pub fn items(&self) -> &[CartLineItem] {
        &self.items
    }

    /// Number of distinct line items (not the sum of quantities).
    #[must_use]
    pub fn count(&self) -> usize {
        self.items.len()
    }

    /// Client-side subtotal estimate: sum of unit price x quantity.
    ///
    /// A provisional display value; the authoritative `total_price` on each
    /// line item is server-computed.
    #[must_use]
    pub fn subtotal(&self) -> Money {
        subtotal_of(&self.items, &HashMap::new())
    }

    /// Subtotal using uncommitted quantity drafts (cart-page editing): a
    /// draft quantity overrides the committed one for its line item.
    #[must_use]
    pub fn subtotal_with(&self, drafts: &HashMap<LineItemId, u32>) -> Money {
        subtotal_of(&self.items, drafts)
    }

    /// Whether a credential backed the most recent operation routing.
    #[must_use]
    pub const fn is_signed_in(&self) -> bool {
        self.signed_in
    }

    /// Whether a mutating or loading operation is in flight.
    ///
    /// Cooperative: UI controls disable themselves on this; the manager does
    /// not queue or reject overlapping calls.
    #[must_use]
    pub const fn is_busy(&self) -> bool {
        self.busy
    }

    /// Whether the cart panel should be open (set by successful adds).
    #[must_use]
    pub const fn is_panel_open(&self) -> bool {
        self.panel_open
    }

    /// Reset the panel-open hint after the UI has shown the panel.
    pub const fn close_panel(&mut self) {
        self.panel_open = false;
    }

    // =========================================================================
    // Internal helpers
    // =========================================================================

    /// Replace the line item matching `updated.id`, if present.
    fn splice(&mut self, updated: CartLineItem) {
        if let Some(slot) = self.items.iter_mut().find(|i| i.id == updated.id) {
            *slot = updated;
        }
    }

    /// Persist the full guest cart wholesale, after the network response it
    /// reflects.
    fn persist(&self) -> Result<(), StoreError> {
        self.store.put(keys::CART, &self.items)
    }
}

impl std::fmt::Debug for CartManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartManager")
            .field("items", &self.items.len())
            .field("signed_in", &self.signed_in)
            .field("busy", &self.busy)
            .finish_non_exhaustive()
    }
}

/// Sum of unit price x quantity, with draft quantities taking precedence.
fn subtotal_of(items: &[CartLineItem], drafts: &HashMap<LineItemId, u32>) -> Money {
    items
        .iter()
        .map(|item| {
            let quantity = drafts.get(&item.id).copied().unwrap_or(item.quantity);
            item.product.price * quantity
        })
        .fold(Money::ZERO, std::ops::Add::add)
}
