//! Wire types for the remote ordering API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tavola_core::{LineItemId, Money, OrderId, ProductId};

/// A catalog product snapshot.
///
/// Cart line items carry the snapshot taken at the time of adding; it is not
/// re-fetched on every render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Catalog identifier.
    pub id: ProductId,
    /// Display title.
    pub title: String,
    /// Longer description for detail pages.
    #[serde(default)]
    pub description: String,
    /// Unit price.
    pub price: Money,
    /// Primary image URL.
    #[serde(default)]
    pub image: Option<String>,
    /// Additional image URLs.
    #[serde(default)]
    pub images: Vec<String>,
    /// Menu category label (e.g. "mains", "desserts").
    pub category: String,
    /// Free-form tag labels (e.g. "vegan", "spicy").
    #[serde(default)]
    pub tags: Vec<String>,
}

/// One row in a cart: a single product id and its quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLineItem {
    /// Identifier assigned by the API at creation time.
    pub id: LineItemId,
    /// Product snapshot taken when the item was added.
    pub product: Product,
    /// Always >= 1.
    pub quantity: u32,
    /// Server-computed `quantity x unit price`; the authoritative display value.
    pub total_price: Money,
}

/// A page of a paginated listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    /// Total number of records across all pages.
    pub count: u64,
    /// Absolute URL of the next page, if any.
    #[serde(default)]
    pub next: Option<String>,
    /// Absolute URL of the previous page, if any.
    #[serde(default)]
    pub previous: Option<String>,
    /// Records in this page.
    pub results: Vec<T>,
}

/// `POST /cart` request body.
#[derive(Debug, Serialize)]
pub struct AddItemRequest {
    /// Product to add (the server merges quantity for an existing product id).
    pub product_id: ProductId,
    /// Requested quantity.
    pub quantity: u32,
}

/// `PATCH /cart/{id}` request body.
#[derive(Debug, Serialize)]
pub struct UpdateItemRequest {
    /// New absolute quantity.
    pub quantity: u32,
}

/// `POST /auth/login` request body.
#[derive(Debug, Serialize)]
pub struct LoginRequest {
    /// Account email.
    pub email: String,
    /// Account password (sent over TLS; never logged).
    pub password: String,
}

/// `POST /auth/register` request body.
#[derive(Debug, Serialize)]
pub struct RegisterRequest {
    /// Display name.
    pub name: String,
    /// Account email.
    pub email: String,
    /// Account password.
    pub password: String,
}

/// Response from login and register: the bearer credential.
#[derive(Debug, Deserialize)]
pub struct AuthResponse {
    /// Bearer token for subsequent calls.
    pub token: String,
}

/// `POST /orders` request body: delivery details for checkout.
#[derive(Debug, Clone, Serialize)]
pub struct OrderRequest {
    /// Delivery address.
    pub address: String,
    /// Contact phone number.
    pub phone: String,
    /// Optional note to the kitchen.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// A placed order, as returned by the API.
///
/// Payment handling happens on the remote side; the client only sees an
/// opaque status string.
#[derive(Debug, Clone, Deserialize)]
pub struct Order {
    /// Order identifier.
    pub id: OrderId,
    /// Opaque status (e.g. "pending", "preparing", "delivered").
    pub status: String,
    /// Server-computed order total.
    pub total: Money,
    /// When the order was placed.
    pub placed_at: DateTime<Utc>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cart_line_item_deserializes_api_shape() {
        let json = r#"{
            "id": 12,
            "product": {
                "id": 5,
                "title": "Margherita",
                "price": "10.00",
                "image": "https://cdn.example.com/margherita.jpg",
                "category": "pizza",
                "tags": ["vegetarian"]
            },
            "quantity": 2,
            "total_price": "20.00"
        }"#;

        let item: CartLineItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.id, LineItemId::new(12));
        assert_eq!(item.product.id, ProductId::new(5));
        assert_eq!(item.quantity, 2);
        assert_eq!(item.total_price.display(), "$20.00");
        // Fields the API may omit default cleanly
        assert!(item.product.description.is_empty());
        assert!(item.product.images.is_empty());
    }

    #[test]
    fn test_page_defaults_missing_links() {
        let json = r#"{ "count": 0, "results": [] }"#;
        let page: Page<CartLineItem> = serde_json::from_str(json).unwrap();
        assert!(page.next.is_none());
        assert!(page.previous.is_none());
        assert!(page.results.is_empty());
    }

    #[test]
    fn test_order_request_omits_empty_note() {
        let request = OrderRequest {
            address: "1 Main St".to_string(),
            phone: "555-0100".to_string(),
            note: None,
        };
        let json = serde_json::to_string(&request).unwrap();
        assert!(!json.contains("note"));
    }
}
