//! Cache value types for the menu cache.

use super::types::Product;

/// Values stored in the menu cache.
///
/// Large variants are boxed to keep the enum small.
#[derive(Clone)]
pub(crate) enum CacheValue {
    /// A single product.
    Product(Box<Product>),
    /// A full menu listing for one category filter.
    Menu(Vec<Product>),
}
