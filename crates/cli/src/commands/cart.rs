//! Cart commands.
//!
//! Every command goes through the cart reconciliation manager, so the guest
//! vs signed-in routing (and the one-time login merge) is transparent here.

use tavola_client::CartManager;
use tavola_core::{LineItemId, ProductId};
use thiserror::Error;

use super::Context;

/// Malformed `item_id=quantity` argument to `cart save`.
#[derive(Debug, Error)]
#[error("invalid edit '{0}': expected item_id=quantity")]
pub struct InvalidEdit(String);

/// Show the cart contents and subtotal.
pub async fn show() -> Result<(), Box<dyn std::error::Error>> {
    let ctx = Context::from_env()?;
    let cart = ctx.cart().await;
    print_cart(&cart);
    Ok(())
}

/// Add a product to the cart.
pub async fn add(product_id: ProductId, quantity: u32) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = Context::from_env()?;
    // The manager stores a product snapshot, so resolve the product first
    let product = ctx.api.get_menu_item(product_id).await?;

    let mut cart = ctx.cart().await;
    let before = cart.count();
    cart.add_item(&product, quantity).await;

    if cart.is_panel_open() {
        println!("Added {} x{quantity}.", product.title);
        cart.close_panel();
    } else if cart.count() == before {
        println!("Could not add {}; cart unchanged.", product.title);
    }
    print_cart(&cart);
    Ok(())
}

/// Set the quantity of one line item.
pub async fn set_quantity(
    item_id: LineItemId,
    quantity: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = Context::from_env()?;
    let mut cart = ctx.cart().await;
    cart.update_quantity(item_id, quantity).await;
    print_cart(&cart);
    Ok(())
}

/// Commit several quantity edits at once.
pub async fn save(edits: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    let updates = edits
        .iter()
        .map(|edit| parse_edit(edit))
        .collect::<Result<Vec<_>, _>>()?;

    let ctx = Context::from_env()?;
    let mut cart = ctx.cart().await;
    cart.update_quantities(&updates).await;
    print_cart(&cart);
    Ok(())
}

/// Remove a line item from the cart.
pub async fn remove(item_id: LineItemId) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = Context::from_env()?;
    let mut cart = ctx.cart().await;
    cart.remove_item(item_id).await;
    print_cart(&cart);
    Ok(())
}

/// Parse one `item_id=quantity` pair.
fn parse_edit(edit: &str) -> Result<(LineItemId, u32), InvalidEdit> {
    let (id, quantity) = edit
        .split_once('=')
        .ok_or_else(|| InvalidEdit(edit.to_string()))?;
    let id = id
        .trim()
        .parse::<i64>()
        .map_err(|_| InvalidEdit(edit.to_string()))?;
    let quantity = quantity
        .trim()
        .parse::<u32>()
        .map_err(|_| InvalidEdit(edit.to_string()))?;
    Ok((LineItemId::new(id), quantity))
}

fn print_cart(cart: &CartManager) {
    if cart.items().is_empty() {
        println!("Cart is empty.");
        return;
    }

    for item in cart.items() {
        println!(
            "{:>5}  {:<30} x{:<3} {:>8}",
            item.id,
            item.product.title,
            item.quantity,
            item.total_price.display()
        );
    }
    println!(
        "{} item(s), subtotal {}",
        cart.count(),
        cart.subtotal().display()
    );
}
