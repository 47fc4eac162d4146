//! Checkout and order history commands.

use tavola_client::api::types::OrderRequest;

use super::Context;

/// Place an order from the current cart.
pub async fn checkout(
    address: String,
    phone: String,
    note: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = Context::from_env()?;

    let cart = ctx.cart().await;
    if !cart.is_signed_in() {
        println!("Checkout requires an account; run `tavola login` first.");
        return Ok(());
    }
    if cart.items().is_empty() {
        println!("Cart is empty; nothing to order.");
        return Ok(());
    }

    let order = ctx
        .api
        .place_order(&OrderRequest {
            address,
            phone,
            note,
        })
        .await?;

    println!(
        "Order #{} placed ({}): total {}.",
        order.id,
        order.status,
        order.total.display()
    );
    Ok(())
}

/// Show the account's order history.
pub async fn history() -> Result<(), Box<dyn std::error::Error>> {
    let ctx = Context::from_env()?;
    if !ctx.tokens.is_signed_in() {
        println!("Order history requires an account; run `tavola login` first.");
        return Ok(());
    }

    let orders = ctx.api.list_orders().await?;
    if orders.is_empty() {
        println!("No orders yet.");
        return Ok(());
    }

    for order in orders {
        println!(
            "#{:<6} {:<12} {:>10}  {}",
            order.id,
            order.status,
            order.total.display(),
            order.placed_at.format("%Y-%m-%d %H:%M")
        );
    }
    Ok(())
}
