//! Menu browsing commands.

use tavola_core::ProductId;

use super::Context;

/// List menu items, optionally filtered.
pub async fn list(
    category: Option<&str>,
    search: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = Context::from_env()?;
    let products = ctx.api.list_menu(category, search).await?;

    if products.is_empty() {
        println!("No menu items found.");
        return Ok(());
    }

    for product in products {
        let tags = if product.tags.is_empty() {
            String::new()
        } else {
            format!("  [{}]", product.tags.join(", "))
        };
        println!(
            "{:>5}  {:<30} {:>8}  {}{}",
            product.id,
            product.title,
            product.price.display(),
            product.category,
            tags
        );
    }
    Ok(())
}

/// Show one menu item in detail.
pub async fn show(product_id: ProductId) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = Context::from_env()?;
    let product = ctx.api.get_menu_item(product_id).await?;

    println!("{} ({})", product.title, product.price.display());
    println!("Category: {}", product.category);
    if !product.tags.is_empty() {
        println!("Tags: {}", product.tags.join(", "));
    }
    if !product.description.is_empty() {
        println!();
        println!("{}", product.description);
    }
    Ok(())
}
