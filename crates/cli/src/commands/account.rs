//! Account commands: login, registration, logout.

use super::Context;

/// Log in and run the one-time guest cart merge.
pub async fn login(email: &str, password: &str) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = Context::from_env()?;
    ctx.api.login(email, password).await?;
    println!("Logged in as {email}.");

    // Re-running initialization merges any guest cart into the account cart
    let cart = ctx.cart().await;
    if cart.is_signed_in() {
        println!("Cart has {} item(s).", cart.count());
    } else {
        println!("Session could not be established; please log in again.");
    }
    Ok(())
}

/// Create an account (and sign in with the returned credential).
pub async fn register(
    name: &str,
    email: &str,
    password: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = Context::from_env()?;
    ctx.api.register(name, email, password).await?;
    println!("Account created for {email}.");

    let cart = ctx.cart().await;
    println!("Cart has {} item(s).", cart.count());
    Ok(())
}

/// Log out of the current account.
pub async fn logout() -> Result<(), Box<dyn std::error::Error>> {
    let ctx = Context::from_env()?;
    if !ctx.tokens.is_signed_in() {
        println!("Not signed in.");
        return Ok(());
    }

    ctx.api.logout().await;
    println!("Logged out.");
    Ok(())
}
