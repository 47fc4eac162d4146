//! Tavola CLI - command-line front end for the ordering client.
//!
//! Stands in for the website's pages: each command exercises the client the
//! way a page would (menu browsing, cart mutations, checkout, account).
//!
//! # Usage
//!
//! ```bash
//! # Browse the menu
//! tavola menu --category pizza
//! tavola item 5
//!
//! # Cart operations (guest or signed-in; the manager reconciles)
//! tavola cart show
//! tavola cart add 5 --quantity 2
//! tavola cart set 12 3
//! tavola cart save 12=3 14=1
//! tavola cart remove 12
//!
//! # Account
//! tavola login --email you@example.com --password secret
//! tavola logout
//!
//! # Checkout and history
//! tavola checkout --address "1 Main St" --phone 555-0100
//! tavola orders
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]
// A CLI's job is to print
#![allow(clippy::print_stdout)]

use clap::{Parser, Subcommand};
use tavola_core::{LineItemId, ProductId};

mod commands;

#[derive(Parser)]
#[command(name = "tavola")]
#[command(author, version, about = "Tavola restaurant ordering CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the menu
    Menu {
        /// Filter by category (e.g. pizza, desserts)
        #[arg(short, long)]
        category: Option<String>,

        /// Free-text search
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Show one menu item
    Item {
        /// Product id
        id: i64,
    },
    /// Cart operations
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Log in to an account
    Login {
        /// Account email
        #[arg(short, long)]
        email: String,

        /// Account password
        #[arg(short, long)]
        password: String,
    },
    /// Create an account
    Register {
        /// Display name
        #[arg(short, long)]
        name: String,

        /// Account email
        #[arg(short, long)]
        email: String,

        /// Account password
        #[arg(short, long)]
        password: String,
    },
    /// Log out of the current account
    Logout,
    /// Place an order from the current cart
    Checkout {
        /// Delivery address
        #[arg(short, long)]
        address: String,

        /// Contact phone number
        #[arg(short, long)]
        phone: String,

        /// Optional note to the kitchen
        #[arg(long)]
        note: Option<String>,
    },
    /// Show order history
    Orders,
}

#[derive(Subcommand)]
enum CartAction {
    /// Show the cart contents and subtotal
    Show,
    /// Add a product to the cart
    Add {
        /// Product id
        product_id: i64,

        /// Quantity to add
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Set the quantity of one line item
    Set {
        /// Line item id
        item_id: i64,

        /// New quantity (minimum 1)
        quantity: u32,
    },
    /// Commit several quantity edits at once, as `item_id=quantity` pairs
    Save {
        /// Edits in `item_id=quantity` form (e.g. `12=3 14=1`)
        #[arg(required = true)]
        edits: Vec<String>,
    },
    /// Remove a line item from the cart
    Remove {
        /// Line item id
        item_id: i64,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing; RUST_LOG overrides the default level
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tavola=info,tavola_client=info".into()),
        )
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Menu { category, search } => {
            commands::menu::list(category.as_deref(), search.as_deref()).await?;
        }
        Commands::Item { id } => {
            commands::menu::show(ProductId::new(id)).await?;
        }
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show().await?,
            CartAction::Add {
                product_id,
                quantity,
            } => commands::cart::add(ProductId::new(product_id), quantity).await?,
            CartAction::Set { item_id, quantity } => {
                commands::cart::set_quantity(LineItemId::new(item_id), quantity).await?;
            }
            CartAction::Save { edits } => commands::cart::save(&edits).await?,
            CartAction::Remove { item_id } => {
                commands::cart::remove(LineItemId::new(item_id)).await?;
            }
        },
        Commands::Login { email, password } => {
            commands::account::login(&email, &password).await?;
        }
        Commands::Register {
            name,
            email,
            password,
        } => commands::account::register(&name, &email, &password).await?,
        Commands::Logout => commands::account::logout().await?,
        Commands::Checkout {
            address,
            phone,
            note,
        } => commands::orders::checkout(address, phone, note).await?,
        Commands::Orders => commands::orders::history().await?,
    }
    Ok(())
}
