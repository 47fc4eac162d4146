//! Cart reconciliation manager behavior against the fake API.

#![allow(clippy::unwrap_used)]

use secrecy::SecretString;
use tavola_client::CartManager;
use tavola_client::api::types::{CartLineItem, Product};
use tavola_client::store::keys;
use tavola_core::{LineItemId, Money, ProductId};
use tavola_integration_tests::{FakeApi, client_stack, stack_with_dir};

fn guest_line_item(id: i64, product: &Product, quantity: u32) -> CartLineItem {
    CartLineItem {
        id: LineItemId::new(id),
        product: product.clone(),
        quantity,
        total_price: product.price * quantity,
    }
}

#[tokio::test]
async fn guest_add_deduplicates_by_product_id() {
    let fake = FakeApi::spawn().await;
    let product = fake.seed_product(5, "Margherita", "10.00", "pizza");
    let stack = client_stack(&fake);

    let mut cart = CartManager::initialize(stack.api, stack.store.clone(), stack.tokens).await;
    cart.add_item(&product, 2).await;

    assert_eq!(cart.count(), 1);
    assert_eq!(cart.items()[0].quantity, 2);
    assert_eq!(cart.items()[0].total_price.display(), "$20.00");

    // Adding the same product again merges into the existing row
    cart.add_item(&product, 1).await;

    assert_eq!(cart.count(), 1);
    assert_eq!(cart.items()[0].quantity, 3);
    assert_eq!(cart.items()[0].total_price.display(), "$30.00");

    // The persisted guest cart matches the in-memory view
    let persisted: Option<Vec<CartLineItem>> = stack.store.get(keys::CART).unwrap();
    assert_eq!(persisted.unwrap(), cart.items().to_vec());
}

#[tokio::test]
async fn guest_merge_saturates_instead_of_overflowing() {
    let fake = FakeApi::spawn().await;
    let product = fake.seed_product(5, "Margherita", "10.00", "pizza");
    let stack = client_stack(&fake);

    let mut cart = CartManager::initialize(stack.api, stack.store, stack.tokens).await;
    cart.add_item(&product, u32::MAX).await;
    cart.add_item(&product, 5).await;

    assert_eq!(cart.count(), 1);
    assert_eq!(cart.items()[0].quantity, u32::MAX);
}

#[tokio::test]
async fn quantity_floor_rejects_updates_below_one() {
    let fake = FakeApi::spawn().await;
    let product = fake.seed_product(5, "Margherita", "10.00", "pizza");
    let stack = client_stack(&fake);

    let mut cart = CartManager::initialize(stack.api, stack.store, stack.tokens).await;
    cart.add_item(&product, 2).await;
    let item_id = cart.items()[0].id;
    let updates_before = fake.counters().updates;

    cart.update_quantity(item_id, 0).await;

    // Rejected before any network call; quantity unchanged
    assert_eq!(fake.counters().updates, updates_before);
    assert_eq!(cart.items()[0].quantity, 2);
}

#[tokio::test]
async fn guest_mutations_never_hit_the_full_list_fetch() {
    let fake = FakeApi::spawn().await;
    let margherita = fake.seed_product(5, "Margherita", "10.00", "pizza");
    let tiramisu = fake.seed_product(7, "Tiramisu", "6.50", "desserts");
    let stack = client_stack(&fake);

    let mut cart = CartManager::initialize(stack.api, stack.store, stack.tokens).await;
    cart.add_item(&margherita, 1).await;
    cart.add_item(&tiramisu, 2).await;
    let item_id = cart.items()[0].id;
    cart.update_quantity(item_id, 3).await;
    cart.remove_item(item_id).await;

    let counters = fake.counters();
    assert_eq!(counters.cart_fetches, 0);
    assert_eq!(counters.cart_pages, 0);
    // Only the single-item endpoints were used
    assert_eq!(counters.adds, 2);
    assert_eq!(counters.updates, 1);
    assert_eq!(counters.deletes, 1);
}

#[tokio::test]
async fn signed_in_mutations_each_trigger_exactly_one_refetch() {
    let fake = FakeApi::spawn().await;
    let product = fake.seed_product(5, "Margherita", "10.00", "pizza");
    fake.issue_token("tok-refetch");

    let stack = client_stack(&fake);
    stack.tokens.set(SecretString::from("tok-refetch")).unwrap();

    let mut cart = CartManager::initialize(stack.api, stack.store, stack.tokens).await;
    assert!(cart.is_signed_in());
    assert_eq!(fake.counters().cart_fetches, 1); // initialization fetch

    cart.add_item(&product, 1).await;
    assert_eq!(fake.counters().cart_fetches, 2);

    let item_id = cart.items()[0].id;
    cart.update_quantity(item_id, 4).await;
    assert_eq!(fake.counters().cart_fetches, 3);

    cart.remove_item(item_id).await;
    assert_eq!(fake.counters().cart_fetches, 4);
    assert!(cart.items().is_empty());
}

#[tokio::test]
async fn login_merges_guest_items_then_clears_the_store() {
    let fake = FakeApi::spawn().await;
    let margherita = fake.seed_product(5, "Margherita", "10.00", "pizza");
    let tiramisu = fake.seed_product(7, "Tiramisu", "6.50", "desserts");
    let lasagna = fake.seed_product(9, "Lasagna", "12.00", "mains");
    fake.issue_token("tok-merge");

    let stack = client_stack(&fake);

    // Previously accumulated guest items, as a prior guest session left them
    let guest_items = vec![
        guest_line_item(101, &margherita, 2),
        guest_line_item(102, &tiramisu, 1),
        guest_line_item(103, &lasagna, 1),
    ];
    stack.store.put(keys::CART, &guest_items).unwrap();
    stack.tokens.set(SecretString::from("tok-merge")).unwrap();

    let cart = CartManager::initialize(stack.api, stack.store.clone(), stack.tokens).await;

    // All three product ids reached the account cart
    let mut server_ids = fake.cart_product_ids();
    server_ids.sort_unstable();
    assert_eq!(server_ids, vec![5, 7, 9]);
    assert_eq!(cart.count(), 3);

    // The local entry is gone
    let persisted: Option<Vec<CartLineItem>> = stack.store.get(keys::CART).unwrap();
    assert!(persisted.is_none());

    // Quantities survived the migration
    let merged = fake
        .cart_snapshot()
        .into_iter()
        .find(|item| item.product.id == ProductId::new(5))
        .unwrap();
    assert_eq!(merged.quantity, 2);
}

#[tokio::test]
async fn partial_merge_failure_still_clears_the_store() {
    let fake = FakeApi::spawn().await;
    let margherita = fake.seed_product(5, "Margherita", "10.00", "pizza");
    let tiramisu = fake.seed_product(7, "Tiramisu", "6.50", "desserts");
    let lasagna = fake.seed_product(9, "Lasagna", "12.00", "mains");
    fake.issue_token("tok-partial");
    fake.fail_adds_for(7); // the middle item fails to sync

    let stack = client_stack(&fake);
    let guest_items = vec![
        guest_line_item(101, &margherita, 1),
        guest_line_item(102, &tiramisu, 1),
        guest_line_item(103, &lasagna, 1),
    ];
    stack.store.put(keys::CART, &guest_items).unwrap();
    stack.tokens.set(SecretString::from("tok-partial")).unwrap();

    let cart = CartManager::initialize(stack.api, stack.store.clone(), stack.tokens).await;

    // The failed item is lost; its siblings merged anyway
    let mut server_ids = fake.cart_product_ids();
    server_ids.sort_unstable();
    assert_eq!(server_ids, vec![5, 9]);
    assert_eq!(cart.count(), 2);

    // Cleared unconditionally, even after the partial failure
    let persisted: Option<Vec<CartLineItem>> = stack.store.get(keys::CART).unwrap();
    assert!(persisted.is_none());
}

#[tokio::test]
async fn removing_an_unknown_item_leaves_the_cart_unchanged() {
    let fake = FakeApi::spawn().await;
    let product = fake.seed_product(5, "Margherita", "10.00", "pizza");
    let stack = client_stack(&fake);

    let mut cart = CartManager::initialize(stack.api, stack.store, stack.tokens).await;
    cart.add_item(&product, 2).await;

    // The server rejects the delete; the failure is swallowed and logged
    cart.remove_item(LineItemId::new(999)).await;

    assert_eq!(cart.count(), 1);
    assert_eq!(cart.items()[0].quantity, 2);
    assert_eq!(fake.counters().deletes, 1);
}

#[tokio::test]
async fn bulk_update_commits_concurrently_with_a_single_refetch() {
    let fake = FakeApi::spawn().await;
    let margherita = fake.seed_product(5, "Margherita", "10.00", "pizza");
    let tiramisu = fake.seed_product(7, "Tiramisu", "6.50", "desserts");
    fake.issue_token("tok-bulk");

    let stack = client_stack(&fake);
    stack.tokens.set(SecretString::from("tok-bulk")).unwrap();

    let mut cart = CartManager::initialize(stack.api, stack.store, stack.tokens).await;
    cart.add_item(&margherita, 1).await;
    cart.add_item(&tiramisu, 1).await;

    let first = cart
        .items()
        .iter()
        .find(|i| i.product.id == ProductId::new(5))
        .unwrap()
        .id;
    let second = cart
        .items()
        .iter()
        .find(|i| i.product.id == ProductId::new(7))
        .unwrap()
        .id;

    let fetches_before = fake.counters().cart_fetches;
    cart.update_quantities(&[(first, 3), (second, 5)]).await;

    let counters = fake.counters();
    assert_eq!(counters.cart_fetches, fetches_before + 1);
    assert_eq!(counters.updates, 2);

    let quantity_of = |product_id: i64| {
        cart.items()
            .iter()
            .find(|i| i.product.id == ProductId::new(product_id))
            .unwrap()
            .quantity
    };
    assert_eq!(quantity_of(5), 3);
    assert_eq!(quantity_of(7), 5);
}

#[tokio::test]
async fn bulk_update_skips_entries_below_the_quantity_floor() {
    let fake = FakeApi::spawn().await;
    let margherita = fake.seed_product(5, "Margherita", "10.00", "pizza");
    let tiramisu = fake.seed_product(7, "Tiramisu", "6.50", "desserts");

    let stack = client_stack(&fake);
    let mut cart = CartManager::initialize(stack.api, stack.store.clone(), stack.tokens).await;
    cart.add_item(&margherita, 1).await;
    cart.add_item(&tiramisu, 1).await;

    let first = cart.items()[0].id;
    let second = cart.items()[1].id;
    cart.update_quantities(&[(first, 0), (second, 3)]).await;

    // Only the entry above the floor was sent
    assert_eq!(fake.counters().updates, 1);
    assert_eq!(cart.items()[0].quantity, 1);
    assert_eq!(cart.items()[1].quantity, 3);

    let persisted: Option<Vec<CartLineItem>> = stack.store.get(keys::CART).unwrap();
    assert_eq!(persisted.unwrap(), cart.items().to_vec());
}

#[tokio::test]
async fn bulk_update_with_only_skipped_entries_sends_nothing() {
    let fake = FakeApi::spawn().await;
    let product = fake.seed_product(5, "Margherita", "10.00", "pizza");
    fake.issue_token("tok-floor");

    let stack = client_stack(&fake);
    stack.tokens.set(SecretString::from("tok-floor")).unwrap();

    let mut cart = CartManager::initialize(stack.api, stack.store, stack.tokens).await;
    cart.add_item(&product, 2).await;
    let item_id = cart.items()[0].id;
    let fetches_before = fake.counters().cart_fetches;

    cart.update_quantities(&[(item_id, 0)]).await;

    // No mutation was sent, so no refetch followed
    let counters = fake.counters();
    assert_eq!(counters.updates, 0);
    assert_eq!(counters.cart_fetches, fetches_before);
    assert_eq!(cart.items()[0].quantity, 2);
}

#[tokio::test]
async fn bulk_update_isolates_per_item_failures() {
    let fake = FakeApi::spawn().await;
    let margherita = fake.seed_product(5, "Margherita", "10.00", "pizza");
    let tiramisu = fake.seed_product(7, "Tiramisu", "6.50", "desserts");

    let stack = client_stack(&fake);
    let mut cart = CartManager::initialize(stack.api, stack.store.clone(), stack.tokens).await;
    cart.add_item(&margherita, 1).await;
    cart.add_item(&tiramisu, 1).await;

    let first = cart.items()[0].id;
    let second = cart.items()[1].id;
    fake.fail_updates_for(first.as_i64());

    cart.update_quantities(&[(first, 4), (second, 3)]).await;

    // Both were attempted; the failed line keeps its confirmed quantity
    assert_eq!(fake.counters().updates, 2);
    assert_eq!(cart.items()[0].quantity, 1);
    assert_eq!(cart.items()[1].quantity, 3);

    // The single persist reflects the surviving update
    let persisted: Option<Vec<CartLineItem>> = stack.store.get(keys::CART).unwrap();
    assert_eq!(persisted.unwrap(), cart.items().to_vec());
}

#[tokio::test]
async fn bulk_update_with_empty_input_is_a_no_op() {
    let fake = FakeApi::spawn().await;
    let stack = client_stack(&fake);

    let mut cart = CartManager::initialize(stack.api, stack.store, stack.tokens).await;
    cart.update_quantities(&[]).await;

    let counters = fake.counters();
    assert_eq!(counters.updates, 0);
    assert_eq!(counters.cart_fetches, 0);
}

#[tokio::test]
async fn rejected_credential_on_init_signs_the_session_out() {
    let fake = FakeApi::spawn().await;
    let stack = client_stack(&fake);

    // A stale token the server no longer accepts
    stack.tokens.set(SecretString::from("tok-stale")).unwrap();

    let cart = CartManager::initialize(stack.api, stack.store, stack.tokens.clone()).await;

    assert!(!cart.is_signed_in());
    assert!(cart.items().is_empty());
    // The credential was discarded, not retried silently
    assert!(!stack.tokens.is_signed_in());
}

#[tokio::test]
async fn guest_cart_survives_an_application_restart() {
    let fake = FakeApi::spawn().await;
    let product = fake.seed_product(5, "Margherita", "10.00", "pizza");

    let data_dir = std::env::temp_dir().join(format!(
        "tavola-restart-{}",
        std::process::id()
    ));
    let _ = std::fs::remove_dir_all(&data_dir);
    let stack = stack_with_dir(&fake, &data_dir);
    let mut cart = CartManager::initialize(stack.api, stack.store, stack.tokens).await;
    cart.add_item(&product, 2).await;
    drop(cart);

    // A fresh stack over the same data directory models a restart
    let pages_before = fake.counters().cart_pages;
    let stack = stack_with_dir(&fake, &data_dir);
    let cart = CartManager::initialize(stack.api, stack.store, stack.tokens).await;

    assert_eq!(cart.count(), 1);
    assert_eq!(cart.items()[0].quantity, 2);
    assert_eq!(cart.subtotal(), Money::new("20.00".parse().unwrap()));
    // Guest initialization touched no network
    assert_eq!(fake.counters().cart_pages, pages_before);
}

#[tokio::test]
async fn failed_add_leaves_items_unchanged() {
    let fake = FakeApi::spawn().await;
    let margherita = fake.seed_product(5, "Margherita", "10.00", "pizza");
    let tiramisu = fake.seed_product(7, "Tiramisu", "6.50", "desserts");
    fake.fail_adds_for(7);

    let stack = client_stack(&fake);
    let mut cart = CartManager::initialize(stack.api, stack.store, stack.tokens).await;
    cart.add_item(&margherita, 1).await;

    cart.add_item(&tiramisu, 1).await;

    // No optimistic insert happened before the failure
    assert_eq!(cart.count(), 1);
    assert_eq!(cart.items()[0].product.id, ProductId::new(5));
    // No successful add, so the panel hint stays from the first add only
    assert!(cart.is_panel_open());
}
