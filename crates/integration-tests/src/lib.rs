//! In-process fake of the remote ordering API, plus client-stack helpers.
//!
//! The fake serves the same REST surface the client consumes (cart CRUD,
//! menu, auth, orders) over a real HTTP listener on an ephemeral port, with
//! request counters and per-product failure injection so tests can assert
//! call patterns, not just end states.

// Test support code: panicking on harness misuse is the desired behavior.
#![allow(clippy::unwrap_used)]
#![allow(clippy::missing_panics_doc)]

use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tavola_client::api::types::{CartLineItem, Page, Product};
use tavola_client::{ApiClient, ClientConfig, LocalStore, TokenProvider};
use tavola_core::{LineItemId, Money, ProductId};
use url::Url;

const PAGE_SIZE: usize = 2;

type Shared = Arc<Mutex<FakeState>>;

/// Counts of requests the fake has served.
#[derive(Debug, Default, Clone, Copy)]
pub struct Counters {
    /// Full-list cart fetches (a fetch is counted once, at its first page).
    pub cart_fetches: usize,
    /// Individual `GET /cart` page requests.
    pub cart_pages: usize,
    /// `POST /cart` calls.
    pub adds: usize,
    /// `PATCH /cart/{id}` calls.
    pub updates: usize,
    /// `DELETE /cart/{id}` calls.
    pub deletes: usize,
    /// Menu listing fetches (counted once per listing, at its first page).
    pub menu_fetches: usize,
    /// Single-product fetches.
    pub product_fetches: usize,
}

/// An order as the fake records and serves it.
#[derive(Debug, Clone, Serialize)]
pub struct FakeOrder {
    pub id: i64,
    pub status: String,
    pub total: Money,
    pub placed_at: DateTime<Utc>,
}

/// Mutable server state behind the fake's endpoints.
#[derive(Debug, Default)]
pub struct FakeState {
    pub products: HashMap<i64, Product>,
    pub cart: Vec<CartLineItem>,
    pub orders: Vec<FakeOrder>,
    pub next_item_id: i64,
    pub next_order_id: i64,
    /// Bearer tokens `GET /cart` and the order endpoints accept.
    pub valid_tokens: HashSet<String>,
    /// Registered accounts (email to password).
    pub accounts: HashMap<String, String>,
    /// Product ids whose `POST /cart` fails with a 500.
    pub fail_adds_for: HashSet<i64>,
    /// Line item ids whose `PATCH /cart/{id}` fails with a 500.
    pub fail_updates_for: HashSet<i64>,
    pub counters: Counters,
}

/// Handle to a running fake API server.
pub struct FakeApi {
    addr: SocketAddr,
    state: Shared,
}

impl FakeApi {
    /// Bind an ephemeral port and serve the fake in a background task.
    pub async fn spawn() -> Self {
        let state: Shared = Arc::new(Mutex::new(FakeState {
            next_item_id: 1,
            next_order_id: 1,
            ..FakeState::default()
        }));

        let app = Router::new()
            .route("/cart", get(get_cart).post(post_cart))
            .route("/cart/{id}", axum::routing::patch(patch_item).delete(delete_item))
            .route("/menu/items", get(list_menu))
            .route("/menu/items/{id}", get(get_menu_item))
            .route("/auth/login", post(login))
            .route("/auth/register", post(register))
            .route("/auth/logout", post(logout))
            .route("/orders", get(list_orders).post(place_order))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake API listener");
        let addr = listener.local_addr().expect("fake API local addr");

        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!(error = %e, "fake API server exited");
            }
        });

        Self { addr, state }
    }

    /// Base URL for pointing a client at this fake.
    #[must_use]
    pub fn base_url(&self) -> Url {
        Url::parse(&format!("http://{}/", self.addr)).expect("fake API base url")
    }

    /// Run a closure against the locked server state.
    pub fn with_state<R>(&self, f: impl FnOnce(&mut FakeState) -> R) -> R {
        let mut guard = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    /// Seed a catalog product.
    pub fn seed_product(&self, id: i64, title: &str, price: &str, category: &str) -> Product {
        let product = Product {
            id: ProductId::new(id),
            title: title.to_string(),
            description: String::new(),
            price: Money::new(price.parse::<Decimal>().expect("seed price")),
            image: None,
            images: Vec::new(),
            category: category.to_string(),
            tags: Vec::new(),
        };
        self.with_state(|state| state.products.insert(id, product.clone()));
        product
    }

    /// Accept `token` as a valid credential.
    pub fn issue_token(&self, token: &str) {
        self.with_state(|state| state.valid_tokens.insert(token.to_string()));
    }

    /// Register an account the login endpoint accepts.
    pub fn seed_account(&self, email: &str, password: &str) {
        self.with_state(|state| {
            state
                .accounts
                .insert(email.to_string(), password.to_string())
        });
    }

    /// Make `POST /cart` fail for one product id.
    pub fn fail_adds_for(&self, product_id: i64) {
        self.with_state(|state| state.fail_adds_for.insert(product_id));
    }

    /// Make `PATCH /cart/{id}` fail for one line item id.
    pub fn fail_updates_for(&self, item_id: i64) {
        self.with_state(|state| state.fail_updates_for.insert(item_id));
    }

    /// Snapshot of the request counters.
    #[must_use]
    pub fn counters(&self) -> Counters {
        self.with_state(|state| state.counters)
    }

    /// Product ids currently in the server-side cart.
    #[must_use]
    pub fn cart_product_ids(&self) -> Vec<i64> {
        self.with_state(|state| {
            state
                .cart
                .iter()
                .map(|item| item.product.id.as_i64())
                .collect()
        })
    }

    /// Server-side cart snapshot.
    #[must_use]
    pub fn cart_snapshot(&self) -> Vec<CartLineItem> {
        self.with_state(|state| state.cart.clone())
    }
}

// =============================================================================
// Client-stack helpers
// =============================================================================

static DATA_DIR_SEQ: AtomicUsize = AtomicUsize::new(0);

/// A client stack (store, tokens, API client) pointed at a fake, with its
/// own unique data directory.
pub struct ClientStack {
    pub store: LocalStore,
    pub tokens: TokenProvider,
    pub api: ApiClient,
}

/// Build a client stack against `fake` with a fresh data directory.
#[must_use]
pub fn client_stack(fake: &FakeApi) -> ClientStack {
    let data_dir = std::env::temp_dir().join(format!(
        "tavola-it-{}-{}",
        std::process::id(),
        DATA_DIR_SEQ.fetch_add(1, Ordering::Relaxed)
    ));
    stack_with_dir(fake, &data_dir)
}

/// Build a client stack reusing an existing data directory (to model an
/// application restart over the same persisted state).
#[must_use]
pub fn stack_with_dir(fake: &FakeApi, data_dir: &std::path::Path) -> ClientStack {
    let config = ClientConfig::new(fake.base_url(), data_dir);
    let store = LocalStore::open(&config.data_dir).expect("open local store");
    let tokens = TokenProvider::new(store.clone());
    let api = ApiClient::new(&config, tokens.clone()).expect("build api client");
    ClientStack { store, tokens, api }
}

// =============================================================================
// Handlers
// =============================================================================

#[derive(Debug, Deserialize)]
struct ListQuery {
    page: Option<usize>,
    category: Option<String>,
    search: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AddItemBody {
    product_id: i64,
    quantity: u32,
}

#[derive(Debug, Deserialize)]
struct UpdateItemBody {
    quantity: u32,
}

#[derive(Debug, Deserialize)]
struct LoginBody {
    email: String,
    password: String,
}

#[derive(Debug, Deserialize)]
struct RegisterBody {
    #[allow(dead_code)]
    name: String,
    email: String,
    password: String,
}

#[derive(Debug, Serialize)]
struct TokenBody {
    token: String,
}

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(ToString::to_string)
}

fn authorized(state: &FakeState, headers: &HeaderMap) -> bool {
    bearer(headers).is_some_and(|token| state.valid_tokens.contains(&token))
}

/// Slice `items` into a page, producing an absolute `next` link.
fn page_of<T: Clone>(items: &[T], page: usize, next_url: impl Fn(usize) -> String) -> Page<T> {
    let start = (page - 1) * PAGE_SIZE;
    let results: Vec<T> = items.iter().skip(start).take(PAGE_SIZE).cloned().collect();
    let has_more = start + results.len() < items.len();
    Page {
        count: items.len() as u64,
        next: has_more.then(|| next_url(page + 1)),
        previous: None,
        results,
    }
}

async fn get_cart(
    State(state): State<Shared>,
    Query(query): Query<ListQuery>,
    headers: HeaderMap,
) -> Response {
    let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
    if !authorized(&state, &headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    let page = query.page.unwrap_or(1);
    state.counters.cart_pages += 1;
    if page == 1 {
        state.counters.cart_fetches += 1;
    }

    // The next link must be absolute; reconstruct from the Host header
    let host = headers
        .get("host")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("127.0.0.1")
        .to_string();
    let body = page_of(&state.cart, page, |next| {
        format!("http://{host}/cart?page={next}")
    });
    Json(body).into_response()
}

async fn post_cart(State(state): State<Shared>, Json(body): Json<AddItemBody>) -> Response {
    let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
    state.counters.adds += 1;

    if state.fail_adds_for.contains(&body.product_id) {
        return (StatusCode::INTERNAL_SERVER_ERROR, "injected failure").into_response();
    }

    let Some(product) = state.products.get(&body.product_id).cloned() else {
        return (StatusCode::NOT_FOUND, "no such product").into_response();
    };

    // Merge quantity for an existing product id rather than duplicating
    if let Some(existing) = state
        .cart
        .iter_mut()
        .find(|item| item.product.id.as_i64() == body.product_id)
    {
        existing.quantity += body.quantity;
        existing.total_price = existing.product.price * existing.quantity;
        return (StatusCode::OK, Json(existing.clone())).into_response();
    }

    let id = state.next_item_id;
    state.next_item_id += 1;
    let item = CartLineItem {
        id: LineItemId::new(id),
        total_price: product.price * body.quantity,
        quantity: body.quantity,
        product,
    };
    state.cart.push(item.clone());
    (StatusCode::CREATED, Json(item)).into_response()
}

async fn patch_item(
    State(state): State<Shared>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateItemBody>,
) -> Response {
    let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
    state.counters.updates += 1;

    if state.fail_updates_for.contains(&id) {
        return (StatusCode::INTERNAL_SERVER_ERROR, "injected failure").into_response();
    }

    let Some(item) = state
        .cart
        .iter_mut()
        .find(|item| item.id.as_i64() == id)
    else {
        return (StatusCode::NOT_FOUND, "no such cart item").into_response();
    };

    item.quantity = body.quantity;
    item.total_price = item.product.price * item.quantity;
    Json(item.clone()).into_response()
}

async fn delete_item(State(state): State<Shared>, Path(id): Path<i64>) -> Response {
    let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
    state.counters.deletes += 1;

    let before = state.cart.len();
    state.cart.retain(|item| item.id.as_i64() != id);
    if state.cart.len() == before {
        return (StatusCode::NOT_FOUND, "no such cart item").into_response();
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn list_menu(
    State(state): State<Shared>,
    Query(query): Query<ListQuery>,
    headers: HeaderMap,
) -> Response {
    let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);

    let page = query.page.unwrap_or(1);
    if page == 1 {
        state.counters.menu_fetches += 1;
    }

    let mut products: Vec<Product> = state
        .products
        .values()
        .filter(|p| {
            query
                .category
                .as_deref()
                .is_none_or(|category| p.category == category)
        })
        .filter(|p| {
            query
                .search
                .as_deref()
                .is_none_or(|search| p.title.to_lowercase().contains(&search.to_lowercase()))
        })
        .cloned()
        .collect();
    products.sort_by_key(|p| p.id.as_i64());

    let host = headers
        .get("host")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("127.0.0.1")
        .to_string();
    let category_pair = query
        .category
        .as_deref()
        .map(|category| format!("&category={category}"))
        .unwrap_or_default();
    let body = page_of(&products, page, |next| {
        format!("http://{host}/menu/items?page={next}{category_pair}")
    });
    Json(body).into_response()
}

async fn get_menu_item(State(state): State<Shared>, Path(id): Path<i64>) -> Response {
    let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
    state.counters.product_fetches += 1;

    state.products.get(&id).cloned().map_or_else(
        || (StatusCode::NOT_FOUND, "no such product").into_response(),
        |product| Json(product).into_response(),
    )
}

async fn login(State(state): State<Shared>, Json(body): Json<LoginBody>) -> Response {
    let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);

    if state.accounts.get(&body.email) != Some(&body.password) {
        return (StatusCode::UNAUTHORIZED, "bad credentials").into_response();
    }

    let token = format!("tok-{}-{}", body.email, state.valid_tokens.len());
    state.valid_tokens.insert(token.clone());
    Json(TokenBody { token }).into_response()
}

async fn register(State(state): State<Shared>, Json(body): Json<RegisterBody>) -> Response {
    let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);

    if state.accounts.contains_key(&body.email) {
        return (StatusCode::CONFLICT, "email already registered").into_response();
    }

    state
        .accounts
        .insert(body.email.clone(), body.password.clone());
    let token = format!("tok-{}-{}", body.email, state.valid_tokens.len());
    state.valid_tokens.insert(token.clone());
    (StatusCode::CREATED, Json(TokenBody { token })).into_response()
}

async fn logout(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(token) = bearer(&headers) {
        state.valid_tokens.remove(&token);
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn place_order(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
    if !authorized(&state, &headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    let total = state
        .cart
        .iter()
        .map(|item| item.total_price)
        .fold(Money::ZERO, std::ops::Add::add);

    let id = state.next_order_id;
    state.next_order_id += 1;
    let order = FakeOrder {
        id,
        status: "pending".to_string(),
        total,
        placed_at: Utc::now(),
    };
    state.orders.push(order.clone());
    state.cart.clear();
    (StatusCode::CREATED, Json(order)).into_response()
}

async fn list_orders(
    State(state): State<Shared>,
    Query(query): Query<ListQuery>,
    headers: HeaderMap,
) -> Response {
    let state = state.lock().unwrap_or_else(PoisonError::into_inner);
    if !authorized(&state, &headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    let page = query.page.unwrap_or(1);
    let host = headers
        .get("host")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("127.0.0.1")
        .to_string();
    let body = page_of(&state.orders, page, |next| {
        format!("http://{host}/orders?page={next}")
    });
    Json(body).into_response()
}
