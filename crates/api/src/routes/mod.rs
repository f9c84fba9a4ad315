//! HTTP route handlers for the ordering API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                               - Liveness check
//! GET  /health/ready                         - Store reachability check
//!
//! # Accounts
//! POST /api/users                            - Register
//! GET  /api/users/me                         - Current user
//! POST /token/login                          - Issue a token
//! POST /token/logout                         - Revoke the presented token
//!
//! # Catalog
//! GET    /api/categories                     - Category listing
//! POST   /api/categories                     - Create category (manager)
//! DELETE /api/categories/{id}                - Delete category (manager)
//! GET    /api/menu-items                     - Menu listing (filter, search, order, page)
//! POST   /api/menu-items                     - Create menu item (manager)
//! GET    /api/menu-items/{id}                - Menu item detail
//! PUT    /api/menu-items/{id}                - Replace menu item (manager)
//! PATCH  /api/menu-items/{id}                - Update menu item (manager)
//! DELETE /api/menu-items/{id}                - Delete menu item (manager)
//! POST   /api/menu-items/featured/{id}       - Set the item of the day (manager)
//!
//! # Rosters (manager)
//! GET    /api/groups/{group}/users           - Group members
//! POST   /api/groups/{group}/users           - Add member
//! DELETE /api/groups/{group}/users/{username} - Remove member
//!
//! # Cart
//! GET    /api/cart/menu-items                - Cart lines
//! POST   /api/cart/menu-items                - Add to cart
//! DELETE /api/cart/menu-items                - Empty cart
//!
//! # Orders
//! GET    /api/orders                         - Orders visible to the caller
//! POST   /api/orders                         - Place order from cart
//! GET    /api/orders/{id}                    - Own order with items
//! PUT    /api/orders/{id}                    - Update status or assignment
//! PATCH  /api/orders/{id}                    - Update status or assignment
//! DELETE /api/orders/{id}                    - Delete order (manager)
//! ```
//!
//! `{group}` is `manager` or `delivery-crew`. Trailing slashes are ignored.

pub mod cart;
pub mod categories;
pub mod groups;
pub mod menu_items;
pub mod orders;
pub mod users;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    middleware,
    routing::{delete, get, post},
};
use tower::Layer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use little_lemon_core::PageRequest;

use crate::error::AppError;
use crate::middleware::{request_id_middleware, throttle_middleware};
use crate::state::AppState;

/// The router wrapped in trailing-slash normalization.
pub type App = NormalizePath<Router>;

/// Build a [`PageRequest`] from the `page` and `perpage` query parameters.
fn page_request(
    state: &AppState,
    page: Option<u32>,
    perpage: Option<u32>,
) -> Result<PageRequest, AppError> {
    let paging = state.config().paging;
    PageRequest::new(page, perpage, paging.page_size, paging.max_page_size)
        .map_err(|e| AppError::BadRequest(e.to_string()))
}

/// Create the token routes router.
pub fn token_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(users::login))
        .route("/logout", post(users::logout))
}

/// Create the `/api` routes router.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Accounts
        .route("/users", post(users::register))
        .route("/users/me", get(users::me))
        // Catalog
        .route(
            "/categories",
            get(categories::index).post(categories::create),
        )
        .route("/categories/{id}", delete(categories::destroy))
        .route(
            "/menu-items",
            get(menu_items::index).post(menu_items::create),
        )
        .route(
            "/menu-items/{id}",
            get(menu_items::show)
                .put(menu_items::replace)
                .patch(menu_items::update)
                .delete(menu_items::destroy),
        )
        .route("/menu-items/featured/{id}", post(menu_items::feature))
        // Rosters
        .route(
            "/groups/{group}/users",
            get(groups::index).post(groups::add),
        )
        .route(
            "/groups/{group}/users/{username}",
            delete(groups::remove),
        )
        // Cart
        .route(
            "/cart/menu-items",
            get(cart::index).post(cart::add).delete(cart::clear),
        )
        // Orders
        .route("/orders", get(orders::index).post(orders::create))
        .route(
            "/orders/{id}",
            get(orders::show)
                .put(orders::update)
                .patch(orders::update)
                .delete(orders::destroy),
        )
}

/// Create the full router with state, tracing and throttling applied.
pub fn router(state: AppState) -> Router {
    let throttled = Router::new()
        .nest("/api", api_routes())
        .nest("/token", token_routes())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            throttle_middleware,
        ));

    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(throttled)
        .layer(middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        user_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
}

/// Wrap a router so `/api/orders/` and `/api/orders` route the same.
pub fn normalize(router: Router) -> App {
    NormalizePathLayer::trim_trailing_slash().layer(router)
}

/// The complete application, as served and as driven by tests.
pub fn app(state: AppState) -> App {
    normalize(router(state))
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the store is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.store().ping().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "store not ready");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
