//! Integration tests for Little Lemon.
//!
//! Tests drive the full router (middleware included) in-process with
//! `tower::ServiceExt::oneshot`, over the in-memory store. No database or
//! running server is needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p little-lemon-integration-tests
//! ```
//!
//! # Fixture
//!
//! [`TestContext::new`] seeds:
//!
//! | User      | Groups        |
//! |-----------|---------------|
//! | `Woody`   | Manager       |
//! | `Slinky`  | Delivery Crew |
//! | `Rex`     | Delivery Crew |
//! | `Buzz`    | -             |
//! | `Bo_Peep` | -             |
//!
//! Each has the password [`PASSWORD`] and an already-issued token, see
//! [`token`]. The menu holds six items in three categories; Bruschetta is
//! menu item 4 at 10.00.

#![allow(clippy::missing_panics_doc, clippy::unwrap_used, clippy::indexing_slicing)]

use std::num::NonZeroU32;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{HeaderMap, Method, Request, StatusCode, header};
use rust_decimal::Decimal;
use serde_json::Value;
use tower::ServiceExt;

use little_lemon_api::config::{ApiConfig, ThrottleConfig};
use little_lemon_api::db::{CatalogStore, MemoryStore, UserStore};
use little_lemon_api::models::{NewCategory, NewMenuItem, NewUser};
use little_lemon_api::routes;
use little_lemon_api::services::auth::{hash_password, token_digest};
use little_lemon_api::state::AppState;
use little_lemon_core::{CategoryId, Group, Price, Slug, Title, Username};

/// Password of every fixture user.
pub const PASSWORD: &str = "lemon-squeezy";

/// Fixture users and their groups.
pub const USERS: [(&str, &[Group]); 5] = [
    ("Woody", &[Group::Manager]),
    ("Slinky", &[Group::DeliveryCrew]),
    ("Rex", &[Group::DeliveryCrew]),
    ("Buzz", &[]),
    ("Bo_Peep", &[]),
];

/// `(slug, title)`
const CATEGORIES: [(&str, &str); 3] = [
    ("main", "Main"),
    ("appetizer", "Appetizer"),
    ("drink", "Drink"),
];

/// `(title, price in cents, category index)`
const MENU: [(&str, i64, usize); 6] = [
    ("Beef Pasta", 600, 0),
    ("Cheese Sticks", 500, 1),
    ("Negroni", 500, 2),
    ("Bruschetta", 1000, 1),
    ("Greek Salad", 750, 0),
    ("Bellini", 500, 2),
];

/// The token issued to a fixture user.
#[must_use]
pub fn token(username: &str) -> String {
    format!("{}-test-token", username.to_lowercase())
}

/// Configuration used by [`TestContext::new`]: four entries per page and
/// throttles high enough never to trip.
#[must_use]
pub fn test_config() -> ApiConfig {
    let mut config = ApiConfig::in_memory();
    config.paging.page_size = 4;
    config.throttle = ThrottleConfig {
        anon_per_minute: NonZeroU32::new(10_000).unwrap(),
        user_per_minute: NonZeroU32::new(10_000).unwrap(),
    };
    config
}

/// A decoded response.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    /// JSON body, or `Null` for an empty body.
    pub body: Value,
}

impl TestResponse {
    /// The `results` of a paged listing.
    #[must_use]
    pub fn results(&self) -> &Vec<Value> {
        self.body["results"].as_array().unwrap()
    }

    /// The error message of a failed request.
    #[must_use]
    pub fn message(&self) -> &str {
        self.body["message"].as_str().unwrap_or_default()
    }
}

/// The application over a seeded in-memory store.
pub struct TestContext {
    app: routes::App,
    pub store: Arc<MemoryStore>,
}

impl TestContext {
    /// A context with the standard fixture and [`test_config`].
    pub async fn new() -> Self {
        Self::with_config(test_config()).await
    }

    /// A context with the standard fixture and custom configuration.
    pub async fn with_config(config: ApiConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        seed(&store).await;

        let state = AppState::new(config, store.clone());
        Self {
            app: routes::app(state),
            store,
        }
    }

    /// Send a request, as `user` if given, with an optional JSON body.
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        user: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let token = user.map(token);
        self.send_with_token(method, uri, token.as_deref(), body).await
    }

    /// Send a request with a raw `Authorization: Token` value.
    pub async fn send_with_token(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Token {token}"));
        }
        let request = match body {
            Some(body) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => request.body(Body::empty()),
        }
        .unwrap();

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str, user: Option<&str>) -> TestResponse {
        self.send(Method::GET, uri, user, None).await
    }

    pub async fn post(&self, uri: &str, user: Option<&str>, body: Value) -> TestResponse {
        self.send(Method::POST, uri, user, Some(body)).await
    }

    pub async fn put(&self, uri: &str, user: Option<&str>, body: Value) -> TestResponse {
        self.send(Method::PUT, uri, user, Some(body)).await
    }

    pub async fn patch(&self, uri: &str, user: Option<&str>, body: Value) -> TestResponse {
        self.send(Method::PATCH, uri, user, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, user: Option<&str>) -> TestResponse {
        self.send(Method::DELETE, uri, user, None).await
    }

    /// Put `quantity` of menu item `id` in `user`'s cart.
    pub async fn add_to_cart(&self, user: &str, id: i32, quantity: i64) -> TestResponse {
        self.post(
            "/api/cart/menu-items",
            Some(user),
            serde_json::json!({ "menuitem_id": id, "quantity": quantity }),
        )
        .await
    }
}

async fn seed(store: &MemoryStore) {
    // One hash for everyone keeps fixture setup fast
    let password_hash = hash_password(PASSWORD).unwrap();

    for (name, groups) in USERS {
        let user = store
            .create_user(&NewUser {
                username: Username::parse(name).unwrap(),
                email: Some(format!("{}@littlelemon.test", name.to_lowercase())),
                password_hash: password_hash.clone(),
            })
            .await
            .unwrap();
        for group in groups {
            store.add_to_group(user.id, *group).await.unwrap();
        }
        store
            .store_token(user.id, &token_digest(&token(name)))
            .await
            .unwrap();
    }

    let mut category_ids: Vec<CategoryId> = Vec::new();
    for (slug, title) in CATEGORIES {
        let category = store
            .create_category(&NewCategory {
                slug: Slug::parse(slug).unwrap(),
                title: Title::parse(title).unwrap(),
            })
            .await
            .unwrap();
        category_ids.push(category.id);
    }

    for (title, cents, category) in MENU {
        store
            .create_menu_item(&NewMenuItem {
                title: Title::parse(title).unwrap(),
                price: Price::menu_price(Decimal::new(cents, 2)).unwrap(),
                featured: false,
                category_id: category_ids[category],
            })
            .await
            .unwrap();
    }
}
