//! Persistence for the ordering API.
//!
//! # Store contract
//!
//! Services never talk to a database directly. They go through the [`Store`]
//! trait object held in [`crate::state::AppState`], which bundles four
//! narrower traits:
//!
//! - [`UserStore`] - users, group membership and auth tokens
//! - [`CatalogStore`] - categories and menu items, including the featured item
//! - [`CartStore`] - per-user cart lines
//! - [`OrderStore`] - order placement, listing and updates
//!
//! Two implementations exist: [`PgStore`] (production, `PostgreSQL`) and
//! [`MemoryStore`] (development and tests). Multi-row mutations (placing an
//! order, toggling the featured item) are atomic in both.
//!
//! # Database
//!
//! ## Tables
//!
//! - `users`, `user_groups`, `auth_tokens` - identity and login
//! - `categories`, `menu_items` - catalog
//! - `cart_lines` - carts
//! - `orders`, `order_items` - placed orders
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p little-lemon-cli -- migrate
//! ```

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use little_lemon_core::{
    CategoryId, Group, MenuItemId, MenuQuery, OrderId, OrderScope, Page, PageRequest, Price,
    Quantity, RosterOrdering, Slug, Title, UserId, Username,
};

use crate::models::{
    CartLine, Category, Identity, MenuItem, MenuItemChanges, NewCategory, NewMenuItem, NewUser,
    Order, OrderDetail, OrderItem, OrderUpdate, User,
};

pub mod cart;
pub mod catalog;
pub mod memory;
pub mod orders;
pub mod users;

pub use memory::MemoryStore;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate title, category still in use).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Map unique and foreign-key violations to [`RepositoryError::Conflict`].
pub(crate) fn map_constraint(e: sqlx::Error, conflict: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && (db_err.is_unique_violation() || db_err.is_foreign_key_violation())
    {
        return RepositoryError::Conflict(conflict.to_owned());
    }
    RepositoryError::Database(e)
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

// =============================================================================
// Store traits
// =============================================================================

/// Users, group membership and login tokens.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Create a user.
    ///
    /// Fails with `Conflict` if the username is taken.
    async fn create_user(&self, user: &NewUser) -> Result<User, RepositoryError>;

    /// Look up a user by ID.
    async fn get_user(&self, id: UserId) -> Result<Option<User>, RepositoryError>;

    /// Look up a user by username.
    async fn get_user_by_username(
        &self,
        username: &Username,
    ) -> Result<Option<User>, RepositoryError>;

    /// Look up a user and their password hash for login.
    async fn get_password_hash(
        &self,
        username: &Username,
    ) -> Result<Option<(User, String)>, RepositoryError>;

    /// Groups the user belongs to.
    async fn user_groups(&self, id: UserId) -> Result<Vec<Group>, RepositoryError>;

    /// Add a user to a group. Adding an existing member is a no-op.
    async fn add_to_group(&self, id: UserId, group: Group) -> Result<(), RepositoryError>;

    /// Remove a user from a group. Returns whether they were a member.
    async fn remove_from_group(&self, id: UserId, group: Group) -> Result<bool, RepositoryError>;

    /// List the members of a group.
    async fn list_group_members(
        &self,
        group: Group,
        ordering: Option<RosterOrdering>,
        page: PageRequest,
    ) -> Result<Page<User>, RepositoryError>;

    /// Record a token digest for a user.
    async fn store_token(&self, id: UserId, digest: &str) -> Result<(), RepositoryError>;

    /// Resolve a token digest to the identity it belongs to.
    async fn identify_token(&self, digest: &str) -> Result<Option<Identity>, RepositoryError>;

    /// Revoke a token. Returns whether it existed.
    async fn revoke_token(&self, digest: &str) -> Result<bool, RepositoryError>;
}

/// Categories and menu items.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// All categories, by ID.
    async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError>;

    /// Look up a category.
    async fn get_category(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError>;

    /// Create a category. Fails with `Conflict` if the title or slug is taken.
    async fn create_category(&self, category: &NewCategory) -> Result<Category, RepositoryError>;

    /// Delete a category. Fails with `Conflict` while menu items reference it.
    async fn delete_category(&self, id: CategoryId) -> Result<bool, RepositoryError>;

    /// List menu items matching `query`.
    async fn list_menu_items(
        &self,
        query: &MenuQuery,
        page: PageRequest,
    ) -> Result<Page<MenuItem>, RepositoryError>;

    /// Look up a menu item.
    async fn get_menu_item(&self, id: MenuItemId) -> Result<Option<MenuItem>, RepositoryError>;

    /// Create a menu item.
    ///
    /// Fails with `Conflict` if (title, category) is taken or the category
    /// does not exist.
    async fn create_menu_item(&self, item: &NewMenuItem) -> Result<MenuItem, RepositoryError>;

    /// Apply `changes` to a menu item. Returns `None` if it does not exist.
    async fn update_menu_item(
        &self,
        id: MenuItemId,
        changes: &MenuItemChanges,
    ) -> Result<Option<MenuItem>, RepositoryError>;

    /// Delete a menu item and any cart lines holding it.
    ///
    /// Fails with `Conflict` while order items reference it.
    async fn delete_menu_item(&self, id: MenuItemId) -> Result<bool, RepositoryError>;

    /// Make `id` the only featured item, atomically.
    ///
    /// Returns `None` (and changes nothing) if the item does not exist.
    async fn set_featured(&self, id: MenuItemId) -> Result<Option<MenuItem>, RepositoryError>;
}

/// Per-user carts.
#[async_trait]
pub trait CartStore: Send + Sync {
    /// The user's cart lines, oldest first.
    async fn list_cart(
        &self,
        user: UserId,
        page: PageRequest,
    ) -> Result<Page<CartLine>, RepositoryError>;

    /// Add `quantity` of a menu item to the user's cart at its current price.
    ///
    /// If the item is already in the cart the quantities are merged and the
    /// unit price is refreshed. Fails with `NotFound` if the menu item does
    /// not exist.
    async fn add_to_cart(
        &self,
        user: UserId,
        menuitem: MenuItemId,
        quantity: Quantity,
    ) -> Result<CartLine, RepositoryError>;

    /// Delete every line in the user's cart. Returns how many were removed.
    async fn clear_cart(&self, user: UserId) -> Result<u64, RepositoryError>;
}

/// Orders.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Turn the user's cart into an order dated `date`, emptying the cart.
    ///
    /// Returns `None` if the cart is empty. Concurrent calls for the same user
    /// are serialized; at most one of them sees the cart's lines.
    async fn place_order(
        &self,
        user: UserId,
        date: NaiveDate,
    ) -> Result<Option<OrderDetail>, RepositoryError>;

    /// List orders within `scope`, by ID.
    async fn list_orders(
        &self,
        scope: OrderScope,
        page: PageRequest,
    ) -> Result<Page<Order>, RepositoryError>;

    /// Look up an order.
    async fn get_order(&self, id: OrderId) -> Result<Option<Order>, RepositoryError>;

    /// Items of an order.
    async fn order_items(&self, id: OrderId) -> Result<Vec<OrderItem>, RepositoryError>;

    /// Write an already-authorized update.
    ///
    /// Returns `None` if the order does not exist or is no longer in
    /// `update.expected`; the caller re-reads and re-checks.
    async fn update_order(
        &self,
        id: OrderId,
        update: OrderUpdate,
    ) -> Result<Option<Order>, RepositoryError>;

    /// Delete an order and its items.
    async fn delete_order(&self, id: OrderId) -> Result<bool, RepositoryError>;
}

/// Everything the API needs from persistence.
#[async_trait]
pub trait Store: UserStore + CatalogStore + CartStore + OrderStore {
    /// Check that the backend is reachable.
    async fn ping(&self) -> Result<(), RepositoryError>;
}

// =============================================================================
// PostgreSQL
// =============================================================================

/// `PostgreSQL`-backed store.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Wrap a connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Convert a row count to the `u64` used by [`Page`].
pub(crate) fn count_to_u64(count: i64) -> Result<u64, RepositoryError> {
    u64::try_from(count)
        .map_err(|_| RepositoryError::DataCorruption(format!("negative row count {count}")))
}

/// Shared `SELECT` list for a menu item joined with its category.
pub(crate) const MENU_ITEM_COLUMNS: &str = "m.id, m.title, m.price, m.featured, \
     c.id AS category_id, c.slug AS category_slug, c.title AS category_title";

/// Row type for [`MENU_ITEM_COLUMNS`].
///
/// Text columns decode straight into the validated newtypes; they were
/// validated (and escaped) on the way in.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct MenuItemRow {
    pub id: MenuItemId,
    pub title: Title,
    pub price: Price,
    pub featured: bool,
    pub category_id: CategoryId,
    pub category_slug: Slug,
    pub category_title: Title,
}

impl From<MenuItemRow> for MenuItem {
    fn from(r: MenuItemRow) -> Self {
        Self {
            id: r.id,
            title: r.title,
            price: r.price,
            featured: r.featured,
            category: Category {
                id: r.category_id,
                slug: r.category_slug,
                title: r.category_title,
            },
        }
    }
}
