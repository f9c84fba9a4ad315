//! The caller's cart.

use tracing::instrument;

use little_lemon_core::{Action, MenuItemId, Page, PageRequest, Quantity};

use super::{ServiceError, authorize_user};
use crate::db::{RepositoryError, Store};
use crate::models::{CartLine, Identity};

/// Cart operations, always scoped to the calling user.
pub struct CartService<'a> {
    store: &'a dyn Store,
}

impl<'a> CartService<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// One page of the caller's cart lines.
    ///
    /// # Errors
    ///
    /// Returns `Unauthenticated` for anonymous callers.
    pub async fn list(
        &self,
        identity: Option<&Identity>,
        page: PageRequest,
    ) -> Result<Page<CartLine>, ServiceError> {
        let (identity, _) = authorize_user(identity, Action::UseCart)?;
        Ok(self.store.list_cart(identity.id(), page).await?)
    }

    /// Add `quantity` of a menu item at its current price.
    ///
    /// Adding an item already in the cart merges the quantities and refreshes
    /// the unit price.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the quantity is below one or the menu
    /// item does not exist.
    #[instrument(skip(self, identity), fields(user_id))]
    pub async fn add(
        &self,
        identity: Option<&Identity>,
        menuitem: MenuItemId,
        quantity: i64,
    ) -> Result<CartLine, ServiceError> {
        let (identity, _) = authorize_user(identity, Action::UseCart)?;
        tracing::Span::current().record("user_id", identity.id().as_i32());
        let quantity = Quantity::new(quantity).map_err(ServiceError::validation)?;

        self.store
            .add_to_cart(identity.id(), menuitem, quantity)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => {
                    ServiceError::Validation(format!("menu item {menuitem} does not exist"))
                }
                other => other.into(),
            })
    }

    /// Empty the caller's cart. Emptying an empty cart succeeds.
    ///
    /// # Errors
    ///
    /// Returns `Unauthenticated` for anonymous callers.
    #[instrument(skip_all)]
    pub async fn clear(&self, identity: Option<&Identity>) -> Result<u64, ServiceError> {
        let (identity, _) = authorize_user(identity, Action::UseCart)?;
        Ok(self.store.clear_cart(identity.id()).await?)
    }
}
