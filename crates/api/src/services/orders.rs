//! Order placement and the delivery workflow.
//!
//! ```text
//!   cart ──place──> Pending ──mark delivered──> Delivered
//!                      │
//!                      └── assign delivery crew (manager)
//! ```

use chrono::Utc;
use tracing::instrument;

use little_lemon_core::{
    Action, Group, OrderId, OrderPatch, Page, PageRequest, UserId, policy,
};

use super::{ServiceError, authorize_user};
use crate::db::Store;
use crate::models::{Identity, Order, OrderDetail, OrderState, OrderUpdate};

/// How often an update is re-checked when the order changes underneath it.
const UPDATE_ATTEMPTS: usize = 3;

/// Order operations.
pub struct OrderService<'a> {
    store: &'a dyn Store,
}

impl<'a> OrderService<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// Turn the caller's cart into an order dated today.
    ///
    /// # Errors
    ///
    /// Returns `EmptyCart` if there is nothing to order. Nothing is written
    /// in that case.
    #[instrument(skip_all, fields(user_id = %identity.map_or(0, |i| i.id().as_i32())))]
    pub async fn place(&self, identity: Option<&Identity>) -> Result<OrderDetail, ServiceError> {
        let (identity, _) = authorize_user(identity, Action::PlaceOrder)?;
        let today = Utc::now().date_naive();

        let detail = self
            .store
            .place_order(identity.id(), today)
            .await?
            .ok_or(ServiceError::EmptyCart)?;

        tracing::info!(
            order_id = %detail.order.id,
            total = %detail.order.total,
            items = detail.items.len(),
            "order placed"
        );
        Ok(detail)
    }

    /// One page of the orders visible to the caller.
    ///
    /// Managers see every order, delivery crew the orders assigned to them,
    /// customers their own.
    ///
    /// # Errors
    ///
    /// Returns `Unauthenticated` for anonymous callers.
    pub async fn list(
        &self,
        identity: Option<&Identity>,
        page: PageRequest,
    ) -> Result<Page<Order>, ServiceError> {
        let (identity, role) = authorize_user(identity, Action::ListOrders)?;
        let scope = policy::order_scope(role, identity.id());
        Ok(self.store.list_orders(scope, page).await?)
    }

    /// One of the caller's own orders with its items.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the order does not exist or belongs to someone
    /// else.
    pub async fn get(
        &self,
        identity: Option<&Identity>,
        id: OrderId,
    ) -> Result<OrderDetail, ServiceError> {
        let (identity, _) = authorize_user(identity, Action::ViewOrder)?;
        let order = self
            .store
            .get_order(id)
            .await?
            .filter(|order| order.user.id == identity.id())
            .ok_or(ServiceError::NotFound("order"))?;
        let items = self.store.order_items(id).await?;

        Ok(OrderDetail { order, items })
    }

    /// Change an order's status or delivery assignment.
    ///
    /// Managers may do both. Delivery crew may only change the status of
    /// orders assigned to them. Delivered orders stay delivered.
    ///
    /// # Errors
    ///
    /// Returns `Forbidden` if the caller may not make this change, a
    /// validation error for an empty patch, a reopen, or an assignee outside
    /// the delivery crew, `NotFound` if the order does not exist, and
    /// `Conflict` if the order keeps changing while the update is checked.
    #[instrument(skip(self, identity))]
    pub async fn update(
        &self,
        identity: Option<&Identity>,
        id: OrderId,
        patch: OrderPatch,
    ) -> Result<Order, ServiceError> {
        let (identity, role) = authorize_user(identity, Action::UpdateOrder)?;
        if patch.is_empty() {
            return Err(ServiceError::validation(
                "provide status or delivery_crew_id",
            ));
        }

        // The store only writes if the order is still in the state checked
        // here. Otherwise the checks run again against the fresh order.
        for _ in 0..UPDATE_ATTEMPTS {
            let order = self
                .store
                .get_order(id)
                .await?
                .ok_or(ServiceError::NotFound("order"))?;
            let expected = OrderState::from(&order);
            policy::authorize_order_update(role, identity.id(), expected.delivery_crew, &patch)
                .into_result()?;

            let status = patch
                .status
                .map(|to| order.status.transition(to))
                .transpose()
                .map_err(ServiceError::validation)?;
            if let Some(crew) = patch.delivery_crew {
                self.require_delivery_crew(crew).await?;
            }

            let update = OrderUpdate {
                expected,
                status,
                delivery_crew: patch.delivery_crew,
            };
            if let Some(updated) = self.store.update_order(id, update).await? {
                tracing::info!(
                    order_id = %id,
                    delivered = updated.status.is_delivered(),
                    "order updated"
                );
                return Ok(updated);
            }
            tracing::debug!(order_id = %id, "order changed during update, checking again");
        }

        Err(ServiceError::Conflict(
            "order is being changed by another request".to_owned(),
        ))
    }

    /// Delete an order and its items. Manager only.
    ///
    /// # Errors
    ///
    /// Returns `Forbidden` for non-managers and `NotFound` if the order does
    /// not exist.
    #[instrument(skip(self, identity))]
    pub async fn delete(
        &self,
        identity: Option<&Identity>,
        id: OrderId,
    ) -> Result<(), ServiceError> {
        authorize_user(identity, Action::DeleteOrder)?;
        if self.store.delete_order(id).await? {
            Ok(())
        } else {
            Err(ServiceError::NotFound("order"))
        }
    }

    async fn require_delivery_crew(&self, user: UserId) -> Result<(), ServiceError> {
        let exists = self.store.get_user(user).await?.is_some();
        if exists
            && self
                .store
                .user_groups(user)
                .await?
                .contains(&Group::DeliveryCrew)
        {
            Ok(())
        } else {
            Err(ServiceError::Validation(format!(
                "user {user} is not in the delivery crew"
            )))
        }
    }
}
