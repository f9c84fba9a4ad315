//! Role-based authorization.
//!
//! Every permission check is a pure function of the caller's [`Role`], the
//! action being attempted and, for orders, who owns or is assigned the order.
//! A refusal is returned as a [`Decision::Deny`] value; it is up to the HTTP
//! layer to turn that into a 401 or 403.

use serde::Deserialize;

use crate::types::{OrderStatus, Role, UserId};

/// Something a caller may attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Read categories and menu items.
    BrowseMenu,
    /// Create, update or delete categories and menu items, or set the featured item.
    ManageMenu,
    /// List, add or remove members of the Manager and Delivery Crew groups.
    ManageRoster,
    /// Read, add to or clear one's own cart.
    UseCart,
    /// Turn one's own cart into an order.
    PlaceOrder,
    /// List orders (scope depends on role, see [`order_scope`]).
    ListOrders,
    /// Read a single order with its items.
    ViewOrder,
    /// Change an order's status or delivery assignment (further checked by
    /// [`authorize_order_update`]).
    UpdateOrder,
    /// Delete an order.
    DeleteOrder,
    /// Read one's own account.
    ViewProfile,
}

/// Why a caller was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Denial {
    /// No credentials were presented.
    Unauthenticated,
    /// Credentials were presented but the role may not do this.
    Forbidden,
}

/// Outcome of a permission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Decision {
    /// The caller may proceed.
    Allow,
    /// The caller may not proceed.
    Deny(Denial),
}

impl Decision {
    /// Whether the caller may proceed.
    #[must_use]
    pub const fn is_allowed(self) -> bool {
        matches!(self, Self::Allow)
    }

    /// Convert into a `Result` so callers can use `?`.
    ///
    /// # Errors
    ///
    /// Returns the [`Denial`] if the decision is a refusal.
    pub const fn into_result(self) -> Result<(), Denial> {
        match self {
            Self::Allow => Ok(()),
            Self::Deny(denial) => Err(denial),
        }
    }

    const fn refuse(role: Role) -> Self {
        if role.is_authenticated() {
            Self::Deny(Denial::Forbidden)
        } else {
            Self::Deny(Denial::Unauthenticated)
        }
    }
}

/// Decide whether `role` may perform `action`.
#[must_use]
pub const fn authorize(role: Role, action: Action) -> Decision {
    match action {
        Action::BrowseMenu => Decision::Allow,
        Action::ManageMenu | Action::ManageRoster | Action::DeleteOrder => {
            if role.is_manager() {
                Decision::Allow
            } else {
                Decision::refuse(role)
            }
        }
        Action::UseCart
        | Action::PlaceOrder
        | Action::ListOrders
        | Action::ViewOrder
        | Action::UpdateOrder
        | Action::ViewProfile => {
            if role.is_authenticated() {
                Decision::Allow
            } else {
                Decision::Deny(Denial::Unauthenticated)
            }
        }
    }
}

/// Which orders a caller sees when listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderScope {
    /// Every order.
    All,
    /// Orders whose delivery crew is this user.
    AssignedTo(UserId),
    /// Orders placed by this user.
    PlacedBy(UserId),
}

impl OrderScope {
    /// Whether an order with the given owner and assignee falls in this scope.
    #[must_use]
    pub fn contains(self, owner: UserId, delivery_crew: Option<UserId>) -> bool {
        match self {
            Self::All => true,
            Self::AssignedTo(crew) => delivery_crew == Some(crew),
            Self::PlacedBy(user) => owner == user,
        }
    }
}

/// The listing scope for an authenticated caller.
///
/// Managers see every order, delivery crew see the orders assigned to them,
/// and everyone else sees the orders they placed.
#[must_use]
pub const fn order_scope(role: Role, caller: UserId) -> OrderScope {
    match role {
        Role::Manager => OrderScope::All,
        Role::DeliveryCrew => OrderScope::AssignedTo(caller),
        Role::Customer | Role::Anonymous => OrderScope::PlacedBy(caller),
    }
}

/// A requested change to an existing order.
///
/// Absent fields are left as they are.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct OrderPatch {
    /// New delivery status.
    #[serde(default)]
    pub status: Option<OrderStatus>,
    /// User to assign as delivery crew.
    #[serde(default, rename = "delivery_crew_id")]
    pub delivery_crew: Option<UserId>,
}

impl OrderPatch {
    /// Whether the patch changes nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.status.is_none() && self.delivery_crew.is_none()
    }
}

/// Decide whether `caller` (acting as `role`) may apply `patch` to an order
/// currently assigned to `assigned_crew`.
///
/// - Managers may change the status and the delivery assignment.
/// - Delivery crew may change only the status, and only on orders assigned
///   to them.
/// - Customers may not change orders at all.
#[must_use]
pub fn authorize_order_update(
    role: Role,
    caller: UserId,
    assigned_crew: Option<UserId>,
    patch: &OrderPatch,
) -> Decision {
    match role {
        Role::Anonymous => Decision::Deny(Denial::Unauthenticated),
        Role::Customer => Decision::Deny(Denial::Forbidden),
        Role::Manager => Decision::Allow,
        Role::DeliveryCrew => {
            if patch.delivery_crew.is_some() || assigned_crew != Some(caller) {
                Decision::Deny(Denial::Forbidden)
            } else {
                Decision::Allow
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CALLER: UserId = UserId::new(2);
    const OTHER: UserId = UserId::new(3);

    fn mark_delivered() -> OrderPatch {
        OrderPatch {
            status: Some(OrderStatus::Delivered),
            delivery_crew: None,
        }
    }

    fn assign(crew: UserId) -> OrderPatch {
        OrderPatch {
            status: None,
            delivery_crew: Some(crew),
        }
    }

    #[test]
    fn test_menu_reads_are_public() {
        for role in [Role::Anonymous, Role::Customer, Role::DeliveryCrew, Role::Manager] {
            assert_eq!(authorize(role, Action::BrowseMenu), Decision::Allow);
        }
    }

    #[test]
    fn test_manager_only_actions() {
        for action in [Action::ManageMenu, Action::ManageRoster, Action::DeleteOrder] {
            assert_eq!(authorize(Role::Manager, action), Decision::Allow);
            assert_eq!(
                authorize(Role::Anonymous, action),
                Decision::Deny(Denial::Unauthenticated)
            );
            assert_eq!(
                authorize(Role::Customer, action),
                Decision::Deny(Denial::Forbidden)
            );
            assert_eq!(
                authorize(Role::DeliveryCrew, action),
                Decision::Deny(Denial::Forbidden)
            );
        }
    }

    #[test]
    fn test_cart_and_orders_need_login() {
        for action in [
            Action::UseCart,
            Action::PlaceOrder,
            Action::ListOrders,
            Action::ViewOrder,
            Action::UpdateOrder,
        ] {
            assert!(authorize(Role::Customer, action).is_allowed());
            assert_eq!(
                authorize(Role::Anonymous, action).into_result(),
                Err(Denial::Unauthenticated)
            );
        }
    }

    #[test]
    fn test_order_scope() {
        assert_eq!(order_scope(Role::Manager, CALLER), OrderScope::All);
        assert_eq!(
            order_scope(Role::DeliveryCrew, CALLER),
            OrderScope::AssignedTo(CALLER)
        );
        assert_eq!(
            order_scope(Role::Customer, CALLER),
            OrderScope::PlacedBy(CALLER)
        );
    }

    #[test]
    fn test_scope_contains() {
        assert!(OrderScope::All.contains(OTHER, None));
        assert!(OrderScope::AssignedTo(CALLER).contains(OTHER, Some(CALLER)));
        assert!(!OrderScope::AssignedTo(CALLER).contains(CALLER, None));
        assert!(OrderScope::PlacedBy(CALLER).contains(CALLER, Some(OTHER)));
        assert!(!OrderScope::PlacedBy(CALLER).contains(OTHER, Some(CALLER)));
    }

    #[test]
    fn test_customer_cannot_assign_or_deliver() {
        for patch in [mark_delivered(), assign(OTHER)] {
            assert_eq!(
                authorize_order_update(Role::Customer, CALLER, Some(CALLER), &patch),
                Decision::Deny(Denial::Forbidden)
            );
        }
    }

    #[test]
    fn test_assigned_crew_can_mark_delivered() {
        let decision =
            authorize_order_update(Role::DeliveryCrew, CALLER, Some(CALLER), &mark_delivered());
        assert_eq!(decision, Decision::Allow);
    }

    #[test]
    fn test_unassigned_crew_cannot_mark_delivered() {
        assert_eq!(
            authorize_order_update(Role::DeliveryCrew, CALLER, Some(OTHER), &mark_delivered()),
            Decision::Deny(Denial::Forbidden)
        );
        assert_eq!(
            authorize_order_update(Role::DeliveryCrew, CALLER, None, &mark_delivered()),
            Decision::Deny(Denial::Forbidden)
        );
    }

    #[test]
    fn test_crew_cannot_reassign() {
        assert_eq!(
            authorize_order_update(Role::DeliveryCrew, CALLER, Some(CALLER), &assign(OTHER)),
            Decision::Deny(Denial::Forbidden)
        );
    }

    #[test]
    fn test_manager_can_assign_and_deliver() {
        let both = OrderPatch {
            status: Some(OrderStatus::Delivered),
            delivery_crew: Some(OTHER),
        };
        assert!(authorize_order_update(Role::Manager, CALLER, None, &both).is_allowed());
    }

    #[test]
    fn test_anonymous_update_is_unauthenticated() {
        assert_eq!(
            authorize_order_update(Role::Anonymous, CALLER, None, &mark_delivered()),
            Decision::Deny(Denial::Unauthenticated)
        );
    }
}
