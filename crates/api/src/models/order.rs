//! Order types.

use chrono::NaiveDate;
use serde::Serialize;

use little_lemon_core::{OrderId, OrderItemId, OrderStatus, Price, Quantity, UserId};

use super::{MenuItem, User};

/// A placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Order {
    pub id: OrderId,
    /// Customer who placed the order.
    pub user: User,
    /// Staff member delivering it, once assigned.
    pub delivery_crew: Option<User>,
    /// `false` until delivered.
    pub status: OrderStatus,
    pub total: Price,
    pub date: NaiveDate,
}

/// One line of a placed order. Prices are frozen at order time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order: OrderId,
    pub menuitem: MenuItem,
    pub quantity: Quantity,
    pub unit_price: Price,
    pub price: Price,
}

/// An order together with its items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

/// The fields of an order that updates are authorized against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderState {
    pub status: OrderStatus,
    pub delivery_crew: Option<UserId>,
}

impl From<&Order> for OrderState {
    fn from(order: &Order) -> Self {
        Self {
            status: order.status,
            delivery_crew: order.delivery_crew.as_ref().map(|crew| crew.id),
        }
    }
}

/// Already-authorized changes to write to an order.
///
/// The write only happens if the order is still in the `expected` state it
/// was authorized against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderUpdate {
    pub expected: OrderState,
    pub status: Option<OrderStatus>,
    pub delivery_crew: Option<UserId>,
}
