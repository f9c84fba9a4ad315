//! Cart types.

use serde::Serialize;

use little_lemon_core::{CartLineId, LineSnapshot, Price, Quantity, UserId};

use super::MenuItem;

/// One line in a user's cart.
///
/// `unit_price` is the menu price at the time the item was (last) added;
/// `price` is always `unit_price × quantity`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartLine {
    pub id: CartLineId,
    pub user: UserId,
    pub menuitem: MenuItem,
    pub quantity: Quantity,
    pub unit_price: Price,
    pub price: Price,
}

impl CartLine {
    /// The priced part of the line, as used to build an order.
    #[must_use]
    pub const fn snapshot(&self) -> LineSnapshot {
        LineSnapshot {
            menuitem_id: self.menuitem.id,
            quantity: self.quantity,
            unit_price: self.unit_price,
        }
    }
}
