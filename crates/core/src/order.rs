//! Turning a cart into an order.
//!
//! Both store implementations read the caller's cart lines (under lock), hand
//! them to [`OrderDraft::from_lines`], and persist whatever it returns. The
//! draft copies each line's quantity and unit price as they were in the cart;
//! menu prices are never re-read at this point.

use chrono::NaiveDate;

use crate::types::{MenuItemId, Price, Quantity, line_price};

/// One priced line, as held in a cart or an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineSnapshot {
    /// The menu item ordered.
    pub menuitem_id: MenuItemId,
    /// How many.
    pub quantity: Quantity,
    /// Price of one unit at the time it was added to the cart.
    pub unit_price: Price,
}

impl LineSnapshot {
    /// `unit_price × quantity`.
    #[must_use]
    pub fn price(&self) -> Price {
        line_price(self.unit_price, self.quantity)
    }
}

/// An order item ready to be inserted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DraftItem {
    /// The menu item ordered.
    pub menuitem_id: MenuItemId,
    /// How many.
    pub quantity: Quantity,
    /// Price of one unit.
    pub unit_price: Price,
    /// `unit_price × quantity`.
    pub price: Price,
}

/// An order ready to be inserted, computed from a cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderDraft {
    /// Sum of the item prices.
    pub total: Price,
    /// Date the order is placed.
    pub date: NaiveDate,
    /// One item per cart line, in cart order.
    pub items: Vec<DraftItem>,
}

impl OrderDraft {
    /// Build a draft from the cart lines.
    ///
    /// Returns `None` when `lines` is empty; an empty cart cannot be ordered.
    #[must_use]
    pub fn from_lines(lines: &[LineSnapshot], date: NaiveDate) -> Option<Self> {
        if lines.is_empty() {
            return None;
        }

        let items: Vec<DraftItem> = lines
            .iter()
            .map(|line| DraftItem {
                menuitem_id: line.menuitem_id,
                quantity: line.quantity,
                unit_price: line.unit_price,
                price: line.price(),
            })
            .collect();
        let total = items.iter().map(|item| item.price).sum();

        Some(Self { total, date, items })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    fn line(id: i32, qty: i64, unit: &str) -> LineSnapshot {
        LineSnapshot {
            menuitem_id: MenuItemId::new(id),
            quantity: Quantity::new(qty).unwrap(),
            unit_price: Price::new(unit.parse::<Decimal>().unwrap()).unwrap(),
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 17).unwrap()
    }

    #[test]
    fn test_empty_cart_yields_no_draft() {
        assert!(OrderDraft::from_lines(&[], today()).is_none());
    }

    #[test]
    fn test_single_line() {
        let draft = OrderDraft::from_lines(&[line(4, 2, "10.00")], today()).unwrap();

        assert_eq!(draft.total.to_string(), "20.00");
        assert_eq!(draft.date, today());
        assert_eq!(draft.items.len(), 1);
        let item = draft.items.first().unwrap();
        assert_eq!(item.menuitem_id, MenuItemId::new(4));
        assert_eq!(item.quantity.get(), 2);
        assert_eq!(item.unit_price.to_string(), "10.00");
        assert_eq!(item.price.to_string(), "20.00");
    }

    #[test]
    fn test_total_is_sum_of_line_prices() {
        let lines = [line(1, 2, "6.00"), line(2, 2, "5.00"), line(5, 1, "7.50")];
        let draft = OrderDraft::from_lines(&lines, today()).unwrap();

        assert_eq!(draft.items.len(), 3);
        let expected: Price = lines.iter().map(LineSnapshot::price).sum();
        assert_eq!(draft.total, expected);
        assert_eq!(draft.total.to_string(), "29.50");
    }

    #[test]
    fn test_items_copy_cart_values() {
        let lines = [line(3, 4, "5.00"), line(6, 1, "5.00")];
        let draft = OrderDraft::from_lines(&lines, today()).unwrap();

        for (item, line) in draft.items.iter().zip(lines.iter()) {
            assert_eq!(item.menuitem_id, line.menuitem_id);
            assert_eq!(item.quantity, line.quantity);
            assert_eq!(item.unit_price, line.unit_price);
            assert_eq!(item.price, line.price());
        }
    }
}
