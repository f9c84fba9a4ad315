//! Menu catalog types.

use serde::Serialize;

use little_lemon_core::{CategoryId, MenuItemId, Price, Slug, Title};

/// A menu category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Category {
    pub id: CategoryId,
    pub slug: Slug,
    pub title: Title,
}

/// A category to be created.
#[derive(Debug, Clone)]
pub struct NewCategory {
    pub slug: Slug,
    pub title: Title,
}

/// A dish or drink on the menu, with its category inlined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuItem {
    pub id: MenuItemId,
    pub title: Title,
    pub price: Price,
    pub featured: bool,
    pub category: Category,
}

/// A menu item to be created.
#[derive(Debug, Clone)]
pub struct NewMenuItem {
    pub title: Title,
    pub price: Price,
    pub featured: bool,
    pub category_id: CategoryId,
}

/// Changes to apply to a menu item. `None` leaves a field unchanged.
///
/// Setting `featured` to `true` clears the flag on every other item in the
/// same transaction.
#[derive(Debug, Clone, Default)]
pub struct MenuItemChanges {
    pub title: Option<Title>,
    pub price: Option<Price>,
    pub featured: Option<bool>,
    pub category_id: Option<CategoryId>,
}
