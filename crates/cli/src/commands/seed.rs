//! Seed the catalog with demo data.
//!
//! Creates three categories and a small menu. Rows that already exist are
//! left alone, so the command can be re-run after a partial seed. The
//! `Manager` and `Delivery Crew` groups come from the migrations.

use rust_decimal::Decimal;
use tracing::info;

use little_lemon_api::db::{CatalogStore, PgStore, RepositoryError};
use little_lemon_api::models::{NewCategory, NewMenuItem};
use little_lemon_core::{Price, Slug, Title};

use super::{CliError, connect};

/// `(slug, title)`
const CATEGORIES: [(&str, &str); 3] = [
    ("main", "Main"),
    ("appetizer", "Appetizer"),
    ("drink", "Drink"),
];

/// `(title, price in cents, category slug)`
const MENU: [(&str, i64, &str); 6] = [
    ("Beef Pasta", 600, "main"),
    ("Cheese Sticks", 500, "appetizer"),
    ("Negroni", 500, "drink"),
    ("Bruschetta", 1000, "appetizer"),
    ("Greek Salad", 750, "main"),
    ("Bellini", 500, "drink"),
];

fn seed_error(e: impl ToString) -> CliError {
    CliError::Seed(e.to_string())
}

/// Insert the demo categories and menu items.
pub async fn run() -> Result<(), CliError> {
    let store = PgStore::new(connect().await?);

    let mut created_categories = 0;
    for (slug, title) in CATEGORIES {
        let category = NewCategory {
            slug: Slug::parse(slug).map_err(seed_error)?,
            title: Title::parse(title).map_err(seed_error)?,
        };
        match store.create_category(&category).await {
            Ok(_) => created_categories += 1,
            Err(RepositoryError::Conflict(_)) => info!(slug, "category exists, skipping"),
            Err(e) => return Err(e.into()),
        }
    }

    let categories = store.list_categories().await?;
    let mut created_items = 0;
    for (title, cents, slug) in MENU {
        let category = categories
            .iter()
            .find(|c| c.slug.as_str() == slug)
            .ok_or_else(|| seed_error(format!("category {slug} missing")))?;
        let item = NewMenuItem {
            title: Title::parse(title).map_err(seed_error)?,
            price: Price::menu_price(Decimal::new(cents, 2)).map_err(seed_error)?,
            featured: false,
            category_id: category.id,
        };
        match store.create_menu_item(&item).await {
            Ok(_) => created_items += 1,
            Err(RepositoryError::Conflict(_)) => info!(title, "menu item exists, skipping"),
            Err(e) => return Err(e.into()),
        }
    }

    info!("Seeding complete!");
    info!("  Categories created: {created_categories}");
    info!("  Menu items created: {created_items}");
    Ok(())
}
