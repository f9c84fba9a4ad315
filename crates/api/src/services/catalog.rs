//! Categories, menu items and the featured item.

use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::instrument;

use little_lemon_core::{
    Action, CategoryId, MenuItemId, MenuQuery, Page, PageRequest, Price, Slug, Title, escape_html,
};

use super::{ServiceError, authorize};
use crate::db::Store;
use crate::models::{Category, Identity, MenuItem, MenuItemChanges, NewCategory, NewMenuItem};

/// A complete menu item, as sent on create and full update.
#[derive(Debug, Clone, Deserialize)]
pub struct MenuItemInput {
    pub title: String,
    pub price: Decimal,
    #[serde(default)]
    pub featured: bool,
    pub category_id: CategoryId,
}

/// A partial menu item update. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MenuItemPatch {
    pub title: Option<String>,
    pub price: Option<Decimal>,
    pub featured: Option<bool>,
    pub category_id: Option<CategoryId>,
}

impl From<MenuItemInput> for MenuItemPatch {
    fn from(input: MenuItemInput) -> Self {
        Self {
            title: Some(input.title),
            price: Some(input.price),
            featured: Some(input.featured),
            category_id: Some(input.category_id),
        }
    }
}

fn parse_title(title: &str) -> Result<Title, ServiceError> {
    Title::parse(title).map_err(ServiceError::validation)
}

fn parse_price(price: Decimal) -> Result<Price, ServiceError> {
    Price::menu_price(price).map_err(ServiceError::validation)
}

/// Catalog operations.
pub struct CatalogService<'a> {
    store: &'a dyn Store,
}

impl<'a> CatalogService<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// All categories.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the store fails.
    pub async fn list_categories(
        &self,
        identity: Option<&Identity>,
    ) -> Result<Vec<Category>, ServiceError> {
        authorize(identity, Action::BrowseMenu)?;
        Ok(self.store.list_categories().await?)
    }

    /// Create a category. Manager only.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a bad slug or title and a conflict if
    /// either is already used.
    #[instrument(skip(self, identity))]
    pub async fn create_category(
        &self,
        identity: Option<&Identity>,
        slug: &str,
        title: &str,
    ) -> Result<Category, ServiceError> {
        authorize(identity, Action::ManageMenu)?;
        let category = NewCategory {
            slug: Slug::parse(slug).map_err(ServiceError::validation)?,
            title: parse_title(title)?,
        };
        Ok(self.store.create_category(&category).await?)
    }

    /// Delete a category. Manager only.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if it does not exist and a conflict while menu
    /// items still use it.
    #[instrument(skip(self, identity))]
    pub async fn delete_category(
        &self,
        identity: Option<&Identity>,
        id: CategoryId,
    ) -> Result<(), ServiceError> {
        authorize(identity, Action::ManageMenu)?;
        if self.store.delete_category(id).await? {
            Ok(())
        } else {
            Err(ServiceError::NotFound("category"))
        }
    }

    /// One page of menu items matching `query`.
    ///
    /// Text filters are escaped the same way stored titles are, so a filter
    /// for `Mac & Cheese` finds the item created with that title.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the store fails.
    pub async fn list_menu_items(
        &self,
        identity: Option<&Identity>,
        mut query: MenuQuery,
        page: PageRequest,
    ) -> Result<Page<MenuItem>, ServiceError> {
        authorize(identity, Action::BrowseMenu)?;
        query.title = query.title.as_deref().map(|t| escape_html(t.trim()));
        query.category = query.category.as_deref().map(escape_html);
        query.search = query.search.as_deref().map(escape_html);
        Ok(self.store.list_menu_items(&query, page).await?)
    }

    /// One menu item.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if it does not exist.
    pub async fn get_menu_item(
        &self,
        identity: Option<&Identity>,
        id: MenuItemId,
    ) -> Result<MenuItem, ServiceError> {
        authorize(identity, Action::BrowseMenu)?;
        self.store
            .get_menu_item(id)
            .await?
            .ok_or(ServiceError::NotFound("menu item"))
    }

    /// Create a menu item. Manager only.
    ///
    /// A featured item replaces the current featured item.
    ///
    /// # Errors
    ///
    /// Returns a validation error for bad input or an unknown category, and a
    /// conflict if the title is already used in that category.
    #[instrument(skip(self, identity, input), fields(title = %input.title))]
    pub async fn create_menu_item(
        &self,
        identity: Option<&Identity>,
        input: MenuItemInput,
    ) -> Result<MenuItem, ServiceError> {
        authorize(identity, Action::ManageMenu)?;
        let item = NewMenuItem {
            title: parse_title(&input.title)?,
            price: parse_price(input.price)?,
            featured: input.featured,
            category_id: input.category_id,
        };
        self.require_category(item.category_id).await?;

        Ok(self.store.create_menu_item(&item).await?)
    }

    /// Update a menu item. Manager only.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the item does not exist, a validation error for
    /// bad input or an unknown category, and a conflict on a duplicate title.
    #[instrument(skip(self, identity, patch))]
    pub async fn update_menu_item(
        &self,
        identity: Option<&Identity>,
        id: MenuItemId,
        patch: MenuItemPatch,
    ) -> Result<MenuItem, ServiceError> {
        authorize(identity, Action::ManageMenu)?;
        let changes = MenuItemChanges {
            title: patch.title.as_deref().map(parse_title).transpose()?,
            price: patch.price.map(parse_price).transpose()?,
            featured: patch.featured,
            category_id: patch.category_id,
        };
        if let Some(category) = changes.category_id {
            self.require_category(category).await?;
        }

        self.store
            .update_menu_item(id, &changes)
            .await?
            .ok_or(ServiceError::NotFound("menu item"))
    }

    /// Delete a menu item and remove it from every cart. Manager only.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if it does not exist and a conflict if it appears
    /// in placed orders.
    #[instrument(skip(self, identity))]
    pub async fn delete_menu_item(
        &self,
        identity: Option<&Identity>,
        id: MenuItemId,
    ) -> Result<(), ServiceError> {
        authorize(identity, Action::ManageMenu)?;
        if self.store.delete_menu_item(id).await? {
            Ok(())
        } else {
            Err(ServiceError::NotFound("menu item"))
        }
    }

    /// Make `id` the item of the day. Manager only.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the item does not exist.
    #[instrument(skip(self, identity))]
    pub async fn set_featured(
        &self,
        identity: Option<&Identity>,
        id: MenuItemId,
    ) -> Result<MenuItem, ServiceError> {
        authorize(identity, Action::ManageMenu)?;
        let item = self
            .store
            .set_featured(id)
            .await?
            .ok_or(ServiceError::NotFound("menu item"))?;

        tracing::info!(menu_item_id = %id, "featured item changed");
        Ok(item)
    }

    async fn require_category(&self, id: CategoryId) -> Result<(), ServiceError> {
        match self.store.get_category(id).await? {
            Some(_) => Ok(()),
            None => Err(ServiceError::Validation(format!(
                "category {id} does not exist"
            ))),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use little_lemon_core::{Group, UserId, Username};

    use super::*;
    use crate::db::MemoryStore;
    use crate::models::User;

    fn manager() -> Identity {
        Identity {
            user: User {
                id: UserId::new(1),
                username: Username::parse("woody").unwrap(),
                email: None,
            },
            groups: vec![Group::Manager],
        }
    }

    fn customer() -> Identity {
        Identity {
            user: User {
                id: UserId::new(2),
                username: Username::parse("buzz").unwrap(),
                email: None,
            },
            groups: vec![],
        }
    }

    #[tokio::test]
    async fn test_only_managers_write() {
        let store = MemoryStore::new();
        let catalog = CatalogService::new(&store);

        assert!(matches!(
            catalog.create_category(None, "main", "Main").await,
            Err(ServiceError::Unauthenticated)
        ));
        assert!(matches!(
            catalog
                .create_category(Some(&customer()), "main", "Main")
                .await,
            Err(ServiceError::Forbidden)
        ));
        catalog
            .create_category(Some(&manager()), "main", "Main")
            .await
            .unwrap();
        assert_eq!(catalog.list_categories(None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_category_is_invalid() {
        let store = MemoryStore::new();
        let catalog = CatalogService::new(&store);
        let input = MenuItemInput {
            title: "Pasta".into(),
            price: Decimal::new(600, 2),
            featured: false,
            category_id: CategoryId::new(99),
        };

        assert!(matches!(
            catalog.create_menu_item(Some(&manager()), input).await,
            Err(ServiceError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_title_filter_matches_escaped_title() {
        let store = MemoryStore::new();
        let catalog = CatalogService::new(&store);
        let category = catalog
            .create_category(Some(&manager()), "main", "Main")
            .await
            .unwrap();
        catalog
            .create_menu_item(
                Some(&manager()),
                MenuItemInput {
                    title: "Mac & Cheese".into(),
                    price: Decimal::new(850, 2),
                    featured: false,
                    category_id: category.id,
                },
            )
            .await
            .unwrap();

        let query = MenuQuery {
            title: Some("Mac & Cheese".into()),
            ..MenuQuery::default()
        };
        let page = catalog
            .list_menu_items(None, query, PageRequest::first(10))
            .await
            .unwrap();
        assert_eq!(page.count, 1);
    }

    #[tokio::test]
    async fn test_negative_price_is_invalid() {
        let store = MemoryStore::new();
        let catalog = CatalogService::new(&store);
        let category = catalog
            .create_category(Some(&manager()), "main", "Main")
            .await
            .unwrap();
        let input = MenuItemInput {
            title: "Pasta".into(),
            price: Decimal::new(-100, 2),
            featured: false,
            category_id: category.id,
        };

        assert!(matches!(
            catalog.create_menu_item(Some(&manager()), input).await,
            Err(ServiceError::Validation(_))
        ));
    }
}
