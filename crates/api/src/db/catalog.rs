//! `PostgreSQL` implementation of [`CatalogStore`].

use async_trait::async_trait;
use sqlx::{PgExecutor, Postgres, QueryBuilder};

use little_lemon_core::{CategoryId, MenuField, MenuItemId, MenuQuery, Page, PageRequest, Slug, Title};

use super::{
    CatalogStore, MENU_ITEM_COLUMNS, MenuItemRow, PgStore, RepositoryError, count_to_u64,
    map_constraint,
};
use crate::models::{Category, MenuItem, MenuItemChanges, NewCategory, NewMenuItem};

#[derive(Debug, sqlx::FromRow)]
struct CategoryRow {
    id: CategoryId,
    slug: Slug,
    title: Title,
}

impl From<CategoryRow> for Category {
    fn from(r: CategoryRow) -> Self {
        Self {
            id: r.id,
            slug: r.slug,
            title: r.title,
        }
    }
}

/// Build an `ILIKE` pattern matching `s` anywhere, with wildcards escaped.
fn contains_pattern(s: &str) -> String {
    let escaped = s
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

fn push_menu_filters(qb: &mut QueryBuilder<'_, Postgres>, query: &MenuQuery) {
    if let Some(category) = &query.category {
        qb.push(" AND c.title ILIKE ")
            .push_bind(contains_pattern(category));
    }
    if let Some(title) = &query.title {
        qb.push(" AND m.title = ").push_bind(title.clone());
    }
    if let Some(featured) = query.featured {
        qb.push(" AND m.featured = ").push_bind(featured);
    }
    for term in query.search_terms() {
        let pattern = contains_pattern(term);
        qb.push(" AND (m.title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR c.title ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

fn menu_order_by(query: &MenuQuery) -> String {
    query.ordering.map_or_else(
        || "m.id ASC".to_owned(),
        |ordering| {
            let column = match ordering.field {
                MenuField::Title => "m.title",
                MenuField::Price => "m.price",
                MenuField::CategoryTitle => "c.title",
            };
            format!("{column} {}, m.id ASC", ordering.direction.as_sql())
        },
    )
}

/// Fetch one menu item with its category.
pub(crate) async fn fetch_menu_item<'e, E>(
    executor: E,
    id: MenuItemId,
) -> Result<Option<MenuItem>, RepositoryError>
where
    E: PgExecutor<'e>,
{
    let sql = format!(
        "SELECT {MENU_ITEM_COLUMNS} FROM menu_items m \
         JOIN categories c ON c.id = m.category_id WHERE m.id = $1"
    );
    let row = sqlx::query_as::<_, MenuItemRow>(&sql)
        .bind(id)
        .fetch_optional(executor)
        .await?;
    Ok(row.map(Into::into))
}

/// Clear the featured flag on every item except `keep`.
async fn clear_featured<'e, E>(executor: E, keep: Option<MenuItemId>) -> Result<(), RepositoryError>
where
    E: PgExecutor<'e>,
{
    sqlx::query("UPDATE menu_items SET featured = FALSE WHERE featured AND id IS DISTINCT FROM $1")
        .bind(keep)
        .execute(executor)
        .await?;
    Ok(())
}

const FEATURED_CONFLICT: &str = "another item was featured concurrently";

#[async_trait]
impl CatalogStore for PgStore {
    async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let rows = sqlx::query_as::<_, CategoryRow>(
            "SELECT id, slug, title FROM categories ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn get_category(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            "SELECT id, slug, title FROM categories WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn create_category(&self, category: &NewCategory) -> Result<Category, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            r"
            INSERT INTO categories (slug, title)
            VALUES ($1, $2)
            RETURNING id, slug, title
            ",
        )
        .bind(&category.slug)
        .bind(&category.title)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_constraint(e, "a category with this slug or title already exists"))?;

        Ok(row.into())
    }

    async fn delete_category(&self, id: CategoryId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_constraint(e, "category is still used by menu items"))?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_menu_items(
        &self,
        query: &MenuQuery,
        page: PageRequest,
    ) -> Result<Page<MenuItem>, RepositoryError> {
        let mut select = QueryBuilder::<Postgres>::new(format!(
            "SELECT {MENU_ITEM_COLUMNS} FROM menu_items m \
             JOIN categories c ON c.id = m.category_id WHERE TRUE"
        ));
        push_menu_filters(&mut select, query);
        select
            .push(" ORDER BY ")
            .push(menu_order_by(query))
            .push(" LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());

        let rows = select
            .build_query_as::<MenuItemRow>()
            .fetch_all(&self.pool)
            .await?;

        let mut count = QueryBuilder::<Postgres>::new(
            "SELECT COUNT(*) FROM menu_items m JOIN categories c ON c.id = m.category_id WHERE TRUE",
        );
        push_menu_filters(&mut count, query);
        let total: i64 = count
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        Ok(Page::new(
            rows.into_iter().map(Into::into).collect(),
            count_to_u64(total)?,
            page,
        ))
    }

    async fn get_menu_item(&self, id: MenuItemId) -> Result<Option<MenuItem>, RepositoryError> {
        fetch_menu_item(&self.pool, id).await
    }

    async fn create_menu_item(&self, item: &NewMenuItem) -> Result<MenuItem, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        if item.featured {
            clear_featured(&mut *tx, None).await?;
        }

        let id: MenuItemId = sqlx::query_scalar(
            r"
            INSERT INTO menu_items (title, price, featured, category_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            ",
        )
        .bind(&item.title)
        .bind(item.price)
        .bind(item.featured)
        .bind(item.category_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            map_constraint(
                e,
                "menu item title already used in this category, or category does not exist",
            )
        })?;

        let created = fetch_menu_item(&mut *tx, id)
            .await?
            .ok_or(RepositoryError::NotFound)?;
        tx.commit().await?;

        Ok(created)
    }

    async fn update_menu_item(
        &self,
        id: MenuItemId,
        changes: &MenuItemChanges,
    ) -> Result<Option<MenuItem>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let exists: Option<MenuItemId> =
            sqlx::query_scalar("SELECT id FROM menu_items WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        if exists.is_none() {
            return Ok(None);
        }

        if changes.featured == Some(true) {
            clear_featured(&mut *tx, Some(id)).await?;
        }

        sqlx::query(
            r"
            UPDATE menu_items
            SET title = COALESCE($2, title),
                price = COALESCE($3, price),
                featured = COALESCE($4, featured),
                category_id = COALESCE($5, category_id)
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(changes.title.as_ref())
        .bind(changes.price)
        .bind(changes.featured)
        .bind(changes.category_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            map_constraint(
                e,
                "menu item title already used in this category, or category does not exist",
            )
        })?;

        let updated = fetch_menu_item(&mut *tx, id).await?;
        tx.commit().await?;

        Ok(updated)
    }

    async fn delete_menu_item(&self, id: MenuItemId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM menu_items WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_constraint(e, "menu item appears in placed orders"))?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_featured(&self, id: MenuItemId) -> Result<Option<MenuItem>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let exists: Option<MenuItemId> =
            sqlx::query_scalar("SELECT id FROM menu_items WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        if exists.is_none() {
            return Ok(None);
        }

        // Clear first so the single-featured index never sees two rows.
        clear_featured(&mut *tx, Some(id))
            .await
            .map_err(|e| match e {
                RepositoryError::Database(db) => map_constraint(db, FEATURED_CONFLICT),
                other => other,
            })?;
        sqlx::query("UPDATE menu_items SET featured = TRUE WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_constraint(e, FEATURED_CONFLICT))?;

        let featured = fetch_menu_item(&mut *tx, id).await?;
        tx.commit().await?;

        Ok(featured)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("main"), "%main%");
        assert_eq!(contains_pattern("50%_off"), "%50\\%\\_off%");
    }

    #[test]
    fn test_menu_order_by() {
        let mut query = MenuQuery::default();
        assert_eq!(menu_order_by(&query), "m.id ASC");

        query.ordering = "-category__title".parse().ok();
        assert_eq!(menu_order_by(&query), "c.title DESC, m.id ASC");
    }

    #[test]
    fn test_filters_render_placeholders() {
        let query = MenuQuery {
            category: Some("main".into()),
            featured: Some(true),
            search: Some("beef pasta".into()),
            ..MenuQuery::default()
        };
        let mut qb = QueryBuilder::<Postgres>::new("SELECT 1 WHERE TRUE");
        push_menu_filters(&mut qb, &query);
        let sql = qb.sql();

        assert!(sql.contains("c.title ILIKE $1"));
        assert!(sql.contains("m.featured = $2"));
        assert!(sql.contains("(m.title ILIKE $3 OR c.title ILIKE $4)"));
        assert!(sql.contains("(m.title ILIKE $5 OR c.title ILIKE $6)"));
    }
}
