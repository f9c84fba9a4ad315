//! `PostgreSQL` implementation of [`CartStore`].

use async_trait::async_trait;
use sqlx::PgExecutor;

use little_lemon_core::{
    CartLineId, MenuItemId, Page, PageRequest, Price, Quantity, UserId, line_price,
};

use super::{
    CartStore, MENU_ITEM_COLUMNS, MenuItemRow, PgStore, RepositoryError, count_to_u64,
    map_constraint,
};
use crate::models::CartLine;

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct CartLineRow {
    line_id: CartLineId,
    user_id: UserId,
    quantity: Quantity,
    unit_price: Price,
    line_price: Price,
    #[sqlx(flatten)]
    menuitem: MenuItemRow,
}

impl From<CartLineRow> for CartLine {
    fn from(r: CartLineRow) -> Self {
        Self {
            id: r.line_id,
            user: r.user_id,
            menuitem: r.menuitem.into(),
            quantity: r.quantity,
            unit_price: r.unit_price,
            price: r.line_price,
        }
    }
}

fn cart_select(filter: &str) -> String {
    format!(
        "SELECT l.id AS line_id, l.user_id, l.quantity, l.unit_price, l.price AS line_price, \
         {MENU_ITEM_COLUMNS} \
         FROM cart_lines l \
         JOIN menu_items m ON m.id = l.menuitem_id \
         JOIN categories c ON c.id = m.category_id \
         WHERE {filter}"
    )
}

async fn fetch_line<'e, E>(executor: E, id: CartLineId) -> Result<CartLine, RepositoryError>
where
    E: PgExecutor<'e>,
{
    let sql = cart_select("l.id = $1");
    let row = sqlx::query_as::<_, CartLineRow>(&sql)
        .bind(id)
        .fetch_optional(executor)
        .await?
        .ok_or(RepositoryError::NotFound)?;
    Ok(row.into())
}

#[async_trait]
impl CartStore for PgStore {
    async fn list_cart(
        &self,
        user: UserId,
        page: PageRequest,
    ) -> Result<Page<CartLine>, RepositoryError> {
        let sql = format!("{} ORDER BY l.id LIMIT $2 OFFSET $3", cart_select("l.user_id = $1"));
        let rows = sqlx::query_as::<_, CartLineRow>(&sql)
            .bind(user)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM cart_lines WHERE user_id = $1")
            .bind(user)
            .fetch_one(&self.pool)
            .await?;

        Ok(Page::new(
            rows.into_iter().map(Into::into).collect(),
            count_to_u64(count)?,
            page,
        ))
    }

    async fn add_to_cart(
        &self,
        user: UserId,
        menuitem: MenuItemId,
        quantity: Quantity,
    ) -> Result<CartLine, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let unit_price: Price = sqlx::query_scalar("SELECT price FROM menu_items WHERE id = $1")
            .bind(menuitem)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        let existing: Option<(CartLineId, Quantity)> = sqlx::query_as(
            r"
            SELECT id, quantity FROM cart_lines
            WHERE user_id = $1 AND menuitem_id = $2
            FOR UPDATE
            ",
        )
        .bind(user)
        .bind(menuitem)
        .fetch_optional(&mut *tx)
        .await?;

        let line_id: CartLineId = if let Some((line_id, current)) = existing {
            let merged = current
                .checked_add(quantity)
                .map_err(|e| RepositoryError::Conflict(e.to_string()))?;
            sqlx::query(
                "UPDATE cart_lines SET quantity = $2, unit_price = $3, price = $4 WHERE id = $1",
            )
            .bind(line_id)
            .bind(merged)
            .bind(unit_price)
            .bind(line_price(unit_price, merged))
            .execute(&mut *tx)
            .await?;
            line_id
        } else {
            sqlx::query_scalar(
                r"
                INSERT INTO cart_lines (user_id, menuitem_id, quantity, unit_price, price)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING id
                ",
            )
            .bind(user)
            .bind(menuitem)
            .bind(quantity)
            .bind(unit_price)
            .bind(line_price(unit_price, quantity))
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| map_constraint(e, "item was added to this cart concurrently"))?
        };

        let line = fetch_line(&mut *tx, line_id).await?;
        tx.commit().await?;

        Ok(line)
    }

    async fn clear_cart(&self, user: UserId) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM cart_lines WHERE user_id = $1")
            .bind(user)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cart_select_aliases_colliding_columns() {
        let sql = cart_select("l.user_id = $1");
        assert!(sql.contains("l.id AS line_id"));
        assert!(sql.contains("l.price AS line_price"));
        assert!(sql.ends_with("WHERE l.user_id = $1"));
    }
}
