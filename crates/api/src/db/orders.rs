//! `PostgreSQL` implementation of [`OrderStore`].

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{PgExecutor, Postgres, QueryBuilder};

use little_lemon_core::{
    CartLineId, LineSnapshot, MenuItemId, OrderDraft, OrderId, OrderItemId, OrderScope, OrderStatus, Page,
    PageRequest, Price, Quantity, UserId, Username,
};

use super::{
    MENU_ITEM_COLUMNS, MenuItemRow, OrderStore, PgStore, RepositoryError, count_to_u64,
    map_constraint,
};
use crate::models::{Order, OrderDetail, OrderItem, OrderUpdate, User};

const ORDER_SELECT: &str = "SELECT o.id, o.status, o.total, o.date, \
     u.id AS user_id, u.username AS user_username, u.email AS user_email, \
     d.id AS crew_id, d.username AS crew_username, d.email AS crew_email \
     FROM orders o \
     JOIN users u ON u.id = o.user_id \
     LEFT JOIN users d ON d.id = o.delivery_crew_id";

/// Removes the cart lines an order was placed from, by id.
const DELETE_ORDERED_LINES: &str = "DELETE FROM cart_lines WHERE id = ANY($1)";

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    status: OrderStatus,
    total: Price,
    date: NaiveDate,
    user_id: UserId,
    user_username: Username,
    user_email: Option<String>,
    crew_id: Option<UserId>,
    crew_username: Option<Username>,
    crew_email: Option<String>,
}

impl From<OrderRow> for Order {
    fn from(r: OrderRow) -> Self {
        let delivery_crew = match (r.crew_id, r.crew_username) {
            (Some(id), Some(username)) => Some(User {
                id,
                username,
                email: r.crew_email,
            }),
            _ => None,
        };

        Self {
            id: r.id,
            user: User {
                id: r.user_id,
                username: r.user_username,
                email: r.user_email,
            },
            delivery_crew,
            status: r.status,
            total: r.total,
            date: r.date,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    item_id: OrderItemId,
    order_id: OrderId,
    quantity: Quantity,
    unit_price: Price,
    item_price: Price,
    #[sqlx(flatten)]
    menuitem: MenuItemRow,
}

impl From<OrderItemRow> for OrderItem {
    fn from(r: OrderItemRow) -> Self {
        Self {
            id: r.item_id,
            order: r.order_id,
            menuitem: r.menuitem.into(),
            quantity: r.quantity,
            unit_price: r.unit_price,
            price: r.item_price,
        }
    }
}

fn push_scope(qb: &mut QueryBuilder<'_, Postgres>, scope: OrderScope) {
    match scope {
        OrderScope::All => {
            qb.push(" WHERE TRUE");
        }
        OrderScope::AssignedTo(crew) => {
            qb.push(" WHERE o.delivery_crew_id = ").push_bind(crew);
        }
        OrderScope::PlacedBy(user) => {
            qb.push(" WHERE o.user_id = ").push_bind(user);
        }
    }
}

async fn fetch_order<'e, E>(executor: E, id: OrderId) -> Result<Option<Order>, RepositoryError>
where
    E: PgExecutor<'e>,
{
    let sql = format!("{ORDER_SELECT} WHERE o.id = $1");
    let row = sqlx::query_as::<_, OrderRow>(&sql)
        .bind(id)
        .fetch_optional(executor)
        .await?;
    Ok(row.map(Into::into))
}

async fn fetch_items<'e, E>(executor: E, id: OrderId) -> Result<Vec<OrderItem>, RepositoryError>
where
    E: PgExecutor<'e>,
{
    let sql = format!(
        "SELECT i.id AS item_id, i.order_id, i.quantity, i.unit_price, i.price AS item_price, \
         {MENU_ITEM_COLUMNS} \
         FROM order_items i \
         JOIN menu_items m ON m.id = i.menuitem_id \
         JOIN categories c ON c.id = m.category_id \
         WHERE i.order_id = $1 \
         ORDER BY i.id"
    );
    let rows = sqlx::query_as::<_, OrderItemRow>(&sql)
        .bind(id)
        .fetch_all(executor)
        .await?;
    Ok(rows.into_iter().map(Into::into).collect())
}

#[async_trait]
impl OrderStore for PgStore {
    async fn place_order(
        &self,
        user: UserId,
        date: NaiveDate,
    ) -> Result<Option<OrderDetail>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        // Row locks serialize concurrent placements for the same user. The
        // second caller re-reads after the first commits and sees no lines.
        let lines: Vec<(CartLineId, MenuItemId, Quantity, Price)> = sqlx::query_as(
            r"
            SELECT id, menuitem_id, quantity, unit_price
            FROM cart_lines
            WHERE user_id = $1
            ORDER BY id
            FOR UPDATE
            ",
        )
        .bind(user)
        .fetch_all(&mut *tx)
        .await?;

        let (line_ids, snapshots): (Vec<i32>, Vec<LineSnapshot>) = lines
            .into_iter()
            .map(|(id, menuitem_id, quantity, unit_price)| {
                let snapshot = LineSnapshot {
                    menuitem_id,
                    quantity,
                    unit_price,
                };
                (id.as_i32(), snapshot)
            })
            .unzip();

        let Some(draft) = OrderDraft::from_lines(&snapshots, date) else {
            return Ok(None);
        };

        let order_id: OrderId = sqlx::query_scalar(
            r"
            INSERT INTO orders (user_id, status, total, date)
            VALUES ($1, FALSE, $2, $3)
            RETURNING id
            ",
        )
        .bind(user)
        .bind(draft.total)
        .bind(draft.date)
        .fetch_one(&mut *tx)
        .await?;

        let mut insert = QueryBuilder::<Postgres>::new(
            "INSERT INTO order_items (order_id, menuitem_id, quantity, unit_price, price) ",
        );
        insert.push_values(&draft.items, |mut row, item| {
            row.push_bind(order_id)
                .push_bind(item.menuitem_id)
                .push_bind(item.quantity)
                .push_bind(item.unit_price)
                .push_bind(item.price);
        });
        insert
            .build()
            .execute(&mut *tx)
            .await
            .map_err(|e| map_constraint(e, "menu item was removed while ordering"))?;

        // Only the lines that were ordered. A line added after the lock was
        // taken stays in the cart.
        sqlx::query(DELETE_ORDERED_LINES)
            .bind(&line_ids)
            .execute(&mut *tx)
            .await?;

        let order = fetch_order(&mut *tx, order_id)
            .await?
            .ok_or(RepositoryError::NotFound)?;
        let items = fetch_items(&mut *tx, order_id).await?;
        tx.commit().await?;

        Ok(Some(OrderDetail { order, items }))
    }

    async fn list_orders(
        &self,
        scope: OrderScope,
        page: PageRequest,
    ) -> Result<Page<Order>, RepositoryError> {
        let mut select = QueryBuilder::<Postgres>::new(ORDER_SELECT);
        push_scope(&mut select, scope);
        select
            .push(" ORDER BY o.id LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());
        let rows = select
            .build_query_as::<OrderRow>()
            .fetch_all(&self.pool)
            .await?;

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM orders o");
        push_scope(&mut count, scope);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        Ok(Page::new(
            rows.into_iter().map(Into::into).collect(),
            count_to_u64(total)?,
            page,
        ))
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        fetch_order(&self.pool, id).await
    }

    async fn order_items(&self, id: OrderId) -> Result<Vec<OrderItem>, RepositoryError> {
        fetch_items(&self.pool, id).await
    }

    async fn update_order(
        &self,
        id: OrderId,
        update: OrderUpdate,
    ) -> Result<Option<Order>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r"
            UPDATE orders
            SET status = COALESCE($2, status),
                delivery_crew_id = COALESCE($3, delivery_crew_id)
            WHERE id = $1
              AND status = $4
              AND delivery_crew_id IS NOT DISTINCT FROM $5
            ",
        )
        .bind(id)
        .bind(update.status)
        .bind(update.delivery_crew)
        .bind(update.expected.status)
        .bind(update.expected.delivery_crew)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_constraint(e, "delivery crew user does not exist"))?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        let order = fetch_order(&mut *tx, id).await?;
        tx.commit().await?;

        Ok(order)
    }

    async fn delete_order(&self, id: OrderId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
