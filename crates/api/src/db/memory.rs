//! In-process [`Store`] for development and tests.
//!
//! All tables live behind one mutex. Each operation takes the lock once and
//! does all of its reads and writes under it, which gives the same atomicity
//! the `PostgreSQL` store gets from transactions. Constraint behavior mirrors
//! the migrations: duplicate keys and dangling references are `Conflict`s,
//! deleting a menu item removes its cart lines, and order items protect the
//! menu items they reference.

use std::collections::{BTreeMap, HashMap, HashSet};

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::Mutex;

use little_lemon_core::{
    CartLineId, CategoryId, Group, LineSnapshot, MenuItemId, MenuQuery, MenuSortKey, OrderDraft,
    OrderId, OrderItemId, OrderScope, OrderStatus, Page, PageRequest, Price, Quantity,
    RosterOrdering, Title, UserId, Username, line_price,
};

use super::{CartStore, CatalogStore, OrderStore, RepositoryError, Store, UserStore};
use crate::models::{
    CartLine, Category, Identity, MenuItem, MenuItemChanges, NewCategory, NewMenuItem, NewUser,
    Order, OrderDetail, OrderItem, OrderUpdate, User,
};

#[derive(Debug)]
struct UserRecord {
    user: User,
    password_hash: String,
}

#[derive(Debug, Clone)]
struct MenuItemRecord {
    title: Title,
    price: Price,
    featured: bool,
    category_id: CategoryId,
}

#[derive(Debug, Clone, Copy)]
struct LineRecord {
    user: UserId,
    menuitem: MenuItemId,
    quantity: Quantity,
    unit_price: Price,
    price: Price,
}

#[derive(Debug, Clone, Copy)]
struct OrderRecord {
    user: UserId,
    delivery_crew: Option<UserId>,
    status: OrderStatus,
    total: Price,
    date: NaiveDate,
}

#[derive(Debug, Clone, Copy)]
struct OrderItemRecord {
    order: OrderId,
    menuitem: MenuItemId,
    quantity: Quantity,
    unit_price: Price,
    price: Price,
}

/// Last ID handed out per table.
#[derive(Debug, Default)]
struct Sequences {
    user: i32,
    category: i32,
    menu_item: i32,
    cart_line: i32,
    order: i32,
    order_item: i32,
}

fn next(counter: &mut i32) -> i32 {
    *counter += 1;
    *counter
}

#[derive(Debug, Default)]
struct Tables {
    seq: Sequences,
    users: BTreeMap<UserId, UserRecord>,
    memberships: HashSet<(UserId, Group)>,
    tokens: HashMap<String, UserId>,
    categories: BTreeMap<CategoryId, Category>,
    menu_items: BTreeMap<MenuItemId, MenuItemRecord>,
    cart_lines: BTreeMap<CartLineId, LineRecord>,
    orders: BTreeMap<OrderId, OrderRecord>,
    order_items: BTreeMap<OrderItemId, OrderItemRecord>,
}

impl Tables {
    fn user(&self, id: UserId) -> Result<User, RepositoryError> {
        self.users
            .get(&id)
            .map(|r| r.user.clone())
            .ok_or_else(|| RepositoryError::DataCorruption(format!("dangling user {id}")))
    }

    fn groups_of(&self, id: UserId) -> Vec<Group> {
        Group::ALL
            .into_iter()
            .filter(|g| self.memberships.contains(&(id, *g)))
            .collect()
    }

    fn menu_item(&self, id: MenuItemId) -> Result<Option<MenuItem>, RepositoryError> {
        let Some(record) = self.menu_items.get(&id) else {
            return Ok(None);
        };
        let category = self
            .categories
            .get(&record.category_id)
            .cloned()
            .ok_or_else(|| {
                RepositoryError::DataCorruption(format!("dangling category on menu item {id}"))
            })?;

        Ok(Some(MenuItem {
            id,
            title: record.title.clone(),
            price: record.price,
            featured: record.featured,
            category,
        }))
    }

    fn existing_menu_item(&self, id: MenuItemId) -> Result<MenuItem, RepositoryError> {
        self.menu_item(id)?
            .ok_or_else(|| RepositoryError::DataCorruption(format!("dangling menu item {id}")))
    }

    fn title_taken(&self, title: &Title, category: CategoryId, except: Option<MenuItemId>) -> bool {
        self.menu_items.iter().any(|(id, item)| {
            Some(*id) != except && item.category_id == category && &item.title == title
        })
    }

    fn clear_featured(&mut self, keep: Option<MenuItemId>) {
        for (id, item) in &mut self.menu_items {
            if Some(*id) != keep {
                item.featured = false;
            }
        }
    }

    fn cart_line(&self, id: CartLineId, record: &LineRecord) -> Result<CartLine, RepositoryError> {
        Ok(CartLine {
            id,
            user: record.user,
            menuitem: self.existing_menu_item(record.menuitem)?,
            quantity: record.quantity,
            unit_price: record.unit_price,
            price: record.price,
        })
    }

    fn order(&self, id: OrderId, record: &OrderRecord) -> Result<Order, RepositoryError> {
        // Mirrors ON DELETE SET NULL: a vanished assignee reads as unassigned.
        let delivery_crew = record
            .delivery_crew
            .and_then(|crew| self.users.get(&crew))
            .map(|r| r.user.clone());

        Ok(Order {
            id,
            user: self.user(record.user)?,
            delivery_crew,
            status: record.status,
            total: record.total,
            date: record.date,
        })
    }

    fn items_of(&self, order: OrderId) -> Result<Vec<OrderItem>, RepositoryError> {
        self.order_items
            .iter()
            .filter(|(_, item)| item.order == order)
            .map(|(id, item)| {
                Ok(OrderItem {
                    id: *id,
                    order,
                    menuitem: self.existing_menu_item(item.menuitem)?,
                    quantity: item.quantity,
                    unit_price: item.unit_price,
                    price: item.price,
                })
            })
            .collect()
    }
}

fn sort_key(item: &MenuItem) -> MenuSortKey<'_> {
    MenuSortKey {
        title: item.title.as_str(),
        price: item.price.amount(),
        category_title: item.category.title.as_str(),
    }
}

/// Store that keeps everything in memory. State is lost when dropped.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, user: &NewUser) -> Result<User, RepositoryError> {
        let mut t = self.tables.lock().await;
        if t.users.values().any(|r| r.user.username == user.username) {
            return Err(RepositoryError::Conflict("username already exists".to_owned()));
        }

        let id = UserId::new(next(&mut t.seq.user));
        let created = User {
            id,
            username: user.username.clone(),
            email: user.email.clone(),
        };
        t.users.insert(
            id,
            UserRecord {
                user: created.clone(),
                password_hash: user.password_hash.clone(),
            },
        );

        Ok(created)
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let t = self.tables.lock().await;
        Ok(t.users.get(&id).map(|r| r.user.clone()))
    }

    async fn get_user_by_username(
        &self,
        username: &Username,
    ) -> Result<Option<User>, RepositoryError> {
        let t = self.tables.lock().await;
        Ok(t
            .users
            .values()
            .find(|r| &r.user.username == username)
            .map(|r| r.user.clone()))
    }

    async fn get_password_hash(
        &self,
        username: &Username,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let t = self.tables.lock().await;
        Ok(t
            .users
            .values()
            .find(|r| &r.user.username == username)
            .map(|r| (r.user.clone(), r.password_hash.clone())))
    }

    async fn user_groups(&self, id: UserId) -> Result<Vec<Group>, RepositoryError> {
        let t = self.tables.lock().await;
        Ok(t.groups_of(id))
    }

    async fn add_to_group(&self, id: UserId, group: Group) -> Result<(), RepositoryError> {
        let mut t = self.tables.lock().await;
        if !t.users.contains_key(&id) {
            return Err(RepositoryError::Conflict("user does not exist".to_owned()));
        }
        t.memberships.insert((id, group));
        Ok(())
    }

    async fn remove_from_group(&self, id: UserId, group: Group) -> Result<bool, RepositoryError> {
        let mut t = self.tables.lock().await;
        Ok(t.memberships.remove(&(id, group)))
    }

    async fn list_group_members(
        &self,
        group: Group,
        ordering: Option<RosterOrdering>,
        page: PageRequest,
    ) -> Result<Page<User>, RepositoryError> {
        let t = self.tables.lock().await;
        let mut members: Vec<User> = t
            .users
            .iter()
            .filter(|(id, _)| t.memberships.contains(&(**id, group)))
            .map(|(_, r)| r.user.clone())
            .collect();

        if let Some(RosterOrdering(direction)) = ordering {
            members.sort_by(|a, b| {
                direction
                    .apply(a.username.cmp(&b.username))
                    .then(a.id.cmp(&b.id))
            });
        }

        Ok(Page::slice(members, page))
    }

    async fn store_token(&self, id: UserId, digest: &str) -> Result<(), RepositoryError> {
        let mut t = self.tables.lock().await;
        if t.tokens.contains_key(digest) {
            return Err(RepositoryError::Conflict("token collision".to_owned()));
        }
        if !t.users.contains_key(&id) {
            return Err(RepositoryError::Conflict("user does not exist".to_owned()));
        }
        t.tokens.insert(digest.to_owned(), id);
        Ok(())
    }

    async fn identify_token(&self, digest: &str) -> Result<Option<Identity>, RepositoryError> {
        let t = self.tables.lock().await;
        let Some(id) = t.tokens.get(digest).copied() else {
            return Ok(None);
        };

        Ok(Some(Identity {
            user: t.user(id)?,
            groups: t.groups_of(id),
        }))
    }

    async fn revoke_token(&self, digest: &str) -> Result<bool, RepositoryError> {
        let mut t = self.tables.lock().await;
        Ok(t.tokens.remove(digest).is_some())
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let t = self.tables.lock().await;
        Ok(t.categories.values().cloned().collect())
    }

    async fn get_category(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError> {
        let t = self.tables.lock().await;
        Ok(t.categories.get(&id).cloned())
    }

    async fn create_category(&self, category: &NewCategory) -> Result<Category, RepositoryError> {
        let mut t = self.tables.lock().await;
        if t
            .categories
            .values()
            .any(|c| c.slug == category.slug || c.title == category.title)
        {
            return Err(RepositoryError::Conflict(
                "a category with this slug or title already exists".to_owned(),
            ));
        }

        let id = CategoryId::new(next(&mut t.seq.category));
        let created = Category {
            id,
            slug: category.slug.clone(),
            title: category.title.clone(),
        };
        t.categories.insert(id, created.clone());

        Ok(created)
    }

    async fn delete_category(&self, id: CategoryId) -> Result<bool, RepositoryError> {
        let mut t = self.tables.lock().await;
        if t.menu_items.values().any(|item| item.category_id == id) {
            return Err(RepositoryError::Conflict(
                "category is still used by menu items".to_owned(),
            ));
        }
        Ok(t.categories.remove(&id).is_some())
    }

    async fn list_menu_items(
        &self,
        query: &MenuQuery,
        page: PageRequest,
    ) -> Result<Page<MenuItem>, RepositoryError> {
        let t = self.tables.lock().await;
        let mut items = Vec::new();
        for id in t.menu_items.keys() {
            let item = t.existing_menu_item(*id)?;
            if query.matches(
                item.title.as_str(),
                item.category.title.as_str(),
                item.featured,
            ) {
                items.push(item);
            }
        }

        if let Some(ordering) = query.ordering {
            items.sort_by(|a, b| {
                ordering
                    .compare(&sort_key(a), &sort_key(b))
                    .then(a.id.cmp(&b.id))
            });
        }

        Ok(Page::slice(items, page))
    }

    async fn get_menu_item(&self, id: MenuItemId) -> Result<Option<MenuItem>, RepositoryError> {
        let t = self.tables.lock().await;
        t.menu_item(id)
    }

    async fn create_menu_item(&self, item: &NewMenuItem) -> Result<MenuItem, RepositoryError> {
        let mut t = self.tables.lock().await;
        if !t.categories.contains_key(&item.category_id)
            || t.title_taken(&item.title, item.category_id, None)
        {
            return Err(RepositoryError::Conflict(
                "menu item title already used in this category, or category does not exist"
                    .to_owned(),
            ));
        }

        if item.featured {
            t.clear_featured(None);
        }

        let id = MenuItemId::new(next(&mut t.seq.menu_item));
        t.menu_items.insert(
            id,
            MenuItemRecord {
                title: item.title.clone(),
                price: item.price,
                featured: item.featured,
                category_id: item.category_id,
            },
        );

        t.existing_menu_item(id)
    }

    async fn update_menu_item(
        &self,
        id: MenuItemId,
        changes: &MenuItemChanges,
    ) -> Result<Option<MenuItem>, RepositoryError> {
        let mut t = self.tables.lock().await;
        let Some(current) = t.menu_items.get(&id).cloned() else {
            return Ok(None);
        };

        let updated = MenuItemRecord {
            title: changes.title.clone().unwrap_or(current.title),
            price: changes.price.unwrap_or(current.price),
            featured: changes.featured.unwrap_or(current.featured),
            category_id: changes.category_id.unwrap_or(current.category_id),
        };
        if !t.categories.contains_key(&updated.category_id)
            || t.title_taken(&updated.title, updated.category_id, Some(id))
        {
            return Err(RepositoryError::Conflict(
                "menu item title already used in this category, or category does not exist"
                    .to_owned(),
            ));
        }

        if updated.featured {
            t.clear_featured(Some(id));
        }
        t.menu_items.insert(id, updated);

        t.menu_item(id)
    }

    async fn delete_menu_item(&self, id: MenuItemId) -> Result<bool, RepositoryError> {
        let mut t = self.tables.lock().await;
        if t.order_items.values().any(|item| item.menuitem == id) {
            return Err(RepositoryError::Conflict(
                "menu item appears in placed orders".to_owned(),
            ));
        }
        if t.menu_items.remove(&id).is_none() {
            return Ok(false);
        }
        t.cart_lines.retain(|_, line| line.menuitem != id);
        Ok(true)
    }

    async fn set_featured(&self, id: MenuItemId) -> Result<Option<MenuItem>, RepositoryError> {
        let mut t = self.tables.lock().await;
        if !t.menu_items.contains_key(&id) {
            return Ok(None);
        }

        t.clear_featured(Some(id));
        if let Some(item) = t.menu_items.get_mut(&id) {
            item.featured = true;
        }

        t.menu_item(id)
    }
}

#[async_trait]
impl CartStore for MemoryStore {
    async fn list_cart(
        &self,
        user: UserId,
        page: PageRequest,
    ) -> Result<Page<CartLine>, RepositoryError> {
        let t = self.tables.lock().await;
        let lines = t
            .cart_lines
            .iter()
            .filter(|(_, line)| line.user == user)
            .map(|(id, line)| t.cart_line(*id, line))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page::slice(lines, page))
    }

    async fn add_to_cart(
        &self,
        user: UserId,
        menuitem: MenuItemId,
        quantity: Quantity,
    ) -> Result<CartLine, RepositoryError> {
        let mut t = self.tables.lock().await;
        let unit_price = t
            .menu_items
            .get(&menuitem)
            .map(|item| item.price)
            .ok_or(RepositoryError::NotFound)?;

        let existing = t
            .cart_lines
            .iter()
            .find(|(_, line)| line.user == user && line.menuitem == menuitem)
            .map(|(id, line)| (*id, line.quantity));

        let (id, quantity) = match existing {
            Some((id, current)) => {
                let merged = current
                    .checked_add(quantity)
                    .map_err(|e| RepositoryError::Conflict(e.to_string()))?;
                (id, merged)
            }
            None => (CartLineId::new(next(&mut t.seq.cart_line)), quantity),
        };

        let record = LineRecord {
            user,
            menuitem,
            quantity,
            unit_price,
            price: line_price(unit_price, quantity),
        };
        t.cart_lines.insert(id, record);

        t.cart_line(id, &record)
    }

    async fn clear_cart(&self, user: UserId) -> Result<u64, RepositoryError> {
        let mut t = self.tables.lock().await;
        let before = t.cart_lines.len();
        t.cart_lines.retain(|_, line| line.user != user);
        Ok((before - t.cart_lines.len()) as u64)
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn place_order(
        &self,
        user: UserId,
        date: NaiveDate,
    ) -> Result<Option<OrderDetail>, RepositoryError> {
        let mut t = self.tables.lock().await;
        let lines: Vec<LineSnapshot> = t
            .cart_lines
            .values()
            .filter(|line| line.user == user)
            .map(|line| LineSnapshot {
                menuitem_id: line.menuitem,
                quantity: line.quantity,
                unit_price: line.unit_price,
            })
            .collect();

        let Some(draft) = OrderDraft::from_lines(&lines, date) else {
            return Ok(None);
        };

        let order_id = OrderId::new(next(&mut t.seq.order));
        let record = OrderRecord {
            user,
            delivery_crew: None,
            status: OrderStatus::Pending,
            total: draft.total,
            date: draft.date,
        };
        t.orders.insert(order_id, record);

        for item in &draft.items {
            let item_id = OrderItemId::new(next(&mut t.seq.order_item));
            t.order_items.insert(
                item_id,
                OrderItemRecord {
                    order: order_id,
                    menuitem: item.menuitem_id,
                    quantity: item.quantity,
                    unit_price: item.unit_price,
                    price: item.price,
                },
            );
        }
        t.cart_lines.retain(|_, line| line.user != user);

        Ok(Some(OrderDetail {
            order: t.order(order_id, &record)?,
            items: t.items_of(order_id)?,
        }))
    }

    async fn list_orders(
        &self,
        scope: OrderScope,
        page: PageRequest,
    ) -> Result<Page<Order>, RepositoryError> {
        let t = self.tables.lock().await;
        let orders = t
            .orders
            .iter()
            .filter(|(_, o)| scope.contains(o.user, o.delivery_crew))
            .map(|(id, o)| t.order(*id, o))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page::slice(orders, page))
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let t = self.tables.lock().await;
        t.orders.get(&id).map(|o| t.order(id, o)).transpose()
    }

    async fn order_items(&self, id: OrderId) -> Result<Vec<OrderItem>, RepositoryError> {
        let t = self.tables.lock().await;
        t.items_of(id)
    }

    async fn update_order(
        &self,
        id: OrderId,
        update: OrderUpdate,
    ) -> Result<Option<Order>, RepositoryError> {
        let mut t = self.tables.lock().await;
        if let Some(crew) = update.delivery_crew
            && !t.users.contains_key(&crew)
        {
            return Err(RepositoryError::Conflict(
                "delivery crew user does not exist".to_owned(),
            ));
        }

        let Some(record) = t.orders.get_mut(&id) else {
            return Ok(None);
        };
        if record.status != update.expected.status
            || record.delivery_crew != update.expected.delivery_crew
        {
            return Ok(None);
        }
        if let Some(status) = update.status {
            record.status = status;
        }
        if let Some(crew) = update.delivery_crew {
            record.delivery_crew = Some(crew);
        }
        let record = *record;

        t.order(id, &record).map(Some)
    }

    async fn delete_order(&self, id: OrderId) -> Result<bool, RepositoryError> {
        let mut t = self.tables.lock().await;
        if t.orders.remove(&id).is_none() {
            return Ok(false);
        }
        t.order_items.retain(|_, item| item.order != id);
        Ok(true)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}
