//! Domain models returned by the store and serialized to clients.
//!
//! These are validated domain objects, separate from the database row types in
//! [`crate::db`].

pub mod cart;
pub mod catalog;
pub mod order;
pub mod user;

pub use cart::CartLine;
pub use catalog::{Category, MenuItem, MenuItemChanges, NewCategory, NewMenuItem};
pub use order::{Order, OrderDetail, OrderItem, OrderState, OrderUpdate};
pub use user::{Identity, NewUser, User};
