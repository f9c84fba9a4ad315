//! Little Lemon Core - Shared domain types and rules.
//!
//! This crate provides the types and pure decision logic used across all
//! Little Lemon components:
//! - `api` - The restaurant ordering REST service
//! - `cli` - Command-line tools for migrations, seeding and user management
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP. Authorization decisions, pricing and the cart-to-order
//! snapshot all live here so that every store implementation and every route
//! agrees on them.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, prices, quantities, names and roles
//! - [`policy`] - Role-based authorization decisions
//! - [`order`] - Converting cart lines into an order draft
//! - [`listing`] - Menu and roster filtering and ordering parameters
//! - [`page`] - Pagination

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod listing;
pub mod order;
pub mod page;
pub mod policy;
pub mod types;

pub use listing::{
    MenuField, MenuOrdering, MenuQuery, MenuSortKey, OrderingError, RosterOrdering, SortDirection,
};
pub use order::{DraftItem, LineSnapshot, OrderDraft};
pub use page::{Page, PageError, PageRequest};
pub use policy::{Action, Decision, Denial, OrderPatch, OrderScope};
pub use types::*;
