//! Ordering workflows.
//!
//! Each service borrows the [`Store`] and takes the calling identity as an
//! explicit parameter (`None` for anonymous callers). Every operation first
//! asks [`little_lemon_core::policy`] whether the caller's role may perform
//! it, then does its work through the store.
//!
//! # Services
//!
//! - [`AuthService`] - registration, token login/logout, token lookup
//! - [`CatalogService`] - categories, menu items and the featured item
//! - [`CartService`] - the caller's cart
//! - [`OrderService`] - placing, listing and updating orders
//! - [`RosterService`] - manager and delivery crew group membership

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod error;
pub mod orders;
pub mod roster;

pub use auth::{AuthError, AuthService};
pub use cart::CartService;
pub use catalog::{CatalogService, MenuItemInput, MenuItemPatch};
pub use error::ServiceError;
pub use orders::OrderService;
pub use roster::RosterService;

use little_lemon_core::{Action, Role, policy};

use crate::models::Identity;

/// Resolve the caller's role and check it may perform `action`.
fn authorize(identity: Option<&Identity>, action: Action) -> Result<Role, ServiceError> {
    let role = identity.map_or(Role::Anonymous, Identity::role);
    policy::authorize(role, action).into_result()?;
    Ok(role)
}

/// Like [`authorize`], for actions that need a logged-in caller.
fn authorize_user(
    identity: Option<&Identity>,
    action: Action,
) -> Result<(&Identity, Role), ServiceError> {
    let role = authorize(identity, action)?;
    let identity = identity.ok_or(ServiceError::Unauthenticated)?;
    Ok((identity, role))
}

/// The caller's own identity.
///
/// # Errors
///
/// Returns `Unauthenticated` for anonymous callers.
pub fn current_user(identity: Option<&Identity>) -> Result<&Identity, ServiceError> {
    authorize_user(identity, Action::ViewProfile).map(|(identity, _)| identity)
}
