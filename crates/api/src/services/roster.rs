//! Manager and delivery crew group membership.

use tracing::instrument;

use little_lemon_core::{Action, Group, Page, PageRequest, RosterOrdering, Username};

use super::{ServiceError, authorize_user};
use crate::db::Store;
use crate::models::{Identity, User};

/// Roster operations. Manager only.
pub struct RosterService<'a> {
    store: &'a dyn Store,
}

impl<'a> RosterService<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// One page of a group's members.
    ///
    /// # Errors
    ///
    /// Returns `Unauthenticated` or `Forbidden` for non-managers.
    pub async fn list(
        &self,
        identity: Option<&Identity>,
        group: Group,
        ordering: Option<RosterOrdering>,
        page: PageRequest,
    ) -> Result<Page<User>, ServiceError> {
        authorize_user(identity, Action::ManageRoster)?;
        Ok(self.store.list_group_members(group, ordering, page).await?)
    }

    /// Add an existing user to a group. Adding a member again is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no user has that username.
    #[instrument(skip(self, identity))]
    pub async fn add(
        &self,
        identity: Option<&Identity>,
        group: Group,
        username: &str,
    ) -> Result<User, ServiceError> {
        authorize_user(identity, Action::ManageRoster)?;
        let user = self.find(username).await?;
        self.store.add_to_group(user.id, group).await?;

        tracing::info!(user_id = %user.id, %group, "added to group");
        Ok(user)
    }

    /// Remove a user from a group.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no user has that username or they are not in the
    /// group.
    #[instrument(skip(self, identity))]
    pub async fn remove(
        &self,
        identity: Option<&Identity>,
        group: Group,
        username: &str,
    ) -> Result<User, ServiceError> {
        authorize_user(identity, Action::ManageRoster)?;
        let user = self.find(username).await?;
        if !self.store.remove_from_group(user.id, group).await? {
            return Err(ServiceError::NotFound("group member"));
        }

        tracing::info!(user_id = %user.id, %group, "removed from group");
        Ok(user)
    }

    async fn find(&self, username: &str) -> Result<User, ServiceError> {
        let username = Username::parse(username).map_err(|_| ServiceError::NotFound("user"))?;
        self.store
            .get_user_by_username(&username)
            .await?
            .ok_or(ServiceError::NotFound("user"))
    }
}
