//! User domain types.

use serde::Serialize;

use little_lemon_core::{Group, Role, UserId, Username};

/// A registered user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Login name.
    pub username: Username,
    /// Contact address, if one was given at registration.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// A user to be created.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Login name.
    pub username: Username,
    /// Contact address.
    pub email: Option<String>,
    /// Argon2 PHC string.
    pub password_hash: String,
}

/// The caller behind an authenticated request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// The user.
    pub user: User,
    /// Staff groups the user belongs to.
    pub groups: Vec<Group>,
}

impl Identity {
    /// The role this identity acts under.
    #[must_use]
    pub fn role(&self) -> Role {
        Role::from_groups(self.groups.iter().copied())
    }

    /// Shortcut for the user's ID.
    #[must_use]
    pub const fn id(&self) -> UserId {
        self.user.id
    }
}
