//! Staff groups and the roles derived from them.
//!
//! Users are never assigned a role directly. They belong to zero or more
//! [`Group`]s and their [`Role`] is resolved from that membership once per
//! request.

use core::fmt;

use serde::{Deserialize, Serialize};

/// A named staff group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Group {
    /// Restaurant managers.
    #[serde(rename = "Manager")]
    Manager,
    /// Staff who deliver orders.
    #[serde(rename = "Delivery Crew")]
    DeliveryCrew,
}

impl Group {
    /// Every group, in seeding order.
    pub const ALL: [Self; 2] = [Self::Manager, Self::DeliveryCrew];

    /// The group's display name, as stored in the `groups` table.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Manager => "Manager",
            Self::DeliveryCrew => "Delivery Crew",
        }
    }

    /// The group's URL segment (`/api/groups/{slug}/users`).
    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::Manager => "manager",
            Self::DeliveryCrew => "delivery-crew",
        }
    }

    /// Look up a group by stored name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|g| g.name() == name)
    }

    /// Look up a group by display name or URL segment, ignoring case.
    #[must_use]
    pub fn lookup(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|g| g.name().eq_ignore_ascii_case(s) || g.slug().eq_ignore_ascii_case(s))
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The permission class a caller acts under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// No credentials presented.
    Anonymous,
    /// Authenticated user in no staff group.
    Customer,
    /// Member of the Delivery Crew group.
    DeliveryCrew,
    /// Member of the Manager group.
    Manager,
}

impl Role {
    /// Resolve the role of an authenticated user from their groups.
    ///
    /// Manager wins over Delivery Crew when a user is in both.
    pub fn from_groups<I>(groups: I) -> Self
    where
        I: IntoIterator<Item = Group>,
    {
        groups.into_iter().fold(Self::Customer, |role, group| {
            match (role, group) {
                (Self::Manager, _) | (_, Group::Manager) => Self::Manager,
                (_, Group::DeliveryCrew) => Self::DeliveryCrew,
            }
        })
    }

    /// Whether the caller presented valid credentials.
    #[must_use]
    pub const fn is_authenticated(self) -> bool {
        !matches!(self, Self::Anonymous)
    }

    /// Whether the caller is a manager.
    #[must_use]
    pub const fn is_manager(self) -> bool {
        matches!(self, Self::Manager)
    }

    /// Whether the caller is delivery crew (and not a manager).
    #[must_use]
    pub const fn is_delivery_crew(self) -> bool {
        matches!(self, Self::DeliveryCrew)
    }
}
