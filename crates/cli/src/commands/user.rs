//! User and staff group management commands.
//!
//! Accounts created here go through the same validation and password hashing
//! as `POST /api/users`.

use little_lemon_api::db::{PgStore, UserStore};
use little_lemon_api::services::AuthService;
use little_lemon_core::{Group, Username};

use super::{CliError, connect};

fn parse_group(group: &str) -> Result<Group, CliError> {
    Group::lookup(group).ok_or_else(|| CliError::InvalidGroup(group.to_owned()))
}

async fn find_user(
    store: &PgStore,
    username: &str,
) -> Result<little_lemon_api::models::User, CliError> {
    let parsed =
        Username::parse(username).map_err(|_| CliError::UnknownUser(username.to_owned()))?;
    store
        .get_user_by_username(&parsed)
        .await?
        .ok_or_else(|| CliError::UnknownUser(username.to_owned()))
}

/// Create a user and add them to `groups`.
pub async fn create(
    username: &str,
    password: &str,
    email: Option<&str>,
    groups: &[String],
) -> Result<(), CliError> {
    // Validate groups before writing anything
    let groups = groups
        .iter()
        .map(|g| parse_group(g))
        .collect::<Result<Vec<_>, _>>()?;

    let store = PgStore::new(connect().await?);
    let user = AuthService::new(&store)
        .register(username, password, email)
        .await?;

    for group in &groups {
        store.add_to_group(user.id, *group).await?;
    }

    tracing::info!(user_id = %user.id, groups = ?groups, "Created user {}", user.username);
    Ok(())
}

/// Add an existing user to a group.
pub async fn grant(username: &str, group: &str) -> Result<(), CliError> {
    let group = parse_group(group)?;
    let store = PgStore::new(connect().await?);
    let user = find_user(&store, username).await?;

    store.add_to_group(user.id, group).await?;
    tracing::info!("Added {} to {group}", user.username);
    Ok(())
}

/// Remove a user from a group.
pub async fn revoke(username: &str, group: &str) -> Result<(), CliError> {
    let group = parse_group(group)?;
    let store = PgStore::new(connect().await?);
    let user = find_user(&store, username).await?;

    if store.remove_from_group(user.id, group).await? {
        tracing::info!("Removed {} from {group}", user.username);
    } else {
        tracing::warn!("{} was not in {group}", user.username);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_group() {
        assert_eq!(parse_group("Manager").ok(), Some(Group::Manager));
        assert_eq!(parse_group("delivery-crew").ok(), Some(Group::DeliveryCrew));
        assert!(matches!(parse_group("chef"), Err(CliError::InvalidGroup(_))));
    }
}
