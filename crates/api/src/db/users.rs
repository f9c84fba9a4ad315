//! `PostgreSQL` implementation of [`UserStore`].

use async_trait::async_trait;

use little_lemon_core::{Group, Page, PageRequest, RosterOrdering, UserId, Username};

use super::{PgStore, RepositoryError, UserStore, count_to_u64, map_constraint};
use crate::models::{Identity, NewUser, User};

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: UserId,
    username: Username,
    email: Option<String>,
}

impl From<UserRow> for User {
    fn from(r: UserRow) -> Self {
        Self {
            id: r.id,
            username: r.username,
            email: r.email,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CredentialRow {
    id: UserId,
    username: Username,
    email: Option<String>,
    password_hash: String,
}

fn parse_groups(names: Vec<String>) -> Result<Vec<Group>, RepositoryError> {
    names
        .into_iter()
        .map(|name| {
            Group::from_name(&name).ok_or_else(|| {
                RepositoryError::DataCorruption(format!("unknown group in database: {name}"))
            })
        })
        .collect()
}

#[async_trait]
impl UserStore for PgStore {
    async fn create_user(&self, user: &NewUser) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            INSERT INTO users (username, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, username, email
            ",
        )
        .bind(&user.username)
        .bind(user.email.as_deref())
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_constraint(e, "username already exists"))?;

        Ok(row.into())
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, username, email FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn get_user_by_username(
        &self,
        username: &Username,
    ) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, username, email FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn get_password_hash(
        &self,
        username: &Username,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, CredentialRow>(
            "SELECT id, username, email, password_hash FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| {
            (
                User {
                    id: r.id,
                    username: r.username,
                    email: r.email,
                },
                r.password_hash,
            )
        }))
    }

    async fn user_groups(&self, id: UserId) -> Result<Vec<Group>, RepositoryError> {
        let names: Vec<String> = sqlx::query_scalar(
            r"
            SELECT g.name
            FROM user_groups ug
            JOIN groups g ON g.id = ug.group_id
            WHERE ug.user_id = $1
            ORDER BY g.id
            ",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        parse_groups(names)
    }

    async fn add_to_group(&self, id: UserId, group: Group) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            INSERT INTO user_groups (user_id, group_id)
            SELECT $1, g.id FROM groups g WHERE g.name = $2
            ON CONFLICT DO NOTHING
            ",
        )
        .bind(id)
        .bind(group.name())
        .execute(&self.pool)
        .await
        .map_err(|e| map_constraint(e, "user does not exist"))?;

        // Zero rows is either "already a member" or "group row missing".
        if result.rows_affected() == 0 {
            let exists: bool =
                sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM groups WHERE name = $1)")
                    .bind(group.name())
                    .fetch_one(&self.pool)
                    .await?;
            if !exists {
                return Err(RepositoryError::DataCorruption(format!(
                    "group {group} missing from database"
                )));
            }
        }

        Ok(())
    }

    async fn remove_from_group(&self, id: UserId, group: Group) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            DELETE FROM user_groups
            WHERE user_id = $1
              AND group_id = (SELECT id FROM groups WHERE name = $2)
            ",
        )
        .bind(id)
        .bind(group.name())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_group_members(
        &self,
        group: Group,
        ordering: Option<RosterOrdering>,
        page: PageRequest,
    ) -> Result<Page<User>, RepositoryError> {
        let order_by = ordering.map_or_else(
            || "u.id ASC".to_owned(),
            |RosterOrdering(direction)| format!("u.username {}, u.id ASC", direction.as_sql()),
        );

        let sql = format!(
            r"
            SELECT u.id, u.username, u.email
            FROM users u
            JOIN user_groups ug ON ug.user_id = u.id
            JOIN groups g ON g.id = ug.group_id
            WHERE g.name = $1
            ORDER BY {order_by}
            LIMIT $2 OFFSET $3
            "
        );

        let rows = sqlx::query_as::<_, UserRow>(&sql)
            .bind(group.name())
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        let count: i64 = sqlx::query_scalar(
            r"
            SELECT COUNT(*)
            FROM user_groups ug
            JOIN groups g ON g.id = ug.group_id
            WHERE g.name = $1
            ",
        )
        .bind(group.name())
        .fetch_one(&self.pool)
        .await?;

        Ok(Page::new(
            rows.into_iter().map(Into::into).collect(),
            count_to_u64(count)?,
            page,
        ))
    }

    async fn store_token(&self, id: UserId, digest: &str) -> Result<(), RepositoryError> {
        sqlx::query("INSERT INTO auth_tokens (digest, user_id) VALUES ($1, $2)")
            .bind(digest)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_constraint(e, "token collision"))?;
        Ok(())
    }

    async fn identify_token(&self, digest: &str) -> Result<Option<Identity>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            SELECT u.id, u.username, u.email
            FROM auth_tokens t
            JOIN users u ON u.id = t.user_id
            WHERE t.digest = $1
            ",
        )
        .bind(digest)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let user = User::from(row);
        let groups = self.user_groups(user.id).await?;

        Ok(Some(Identity { user, groups }))
    }

    async fn revoke_token(&self, digest: &str) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM auth_tokens WHERE digest = $1")
            .bind(digest)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
