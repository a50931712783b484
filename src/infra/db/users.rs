use async_trait::async_trait;
use sqlx::QueryBuilder;
use time::OffsetDateTime;

use crate::application::repos::{CreateUserParams, RepoError, UserChanges, UsersRepo};
use crate::domain::{
    entities::UserRecord,
    types::{UserRole, UserStatus},
};

use super::{PostgresRepositories, map_sqlx_error};

const USER_COLUMNS: &str = "id, username, password_hash, role, status, email, avatar, \
     nickname, bio, phone, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    username: String,
    password_hash: String,
    role: UserRole,
    status: UserStatus,
    email: Option<String>,
    avatar: Option<String>,
    nickname: Option<String>,
    bio: Option<String>,
    phone: Option<String>,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<UserRow> for UserRecord {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            username: row.username,
            password_hash: row.password_hash,
            role: row.role,
            status: row.status,
            email: row.email,
            avatar: row.avatar,
            nickname: row.nickname,
            bio: row.bio,
            phone: row.phone,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl UsersRepo for PostgresRepositories {
    async fn create_user(&self, params: CreateUserParams) -> Result<UserRecord, RepoError> {
        let sql = format!(
            "INSERT INTO users (username, password_hash, role) VALUES ($1, $2, $3) \
             RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(params.username)
            .bind(params.password_hash)
            .bind(params.role)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(UserRecord::from(row))
    }

    async fn find_user(&self, id: i64) -> Result<Option<UserRecord>, RepoError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(UserRecord::from))
    }

    async fn find_user_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserRecord>, RepoError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(username)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(UserRecord::from))
    }

    async fn email_in_use_by_other(&self, email: &str, user_id: i64) -> Result<bool, RepoError> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM users WHERE email = $1 AND id <> $2)",
        )
        .bind(email)
        .bind(user_id)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)
    }

    async fn update_user(
        &self,
        id: i64,
        changes: &UserChanges,
    ) -> Result<UserRecord, RepoError> {
        if changes.is_empty() {
            return Err(RepoError::InvalidInput {
                message: "no columns to update".to_string(),
            });
        }

        let mut qb = QueryBuilder::new("UPDATE users SET ");
        let mut set = qb.separated(", ");
        for (column, value) in [
            ("email", &changes.email),
            ("avatar", &changes.avatar),
            ("nickname", &changes.nickname),
            ("bio", &changes.bio),
            ("phone", &changes.phone),
        ] {
            if let Some(value) = value {
                set.push(format!("{column} = "));
                set.push_bind_unseparated(value.clone());
            }
        }
        if let Some(role) = changes.role {
            set.push("role = ");
            set.push_bind_unseparated(role);
        }
        if let Some(status) = changes.status {
            set.push("status = ");
            set.push_bind_unseparated(status);
        }
        set.push("updated_at = now()");

        qb.push(" WHERE id = ");
        qb.push_bind(id);
        qb.push(" RETURNING ");
        qb.push(USER_COLUMNS);

        let row = qb
            .build_query_as::<UserRow>()
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?
            .ok_or(RepoError::NotFound)?;

        Ok(UserRecord::from(row))
    }

    async fn update_password(&self, id: i64, password_hash: &str) -> Result<(), RepoError> {
        let result =
            sqlx::query("UPDATE users SET password_hash = $1, updated_at = now() WHERE id = $2")
                .bind(password_hash)
                .bind(id)
                .execute(self.pool())
                .await
                .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn list_users(&self) -> Result<Vec<UserRecord>, RepoError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY id");
        let rows = sqlx::query_as::<_, UserRow>(&sql)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(UserRecord::from).collect())
    }
}
