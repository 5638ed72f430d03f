use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tourly_core::identity::{normalize_email, NewUser};
use tourly_core::repository::{UserRemoval, UserRepository};
use tourly_core::{AccountStatus, Role, StoreError, StoreResult, User};
use uuid::Uuid;

use crate::database::store_error;

pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const USER_COLUMNS: &str = "id, name, email, password_hash, role, status, created_at";

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    name: String,
    email: String,
    password_hash: String,
    role: String,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: row.id,
            name: row.name,
            email: row.email,
            password_hash: row.password_hash,
            role: row.role.parse().map_err(StoreError::backend)?,
            status: row.status.parse().map_err(StoreError::backend)?,
            created_at: row.created_at,
        })
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create_user(&self, user: &NewUser) -> StoreResult<User> {
        sqlx::query_as::<_, UserRow>(&format!(
            r#"
            INSERT INTO users (id, name, email, password_hash, role)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&user.name)
        .bind(normalize_email(&user.email))
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(store_error)?
        .try_into()
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        sqlx::query_as::<_, UserRow>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
            .bind(normalize_email(email))
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)?
            .map(User::try_from)
            .transpose()
    }

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        sqlx::query_as::<_, UserRow>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)?
            .map(User::try_from)
            .transpose()
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        sqlx::query_as::<_, UserRow>(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC"))
            .fetch_all(&self.pool)
            .await
            .map_err(store_error)?
            .into_iter()
            .map(User::try_from)
            .collect()
    }

    async fn update_user_role(&self, id: Uuid, role: Role) -> StoreResult<Option<User>> {
        sqlx::query_as::<_, UserRow>(&format!(
            "UPDATE users SET role = $2 WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(role.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)?
        .map(User::try_from)
        .transpose()
    }

    async fn update_user_status(&self, id: Uuid, status: AccountStatus) -> StoreResult<Option<User>> {
        sqlx::query_as::<_, UserRow>(&format!(
            "UPDATE users SET status = $2 WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(status.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)?
        .map(User::try_from)
        .transpose()
    }

    async fn delete_user_if_unused(&self, id: Uuid) -> StoreResult<UserRemoval> {
        let mut tx = self.pool.begin().await.map_err(store_error)?;

        let role: Option<String> = sqlx::query_scalar("SELECT role FROM users WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(store_error)?;

        match role.as_deref() {
            None => return Ok(UserRemoval::NotFound),
            Some("admin") => return Ok(UserRemoval::Admin),
            Some(_) => {}
        }

        let deleted = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            DELETE FROM users
            WHERE id = $1
              AND NOT EXISTS (
                  SELECT 1 FROM bookings WHERE user_id = $1 AND status IN ('pending', 'confirmed')
              )
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(store_error)?;

        tx.commit().await.map_err(store_error)?;

        match deleted {
            Some(row) => Ok(UserRemoval::Deleted(row.try_into()?)),
            None => Ok(UserRemoval::HasActiveBookings),
        }
    }
}
