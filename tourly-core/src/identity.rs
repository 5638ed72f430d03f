use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

use crate::repository::{UserRemoval, UserRepository};
use crate::{CoreError, CoreResult, StoreError};

const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

/// Inactive accounts keep their data but cannot sign in.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    #[default]
    Active,
    Inactive,
}

impl AccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Active => "active",
            AccountStatus::Inactive => "inactive",
        }
    }
}

impl FromStr for AccountStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(AccountStatus::Active),
            "inactive" => Ok(AccountStatus::Inactive),
            other => Err(format!("unknown account status: {}", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub status: AccountStatus,
    pub created_at: DateTime<Utc>,
}

/// The user as shown to API callers. Never carries the password hash.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub status: AccountStatus,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
            status: user.status,
            created_at: user.created_at,
        }
    }
}

/// Booking owner as embedded in admin booking views.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Registration, login and admin bootstrap over a `UserRepository`.
#[derive(Clone)]
pub struct IdentityService {
    users: Arc<dyn UserRepository>,
    bcrypt_cost: u32,
}

impl IdentityService {
    pub fn new(users: Arc<dyn UserRepository>, bcrypt_cost: u32) -> Self {
        Self { users, bcrypt_cost }
    }

    pub async fn register(&self, name: &str, email: &str, password: &str) -> CoreResult<User> {
        self.create_account(name, email, password, Role::User).await
    }

    /// Verify credentials. Unknown email and wrong password fail the same way.
    pub async fn authenticate(&self, email: &str, password: &str) -> CoreResult<User> {
        let invalid = || CoreError::IdentityError("Invalid email or password".to_string());

        let user = self
            .users
            .find_user_by_email(&normalize_email(email))
            .await?
            .ok_or_else(invalid)?;

        if !verify_password(password, &user.password_hash).await? {
            return Err(invalid());
        }
        if user.status == AccountStatus::Inactive {
            return Err(CoreError::IdentityError("Account is inactive".to_string()));
        }

        Ok(user)
    }

    pub async fn find_user(&self, id: Uuid) -> CoreResult<Option<User>> {
        Ok(self.users.find_user_by_id(id).await?)
    }

    pub async fn list_users(&self) -> CoreResult<Vec<User>> {
        Ok(self.users.list_users().await?)
    }

    /// Activate or deactivate an account. Admin accounts stay active.
    pub async fn set_user_status(&self, id: Uuid, status: &str) -> CoreResult<User> {
        let status: AccountStatus = status
            .parse()
            .map_err(|_| CoreError::ValidationError("Invalid status".to_string()))?;

        let user = self.users.find_user_by_id(id).await?.ok_or_else(user_not_found)?;
        if user.role == Role::Admin && status == AccountStatus::Inactive {
            return Err(CoreError::ValidationError("Cannot deactivate admin user".to_string()));
        }

        let updated = self
            .users
            .update_user_status(id, status)
            .await?
            .ok_or_else(user_not_found)?;
        tracing::info!(user_id = %id, status = status.as_str(), "Account status changed");
        Ok(updated)
    }

    pub async fn delete_user(&self, id: Uuid) -> CoreResult<User> {
        match self.users.delete_user_if_unused(id).await? {
            UserRemoval::Deleted(user) => {
                tracing::info!(user_id = %id, "Account deleted");
                Ok(user)
            }
            UserRemoval::NotFound => Err(user_not_found()),
            UserRemoval::Admin => Err(CoreError::ValidationError("Cannot delete admin user".to_string())),
            UserRemoval::HasActiveBookings => Err(CoreError::ConflictError(
                "Cannot delete user with active bookings".to_string(),
            )),
        }
    }

    /// Make sure an admin account exists for `email`, creating or promoting it.
    pub async fn ensure_admin(&self, name: &str, email: &str, password: &str) -> CoreResult<User> {
        match self.users.find_user_by_email(&normalize_email(email)).await? {
            Some(user) if user.role == Role::Admin => Ok(user),
            Some(user) => {
                tracing::info!(user_id = %user.id, "Promoting existing account to admin");
                self.users
                    .update_user_role(user.id, Role::Admin)
                    .await?
                    .ok_or_else(|| CoreError::InternalError("user vanished during promotion".to_string()))
            }
            None => {
                tracing::info!("Creating bootstrap admin account");
                self.create_account(name, email, password, Role::Admin).await
            }
        }
    }

    async fn create_account(&self, name: &str, email: &str, password: &str, role: Role) -> CoreResult<User> {
        let name = name.trim();
        let email = normalize_email(email);

        if name.is_empty() || email.is_empty() || password.is_empty() {
            return Err(CoreError::ValidationError("Please provide all required fields".to_string()));
        }
        if !email.contains('@') {
            return Err(CoreError::ValidationError("Email address is not valid".to_string()));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(CoreError::ValidationError(format!(
                "Password must be at least {} characters long",
                MIN_PASSWORD_LEN
            )));
        }

        let password_hash = hash_password(password, self.bcrypt_cost).await?;
        let new_user = NewUser {
            name: name.to_string(),
            email,
            password_hash,
            role,
        };

        self.users.create_user(&new_user).await.map_err(|e| match e {
            StoreError::UniqueViolation(_) => {
                CoreError::ConflictError("User with this email already exists".to_string())
            }
            other => CoreError::Store(other),
        })
    }
}

fn user_not_found() -> CoreError {
    CoreError::NotFound("User not found".to_string())
}

/// bcrypt is CPU bound, so hashing runs on the blocking pool.
pub async fn hash_password(password: &str, cost: u32) -> CoreResult<String> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| CoreError::InternalError(format!("hashing task failed: {}", e)))?
        .map_err(|e| CoreError::InternalError(format!("password hashing failed: {}", e)))
}

pub async fn verify_password(password: &str, hash: &str) -> CoreResult<bool> {
    let password = password.to_string();
    let hash = hash.to_string();
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| CoreError::InternalError(format!("verification task failed: {}", e)))?
        .or(Ok(false))
}
