use async_trait::async_trait;
use uuid::Uuid;

use crate::identity::{AccountStatus, NewUser, Role, User};
use crate::StoreResult;

/// Outcome of an admin account removal.
#[derive(Debug, Clone)]
pub enum UserRemoval {
    Deleted(User),
    NotFound,
    /// Admin accounts are never removed.
    Admin,
    /// The user still holds pending or confirmed bookings.
    HasActiveBookings,
}

/// Repository trait for user accounts
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a user. A duplicate email (case-insensitive) is a `UniqueViolation`.
    async fn create_user(&self, user: &NewUser) -> StoreResult<User>;

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>>;

    /// Every account, newest first.
    async fn list_users(&self) -> StoreResult<Vec<User>>;

    async fn update_user_role(&self, id: Uuid, role: Role) -> StoreResult<Option<User>>;

    async fn update_user_status(&self, id: Uuid, status: AccountStatus) -> StoreResult<Option<User>>;

    /// Delete a non-admin account with no active bookings, checked and
    /// removed in one atomic step.
    async fn delete_user_if_unused(&self, id: Uuid) -> StoreResult<UserRemoval>;
}
