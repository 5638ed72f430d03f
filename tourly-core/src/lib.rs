pub mod contact;
pub mod dates;
pub mod identity;
pub mod payment;
pub mod reference;
pub mod repository;

pub use contact::{CustomerInfo, EmergencyContact, GuestDetails, IdType};
pub use identity::{AccountStatus, IdentityService, Role, User, UserProfile, UserSummary};
pub use payment::PaymentStatus;
pub use reference::ReferenceGenerator;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    ValidationError(String),
    #[error("Conflict: {0}")]
    ConflictError(String),
    #[error("{0}")]
    NotFound(String),
    #[error("Identity verification failed: {0}")]
    IdentityError(String),
    #[error("Internal service error: {0}")]
    InternalError(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type CoreResult<T> = Result<T, CoreError>;

/// Failure reported by a persistence adapter (Postgres or in-memory).
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),
    /// The write would break an invariant the store enforces.
    #[error("{0}")]
    Rejected(String),
    #[error("storage backend failure: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl StoreError {
    pub fn backend<E>(err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::Backend(err.into())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
