use async_trait::async_trait;
use tourly_core::StoreResult;
use uuid::Uuid;

use crate::inventory::SeatReservation;
use crate::tour::{Tour, TourUpdate};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TourRemoval {
    Deleted,
    NotFound,
    InUse,
}

/// Repository trait for the tour catalog
#[async_trait]
pub trait TourRepository: Send + Sync {
    async fn fetch_tour(&self, id: Uuid) -> StoreResult<Option<Tour>>;

    /// All tours, newest first.
    async fn list_tours(&self) -> StoreResult<Vec<Tour>>;

    /// Insert a fully built tour. A duplicate title is a `UniqueViolation`.
    async fn create_tour(&self, tour: &Tour) -> StoreResult<Tour>;

    /// A capacity the sold seats do not fit into is a `StoreError::Rejected`.
    async fn update_tour(&self, id: Uuid, update: TourUpdate) -> StoreResult<Option<Tour>>;

    /// Delete the tour unless a pending or confirmed booking references it.
    /// The check and the delete are one atomic step.
    async fn delete_tour_if_unused(&self, id: Uuid) -> StoreResult<TourRemoval>;

    /// Atomically take `seats` seats, only if at least that many remain.
    async fn reserve_seats(&self, id: Uuid, seats: u32) -> StoreResult<SeatReservation>;

    /// Atomically return `seats` seats, capped at the tour's capacity.
    /// `None` when the tour is gone or not seat-limited.
    async fn release_seats(&self, id: Uuid, seats: u32) -> StoreResult<Option<i32>>;
}
