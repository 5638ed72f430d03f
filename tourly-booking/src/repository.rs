use async_trait::async_trait;
use tourly_core::StoreResult;
use uuid::Uuid;

use crate::models::{Booking, BookingStatus};

/// Repository trait for booking records
#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Insert a new booking. A duplicate booking reference is a `UniqueViolation`.
    /// Returns `false`, inserting nothing, when the booking's tour no longer
    /// exists; this is checked under the same lock a tour delete takes.
    async fn insert_booking(&self, booking: &Booking) -> StoreResult<bool>;

    async fn fetch_booking(&self, id: Uuid) -> StoreResult<Option<Booking>>;

    /// Bookings owned by `user_id`, newest first.
    async fn list_bookings_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Booking>>;

    /// Every booking, newest first.
    async fn list_bookings(&self) -> StoreResult<Vec<Booking>>;

    /// Compare-and-set of the status. Returns `None` when the booking is
    /// missing or its status is no longer `expected`.
    async fn update_booking_status(
        &self,
        id: Uuid,
        expected: BookingStatus,
        next: BookingStatus,
    ) -> StoreResult<Option<Booking>>;

    /// Hard delete, returning the removed record.
    async fn delete_booking(&self, id: Uuid) -> StoreResult<Option<Booking>>;
}
