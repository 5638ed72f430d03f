use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tourly_catalog::{InventoryError, PriceQuote, SeatReservation, TourRepository, TourSummary};
use tourly_core::repository::UserRepository;
use tourly_core::{ReferenceGenerator, StoreError, UserSummary};
use tourly_shared::models::events::{
    as_log_field, BookingCreatedEvent, BookingDeletedEvent, BookingStatusChangedEvent,
    SeatsReleasedEvent,
};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::models::{Booking, BookingRequest, BookingStatus, BookingView};
use crate::repository::BookingRepository;

const REFERENCE_ATTEMPTS: usize = 3;

/// Outcome of an admin status change.
#[derive(Debug, Clone)]
pub struct StatusTransition {
    pub booking: BookingView,
    pub message: String,
    /// `false` when the booking already had the requested status.
    pub changed: bool,
}

/// Manages booking lifecycle and seat accounting
pub struct BookingManager {
    tours: Arc<dyn TourRepository>,
    bookings: Arc<dyn BookingRepository>,
    users: Arc<dyn UserRepository>,
    references: ReferenceGenerator,
}

impl BookingManager {
    pub fn new(
        tours: Arc<dyn TourRepository>,
        bookings: Arc<dyn BookingRepository>,
        users: Arc<dyn UserRepository>,
    ) -> Self {
        Self {
            tours,
            bookings,
            users,
            references: ReferenceGenerator::default(),
        }
    }

    /// Validate a request against its tour, reserve seats and persist a `pending` booking.
    pub async fn create_booking(&self, request: BookingRequest) -> Result<BookingView, BookingError> {
        let tour = self
            .tours
            .fetch_tour(request.tour_id)
            .await?
            .ok_or(BookingError::TourNotFound(request.tour_id))?;

        if !tour.accepts_date(&request.tour_date, Utc::now().date_naive()) {
            return Err(BookingError::InvalidDate);
        }

        tour.inventory().check(request.number_of_guests)?;

        if request.guests.is_empty() || request.guests.len() != request.number_of_guests as usize {
            return Err(BookingError::GuestCountMismatch {
                expected: request.number_of_guests,
                actual: request.guests.len(),
            });
        }

        validate_contacts(&request)?;

        let quote = PriceQuote::for_guests(tour.price, request.number_of_guests);

        // Conditional decrement at the storage layer. The check above only
        // rejects early; this is what keeps concurrent requests from overselling.
        let seats_remaining = match self.tours.reserve_seats(tour.id, request.number_of_guests).await? {
            SeatReservation::Reserved { remaining } => remaining,
            SeatReservation::Insufficient { available } => {
                warn!(
                    tour_id = %tour.id,
                    requested = request.number_of_guests,
                    available,
                    "Seat reservation lost to a concurrent booking"
                );
                return Err(BookingError::InsufficientInventory {
                    requested: request.number_of_guests,
                    available,
                });
            }
            SeatReservation::TourMissing => return Err(BookingError::TourNotFound(tour.id)),
        };

        let mut booking = Booking::new(&request, &quote, self.references.next_reference());
        let mut attempt = 1;
        loop {
            match self.bookings.insert_booking(&booking).await {
                Ok(true) => break,
                // Tour deleted after the seats were taken; nothing left to give back.
                Ok(false) => return Err(BookingError::TourNotFound(tour.id)),
                Err(StoreError::UniqueViolation(detail)) if attempt < REFERENCE_ATTEMPTS => {
                    warn!(reference = %booking.booking_reference, %detail, "Booking reference collision, regenerating");
                    booking.booking_reference = self.references.next_reference();
                    attempt += 1;
                }
                Err(e) => {
                    self.compensate_reservation(&booking).await;
                    return Err(e.into());
                }
            }
        }

        let event = BookingCreatedEvent {
            booking_id: booking.id,
            booking_reference: booking.booking_reference.clone(),
            tour_id: booking.tour_id,
            user_id: booking.user_id,
            number_of_guests: booking.number_of_guests,
            total_amount: booking.total_amount,
            seats_remaining,
            timestamp: Utc::now().timestamp(),
        };
        info!(event = %as_log_field(&event), "Booking created");

        let user = self.owner(booking.user_id).await?;
        Ok(BookingView {
            booking,
            tour_package: Some(tour.summary()),
            user,
        })
    }

    /// Move a booking to `status`. The same status twice is a no-op success.
    pub async fn transition_status(&self, booking_id: Uuid, status: &str) -> Result<StatusTransition, BookingError> {
        let next: BookingStatus = status
            .parse()
            .map_err(|_| BookingError::InvalidStatus(status.to_string()))?;

        let mut current = self.load(booking_id).await?;

        let updated = loop {
            if current.status == next {
                let booking = self.view(current).await?;
                return Ok(StatusTransition {
                    booking,
                    message: transition_message(next),
                    changed: false,
                });
            }
            if !current.status.can_transition_to(next) {
                return Err(BookingError::InvalidTransition {
                    from: current.status,
                    to: next,
                });
            }

            match self
                .bookings
                .update_booking_status(booking_id, current.status, next)
                .await?
            {
                Some(updated) => break updated,
                // Another writer got there first; decide again from the fresh state.
                None => current = self.load(booking_id).await?,
            }
        };

        let previous = current.status;
        if next == BookingStatus::Cancelled && previous.is_active() {
            if let Err(e) = self.release_seats(&updated, "cancelled").await {
                error!(booking_id = %booking_id, error = %e, "Seat release failed, reverting status");
                if let Err(revert) = self
                    .bookings
                    .update_booking_status(booking_id, next, previous)
                    .await
                {
                    error!(booking_id = %booking_id, error = %revert, "Status revert failed");
                }
                return Err(e);
            }
        }

        let event = BookingStatusChangedEvent {
            booking_id,
            booking_reference: updated.booking_reference.clone(),
            from_status: previous.to_string(),
            to_status: next.to_string(),
            timestamp: Utc::now().timestamp(),
        };
        info!(event = %as_log_field(&event), "Booking status changed");

        Ok(StatusTransition {
            booking: self.view(updated).await?,
            message: transition_message(next),
            changed: true,
        })
    }

    /// Hard delete. Seats of an active booking go back to the tour.
    pub async fn delete_booking(&self, booking_id: Uuid) -> Result<Booking, BookingError> {
        let deleted = self
            .bookings
            .delete_booking(booking_id)
            .await?
            .ok_or(BookingError::BookingNotFound(booking_id))?;

        if deleted.status.is_active() {
            if let Err(e) = self.release_seats(&deleted, "deleted").await {
                error!(booking_id = %booking_id, error = %e, "Seat release failed, restoring booking");
                match self.bookings.insert_booking(&deleted).await {
                    Ok(true) => {}
                    Ok(false) => error!(booking_id = %booking_id, "Booking restore failed, tour is gone"),
                    Err(restore) => error!(booking_id = %booking_id, error = %restore, "Booking restore failed"),
                }
                return Err(e);
            }
        }

        let event = BookingDeletedEvent {
            booking_id,
            booking_reference: deleted.booking_reference.clone(),
            status: deleted.status.to_string(),
            timestamp: Utc::now().timestamp(),
        };
        info!(event = %as_log_field(&event), "Booking deleted");

        Ok(deleted)
    }

    pub async fn get_booking(&self, booking_id: Uuid) -> Result<BookingView, BookingError> {
        let booking = self.load(booking_id).await?;
        self.view(booking).await
    }

    pub async fn list_user_bookings(&self, user_id: Uuid) -> Result<Vec<BookingView>, BookingError> {
        let bookings = self.bookings.list_bookings_for_user(user_id).await?;
        self.views(bookings).await
    }

    pub async fn list_all_bookings(&self) -> Result<Vec<BookingView>, BookingError> {
        let bookings = self.bookings.list_bookings().await?;
        self.views(bookings).await
    }

    async fn load(&self, booking_id: Uuid) -> Result<Booking, BookingError> {
        self.bookings
            .fetch_booking(booking_id)
            .await?
            .ok_or(BookingError::BookingNotFound(booking_id))
    }

    async fn owner(&self, user_id: Uuid) -> Result<Option<UserSummary>, BookingError> {
        Ok(self
            .users
            .find_user_by_id(user_id)
            .await?
            .map(|u| UserSummary::from(&u)))
    }

    async fn view(&self, booking: Booking) -> Result<BookingView, BookingError> {
        let tour_package = self.tours.fetch_tour(booking.tour_id).await?.map(|t| t.summary());
        let user = self.owner(booking.user_id).await?;
        Ok(BookingView {
            booking,
            tour_package,
            user,
        })
    }

    async fn views(&self, bookings: Vec<Booking>) -> Result<Vec<BookingView>, BookingError> {
        let mut tours: HashMap<Uuid, Option<TourSummary>> = HashMap::new();
        let mut owners: HashMap<Uuid, Option<UserSummary>> = HashMap::new();
        let mut views = Vec::with_capacity(bookings.len());

        for booking in bookings {
            if !tours.contains_key(&booking.tour_id) {
                let summary = self.tours.fetch_tour(booking.tour_id).await?.map(|t| t.summary());
                tours.insert(booking.tour_id, summary);
            }
            if !owners.contains_key(&booking.user_id) {
                owners.insert(booking.user_id, self.owner(booking.user_id).await?);
            }
            let tour_package = tours.get(&booking.tour_id).cloned().flatten();
            let user = owners.get(&booking.user_id).cloned().flatten();
            views.push(BookingView {
                booking,
                tour_package,
                user,
            });
        }

        Ok(views)
    }

    async fn release_seats(&self, booking: &Booking, reason: &str) -> Result<Option<i32>, BookingError> {
        let seats_available = self
            .tours
            .release_seats(booking.tour_id, booking.number_of_guests)
            .await?;

        let event = SeatsReleasedEvent {
            tour_id: booking.tour_id,
            booking_id: booking.id,
            seats: booking.number_of_guests,
            seats_available,
            reason: reason.to_string(),
            timestamp: Utc::now().timestamp(),
        };
        info!(event = %as_log_field(&event), "Seats released");

        Ok(seats_available)
    }

    async fn compensate_reservation(&self, booking: &Booking) {
        if let Err(e) = self.release_seats(booking, "booking_not_persisted").await {
            error!(
                tour_id = %booking.tour_id,
                seats = booking.number_of_guests,
                error = %e,
                "Failed to return seats after booking insert failure"
            );
        }
    }
}

fn validate_contacts(request: &BookingRequest) -> Result<(), BookingError> {
    for (index, guest) in request.guests.iter().enumerate() {
        let missing = guest.missing_fields();
        if !missing.is_empty() {
            return Err(BookingError::InvalidGuestData(format!(
                "Guest {} is missing {}",
                index + 1,
                missing.join(", ")
            )));
        }
    }

    let missing = request.customer_info.missing_fields();
    if !missing.is_empty() {
        return Err(BookingError::InvalidGuestData(format!(
            "Customer info is missing {}",
            missing.join(", ")
        )));
    }

    Ok(())
}

fn transition_message(status: BookingStatus) -> String {
    format!("Booking {} successfully", status.outcome_word())
}

#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("Tour package not found")]
    TourNotFound(Uuid),

    #[error("Booking not found")]
    BookingNotFound(Uuid),

    #[error("Selected tour date is not available")]
    InvalidDate,

    #[error("Not enough available seats for this tour (requested {requested}, available {available})")]
    InsufficientInventory { requested: u32, available: i32 },

    #[error("Number of guests must match guest details provided (expected {expected}, got {actual})")]
    GuestCountMismatch { expected: u32, actual: usize },

    #[error("Invalid guest data: {0}")]
    InvalidGuestData(String),

    #[error("Invalid status: {0}")]
    InvalidStatus(String),

    #[error("Invalid state transition from {from} to {to}")]
    InvalidTransition { from: BookingStatus, to: BookingStatus },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<InventoryError> for BookingError {
    fn from(err: InventoryError) -> Self {
        match err {
            InventoryError::InsufficientInventory { requested, available } => {
                BookingError::InsufficientInventory { requested, available }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use async_trait::async_trait;
    use chrono::{DateTime, TimeZone};
    use tourly_catalog::{NewTour, Tour};
    use tourly_core::identity::NewUser;
    use tourly_core::{CustomerInfo, GuestDetails, Role, StoreResult};

    fn departure() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2036, 11, 20, 6, 0, 0).unwrap()
    }

    fn new_tour(seats: Option<i32>, dates: Vec<DateTime<Utc>>) -> Tour {
        NewTour {
            title: format!("Kerala Backwaters {}", Uuid::new_v4()),
            description: "Houseboat cruise".to_string(),
            location: "Alleppey".to_string(),
            price: 1000.0,
            duration: 3,
            max_group_size: 10,
            images: vec![],
            available_seats: seats,
            available_dates: dates,
        }
        .into_tour(Utc::now())
    }

    fn request(tour_id: Uuid, guests: u32) -> BookingRequest {
        BookingRequest {
            user_id: Uuid::new_v4(),
            tour_id,
            number_of_guests: guests,
            tour_date: departure(),
            customer_info: CustomerInfo::new("Meera", "meera@example.com", "555-0100"),
            guests: (0..guests)
                .map(|i| GuestDetails::new(&format!("Guest {}", i), "guest@example.com", "555-0101"))
                .collect(),
            special_requests: None,
            emergency_contact: None,
        }
    }

    async fn setup(seats: Option<i32>, dates: Vec<DateTime<Utc>>) -> (Arc<MemoryStore>, BookingManager, Tour) {
        let store = Arc::new(MemoryStore::new());
        let tour = store.create_tour(&new_tour(seats, dates)).await.unwrap();
        let manager = BookingManager::new(store.clone(), store.clone(), store.clone());
        (store, manager, tour)
    }

    async fn seats_of(store: &MemoryStore, id: Uuid) -> Option<i32> {
        store.fetch_tour(id).await.unwrap().unwrap().available_seats
    }

    #[tokio::test]
    async fn test_booking_lifecycle() {
        let (store, manager, tour) = setup(Some(10), vec![departure()]).await;

        let created = manager.create_booking(request(tour.id, 2)).await.unwrap();
        assert_eq!(created.booking.status, BookingStatus::Pending);
        assert_eq!(created.booking.total_amount, 2000.0);
        assert!(created.booking.booking_reference.starts_with("TRV-"));
        assert_eq!(created.tour_package.as_ref().unwrap().id, tour.id);
        assert_eq!(seats_of(&store, tour.id).await, Some(8));

        let id = created.booking.id;

        // pending -> confirmed
        let confirmed = manager.transition_status(id, "confirmed").await.unwrap();
        assert_eq!(confirmed.message, "Booking approved successfully");
        assert!(confirmed.changed);

        // confirmed -> completed
        let completed = manager.transition_status(id, "completed").await.unwrap();
        assert_eq!(completed.booking.booking.status, BookingStatus::Completed);
        assert_eq!(seats_of(&store, tour.id).await, Some(8));
    }

    #[tokio::test]
    async fn test_seats_run_out() {
        let (store, manager, tour) = setup(Some(3), vec![]).await;

        for _ in 0..3 {
            manager.create_booking(request(tour.id, 1)).await.unwrap();
        }
        assert_eq!(seats_of(&store, tour.id).await, Some(0));

        let result = manager.create_booking(request(tour.id, 1)).await;
        assert!(matches!(
            result,
            Err(BookingError::InsufficientInventory { requested: 1, available: 0 })
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_bookings_never_oversell() {
        let (store, manager, tour) = setup(Some(5), vec![]).await;
        let manager = Arc::new(manager);

        let mut handles = Vec::new();
        for _ in 0..20 {
            let manager = manager.clone();
            let tour_id = tour.id;
            handles.push(tokio::spawn(async move { manager.create_booking(request(tour_id, 1)).await }));
        }

        let mut succeeded = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => succeeded += 1,
                Err(BookingError::InsufficientInventory { .. }) => {}
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        assert_eq!(succeeded, 5);
        assert_eq!(seats_of(&store, tour.id).await, Some(0));
        assert_eq!(store.list_bookings().await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_date_matching_by_calendar_day() {
        let (_store, manager, tour) = setup(None, vec![departure()]).await;

        let mut late_same_day = request(tour.id, 1);
        late_same_day.tour_date = Utc.with_ymd_and_hms(2036, 11, 20, 23, 59, 0).unwrap();
        assert!(manager.create_booking(late_same_day).await.is_ok());

        let mut next_day = request(tour.id, 1);
        next_day.tour_date = Utc.with_ymd_and_hms(2036, 11, 21, 0, 0, 0).unwrap();
        assert!(matches!(manager.create_booking(next_day).await, Err(BookingError::InvalidDate)));
    }

    #[tokio::test]
    async fn test_validation_order() {
        let (store, manager, tour) = setup(Some(1), vec![departure()]).await;

        let missing = manager.create_booking(request(Uuid::new_v4(), 1)).await;
        assert!(matches!(missing, Err(BookingError::TourNotFound(_))));

        // Wrong date wins over insufficient seats.
        let mut both = request(tour.id, 2);
        both.tour_date = Utc.with_ymd_and_hms(2037, 1, 1, 0, 0, 0).unwrap();
        assert!(matches!(manager.create_booking(both).await, Err(BookingError::InvalidDate)));

        // Insufficient seats wins over guest mismatch.
        let mut seats_and_guests = request(tour.id, 2);
        seats_and_guests.guests.pop();
        assert!(matches!(
            manager.create_booking(seats_and_guests).await,
            Err(BookingError::InsufficientInventory { .. })
        ));

        assert_eq!(seats_of(&store, tour.id).await, Some(1));
    }

    #[tokio::test]
    async fn test_guest_count_must_match() {
        let (store, manager, tour) = setup(Some(10), vec![]).await;

        for (declared, provided) in [(1u32, 0usize), (1, 2), (3, 2), (2, 5)] {
            let mut req = request(tour.id, declared);
            req.guests = (0..provided)
                .map(|_| GuestDetails::new("Ravi", "ravi@example.com", "555-0102"))
                .collect();
            let result = manager.create_booking(req).await;
            assert!(
                matches!(result, Err(BookingError::GuestCountMismatch { expected, actual })
                    if expected == declared && actual == provided),
                "declared {declared}, provided {provided}"
            );
        }

        assert_eq!(seats_of(&store, tour.id).await, Some(10));
    }

    #[tokio::test]
    async fn test_guest_fields_required() {
        let (_store, manager, tour) = setup(None, vec![]).await;

        let mut req = request(tour.id, 2);
        req.guests[1].phone = "  ".into();
        match manager.create_booking(req).await {
            Err(BookingError::InvalidGuestData(message)) => assert_eq!(message, "Guest 2 is missing phone"),
            other => panic!("expected InvalidGuestData, got {other:?}"),
        }

        let mut req = request(tour.id, 1);
        req.customer_info.name = String::new();
        assert!(matches!(manager.create_booking(req).await, Err(BookingError::InvalidGuestData(_))));
    }

    #[tokio::test]
    async fn test_total_amount_frozen() {
        let (store, manager, tour) = setup(None, vec![]).await;

        let created = manager.create_booking(request(tour.id, 3)).await.unwrap();
        assert_eq!(created.booking.total_amount, 3000.0);

        let update = tourly_catalog::TourUpdate {
            price: Some(5000.0),
            ..Default::default()
        };
        store.update_tour(tour.id, update).await.unwrap();

        let fetched = manager.get_booking(created.booking.id).await.unwrap();
        assert_eq!(fetched.booking.total_amount, 3000.0);
        assert_eq!(fetched.tour_package.unwrap().price, 5000.0);
    }

    #[tokio::test]
    async fn test_cancel_restores_seats_once() {
        let (store, manager, tour) = setup(Some(4), vec![]).await;

        let created = manager.create_booking(request(tour.id, 3)).await.unwrap();
        assert_eq!(seats_of(&store, tour.id).await, Some(1));

        let first = manager.transition_status(created.booking.id, "cancelled").await.unwrap();
        assert!(first.changed);
        assert_eq!(first.message, "Booking cancelled successfully");
        assert_eq!(seats_of(&store, tour.id).await, Some(4));

        let second = manager.transition_status(created.booking.id, "cancelled").await.unwrap();
        assert!(!second.changed);
        assert_eq!(seats_of(&store, tour.id).await, Some(4));
    }

    #[tokio::test]
    async fn test_idempotent_confirm() {
        let (_store, manager, tour) = setup(None, vec![]).await;
        let id = manager.create_booking(request(tour.id, 1)).await.unwrap().booking.id;

        let first = manager.transition_status(id, "confirmed").await.unwrap();
        let second = manager.transition_status(id, "confirmed").await.unwrap();

        assert_eq!(second.message, "Booking approved successfully");
        assert_eq!(first.booking.booking.status, second.booking.booking.status);
        assert_eq!(first.booking.booking.updated_at, second.booking.booking.updated_at);
    }

    #[tokio::test]
    async fn test_invalid_transitions() {
        let (_store, manager, tour) = setup(None, vec![]).await;
        let id = manager.create_booking(request(tour.id, 1)).await.unwrap().booking.id;

        assert!(matches!(
            manager.transition_status(id, "completed").await,
            Err(BookingError::InvalidTransition { from: BookingStatus::Pending, to: BookingStatus::Completed })
        ));
        assert!(matches!(
            manager.transition_status(id, "archived").await,
            Err(BookingError::InvalidStatus(_))
        ));
        assert!(matches!(
            manager.transition_status(Uuid::new_v4(), "confirmed").await,
            Err(BookingError::BookingNotFound(_))
        ));

        manager.transition_status(id, "confirmed").await.unwrap();
        manager.transition_status(id, "completed").await.unwrap();
        assert!(matches!(
            manager.transition_status(id, "pending").await,
            Err(BookingError::InvalidTransition { .. })
        ));
    }

    #[tokio::test]
    async fn test_delete_booking() {
        let (store, manager, tour) = setup(Some(5), vec![]).await;

        let active = manager.create_booking(request(tour.id, 2)).await.unwrap().booking.id;
        let cancelled = manager.create_booking(request(tour.id, 1)).await.unwrap().booking.id;
        manager.transition_status(cancelled, "cancelled").await.unwrap();
        assert_eq!(seats_of(&store, tour.id).await, Some(3));

        manager.delete_booking(active).await.unwrap();
        assert_eq!(seats_of(&store, tour.id).await, Some(5));

        // Seats of a cancelled booking were already returned.
        manager.delete_booking(cancelled).await.unwrap();
        assert_eq!(seats_of(&store, tour.id).await, Some(5));

        assert!(matches!(
            manager.delete_booking(active).await,
            Err(BookingError::BookingNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_listings_newest_first_with_summary() {
        let (_store, manager, tour) = setup(None, vec![]).await;

        let req = request(tour.id, 1);
        let user_id = req.user_id;
        let first = manager.create_booking(req.clone()).await.unwrap().booking.id;
        let second = manager.create_booking(req).await.unwrap().booking.id;
        manager.create_booking(request(tour.id, 1)).await.unwrap();

        let mine = manager.list_user_bookings(user_id).await.unwrap();
        assert_eq!(mine.len(), 2);
        assert_eq!(mine[0].booking.id, second);
        assert_eq!(mine[1].booking.id, first);
        assert!(mine.iter().all(|v| v.tour_package.as_ref().map(|t| t.id) == Some(tour.id)));

        assert_eq!(manager.list_all_bookings().await.unwrap().len(), 3);
    }

    struct RejectingBookings;

    #[async_trait]
    impl BookingRepository for RejectingBookings {
        async fn insert_booking(&self, _booking: &Booking) -> StoreResult<bool> {
            Err(StoreError::backend("connection reset"))
        }
        async fn fetch_booking(&self, _id: Uuid) -> StoreResult<Option<Booking>> {
            Ok(None)
        }
        async fn list_bookings_for_user(&self, _user_id: Uuid) -> StoreResult<Vec<Booking>> {
            Ok(vec![])
        }
        async fn list_bookings(&self) -> StoreResult<Vec<Booking>> {
            Ok(vec![])
        }
        async fn update_booking_status(
            &self,
            _id: Uuid,
            _expected: BookingStatus,
            _next: BookingStatus,
        ) -> StoreResult<Option<Booking>> {
            Ok(None)
        }
        async fn delete_booking(&self, _id: Uuid) -> StoreResult<Option<Booking>> {
            Ok(None)
        }
    }

    #[tokio::test]
    async fn test_failed_insert_returns_seats() {
        let store = Arc::new(MemoryStore::new());
        let tour = store.create_tour(&new_tour(Some(4), vec![])).await.unwrap();
        let manager = BookingManager::new(store.clone(), Arc::new(RejectingBookings), store.clone());

        let result = manager.create_booking(request(tour.id, 3)).await;
        assert!(matches!(result, Err(BookingError::Store(_))));
        assert_eq!(seats_of(&store, tour.id).await, Some(4));
    }

    #[tokio::test]
    async fn test_open_tour_rejects_past_dates() {
        let (store, manager, tour) = setup(Some(5), vec![]).await;

        let mut past = request(tour.id, 1);
        past.tour_date = Utc.with_ymd_and_hms(2001, 1, 1, 0, 0, 0).unwrap();
        assert!(matches!(manager.create_booking(past).await, Err(BookingError::InvalidDate)));

        let mut yesterday = request(tour.id, 1);
        yesterday.tour_date = Utc::now() - chrono::Duration::days(1);
        assert!(matches!(manager.create_booking(yesterday).await, Err(BookingError::InvalidDate)));

        let mut today = request(tour.id, 1);
        today.tour_date = Utc::now();
        assert!(manager.create_booking(today).await.is_ok());
        assert_eq!(seats_of(&store, tour.id).await, Some(4));
    }

    #[tokio::test]
    async fn test_last_seats_then_cancel_restores() {
        let (store, manager, tour) = setup(Some(2), vec![]).await;

        let first = manager.create_booking(request(tour.id, 2)).await.unwrap();
        assert_eq!(first.booking.total_amount, 2000.0);
        assert_eq!(first.booking.status, BookingStatus::Pending);
        assert_eq!(seats_of(&store, tour.id).await, Some(0));

        let second = manager.create_booking(request(tour.id, 1)).await;
        assert!(matches!(
            second,
            Err(BookingError::InsufficientInventory { requested: 1, available: 0 })
        ));

        manager.transition_status(first.booking.id, "cancelled").await.unwrap();
        assert_eq!(seats_of(&store, tour.id).await, Some(2));
    }

    #[tokio::test]
    async fn test_views_carry_booking_owner() {
        let (store, manager, tour) = setup(None, vec![]).await;
        let owner = store
            .create_user(&NewUser {
                name: "Meera".to_string(),
                email: "meera@example.com".to_string(),
                password_hash: "hash".to_string(),
                role: Role::User,
            })
            .await
            .unwrap();

        let mut req = request(tour.id, 1);
        req.user_id = owner.id;
        let created = manager.create_booking(req).await.unwrap();
        let summary = created.user.as_ref().unwrap();
        assert_eq!(summary.email, "meera@example.com");

        let fetched = manager.get_booking(created.booking.id).await.unwrap();
        assert_eq!(fetched.user.unwrap().id, owner.id);

        manager.create_booking(request(tour.id, 1)).await.unwrap();
        let all = manager.list_all_bookings().await.unwrap();
        assert_eq!(all.len(), 2);
        assert!(all[0].user.is_none());
        assert_eq!(all[1].user.as_ref().map(|u| u.name.as_str()), Some("Meera"));
    }

    /// Lets a tour delete run between a booking's seat reservation and its insert.
    struct DeleteBeforeInsert {
        store: Arc<MemoryStore>,
    }

    #[async_trait]
    impl BookingRepository for DeleteBeforeInsert {
        async fn insert_booking(&self, booking: &Booking) -> StoreResult<bool> {
            self.store.delete_tour_if_unused(booking.tour_id).await?;
            self.store.insert_booking(booking).await
        }
        async fn fetch_booking(&self, id: Uuid) -> StoreResult<Option<Booking>> {
            self.store.fetch_booking(id).await
        }
        async fn list_bookings_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Booking>> {
            self.store.list_bookings_for_user(user_id).await
        }
        async fn list_bookings(&self) -> StoreResult<Vec<Booking>> {
            self.store.list_bookings().await
        }
        async fn update_booking_status(
            &self,
            id: Uuid,
            expected: BookingStatus,
            next: BookingStatus,
        ) -> StoreResult<Option<Booking>> {
            self.store.update_booking_status(id, expected, next).await
        }
        async fn delete_booking(&self, id: Uuid) -> StoreResult<Option<Booking>> {
            self.store.delete_booking(id).await
        }
    }

    #[tokio::test]
    async fn test_booking_never_lands_on_deleted_tour() {
        let store = Arc::new(MemoryStore::new());
        let tour = store.create_tour(&new_tour(Some(4), vec![])).await.unwrap();
        let racing = Arc::new(DeleteBeforeInsert { store: store.clone() });
        let manager = BookingManager::new(store.clone(), racing, store.clone());

        let result = manager.create_booking(request(tour.id, 1)).await;
        assert!(matches!(result, Err(BookingError::TourNotFound(_))));
        assert!(store.fetch_tour(tour.id).await.unwrap().is_none());
        assert!(store.list_bookings().await.unwrap().is_empty());
    }
}
