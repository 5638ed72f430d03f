use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use tourly_catalog::{SeatReservation, Tour, TourRemoval, TourRepository, TourUpdate};
use tourly_core::identity::{normalize_email, NewUser};
use tourly_core::repository::{UserRemoval, UserRepository};
use tourly_core::{AccountStatus, Role, StoreError, StoreResult, User};
use uuid::Uuid;

use crate::models::{Booking, BookingStatus};
use crate::repository::BookingRepository;

/// In-process document store for tours, bookings and users.
///
/// One lock covers every collection, so each operation is atomic the way a
/// single statement or transaction is in Postgres, including the ones that
/// look across collections. Used by the `memory` storage backend and by tests.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Documents>,
}

#[derive(Default)]
struct Documents {
    tours: HashMap<Uuid, Stored<Tour>>,
    bookings: HashMap<Uuid, Stored<Booking>>,
    users: HashMap<Uuid, Stored<User>>,
    next_seq: u64,
}

struct Stored<T> {
    seq: u64,
    record: T,
}

impl Documents {
    fn seq(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }

    fn has_active_booking(&self, matches: impl Fn(&Booking) -> bool) -> bool {
        self.bookings
            .values()
            .any(|s| s.record.status.is_active() && matches(&s.record))
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Newest first; insertion order breaks timestamp ties.
fn newest_first<T: Clone>(records: Vec<&Stored<T>>, created_at: impl Fn(&T) -> chrono::DateTime<Utc>) -> Vec<T> {
    let mut records = records;
    records.sort_by(|a, b| {
        created_at(&b.record)
            .cmp(&created_at(&a.record))
            .then(b.seq.cmp(&a.seq))
    });
    records.into_iter().map(|s| s.record.clone()).collect()
}

#[async_trait]
impl TourRepository for MemoryStore {
    async fn fetch_tour(&self, id: Uuid) -> StoreResult<Option<Tour>> {
        let docs = self.inner.lock().await;
        Ok(docs.tours.get(&id).map(|s| s.record.clone()))
    }

    async fn list_tours(&self) -> StoreResult<Vec<Tour>> {
        let docs = self.inner.lock().await;
        Ok(newest_first(docs.tours.values().collect(), |t| t.created_at))
    }

    async fn create_tour(&self, tour: &Tour) -> StoreResult<Tour> {
        let mut docs = self.inner.lock().await;
        if docs.tours.values().any(|s| s.record.title == tour.title) {
            return Err(StoreError::UniqueViolation(format!("tour title '{}'", tour.title)));
        }
        let seq = docs.seq();
        docs.tours.insert(tour.id, Stored { seq, record: tour.clone() });
        Ok(tour.clone())
    }

    async fn update_tour(&self, id: Uuid, update: TourUpdate) -> StoreResult<Option<Tour>> {
        let mut docs = self.inner.lock().await;
        if let Some(title) = &update.title {
            let title = title.trim();
            if docs.tours.values().any(|s| s.record.id != id && s.record.title == title) {
                return Err(StoreError::UniqueViolation(format!("tour title '{}'", title)));
            }
        }
        let Some(stored) = docs.tours.get_mut(&id) else {
            return Ok(None);
        };
        let mut tour = stored.record.clone();
        update
            .apply(&mut tour, Utc::now())
            .map_err(|e| StoreError::Rejected(e.to_string()))?;
        stored.record = tour;
        Ok(Some(stored.record.clone()))
    }

    async fn delete_tour_if_unused(&self, id: Uuid) -> StoreResult<TourRemoval> {
        let mut docs = self.inner.lock().await;
        if !docs.tours.contains_key(&id) {
            return Ok(TourRemoval::NotFound);
        }
        if docs.has_active_booking(|b| b.tour_id == id) {
            return Ok(TourRemoval::InUse);
        }
        docs.tours.remove(&id);
        Ok(TourRemoval::Deleted)
    }

    async fn reserve_seats(&self, id: Uuid, seats: u32) -> StoreResult<SeatReservation> {
        let mut docs = self.inner.lock().await;
        let Some(stored) = docs.tours.get_mut(&id) else {
            return Ok(SeatReservation::TourMissing);
        };
        let mut inventory = stored.record.inventory();
        let outcome = inventory.reserve(seats);
        if let SeatReservation::Reserved { .. } = outcome {
            stored.record.available_seats = inventory.available;
            stored.record.updated_at = Utc::now();
        }
        Ok(outcome)
    }

    async fn release_seats(&self, id: Uuid, seats: u32) -> StoreResult<Option<i32>> {
        let mut docs = self.inner.lock().await;
        let Some(stored) = docs.tours.get_mut(&id) else {
            return Ok(None);
        };
        let mut inventory = stored.record.inventory();
        let restored = inventory.release(seats);
        if restored.is_some() {
            stored.record.available_seats = restored;
            stored.record.updated_at = Utc::now();
        }
        Ok(restored)
    }
}

#[async_trait]
impl BookingRepository for MemoryStore {
    async fn insert_booking(&self, booking: &Booking) -> StoreResult<bool> {
        let mut docs = self.inner.lock().await;
        if !docs.tours.contains_key(&booking.tour_id) {
            return Ok(false);
        }
        if docs
            .bookings
            .values()
            .any(|s| s.record.booking_reference == booking.booking_reference)
        {
            return Err(StoreError::UniqueViolation(format!(
                "booking reference '{}'",
                booking.booking_reference
            )));
        }
        let seq = docs.seq();
        docs.bookings.insert(booking.id, Stored { seq, record: booking.clone() });
        Ok(true)
    }

    async fn fetch_booking(&self, id: Uuid) -> StoreResult<Option<Booking>> {
        let docs = self.inner.lock().await;
        Ok(docs.bookings.get(&id).map(|s| s.record.clone()))
    }

    async fn list_bookings_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Booking>> {
        let docs = self.inner.lock().await;
        let owned = docs.bookings.values().filter(|s| s.record.user_id == user_id).collect();
        Ok(newest_first(owned, |b| b.created_at))
    }

    async fn list_bookings(&self) -> StoreResult<Vec<Booking>> {
        let docs = self.inner.lock().await;
        Ok(newest_first(docs.bookings.values().collect(), |b| b.created_at))
    }

    async fn update_booking_status(
        &self,
        id: Uuid,
        expected: BookingStatus,
        next: BookingStatus,
    ) -> StoreResult<Option<Booking>> {
        let mut docs = self.inner.lock().await;
        match docs.bookings.get_mut(&id) {
            Some(stored) if stored.record.status == expected => {
                stored.record.status = next;
                stored.record.updated_at = Utc::now();
                Ok(Some(stored.record.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn delete_booking(&self, id: Uuid) -> StoreResult<Option<Booking>> {
        let mut docs = self.inner.lock().await;
        Ok(docs.bookings.remove(&id).map(|s| s.record))
    }

}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create_user(&self, user: &NewUser) -> StoreResult<User> {
        let mut docs = self.inner.lock().await;
        let email = normalize_email(&user.email);
        if docs.users.values().any(|s| s.record.email == email) {
            return Err(StoreError::UniqueViolation(format!("users.email = {}", email)));
        }

        let created = User {
            id: Uuid::new_v4(),
            name: user.name.clone(),
            email,
            password_hash: user.password_hash.clone(),
            role: user.role,
            status: AccountStatus::Active,
            created_at: Utc::now(),
        };
        let seq = docs.seq();
        docs.users.insert(created.id, Stored { seq, record: created.clone() });
        Ok(created)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let email = normalize_email(email);
        let docs = self.inner.lock().await;
        Ok(docs.users.values().find(|s| s.record.email == email).map(|s| s.record.clone()))
    }

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        let docs = self.inner.lock().await;
        Ok(docs.users.get(&id).map(|s| s.record.clone()))
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let docs = self.inner.lock().await;
        Ok(newest_first(docs.users.values().collect(), |u| u.created_at))
    }

    async fn update_user_role(&self, id: Uuid, role: Role) -> StoreResult<Option<User>> {
        let mut docs = self.inner.lock().await;
        Ok(docs.users.get_mut(&id).map(|s| {
            s.record.role = role;
            s.record.clone()
        }))
    }

    async fn update_user_status(&self, id: Uuid, status: AccountStatus) -> StoreResult<Option<User>> {
        let mut docs = self.inner.lock().await;
        Ok(docs.users.get_mut(&id).map(|s| {
            s.record.status = status;
            s.record.clone()
        }))
    }

    async fn delete_user_if_unused(&self, id: Uuid) -> StoreResult<UserRemoval> {
        let mut docs = self.inner.lock().await;
        match docs.users.get(&id) {
            None => return Ok(UserRemoval::NotFound),
            Some(stored) if stored.record.role == Role::Admin => return Ok(UserRemoval::Admin),
            Some(_) => {}
        }
        if docs.has_active_booking(|b| b.user_id == id) {
            return Ok(UserRemoval::HasActiveBookings);
        }
        Ok(docs
            .users
            .remove(&id)
            .map_or(UserRemoval::NotFound, |s| UserRemoval::Deleted(s.record)))
    }
}
