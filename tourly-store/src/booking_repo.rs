use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use tourly_booking::{Booking, BookingRepository, BookingStatus};
use tourly_core::{CustomerInfo, EmergencyContact, GuestDetails, StoreError, StoreResult};
use uuid::Uuid;

use crate::database::store_error;

pub struct PgBookingRepository {
    pool: PgPool,
}

impl PgBookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const BOOKING_COLUMNS: &str = "id, user_id, tour_id, tour_date, number_of_guests, total_amount, status, \
     payment_status, guests, customer_info, emergency_contact, special_requests, booking_reference, \
     created_at, updated_at";

// Guest and contact records are stored as JSONB documents.
#[derive(sqlx::FromRow)]
struct BookingRow {
    id: Uuid,
    user_id: Uuid,
    tour_id: Uuid,
    tour_date: DateTime<Utc>,
    number_of_guests: i32,
    total_amount: f64,
    status: String,
    payment_status: String,
    guests: Json<Vec<GuestDetails>>,
    customer_info: Json<CustomerInfo>,
    emergency_contact: Option<Json<EmergencyContact>>,
    special_requests: Option<String>,
    booking_reference: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = StoreError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        Ok(Booking {
            id: row.id,
            user_id: row.user_id,
            tour_id: row.tour_id,
            tour_date: row.tour_date,
            number_of_guests: u32::try_from(row.number_of_guests).map_err(StoreError::backend)?,
            total_amount: row.total_amount,
            status: row.status.parse().map_err(StoreError::backend)?,
            payment_status: row.payment_status.parse().map_err(StoreError::backend)?,
            guests: row.guests.0,
            customer_info: row.customer_info.0,
            emergency_contact: row.emergency_contact.map(|c| c.0),
            special_requests: row.special_requests,
            booking_reference: row.booking_reference,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn into_bookings(rows: Vec<BookingRow>) -> StoreResult<Vec<Booking>> {
    rows.into_iter().map(Booking::try_from).collect()
}

#[async_trait]
impl BookingRepository for PgBookingRepository {
    async fn insert_booking(&self, booking: &Booking) -> StoreResult<bool> {
        let guests = i32::try_from(booking.number_of_guests).map_err(StoreError::backend)?;

        let mut tx = self.pool.begin().await.map_err(store_error)?;

        // Held until commit; a concurrent tour delete waits on it.
        let tour: Option<Uuid> = sqlx::query_scalar("SELECT id FROM tours WHERE id = $1 FOR SHARE")
            .bind(booking.tour_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(store_error)?;

        if tour.is_none() {
            return Ok(false);
        }

        sqlx::query(
            r#"
            INSERT INTO bookings (id, user_id, tour_id, tour_date, number_of_guests, total_amount, status,
                                  payment_status, guests, customer_info, emergency_contact, special_requests,
                                  booking_reference, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(booking.id)
        .bind(booking.user_id)
        .bind(booking.tour_id)
        .bind(booking.tour_date)
        .bind(guests)
        .bind(booking.total_amount)
        .bind(booking.status.as_str())
        .bind(booking.payment_status.as_str())
        .bind(Json(&booking.guests))
        .bind(Json(&booking.customer_info))
        .bind(booking.emergency_contact.as_ref().map(Json))
        .bind(&booking.special_requests)
        .bind(&booking.booking_reference)
        .bind(booking.created_at)
        .bind(booking.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(store_error)?;

        tx.commit().await.map_err(store_error)?;
        Ok(true)
    }

    async fn fetch_booking(&self, id: Uuid) -> StoreResult<Option<Booking>> {
        sqlx::query_as::<_, BookingRow>(&format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)?
            .map(Booking::try_from)
            .transpose()
    }

    async fn list_bookings_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Booking>> {
        let rows = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(store_error)?;

        into_bookings(rows)
    }

    async fn list_bookings(&self) -> StoreResult<Vec<Booking>> {
        let rows = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(store_error)?;

        into_bookings(rows)
    }

    async fn update_booking_status(
        &self,
        id: Uuid,
        expected: BookingStatus,
        next: BookingStatus,
    ) -> StoreResult<Option<Booking>> {
        sqlx::query_as::<_, BookingRow>(&format!(
            r#"
            UPDATE bookings
            SET status = $3, updated_at = NOW()
            WHERE id = $1 AND status = $2
            RETURNING {BOOKING_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(expected.as_str())
        .bind(next.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)?
        .map(Booking::try_from)
        .transpose()
    }

    async fn delete_booking(&self, id: Uuid) -> StoreResult<Option<Booking>> {
        sqlx::query_as::<_, BookingRow>(&format!(
            "DELETE FROM bookings WHERE id = $1 RETURNING {BOOKING_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)?
        .map(Booking::try_from)
        .transpose()
    }
}
