use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tourly_catalog::{SeatReservation, Tour, TourRemoval, TourRepository, TourUpdate};
use tourly_core::{StoreError, StoreResult};
use uuid::Uuid;

use crate::database::store_error;

pub struct PgTourRepository {
    pool: PgPool,
}

impl PgTourRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const TOUR_COLUMNS: &str = "id, title, description, location, price, duration_days, max_group_size, \
     images, available_seats, seat_capacity, available_dates, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct TourRow {
    id: Uuid,
    title: String,
    description: String,
    location: String,
    price: f64,
    duration_days: i32,
    max_group_size: i32,
    images: Vec<String>,
    available_seats: Option<i32>,
    seat_capacity: Option<i32>,
    available_dates: Vec<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<TourRow> for Tour {
    fn from(row: TourRow) -> Self {
        Tour {
            id: row.id,
            title: row.title,
            description: row.description,
            location: row.location,
            price: row.price,
            duration: row.duration_days,
            max_group_size: row.max_group_size,
            images: row.images,
            available_seats: row.available_seats,
            seat_capacity: row.seat_capacity,
            available_dates: row.available_dates,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl TourRepository for PgTourRepository {
    async fn fetch_tour(&self, id: Uuid) -> StoreResult<Option<Tour>> {
        let row = sqlx::query_as::<_, TourRow>(&format!("SELECT {TOUR_COLUMNS} FROM tours WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)?;

        Ok(row.map(Tour::from))
    }

    async fn list_tours(&self) -> StoreResult<Vec<Tour>> {
        let rows = sqlx::query_as::<_, TourRow>(&format!(
            "SELECT {TOUR_COLUMNS} FROM tours ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(store_error)?;

        Ok(rows.into_iter().map(Tour::from).collect())
    }

    async fn create_tour(&self, tour: &Tour) -> StoreResult<Tour> {
        let row = sqlx::query_as::<_, TourRow>(&format!(
            r#"
            INSERT INTO tours (id, title, description, location, price, duration_days, max_group_size,
                               images, available_seats, seat_capacity, available_dates, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING {TOUR_COLUMNS}
            "#
        ))
        .bind(tour.id)
        .bind(&tour.title)
        .bind(&tour.description)
        .bind(&tour.location)
        .bind(tour.price)
        .bind(tour.duration)
        .bind(tour.max_group_size)
        .bind(&tour.images)
        .bind(tour.available_seats)
        .bind(tour.seat_capacity)
        .bind(&tour.available_dates)
        .bind(tour.created_at)
        .bind(tour.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(store_error)?;

        Ok(row.into())
    }

    async fn update_tour(&self, id: Uuid, update: TourUpdate) -> StoreResult<Option<Tour>> {
        let mut tx = self.pool.begin().await.map_err(store_error)?;

        let row = sqlx::query_as::<_, TourRow>(&format!(
            "SELECT {TOUR_COLUMNS} FROM tours WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(store_error)?;

        let Some(row) = row else {
            return Ok(None);
        };
        let mut tour = Tour::from(row);
        update
            .apply(&mut tour, Utc::now())
            .map_err(|e| StoreError::Rejected(e.to_string()))?;

        // The row lock keeps reserve/release out while the seat columns are rewritten.
        let row = sqlx::query_as::<_, TourRow>(&format!(
            r#"
            UPDATE tours
            SET title = $2, description = $3, location = $4, price = $5, duration_days = $6,
                max_group_size = $7, images = $8, available_dates = $9, updated_at = $10,
                available_seats = $11, seat_capacity = $12
            WHERE id = $1
            RETURNING {TOUR_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&tour.title)
        .bind(&tour.description)
        .bind(&tour.location)
        .bind(tour.price)
        .bind(tour.duration)
        .bind(tour.max_group_size)
        .bind(&tour.images)
        .bind(&tour.available_dates)
        .bind(tour.updated_at)
        .bind(tour.available_seats)
        .bind(tour.seat_capacity)
        .fetch_one(&mut *tx)
        .await
        .map_err(store_error)?;

        tx.commit().await.map_err(store_error)?;
        Ok(Some(row.into()))
    }

    async fn delete_tour_if_unused(&self, id: Uuid) -> StoreResult<TourRemoval> {
        let mut tx = self.pool.begin().await.map_err(store_error)?;

        // Booking inserts hold FOR SHARE on this row, so this waits for them
        // and the DELETE below sees every booking they committed.
        let locked: Option<Uuid> = sqlx::query_scalar("SELECT id FROM tours WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(store_error)?;

        if locked.is_none() {
            return Ok(TourRemoval::NotFound);
        }

        let result = sqlx::query(
            r#"
            DELETE FROM tours
            WHERE id = $1
              AND NOT EXISTS (
                  SELECT 1 FROM bookings WHERE tour_id = $1 AND status IN ('pending', 'confirmed')
              )
            "#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(store_error)?;

        tx.commit().await.map_err(store_error)?;

        Ok(if result.rows_affected() > 0 {
            TourRemoval::Deleted
        } else {
            TourRemoval::InUse
        })
    }

    async fn reserve_seats(&self, id: Uuid, seats: u32) -> StoreResult<SeatReservation> {
        let requested = i32::try_from(seats).unwrap_or(i32::MAX);

        let remaining: Option<i32> = sqlx::query_scalar(
            r#"
            UPDATE tours
            SET available_seats = available_seats - $2, updated_at = NOW()
            WHERE id = $1 AND available_seats IS NOT NULL AND available_seats >= $2
            RETURNING available_seats
            "#,
        )
        .bind(id)
        .bind(requested)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)?;

        if let Some(remaining) = remaining {
            return Ok(SeatReservation::Reserved {
                remaining: Some(remaining),
            });
        }

        // No row updated: the tour is missing, unlimited, or short of seats.
        let current: Option<Option<i32>> =
            sqlx::query_scalar("SELECT available_seats FROM tours WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(store_error)?;

        Ok(match current {
            None => SeatReservation::TourMissing,
            Some(None) => SeatReservation::Reserved { remaining: None },
            Some(Some(available)) => SeatReservation::Insufficient { available },
        })
    }

    async fn release_seats(&self, id: Uuid, seats: u32) -> StoreResult<Option<i32>> {
        let seats = i32::try_from(seats).unwrap_or(i32::MAX);

        sqlx::query_scalar(
            r#"
            UPDATE tours
            SET available_seats = LEAST(available_seats + $2, COALESCE(seat_capacity, available_seats + $2)),
                updated_at = NOW()
            WHERE id = $1 AND available_seats IS NOT NULL
            RETURNING available_seats
            "#,
        )
        .bind(id)
        .bind(seats)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)
    }
}
