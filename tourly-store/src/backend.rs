use std::sync::Arc;

use tourly_booking::{BookingRepository, MemoryStore};
use tourly_catalog::TourRepository;
use tourly_core::repository::UserRepository;
use tracing::info;

use crate::app_config::{DatabaseConfig, StorageBackend};
use crate::booking_repo::PgBookingRepository;
use crate::database::DbClient;
use crate::tour_repo::PgTourRepository;
use crate::user_repo::PgUserRepository;

/// The three repository handles the services are built from.
#[derive(Clone)]
pub struct Repositories {
    pub tours: Arc<dyn TourRepository>,
    pub bookings: Arc<dyn BookingRepository>,
    pub users: Arc<dyn UserRepository>,
}

impl Repositories {
    /// All three ports share one store so checks that span collections stay atomic.
    pub fn memory() -> Self {
        let store = Arc::new(MemoryStore::new());
        Self {
            tours: store.clone(),
            bookings: store.clone(),
            users: store,
        }
    }

    pub fn postgres(db: &DbClient) -> Self {
        Self {
            tours: Arc::new(PgTourRepository::new(db.pool.clone())),
            bookings: Arc::new(PgBookingRepository::new(db.pool.clone())),
            users: Arc::new(PgUserRepository::new(db.pool.clone())),
        }
    }

    /// Connect the configured backend, running migrations for Postgres.
    pub async fn connect(backend: StorageBackend, database: &DatabaseConfig) -> Result<Self, sqlx::Error> {
        match backend {
            StorageBackend::Memory => {
                info!("Using in-memory storage backend");
                Ok(Self::memory())
            }
            StorageBackend::Postgres => {
                let db = DbClient::new(&database.url, database.max_connections).await?;
                db.migrate().await?;
                info!("Connected to Postgres");
                Ok(Self::postgres(&db))
            }
        }
    }
}
