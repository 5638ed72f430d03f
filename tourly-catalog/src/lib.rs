pub mod inventory;
pub mod pricing;
pub mod repository;
pub mod tour;

pub use inventory::{CapacityError, InventoryError, SeatInventory, SeatReservation};
pub use pricing::PriceQuote;
pub use repository::{TourRemoval, TourRepository};
pub use tour::{NewTour, Tour, TourSummary, TourUpdate};

use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Tour not found: {0}")]
    NotFound(Uuid),

    #[error("Invalid tour: {0}")]
    InvalidTour(String),

    #[error("Cannot delete tour {0} while it has active bookings")]
    TourInUse(Uuid),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    Store(#[from] tourly_core::StoreError),
}
