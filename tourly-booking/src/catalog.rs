use std::sync::Arc;

use chrono::Utc;
use tourly_catalog::{CatalogError, NewTour, Tour, TourRemoval, TourRepository, TourUpdate};
use tourly_core::StoreError;
use tracing::info;
use uuid::Uuid;

/// Tour administration. A tour cannot be removed while pending or confirmed
/// bookings still hold its seats.
pub struct TourCatalog {
    tours: Arc<dyn TourRepository>,
}

impl TourCatalog {
    pub fn new(tours: Arc<dyn TourRepository>) -> Self {
        Self { tours }
    }

    pub async fn list_tours(&self) -> Result<Vec<Tour>, CatalogError> {
        Ok(self.tours.list_tours().await?)
    }

    pub async fn get_tour(&self, id: Uuid) -> Result<Tour, CatalogError> {
        self.tours.fetch_tour(id).await?.ok_or(CatalogError::NotFound(id))
    }

    pub async fn create_tour(&self, new_tour: NewTour) -> Result<Tour, CatalogError> {
        new_tour.validate()?;
        let tour = new_tour.into_tour(Utc::now());

        let created = self.tours.create_tour(&tour).await.map_err(title_conflict)?;
        info!(tour_id = %created.id, title = %created.title, seats = ?created.available_seats, "Tour created");
        Ok(created)
    }

    pub async fn update_tour(&self, id: Uuid, update: TourUpdate) -> Result<Tour, CatalogError> {
        update.validate()?;
        let updated = self
            .tours
            .update_tour(id, update)
            .await
            .map_err(title_conflict)?
            .ok_or(CatalogError::NotFound(id))?;
        info!(tour_id = %id, seats = ?updated.available_seats, capacity = ?updated.seat_capacity, "Tour updated");
        Ok(updated)
    }

    pub async fn delete_tour(&self, id: Uuid) -> Result<(), CatalogError> {
        match self.tours.delete_tour_if_unused(id).await? {
            TourRemoval::Deleted => {
                info!(tour_id = %id, "Tour deleted");
                Ok(())
            }
            TourRemoval::NotFound => Err(CatalogError::NotFound(id)),
            TourRemoval::InUse => Err(CatalogError::TourInUse(id)),
        }
    }
}

fn title_conflict(err: StoreError) -> CatalogError {
    match err {
        StoreError::UniqueViolation(_) => {
            CatalogError::Conflict("A tour with this title already exists".to_string())
        }
        StoreError::Rejected(reason) => CatalogError::InvalidTour(reason),
        other => CatalogError::Store(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manager::BookingManager;
    use crate::memory::MemoryStore;
    use crate::models::BookingRequest;
    use tourly_core::{CustomerInfo, GuestDetails};

    fn new_tour(title: &str) -> NewTour {
        serde_json::from_value(serde_json::json!({
            "title": title,
            "description": "Tea estates and hill trains",
            "location": "Darjeeling",
            "price": 5400.0,
            "duration": 4,
            "maxGroupSize": 15,
            "availableSeats": 15
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_tour_admin_flow() {
        let store = Arc::new(MemoryStore::new());
        let catalog = TourCatalog::new(store.clone());

        let tour = catalog.create_tour(new_tour("Darjeeling Heritage")).await.unwrap();
        assert_eq!(tour.seat_capacity, Some(15));

        let duplicate = catalog.create_tour(new_tour("Darjeeling Heritage")).await;
        assert!(matches!(duplicate, Err(CatalogError::Conflict(_))));

        let updated = catalog
            .update_tour(tour.id, TourUpdate { price: Some(6000.0), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(updated.price, 6000.0);

        catalog.delete_tour(tour.id).await.unwrap();
        assert!(matches!(catalog.get_tour(tour.id).await, Err(CatalogError::NotFound(_))));
        assert!(matches!(catalog.delete_tour(tour.id).await, Err(CatalogError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_tour_with_active_booking_cannot_be_deleted() {
        let store = Arc::new(MemoryStore::new());
        let catalog = TourCatalog::new(store.clone());
        let manager = BookingManager::new(store.clone(), store.clone(), store.clone());

        let tour = catalog.create_tour(new_tour("Sikkim Monasteries")).await.unwrap();
        let booking = manager
            .create_booking(BookingRequest {
                user_id: Uuid::new_v4(),
                tour_id: tour.id,
                number_of_guests: 1,
                tour_date: Utc::now(),
                customer_info: CustomerInfo::new("Tenzin", "tenzin@example.com", "555-0199"),
                guests: vec![GuestDetails::new("Tenzin", "tenzin@example.com", "555-0199")],
                special_requests: None,
                emergency_contact: None,
            })
            .await
            .unwrap();

        assert!(matches!(catalog.delete_tour(tour.id).await, Err(CatalogError::TourInUse(_))));

        manager.transition_status(booking.booking.id, "cancelled").await.unwrap();
        catalog.delete_tour(tour.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_invalid_tour_rejected() {
        let store = Arc::new(MemoryStore::new());
        let catalog = TourCatalog::new(store.clone());

        let mut tour = new_tour("Zero Price");
        tour.price = 0.0;
        assert!(matches!(catalog.create_tour(tour).await, Err(CatalogError::InvalidTour(_))));
    }

    #[tokio::test]
    async fn test_capacity_edit_respects_booked_seats() {
        let store = Arc::new(MemoryStore::new());
        let catalog = TourCatalog::new(store.clone());
        let tour = catalog.create_tour(new_tour("Munnar Tea Trails")).await.unwrap();
        store.reserve_seats(tour.id, 10).await.unwrap();

        let shrink = TourUpdate { seat_capacity: Some(9), ..Default::default() };
        assert!(matches!(catalog.update_tour(tour.id, shrink).await, Err(CatalogError::InvalidTour(_))));

        let grow = TourUpdate { seat_capacity: Some(20), ..Default::default() };
        let updated = catalog.update_tour(tour.id, grow).await.unwrap();
        assert_eq!(updated.available_seats, Some(10));
        assert_eq!(updated.seat_capacity, Some(20));
    }
}
