use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tourly_core::dates::{deserialize_tour_dates, same_calendar_day};
use uuid::Uuid;

use crate::inventory::{CapacityError, SeatInventory};
use crate::CatalogError;

/// A bookable travel package
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Tour {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub location: String,
    pub price: f64,
    /// Length of the tour in days.
    pub duration: i32,
    pub max_group_size: i32,
    pub images: Vec<String>,
    /// `None` means the tour is not seat-limited.
    pub available_seats: Option<i32>,
    pub seat_capacity: Option<i32>,
    /// Fixed departure days. Empty means any day from today on.
    pub available_dates: Vec<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Tour {
    /// Whether `date` falls on one of the fixed departure days, or on any
    /// day not before `today` when the tour has none.
    pub fn accepts_date(&self, date: &DateTime<Utc>, today: NaiveDate) -> bool {
        if self.available_dates.is_empty() {
            return date.date_naive() >= today;
        }
        self.available_dates.iter().any(|d| same_calendar_day(d, date))
    }

    pub fn inventory(&self) -> SeatInventory {
        SeatInventory {
            available: self.available_seats,
            capacity: self.seat_capacity.or(self.available_seats),
        }
    }

    pub fn summary(&self) -> TourSummary {
        TourSummary {
            id: self.id,
            title: self.title.clone(),
            location: self.location.clone(),
            price: self.price,
            images: self.images.clone(),
        }
    }
}

/// The tour fields embedded in booking responses.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TourSummary {
    pub id: Uuid,
    pub title: String,
    pub location: String,
    pub price: f64,
    pub images: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTour {
    pub title: String,
    pub description: String,
    pub location: String,
    pub price: f64,
    pub duration: i32,
    pub max_group_size: i32,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub available_seats: Option<i32>,
    #[serde(default, deserialize_with = "deserialize_tour_dates")]
    pub available_dates: Vec<DateTime<Utc>>,
}

impl NewTour {
    pub fn validate(&self) -> Result<(), CatalogError> {
        require_text("title", &self.title)?;
        require_text("description", &self.description)?;
        require_text("location", &self.location)?;
        require_positive_price(self.price)?;
        require_positive("duration", self.duration)?;
        require_positive("maxGroupSize", self.max_group_size)?;
        if let Some(seats) = self.available_seats {
            if seats < 0 {
                return Err(CatalogError::InvalidTour("availableSeats cannot be negative".to_string()));
            }
        }
        Ok(())
    }

    /// Build the stored record; seat capacity mirrors the initial seat count.
    pub fn into_tour(self, now: DateTime<Utc>) -> Tour {
        let mut available_dates = self.available_dates;
        available_dates.sort();

        Tour {
            id: Uuid::new_v4(),
            title: self.title.trim().to_string(),
            description: self.description,
            location: self.location,
            price: self.price,
            duration: self.duration,
            max_group_size: self.max_group_size,
            images: self.images,
            available_seats: self.available_seats,
            seat_capacity: self.available_seats,
            available_dates,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Admin edit of a tour. The available seat count follows the booking flow;
/// only the capacity can be changed here, and seats already sold stay sold.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TourUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub price: Option<f64>,
    pub duration: Option<i32>,
    pub max_group_size: Option<i32>,
    pub images: Option<Vec<String>>,
    #[serde(default, deserialize_with = "deserialize_optional_dates")]
    pub available_dates: Option<Vec<DateTime<Utc>>>,
    pub seat_capacity: Option<i32>,
}

impl TourUpdate {
    pub fn validate(&self) -> Result<(), CatalogError> {
        if let Some(title) = &self.title {
            require_text("title", title)?;
        }
        if let Some(description) = &self.description {
            require_text("description", description)?;
        }
        if let Some(location) = &self.location {
            require_text("location", location)?;
        }
        if let Some(price) = self.price {
            require_positive_price(price)?;
        }
        if let Some(duration) = self.duration {
            require_positive("duration", duration)?;
        }
        if let Some(size) = self.max_group_size {
            require_positive("maxGroupSize", size)?;
        }
        if let Some(capacity) = self.seat_capacity {
            if capacity < 0 {
                return Err(CatalogError::InvalidTour("seatCapacity cannot be negative".to_string()));
            }
        }
        Ok(())
    }

    /// Apply to the stored record. Fails without touching `tour` when the new
    /// capacity cannot hold the seats already sold.
    pub fn apply(self, tour: &mut Tour, now: DateTime<Utc>) -> Result<(), CapacityError> {
        if let Some(capacity) = self.seat_capacity {
            let mut inventory = tour.inventory();
            inventory.resize(capacity)?;
            tour.available_seats = inventory.available;
            tour.seat_capacity = inventory.capacity;
        }
        if let Some(title) = self.title {
            tour.title = title.trim().to_string();
        }
        if let Some(description) = self.description {
            tour.description = description;
        }
        if let Some(location) = self.location {
            tour.location = location;
        }
        if let Some(price) = self.price {
            tour.price = price;
        }
        if let Some(duration) = self.duration {
            tour.duration = duration;
        }
        if let Some(size) = self.max_group_size {
            tour.max_group_size = size;
        }
        if let Some(images) = self.images {
            tour.images = images;
        }
        if let Some(mut dates) = self.available_dates {
            dates.sort();
            tour.available_dates = dates;
        }
        tour.updated_at = now;
        Ok(())
    }
}

fn deserialize_optional_dates<'de, D>(deserializer: D) -> Result<Option<Vec<DateTime<Utc>>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    deserialize_tour_dates(deserializer).map(Some)
}

fn require_text(field: &str, value: &str) -> Result<(), CatalogError> {
    if value.trim().is_empty() {
        return Err(CatalogError::InvalidTour(format!("{} is required", field)));
    }
    Ok(())
}

fn require_positive(field: &str, value: i32) -> Result<(), CatalogError> {
    if value <= 0 {
        return Err(CatalogError::InvalidTour(format!("{} must be positive", field)));
    }
    Ok(())
}

fn require_positive_price(price: f64) -> Result<(), CatalogError> {
    if !price.is_finite() || price <= 0.0 {
        return Err(CatalogError::InvalidTour("price must be positive".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn new_tour_json() -> serde_json::Value {
        serde_json::json!({
            "title": "Spiti Valley Circuit",
            "description": "Eight days across the high desert",
            "location": "Himachal Pradesh",
            "price": 24999.0,
            "duration": 8,
            "maxGroupSize": 12,
            "images": ["https://img.example.com/spiti.jpg"],
            "availableSeats": 12,
            "availableDates": ["2026-06-14", "2026-06-01T04:30:00Z"]
        })
    }

    #[test]
    fn test_new_tour_mirrors_capacity_and_sorts_dates() {
        let new_tour: NewTour = serde_json::from_value(new_tour_json()).unwrap();
        assert!(new_tour.validate().is_ok());

        let tour = new_tour.into_tour(Utc::now());
        assert_eq!(tour.available_seats, Some(12));
        assert_eq!(tour.seat_capacity, Some(12));
        assert_eq!(tour.available_dates[0], Utc.with_ymd_and_hms(2026, 6, 1, 4, 30, 0).unwrap());
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_accepts_date_by_calendar_day() {
        let tour = serde_json::from_value::<NewTour>(new_tour_json()).unwrap().into_tour(Utc::now());
        let today = day(2026, 5, 1);

        assert!(tour.accepts_date(&Utc.with_ymd_and_hms(2026, 6, 14, 22, 15, 0).unwrap(), today));
        assert!(tour.accepts_date(&Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap(), today));
        assert!(!tour.accepts_date(&Utc.with_ymd_and_hms(2026, 6, 15, 0, 0, 0).unwrap(), today));
    }

    #[test]
    fn test_open_tour_accepts_today_onwards() {
        let mut open = serde_json::from_value::<NewTour>(new_tour_json()).unwrap().into_tour(Utc::now());
        open.available_dates.clear();
        let today = day(2026, 5, 1);

        assert!(open.accepts_date(&Utc.with_ymd_and_hms(2031, 1, 1, 0, 0, 0).unwrap(), today));
        assert!(open.accepts_date(&Utc.with_ymd_and_hms(2026, 5, 1, 23, 0, 0).unwrap(), today));
        assert!(!open.accepts_date(&Utc.with_ymd_and_hms(2026, 4, 30, 23, 59, 59).unwrap(), today));
        assert!(!open.accepts_date(&Utc.with_ymd_and_hms(2001, 1, 1, 0, 0, 0).unwrap(), today));
    }

    #[test]
    fn test_validation_rejects_bad_fields() {
        let mut json = new_tour_json();
        json["price"] = serde_json::json!(0);
        let tour: NewTour = serde_json::from_value(json).unwrap();
        assert!(matches!(tour.validate(), Err(CatalogError::InvalidTour(_))));

        let mut json = new_tour_json();
        json["availableSeats"] = serde_json::json!(-1);
        let tour: NewTour = serde_json::from_value(json).unwrap();
        assert!(matches!(tour.validate(), Err(CatalogError::InvalidTour(_))));

        let update = TourUpdate {
            title: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(update.validate().is_err());
    }

    #[test]
    fn test_update_keeps_seats() {
        let mut tour = serde_json::from_value::<NewTour>(new_tour_json()).unwrap().into_tour(Utc::now());
        tour.available_seats = Some(3);

        let update: TourUpdate = serde_json::from_value(serde_json::json!({
            "price": 27999.0,
            "availableDates": []
        }))
        .unwrap();
        update.apply(&mut tour, Utc::now()).unwrap();

        assert_eq!(tour.price, 27999.0);
        assert!(tour.available_dates.is_empty());
        assert_eq!(tour.available_seats, Some(3));
        assert_eq!(tour.seat_capacity, Some(12));
    }

    #[test]
    fn test_capacity_change_keeps_sold_seats() {
        let mut tour = serde_json::from_value::<NewTour>(new_tour_json()).unwrap().into_tour(Utc::now());
        tour.available_seats = Some(3);

        let grow: TourUpdate = serde_json::from_value(serde_json::json!({ "seatCapacity": 20 })).unwrap();
        grow.apply(&mut tour, Utc::now()).unwrap();
        assert_eq!(tour.seat_capacity, Some(20));
        assert_eq!(tour.available_seats, Some(11));

        let too_small = TourUpdate {
            seat_capacity: Some(8),
            price: Some(1.0),
            ..Default::default()
        };
        assert_eq!(
            too_small.apply(&mut tour, Utc::now()),
            Err(CapacityError::BelowSold { capacity: 8, sold: 9 })
        );
        assert_eq!(tour.available_seats, Some(11));
        assert_eq!(tour.price, 24999.0);
    }
}
