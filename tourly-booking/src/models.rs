use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tourly_catalog::{PriceQuote, TourSummary};
use tourly_core::{CustomerInfo, EmergencyContact, GuestDetails, PaymentStatus, UserSummary};
use uuid::Uuid;

/// Booking status in the lifecycle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl BookingStatus {
    pub const ALL: [BookingStatus; 4] = [
        BookingStatus::Pending,
        BookingStatus::Confirmed,
        BookingStatus::Cancelled,
        BookingStatus::Completed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Completed => "completed",
        }
    }

    /// Active bookings hold seats and keep their tour from being deleted.
    pub fn is_active(&self) -> bool {
        matches!(self, BookingStatus::Pending | BookingStatus::Confirmed)
    }

    /// Transition table:
    ///
    /// ```text
    /// pending   -> confirmed | cancelled
    /// confirmed -> completed | cancelled
    /// ```
    ///
    /// `cancelled` and `completed` are terminal.
    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        matches!(
            (self, next),
            (BookingStatus::Pending, BookingStatus::Confirmed)
                | (BookingStatus::Pending, BookingStatus::Cancelled)
                | (BookingStatus::Confirmed, BookingStatus::Completed)
                | (BookingStatus::Confirmed, BookingStatus::Cancelled)
        )
    }

    /// Word used in the admin-facing outcome message.
    pub fn outcome_word(&self) -> &'static str {
        match self {
            BookingStatus::Confirmed => "approved",
            other => other.as_str(),
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BookingStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown booking status: {}", s))
    }
}

/// A reservation of seats on one tour by one user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: Uuid,
    pub user_id: Uuid,
    pub tour_id: Uuid,
    pub tour_date: DateTime<Utc>,
    pub number_of_guests: u32,
    /// Frozen at creation from the tour price.
    pub total_amount: f64,
    pub status: BookingStatus,
    pub payment_status: PaymentStatus,
    pub guests: Vec<GuestDetails>,
    pub customer_info: CustomerInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emergency_contact: Option<EmergencyContact>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_requests: Option<String>,
    pub booking_reference: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// A fresh `pending` booking built from a validated request.
    pub fn new(request: &BookingRequest, quote: &PriceQuote, booking_reference: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id: request.user_id,
            tour_id: request.tour_id,
            tour_date: request.tour_date,
            number_of_guests: request.number_of_guests,
            total_amount: quote.total_amount,
            status: BookingStatus::Pending,
            payment_status: PaymentStatus::Pending,
            guests: request.guests.clone(),
            customer_info: request.customer_info.clone(),
            emergency_contact: request.emergency_contact.clone(),
            special_requests: request
                .special_requests
                .as_ref()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            booking_reference,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Everything needed to create a booking. `user_id` comes from the caller's credential.
#[derive(Debug, Clone)]
pub struct BookingRequest {
    pub user_id: Uuid,
    pub tour_id: Uuid,
    pub number_of_guests: u32,
    pub tour_date: DateTime<Utc>,
    pub customer_info: CustomerInfo,
    pub guests: Vec<GuestDetails>,
    pub special_requests: Option<String>,
    pub emergency_contact: Option<EmergencyContact>,
}

/// A booking with its tour snapshot, as returned to callers.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BookingView {
    #[serde(flatten)]
    pub booking: Booking,
    /// `None` once the tour has been removed from the catalog.
    pub tour_package: Option<TourSummary>,
    /// The booking owner; `None` once the account is deleted.
    pub user: Option<UserSummary>,
}
