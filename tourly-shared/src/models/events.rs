use uuid::Uuid;

// Booking lifecycle events. They are emitted as structured `tracing` fields by
// the booking manager; nothing consumes them out of process.

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct BookingCreatedEvent {
    pub booking_id: Uuid,
    pub booking_reference: String,
    pub tour_id: Uuid,
    pub user_id: Uuid,
    pub number_of_guests: u32,
    pub total_amount: f64,
    pub seats_remaining: Option<i32>,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct BookingStatusChangedEvent {
    pub booking_id: Uuid,
    pub booking_reference: String,
    pub from_status: String,
    pub to_status: String,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SeatsReleasedEvent {
    pub tour_id: Uuid,
    pub booking_id: Uuid,
    pub seats: u32,
    pub seats_available: Option<i32>,
    pub reason: String,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct BookingDeletedEvent {
    pub booking_id: Uuid,
    pub booking_reference: String,
    pub status: String,
    pub timestamp: i64,
}

/// Renders an event as compact JSON for a `tracing` field.
pub fn as_log_field<T: serde::Serialize>(event: &T) -> String {
    serde_json::to_string(event).unwrap_or_else(|_| "{}".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_log_field_is_camel_case() {
        let event = SeatsReleasedEvent {
            tour_id: Uuid::nil(),
            booking_id: Uuid::nil(),
            seats: 2,
            seats_available: Some(5),
            reason: "cancelled".to_string(),
            timestamp: 0,
        };

        let field = as_log_field(&event);
        assert!(field.contains("\"seatsAvailable\":5"));
        assert!(field.contains("\"reason\":\"cancelled\""));
    }
}
