use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tourly_booking::{BookingRequest, BookingView};
use tourly_core::dates::deserialize_tour_date;
use tourly_core::{CustomerInfo, EmergencyContact, GuestDetails};
use uuid::Uuid;

use crate::error::AppError;
use crate::middleware::{require_user, Claims};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateBookingRequest {
    tour_package_id: Uuid,
    number_of_guests: u32,
    #[serde(deserialize_with = "deserialize_tour_date")]
    tour_date: DateTime<Utc>,
    customer_info: CustomerInfo,
    #[serde(default)]
    guests: Vec<GuestDetails>,
    #[serde(default)]
    special_requests: Option<String>,
    #[serde(default)]
    emergency_contact: Option<EmergencyContact>,
}

impl CreateBookingRequest {
    /// The owner always comes from the token, never from the body.
    fn into_request(self, user_id: Uuid) -> BookingRequest {
        BookingRequest {
            user_id,
            tour_id: self.tour_package_id,
            number_of_guests: self.number_of_guests,
            tour_date: self.tour_date,
            customer_info: self.customer_info,
            guests: self.guests,
            special_requests: self.special_requests,
            emergency_contact: self.emergency_contact,
        }
    }
}

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/api/bookings", post(create_booking))
        .route("/api/bookings/mybookings", get(my_bookings))
        .route_layer(axum::middleware::from_fn_with_state(state, require_user))
}

async fn create_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<BookingView>), AppError> {
    let booking = state.bookings.create_booking(req.into_request(claims.sub)).await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

async fn my_bookings(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<BookingView>>, AppError> {
    Ok(Json(state.bookings.list_user_bookings(claims.sub).await?))
}
