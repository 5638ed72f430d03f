use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, put},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use tourly_booking::BookingView;
use tourly_catalog::{NewTour, Tour, TourUpdate};
use tourly_core::UserProfile;
use tracing::info;
use uuid::Uuid;

use crate::error::AppError;
use crate::middleware::{require_admin, Claims};
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub success: bool,
    pub message: String,
    pub booking: BookingView,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    fn ok(message: &str) -> Json<Self> {
        Json(Self {
            success: true,
            message: message.to_string(),
        })
    }
}

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/api/admin/bookings", get(list_bookings))
        .route("/api/admin/bookings/{id}", get(get_booking).delete(delete_booking))
        .route("/api/admin/bookings/{id}/status", put(update_booking_status))
        .route("/api/admin/tours", get(list_tours).post(create_tour))
        .route("/api/admin/tours/{id}", put(update_tour).delete(delete_tour))
        .route("/api/admin/users", get(list_users))
        .route("/api/admin/users/{id}", delete(delete_user))
        .route("/api/admin/users/{id}/status", put(update_user_status))
        .route_layer(axum::middleware::from_fn_with_state(state, require_admin))
}

// ============================================================================
// Booking Management
// ============================================================================

async fn list_bookings(State(state): State<AppState>) -> Result<Json<Vec<BookingView>>, AppError> {
    Ok(Json(state.bookings.list_all_bookings().await?))
}

async fn get_booking(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<BookingView>, AppError> {
    Ok(Json(state.bookings.get_booking(id).await?))
}

async fn update_booking_status(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<StatusResponse>, AppError> {
    let outcome = state.bookings.transition_status(id, &req.status).await?;
    info!(
        booking_id = %id,
        admin_id = %claims.sub,
        status = %req.status,
        changed = outcome.changed,
        "Admin updated booking status"
    );

    Ok(Json(StatusResponse {
        success: true,
        message: outcome.message,
        booking: outcome.booking,
    }))
}

async fn delete_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    state.bookings.delete_booking(id).await?;
    info!(booking_id = %id, admin_id = %claims.sub, "Admin deleted booking");
    Ok(MessageResponse::ok("Booking deleted successfully"))
}

// ============================================================================
// Tour Management
// ============================================================================

async fn list_tours(State(state): State<AppState>) -> Result<Json<Vec<Tour>>, AppError> {
    Ok(Json(state.catalog.list_tours().await?))
}

async fn create_tour(
    State(state): State<AppState>,
    Json(req): Json<NewTour>,
) -> Result<(StatusCode, Json<Tour>), AppError> {
    let tour = state.catalog.create_tour(req).await?;
    Ok((StatusCode::CREATED, Json(tour)))
}

async fn update_tour(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<TourUpdate>,
) -> Result<Json<Tour>, AppError> {
    Ok(Json(state.catalog.update_tour(id, req).await?))
}

async fn delete_tour(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<MessageResponse>, AppError> {
    state.catalog.delete_tour(id).await?;
    Ok(MessageResponse::ok("Tour deleted successfully"))
}

// ============================================================================
// User Management
// ============================================================================

async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<UserProfile>>, AppError> {
    let users = state.identity.list_users().await?;
    Ok(Json(users.iter().map(UserProfile::from).collect()))
}

async fn update_user_status(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<UserProfile>, AppError> {
    let user = state.identity.set_user_status(id, &req.status).await?;
    info!(user_id = %id, admin_id = %claims.sub, status = %req.status, "Admin updated account status");
    Ok(Json(UserProfile::from(&user)))
}

async fn delete_user(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    state.identity.delete_user(id).await?;
    info!(user_id = %id, admin_id = %claims.sub, "Admin deleted account");
    Ok(MessageResponse::ok("User deleted successfully"))
}
