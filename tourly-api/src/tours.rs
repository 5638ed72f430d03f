use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use tourly_catalog::Tour;
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/tours", get(list_tours))
        .route("/api/tours/{id}", get(get_tour))
}

async fn list_tours(State(state): State<AppState>) -> Result<Json<Vec<Tour>>, AppError> {
    Ok(Json(state.catalog.list_tours().await?))
}

async fn get_tour(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<Tour>, AppError> {
    Ok(Json(state.catalog.get_tour(id).await?))
}
