use axum::{
    extract::{ConnectInfo, Request, State},
    http::Method,
    middleware::Next,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use std::net::SocketAddr;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod admin;
pub mod auth;
pub mod bookings;
pub mod error;
pub mod middleware;
pub mod state;
pub mod tours;

pub use error::AppError;
pub use state::AppState;

const RATE_LIMIT_WINDOW_SECONDS: i64 = 60;

pub fn app(state: AppState) -> Router {
    // CORS Middleware
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::USER_AGENT,
        ]);

    Router::new()
        .route("/api/health", get(health))
        .merge(tours::routes())
        .merge(auth::routes(state.clone()))
        .merge(bookings::routes(state.clone()))
        .merge(admin::routes(state.clone()))
        .layer(axum::middleware::from_fn_with_state(state.clone(), request_timeout))
        .layer(axum::middleware::from_fn_with_state(state.clone(), rate_limit_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn request_timeout(State(state): State<AppState>, req: Request, next: Next) -> Response {
    match tokio::time::timeout(state.request_timeout, next.run(req)).await {
        Ok(response) => response,
        Err(_) => {
            tracing::warn!(timeout = ?state.request_timeout, "Request timed out");
            AppError::Timeout.into_response()
        }
    }
}

/// Per-IP fixed window. Skipped without Redis or a peer address; fails open on Redis errors.
async fn rate_limit_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let (Some(limit), Some(ConnectInfo(addr))) = (
        state.rate_limit.as_ref(),
        req.extensions().get::<ConnectInfo<SocketAddr>>().copied(),
    ) else {
        return Ok(next.run(req).await);
    };

    let key = format!("ratelimit:{}", addr.ip());
    match limit
        .redis
        .check_rate_limit(&key, limit.per_minute, RATE_LIMIT_WINDOW_SECONDS)
        .await
    {
        Ok(true) => Ok(next.run(req).await),
        Ok(false) => Err(AppError::RateLimited),
        Err(e) => {
            tracing::warn!(error = %e, "Rate limiter unavailable, allowing request");
            Ok(next.run(req).await)
        }
    }
}
