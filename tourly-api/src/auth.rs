use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use tourly_core::{Role, UserProfile};
use tourly_shared::pii::redact_email;
use tracing::info;

use crate::error::AppError;
use crate::middleware::{issue_token, require_user, Claims};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct RegisterRequest {
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

#[derive(Debug, Serialize)]
struct AuthResponse {
    token: String,
    user: UserProfile,
}

pub fn routes(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/api/auth/profile", get(profile))
        .route_layer(axum::middleware::from_fn_with_state(state, require_user));

    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/admin-login", post(admin_login))
        .merge(protected)
}

async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let user = state.identity.register(&req.name, &req.email, &req.password).await?;
    info!(user_id = %user.id, email = %redact_email(&user.email), "User registered");

    let token = issue_token(&state.auth, &user)?;
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: UserProfile::from(&user),
        }),
    ))
}

async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let user = state.identity.authenticate(&req.email, &req.password).await?;
    let token = issue_token(&state.auth, &user)?;

    Ok(Json(AuthResponse {
        token,
        user: UserProfile::from(&user),
    }))
}

/// Same as login, but only admin accounts get a token.
async fn admin_login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let user = state.identity.authenticate(&req.email, &req.password).await?;
    if user.role != Role::Admin {
        return Err(AppError::AuthorizationError(
            "Access denied. Admin privileges required.".to_string(),
        ));
    }
    let token = issue_token(&state.auth, &user)?;
    info!(user_id = %user.id, "Admin signed in");

    Ok(Json(AuthResponse {
        token,
        user: UserProfile::from(&user),
    }))
}

async fn profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<UserProfile>, AppError> {
    let user = state
        .identity
        .find_user(claims.sub)
        .await?
        .ok_or_else(|| AppError::NotFoundError("User not found".to_string()))?;

    Ok(Json(UserProfile::from(&user)))
}
