use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    typed_header::TypedHeaderRejection,
    TypedHeader,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tourly_core::{Role, User};
use uuid::Uuid;

use crate::error::AppError;
use crate::state::{AppState, AuthConfig};

// ============================================================================
// JWT Claims
// ============================================================================

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub role: Role,
    pub exp: usize,
}

impl Claims {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

pub fn issue_token(auth: &AuthConfig, user: &User) -> Result<String, AppError> {
    let claims = Claims {
        sub: user.id,
        email: user.email.clone(),
        role: user.role,
        exp: (Utc::now() + Duration::seconds(auth.expiration as i64)).timestamp() as usize,
    };

    encode(&Header::default(), &claims, &EncodingKey::from_secret(auth.secret.as_bytes()))
        .map_err(|e| AppError::Anyhow(anyhow::anyhow!("Token encoding failed: {}", e)))
}

fn verify(
    auth: &AuthConfig,
    bearer: Result<TypedHeader<Authorization<Bearer>>, TypedHeaderRejection>,
) -> Result<Claims, AppError> {
    let TypedHeader(Authorization(bearer)) =
        bearer.map_err(|_| AppError::AuthenticationError("Not authorized, no token".to_string()))?;

    decode::<Claims>(
        bearer.token(),
        &DecodingKey::from_secret(auth.secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::AuthenticationError("Not authorized, token failed".to_string()))
}

// ============================================================================
// Authentication Middleware
// ============================================================================

/// Any signed-in account.
pub async fn require_user(
    State(state): State<AppState>,
    bearer: Result<TypedHeader<Authorization<Bearer>>, TypedHeaderRejection>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let claims = verify(&state.auth, bearer)?;
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

pub async fn require_admin(
    State(state): State<AppState>,
    bearer: Result<TypedHeader<Authorization<Bearer>>, TypedHeaderRejection>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let claims = verify(&state.auth, bearer)?;
    if !claims.is_admin() {
        return Err(AppError::AuthorizationError(
            "Access denied. Admin privileges required.".to_string(),
        ));
    }
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;

    fn auth() -> AuthConfig {
        AuthConfig {
            secret: "test-secret".to_string(),
            expiration: 3600,
        }
    }

    fn user(role: Role) -> User {
        User {
            id: Uuid::new_v4(),
            name: "Kiran".to_string(),
            email: "kiran@example.com".to_string(),
            password_hash: String::new(),
            role,
            status: tourly_core::AccountStatus::Active,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_token_round_trip_keeps_role() {
        let admin = user(Role::Admin);
        let token = issue_token(&auth(), &admin).unwrap();

        let bearer = Authorization::bearer(&token).unwrap();
        let claims = verify(&auth(), Ok(TypedHeader(bearer))).unwrap();
        assert_eq!(claims.sub, admin.id);
        assert!(claims.is_admin());
    }

    #[test]
    fn test_token_signed_with_other_secret_is_rejected() {
        let token = issue_token(&auth(), &user(Role::User)).unwrap();
        let other = AuthConfig {
            secret: "another-secret".to_string(),
            expiration: 3600,
        };

        let bearer = Authorization::bearer(&token).unwrap();
        let err = verify(&other, Ok(TypedHeader(bearer))).unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::UNAUTHORIZED);
    }
}
