// Bearer JWT validation
// Token issuance lives with the identity provider; this side only
// validates and exposes the claims. Handlers opt in by taking an
// AuthenticatedUser argument; extraction rejects with 401.

use axum::{extract::FromRequestParts, http::header::AUTHORIZATION, http::request::Parts};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::app::AppState;
use crate::utils::service_error::ServiceError;

/// Authenticated user information extracted from the access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub company_id: Uuid,
    pub email: String,
    pub is_admin: bool,
    pub is_super_admin: bool,
}

#[derive(Debug, Deserialize)]
struct AccessTokenClaims {
    sub: Uuid,
    company_id: Uuid,
    email: String,
    #[serde(default)]
    is_admin: bool,
    #[serde(default)]
    is_super_admin: bool,
    #[allow(dead_code)]
    exp: u64,
}

impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = ServiceError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or(ServiceError::Unauthorized)?;

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[state.config.jwt_audience.clone()]);
        validation.set_issuer(&[state.config.jwt_issuer.clone()]);

        let claims = decode::<AccessTokenClaims>(
            token,
            &DecodingKey::from_secret(state.config.jwt_access_secret.as_bytes()),
            &validation,
        )
        .map_err(|_| ServiceError::Unauthorized)?
        .claims;

        Ok(AuthenticatedUser {
            user_id: claims.sub,
            company_id: claims.company_id,
            email: claims.email,
            is_admin: claims.is_admin,
            is_super_admin: claims.is_super_admin,
        })
    }
}
