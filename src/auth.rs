//! Request authentication
//!
//! Routes that need a caller identity take an [`AuthUser`] argument. The extractor reads a
//! JWT from the `x-auth-token` header (or `Authorization: Bearer …`), verifies it against
//! the configured secret and yields the caller's user id.

use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::AppState;
use crate::api::error::ApiError;

/// Header carrying the token
pub const TOKEN_HEADER: &str = "x-auth-token";

/// Authenticated caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: Uuid,
}

/// Claims carried by access tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    /// User ID (subject)
    pub sub: String,
    /// Expiration timestamp
    pub exp: i64,
    /// Issued at timestamp
    pub iat: i64,
}

/// Sign an access token for `user_id` valid for `lifetime`
pub fn issue_token(
    secret: &str,
    user_id: Uuid,
    lifetime: Duration,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let claims = AccessTokenClaims {
        sub: user_id.to_string(),
        exp: (now + lifetime).timestamp(),
        iat: now.timestamp(),
    };

    encode(&Header::new(Algorithm::HS256), &claims, &EncodingKey::from_secret(secret.as_bytes()))
}

/// Verify a JWT and extract the caller
pub fn verify_token(secret: &str, token: &str) -> Result<AuthUser, ApiError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    validation.validate_aud = false;

    let data = decode::<AccessTokenClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| {
        tracing::debug!(error = %e, "JWT verification failed");
        ApiError::Unauthorized("Token is not valid")
    })?;

    let user_id =
        Uuid::parse_str(&data.claims.sub).map_err(|_| ApiError::Unauthorized("Token is not valid"))?;

    Ok(AuthUser { user_id })
}

/// Extract the raw token from the request headers
fn extract_token(headers: &HeaderMap) -> Option<&str> {
    if let Some(token) = headers.get(TOKEN_HEADER).and_then(|h| h.to_str().ok()) {
        return Some(token.trim());
    }

    headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = extract_token(&parts.headers)
            .filter(|t| !t.is_empty())
            .ok_or(ApiError::Unauthorized("No token, authorization denied"))?;

        verify_token(&state.config.jwt_secret, token)
    }
}
