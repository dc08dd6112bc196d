//! Admin sessions: HS256 bearer tokens and the authenticated-admin extractor.

use crate::domain::AdminRecord;
use crate::error::AppError;
use crate::state::SharedState;
use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, HeaderMap},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub expiry_hours: i64,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("expiry_hours", &self.expiry_hours)
            .finish()
    }
}

impl JwtConfig {
    pub fn expires_in_seconds(&self) -> i64 {
        self.expiry_hours * 3600
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("missing bearer token")]
    Missing,
    #[error("expired")]
    Expired,
    #[error("invalid token: {0}")]
    Invalid(String),
    #[error("admin no longer active")]
    Revoked,
    #[error("failed to sign token: {0}")]
    Signing(String),
}

pub fn issue_token(admin_id: Uuid, email: &str, config: &JwtConfig) -> Result<String, SessionError> {
    let now = Utc::now();
    let claims = Claims {
        sub: admin_id,
        email: email.to_string(),
        iat: now.timestamp(),
        exp: (now + Duration::hours(config.expiry_hours)).timestamp(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
    .map_err(|e| SessionError::Signing(e.to_string()))
}

pub fn verify_token(token: &str, config: &JwtConfig) -> Result<Claims, SessionError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => SessionError::Expired,
        _ => SessionError::Invalid(e.to_string()),
    })
}

pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    let value = headers
        .get(axum::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then(|| token.to_string())
}

/// Extractor for routes that require a logged-in, still active admin.
pub struct AdminSession(pub AdminRecord);

#[async_trait]
impl<S> FromRequestParts<S> for AdminSession
where
    S: Send + Sync,
    SharedState: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let shared_state = SharedState::from_ref(state);

        let token = extract_token(&parts.headers).ok_or(SessionError::Missing)?;
        let claims = verify_token(&token, &shared_state.jwt)?;

        let admin = shared_state
            .store
            .find_admin_by_email(&claims.email)
            .await?
            .filter(|admin| admin.id == claims.sub && admin.is_active)
            .ok_or(SessionError::Revoked)?;

        Ok(AdminSession(admin))
    }
}
