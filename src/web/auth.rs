use crate::error::{AppError, AppResult};
use crate::middleware::ClientIp;
use crate::state::SharedState;
use crate::web::session::{self, AdminSession};
use argon2::{password_hash::PasswordHash, Argon2, PasswordVerifier};
use axum::{
    extract::{rejection::JsonRejection, State},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
}

#[derive(Debug, Serialize)]
pub struct AdminProfile {
    pub id: Uuid,
    pub email: String,
    pub full_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
    pub is_active: bool,
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/login", post(login))
        .route("/me", get(me))
        .with_state(state)
}

pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

async fn login(
    State(state): State<SharedState>,
    ClientIp(ip): ClientIp,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> AppResult<Json<TokenResponse>> {
    if !state.login_limiter.check(&ip).await {
        tracing::warn!("Login rate limit exceeded for IP: {}", ip);
        return Err(AppError::RateLimited);
    }

    let Json(payload) = payload?;
    let email = normalize_email(&payload.email);

    let admin = state
        .store
        .find_admin_by_email(&email)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    let parsed_hash = PasswordHash::new(&admin.password_hash).map_err(|e| {
        tracing::error!(admin_id = %admin.id, "Stored password hash is unreadable: {}", e);
        AppError::InvalidCredentials
    })?;
    Argon2::default()
        .verify_password(payload.password.as_bytes(), &parsed_hash)
        .map_err(|_| AppError::InvalidCredentials)?;

    let token = session::issue_token(admin.id, &admin.email, &state.jwt)?;

    if let Err(e) = state.store.touch_admin_login(admin.id).await {
        tracing::warn!(admin_id = %admin.id, "Failed to update last login: {}", e);
    }
    tracing::info!(admin_id = %admin.id, "Admin logged in");

    Ok(Json(TokenResponse {
        access_token: token,
        token_type: "bearer",
        expires_in: state.jwt.expires_in_seconds(),
    }))
}

async fn me(AdminSession(admin): AdminSession) -> Json<AdminProfile> {
    Json(AdminProfile {
        id: admin.id,
        email: admin.email,
        full_name: admin.full_name,
        created_at: admin.created_at,
        last_login: admin.last_login,
        is_active: admin.is_active,
    })
}
