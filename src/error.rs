use crate::db::StoreError;
use crate::scoring::ValidationError;
use crate::web::session::SessionError;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::{json, Value};

/// Error type for HTTP handlers, rendered as `{"detail", "code"}`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Malformed or out-of-contract request body.
    #[error("{0}")]
    InvalidInput(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Session(#[from] SessionError),

    /// Login failure; the message never says which credential was wrong.
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("too many requests")]
    RateLimited,

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidInput(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, detail, extra): (StatusCode, &str, String, Option<Value>) = match &self {
            AppError::Validation(err) => {
                let mismatches = err.mismatches();
                let extra = (!mismatches.is_empty()).then(|| json!(mismatches));
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "VALIDATION_ERROR",
                    format!("Respostas inválidas: {err}"),
                    extra,
                )
            }
            AppError::InvalidInput(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "VALIDATION_ERROR",
                msg.clone(),
                None,
            ),
            AppError::Store(err) => {
                tracing::error!(error = %err, "Store error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORE_ERROR",
                    "Erro interno ao acessar os dados".to_string(),
                    None,
                )
            }
            AppError::Session(err) => {
                tracing::warn!("Session verification failed: {}", err);
                (
                    StatusCode::UNAUTHORIZED,
                    "UNAUTHORIZED",
                    "Token inválido ou expirado".to_string(),
                    None,
                )
            }
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "INVALID_CREDENTIALS",
                "Email ou senha incorretos".to_string(),
                None,
            ),
            AppError::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                "RATE_LIMITED",
                "Muitas tentativas. Tente novamente mais tarde.".to_string(),
                None,
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone(), None),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone(), None),
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "Erro interno do servidor".to_string(),
                    None,
                )
            }
        };

        let mut body = json!({
            "detail": detail,
            "code": code,
        });
        if let (Some(extra), Some(map)) = (extra, body.as_object_mut()) {
            map.insert("mismatches".to_string(), extra);
        }

        let mut response = (status, axum::Json(body)).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                axum::http::header::WWW_AUTHENTICATE,
                axum::http::HeaderValue::from_static("Bearer"),
            );
        }
        response
    }
}
