use crate::db::NewSubmission;
use crate::domain::{questionnaire, AccessLogEntry, AnswerSet};
use crate::error::{AppError, AppResult};
use crate::middleware::ClientIp;
use crate::state::SharedState;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header::USER_AGENT, HeaderMap},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

pub const FORM_SUBMIT_ACTION: &str = "form_submit";

#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    pub answers: AnswerSet,
    pub completion_time_seconds: i32,
    #[serde(default)]
    pub user_agent: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub id: Uuid,
    pub message: &'static str,
    pub submitted_at: DateTime<Utc>,
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/submit", post(submit))
        .route("/health", get(health))
        .route("/questions", get(questions))
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy", "service": "form" }))
}

async fn questions(State(state): State<SharedState>) -> Json<questionnaire::Catalog> {
    Json(questionnaire::catalog(state.scale.min(), state.scale.max()))
}

async fn submit(
    State(state): State<SharedState>,
    ClientIp(ip): ClientIp,
    headers: HeaderMap,
    payload: Result<Json<SubmitRequest>, JsonRejection>,
) -> AppResult<Json<SubmitResponse>> {
    if !state.submit_limiter.check(&ip).await {
        tracing::warn!("Submit rate limit exceeded for IP: {}", ip);
        return Err(AppError::RateLimited);
    }

    let Json(payload) = payload?;
    if payload.completion_time_seconds <= 0 {
        return Err(AppError::InvalidInput(
            "completion_time_seconds deve ser maior que zero".to_string(),
        ));
    }

    state.scale.check(&payload.answers)?;
    let scored = state.engine.score_submission(&payload.answers)?;

    let user_agent = payload.user_agent.or_else(|| {
        headers
            .get(USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    });
    let stored_ip = state.ip_pseudonymizer.apply(&ip);

    let new = NewSubmission {
        ip_address: Some(stored_ip.clone()),
        user_agent,
        completion_time_seconds: payload.completion_time_seconds,
        answers: payload.answers,
        scores: scored.scores,
        risks: scored.risks,
    };
    let submission = state.store.insert_submission(&new).await?;
    tracing::info!(
        submission_id = %submission.id,
        completion_time = submission.completion_time_seconds,
        "Form submission stored"
    );

    let entry = AccessLogEntry {
        ip_address: stored_ip,
        action: FORM_SUBMIT_ACTION.to_string(),
        metadata: Some(json!({ "completion_time": submission.completion_time_seconds })),
    };
    if let Err(e) = state.store.log_access(&entry).await {
        tracing::warn!(submission_id = %submission.id, "Failed to write access log: {}", e);
    }

    Ok(Json(SubmitResponse {
        id: submission.id,
        message: "Formulário enviado com sucesso!",
        submitted_at: submission.submitted_at,
    }))
}
