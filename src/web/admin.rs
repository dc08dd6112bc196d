use crate::db::{self, SubmissionQuery};
use crate::domain::{Dimension, ReportFilters, Submission};
use crate::error::{AppError, AppResult};
use crate::report::{self, export::CSV_FILENAME, DimensionAnalysis, FilteredReport, TimelineBucket};
use crate::scoring::{aggregate_overview, Overview, ScoredSubmission};
use crate::state::SharedState;
use crate::web::session::AdminSession;
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Default, Deserialize)]
pub struct DateRange {
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/stats/overview", get(overview))
        .route("/stats/risk-distribution", get(risk_distribution))
        .route("/stats/timeline", get(timeline))
        .route("/reports/filtered", post(filtered_report))
        .route("/reports/dimension/:dimension", get(dimension_report))
        .route("/export/ai", post(export_ai))
        .route("/export/csv", post(export_csv))
        .with_state(state)
}

/// An empty body means "no filters"; anything else must be valid JSON.
fn optional_body<T: DeserializeOwned + Default>(body: &Bytes) -> AppResult<T> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| AppError::InvalidInput(format!("Corpo inválido: {e}")))
}

async fn load_scored(state: &SharedState, query: SubmissionQuery) -> AppResult<Vec<ScoredSubmission>> {
    let submissions = state.store.list_submissions(&query).await?;
    Ok(report::score_all(&state.engine, submissions))
}

/// Every submission in the range, read page by page. Aggregates use this so
/// their counts cover all stored rows.
async fn load_all(
    state: &SharedState,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> AppResult<Vec<Submission>> {
    Ok(db::list_all_submissions(state.store.as_ref(), start, end, state.export_limit).await?)
}

/// Newest scored submissions passing `filters`, at most `limit` of them.
/// With a risk filter the whole range is scanned, since risks are only known
/// after scoring.
async fn load_filtered(
    state: &SharedState,
    filters: &ReportFilters,
    limit: i64,
) -> AppResult<Vec<ScoredSubmission>> {
    let scored = if report::has_risk_filter(filters) {
        let submissions = load_all(state, filters.start_date, filters.end_date).await?;
        report::score_all(&state.engine, submissions)
    } else {
        let query = SubmissionQuery::between(filters.start_date, filters.end_date, limit);
        load_scored(state, query).await?
    };
    Ok(scored
        .into_iter()
        .filter(|s| report::matches_risk(s, filters))
        .take(usize::try_from(limit).unwrap_or(0))
        .collect())
}

async fn health(State(state): State<SharedState>, AdminSession(admin): AdminSession) -> Json<Value> {
    let store_status = match state.store.health().await {
        Ok(()) => "ok",
        Err(e) => {
            tracing::warn!(backend = state.store.backend(), "Store health check failed: {}", e);
            "unavailable"
        }
    };
    Json(json!({
        "status": if store_status == "ok" { "healthy" } else { "degraded" },
        "service": "admin",
        "admin_email": admin.email,
        "store": {
            "backend": state.store.backend(),
            "status": store_status,
        },
    }))
}

async fn overview(
    State(state): State<SharedState>,
    AdminSession(_admin): AdminSession,
) -> AppResult<Json<Overview>> {
    let scored = report::score_all(&state.engine, load_all(&state, None, None).await?);
    if scored.is_empty() {
        return Err(AppError::NotFound("Nenhuma resposta encontrada".to_string()));
    }
    let overview = aggregate_overview(&scored, Utc::now());
    Ok(Json(report::rounded_overview(overview)))
}

async fn risk_distribution(
    State(state): State<SharedState>,
    AdminSession(_admin): AdminSession,
) -> AppResult<Json<Vec<report::DistributionRow>>> {
    let scored = report::score_all(&state.engine, load_all(&state, None, None).await?);
    let overview = aggregate_overview(&scored, Utc::now());
    Ok(Json(report::risk_distribution(&overview)))
}

async fn timeline(
    State(state): State<SharedState>,
    AdminSession(_admin): AdminSession,
    range: Result<Query<DateRange>, axum::extract::rejection::QueryRejection>,
) -> AppResult<Json<Vec<TimelineBucket>>> {
    let Query(range) = range.map_err(|e| AppError::InvalidInput(e.body_text()))?;
    let submissions = load_all(&state, range.start_date, range.end_date).await?;
    Ok(Json(report::timeline(&submissions)))
}

async fn filtered_report(
    State(state): State<SharedState>,
    AdminSession(admin): AdminSession,
    body: Bytes,
) -> AppResult<Json<FilteredReport>> {
    let filters: ReportFilters = optional_body(&body)?;
    let scored = load_filtered(&state, &filters, state.report_limit).await?;

    let limit = usize::try_from(state.report_limit).unwrap_or(usize::MAX);
    let report = report::filtered_report(&scored, filters, limit);
    tracing::info!(admin_id = %admin.id, total = report.total, "Filtered report generated");
    Ok(Json(report))
}

async fn dimension_report(
    State(state): State<SharedState>,
    AdminSession(_admin): AdminSession,
    Path(raw): Path<String>,
) -> AppResult<Json<DimensionAnalysis>> {
    let dimension: Dimension = raw.parse().map_err(|_| {
        let valid: Vec<&str> = Dimension::ALL.iter().map(|d| d.as_str()).collect();
        AppError::BadRequest(format!(
            "Dimensão inválida: {raw}. Use uma de: {}",
            valid.join(", ")
        ))
    })?;
    let scored = report::score_all(&state.engine, load_all(&state, None, None).await?);
    Ok(Json(report::analyze_dimension(dimension, &scored)))
}

async fn export_ai(
    State(state): State<SharedState>,
    AdminSession(admin): AdminSession,
    body: Bytes,
) -> AppResult<Json<report::AiExport>> {
    let range: DateRange = optional_body(&body)?;
    let query = SubmissionQuery::between(range.start_date, range.end_date, state.export_limit);
    let scored = load_scored(&state, query).await?;
    let export = report::ai_export(&scored);
    tracing::info!(admin_id = %admin.id, total = export.total_responses, "AI export generated");
    Ok(Json(export))
}

async fn export_csv(
    State(state): State<SharedState>,
    AdminSession(admin): AdminSession,
    body: Bytes,
) -> AppResult<impl IntoResponse> {
    let filters: ReportFilters = optional_body(&body)?;
    let scored = load_filtered(&state, &filters, state.export_limit).await?;
    let csv = report::render_csv(&scored).map_err(|e| AppError::Internal(format!("CSV rendering failed: {e}")))?;
    tracing::info!(admin_id = %admin.id, rows = scored.len(), "CSV export generated");

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename={CSV_FILENAME}"),
            ),
        ],
        csv,
    ))
}
