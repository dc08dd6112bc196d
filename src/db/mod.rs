pub mod http;
pub mod postgres;
pub mod rest;
pub mod seed;
pub mod webhook;

use crate::config::StoreConfig;
use crate::domain::{AccessLogEntry, AdminRecord, AnswerSet, Submission};
use crate::scoring::{DimensionScores, RiskProfile};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

pub use postgres::PgStore;
pub use rest::RestStore;
pub use webhook::WebhookStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("`{endpoint}` answered {status}: {body}")]
    Upstream {
        endpoint: String,
        status: u16,
        body: String,
    },
    #[error("unexpected payload from `{endpoint}`: {reason}")]
    Decode { endpoint: String, reason: String },
}

/// A submission ready to persist. Scores travel along for consumers that
/// read the store directly; reports always rescore from `answers`.
#[derive(Debug, Clone, Serialize)]
pub struct NewSubmission {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub completion_time_seconds: i32,
    pub answers: AnswerSet,
    pub scores: DimensionScores,
    pub risks: RiskProfile,
}

/// Range query over stored submissions, newest first. `offset` skips that
/// many rows of the ordered range before `limit` applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmissionQuery {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub limit: i64,
    pub offset: i64,
}

impl SubmissionQuery {
    pub fn latest(limit: i64) -> Self {
        Self::between(None, None, limit)
    }

    pub fn between(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>, limit: i64) -> Self {
        Self {
            start,
            end,
            limit,
            offset: 0,
        }
    }

    pub fn page(self, offset: i64) -> Self {
        Self { offset, ..self }
    }
}

#[async_trait]
pub trait SurveyStore: Send + Sync {
    /// Short backend name for logs and health output.
    fn backend(&self) -> &'static str;

    async fn insert_submission(&self, new: &NewSubmission) -> Result<Submission, StoreError>;

    async fn log_access(&self, entry: &AccessLogEntry) -> Result<(), StoreError>;

    async fn list_submissions(&self, query: &SubmissionQuery) -> Result<Vec<Submission>, StoreError>;

    /// Active admin with this email, if any.
    async fn find_admin_by_email(&self, email: &str) -> Result<Option<AdminRecord>, StoreError>;

    async fn touch_admin_login(&self, admin_id: Uuid) -> Result<(), StoreError>;

    /// Cheap round trip proving the backend is reachable.
    async fn health(&self) -> Result<(), StoreError>;
}

pub type DynStore = Arc<dyn SurveyStore>;

/// Every submission in `[start, end]`, newest first, read in pages of
/// `page_size` until the store runs dry. Rows seen twice because of inserts
/// between pages are kept once.
pub async fn list_all_submissions(
    store: &dyn SurveyStore,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    page_size: i64,
) -> Result<Vec<Submission>, StoreError> {
    let page_size = page_size.max(1);
    let query = SubmissionQuery::between(start, end, page_size);
    let mut seen = HashSet::new();
    let mut all = Vec::new();
    let mut offset = 0;

    loop {
        let page = store.list_submissions(&query.page(offset)).await?;
        let fetched = page.len();
        all.extend(page.into_iter().filter(|s| seen.insert(s.id)));
        if (fetched as i64) < page_size {
            break;
        }
        offset += page_size;
    }

    tracing::debug!(rows = all.len(), pages = offset / page_size + 1, "Loaded submissions");
    Ok(all)
}

/// Builds the configured backend. Postgres is migrated and, when configured,
/// seeded with a bootstrap admin before it is handed out.
pub async fn open(config: &StoreConfig, bootstrap: Option<&seed::BootstrapAdmin>) -> anyhow::Result<DynStore> {
    let store: DynStore = match config {
        StoreConfig::Postgres {
            url,
            max_connections,
        } => {
            tracing::info!("Connecting to database...");
            let store = PgStore::connect(url, *max_connections).await.map_err(|e| {
                tracing::error!("Failed to connect to database: {}", e);
                e
            })?;
            tracing::info!("Database connection established");

            tracing::info!("Running database migrations...");
            store.migrate().await.map_err(|e| {
                tracing::error!("Failed to run database migrations: {}", e);
                e
            })?;
            tracing::info!("Database migrations completed");

            if let Some(admin) = bootstrap {
                seed::seed_admin(&store, admin).await?;
            }
            Arc::new(store)
        }
        StoreConfig::Rest {
            base_url,
            service_key,
            timeout,
        } => {
            let client = http::client(*timeout)?;
            Arc::new(RestStore::new(client, base_url, service_key.clone()))
        }
        StoreConfig::Webhook { base_url, timeout } => {
            let client = http::client(*timeout)?;
            Arc::new(WebhookStore::new(client, base_url))
        }
    };

    if bootstrap.is_some() && !matches!(config, StoreConfig::Postgres { .. }) {
        tracing::warn!(
            "ADMIN_EMAIL is set but the {} backend cannot create admins; ignoring",
            store.backend()
        );
    }

    Ok(store)
}
