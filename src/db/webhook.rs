//! Workflow-webhook (n8n) backed store. Every operation is a JSON POST to
//! `<base>/<endpoint>`.

use super::http::{expect_success, first_record, iso, read_json};
use super::{NewSubmission, StoreError, SubmissionQuery, SurveyStore};
use crate::domain::{AccessLogEntry, AdminRecord, Submission};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

const FORM_SUBMIT: &str = "form-submit";
const LOG_ACCESS: &str = "log-access";
const ADMIN_GET: &str = "admin-get";
const ADMIN_UPDATE_LOGIN: &str = "admin-update-login";
const REPORTS_FILTERED: &str = "reports-filtered";

#[derive(Clone)]
pub struct WebhookStore {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct Receipt {
    id: Uuid,
    #[serde(default)]
    submitted_at: Option<DateTime<Utc>>,
}

impl WebhookStore {
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint)
    }

    async fn post(&self, endpoint: &str, body: &Value) -> Result<reqwest::Response, StoreError> {
        tracing::debug!(endpoint, "calling webhook");
        let response = self.client.post(self.url(endpoint)).json(body).send().await?;
        Ok(response)
    }
}

/// Workflows answer lists as an array, a single object or nothing at all.
fn many<T: serde::de::DeserializeOwned>(endpoint: &str, value: Value) -> Result<Vec<T>, StoreError> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Array(_) => serde_json::from_value(value).map_err(|e| StoreError::Decode {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        }),
        other => Ok(first_record(endpoint, other)?.into_iter().collect()),
    }
}

/// Orders newest first and applies offset and limit; the workflow is not
/// trusted to honour either.
fn page_of(mut submissions: Vec<Submission>, query: &SubmissionQuery) -> Vec<Submission> {
    submissions.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
    submissions
        .into_iter()
        .skip(usize::try_from(query.offset).unwrap_or(0))
        .take(usize::try_from(query.limit).unwrap_or(0))
        .collect()
}

#[async_trait]
impl SurveyStore for WebhookStore {
    fn backend(&self) -> &'static str {
        "webhook"
    }

    async fn insert_submission(&self, new: &NewSubmission) -> Result<Submission, StoreError> {
        let body = serde_json::to_value(new).map_err(|e| StoreError::Decode {
            endpoint: FORM_SUBMIT.to_string(),
            reason: e.to_string(),
        })?;
        let response = self.post(FORM_SUBMIT, &body).await?;
        let value: Value = read_json(FORM_SUBMIT, response).await?;
        let receipt: Receipt = first_record(FORM_SUBMIT, value)?.ok_or_else(|| StoreError::Decode {
            endpoint: FORM_SUBMIT.to_string(),
            reason: "workflow returned no receipt".to_string(),
        })?;

        Ok(Submission {
            id: receipt.id,
            submitted_at: receipt.submitted_at.unwrap_or_else(Utc::now),
            ip_address: new.ip_address.clone(),
            user_agent: new.user_agent.clone(),
            completion_time_seconds: new.completion_time_seconds,
            answers: new.answers.clone(),
        })
    }

    async fn log_access(&self, entry: &AccessLogEntry) -> Result<(), StoreError> {
        let body = json!({
            "ip_address": entry.ip_address,
            "action": entry.action,
            "metadata": entry.metadata,
        });
        let response = self.post(LOG_ACCESS, &body).await?;
        expect_success(LOG_ACCESS, response).await
    }

    async fn list_submissions(&self, query: &SubmissionQuery) -> Result<Vec<Submission>, StoreError> {
        // Workflows take no offset, so ask for everything up to the end of
        // the requested page and slice it here.
        let body = json!({
            "start_date": query.start.map(iso),
            "end_date": query.end.map(iso),
            "limit": query.offset.max(0) + query.limit.max(0),
        });
        let response = self.post(REPORTS_FILTERED, &body).await?;
        let value: Value = read_json(REPORTS_FILTERED, response).await?;
        let submissions: Vec<Submission> = many(REPORTS_FILTERED, value)?;
        Ok(page_of(submissions, query))
    }

    async fn find_admin_by_email(&self, email: &str) -> Result<Option<AdminRecord>, StoreError> {
        let response = self.post(ADMIN_GET, &json!({ "email": email })).await?;
        let value: Value = read_json(ADMIN_GET, response).await?;
        let admin: Option<AdminRecord> = first_record(ADMIN_GET, value)?;
        Ok(admin.filter(|a| a.is_active))
    }

    async fn touch_admin_login(&self, admin_id: Uuid) -> Result<(), StoreError> {
        let response = self
            .post(ADMIN_UPDATE_LOGIN, &json!({ "admin_id": admin_id }))
            .await?;
        expect_success(ADMIN_UPDATE_LOGIN, response).await
    }

    async fn health(&self) -> Result<(), StoreError> {
        // Workflows expose no probe endpoint.
        Ok(())
    }
}
