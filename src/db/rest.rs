//! PostgREST (Supabase) backed store.

use super::http::{expect_success, first_record, iso, read_json};
use super::{NewSubmission, StoreError, SubmissionQuery, SurveyStore};
use crate::domain::{AccessLogEntry, AdminRecord, AnswerSet, Submission};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::RequestBuilder;
use serde::Serialize;
use serde_json::{json, Value};
use uuid::Uuid;

const RESPONSES: &str = "responses";
const ACCESS_LOG: &str = "access_log";
const ADMIN_USERS: &str = "admin_users";

#[derive(Clone)]
pub struct RestStore {
    client: reqwest::Client,
    base_url: String,
    service_key: String,
}

/// Columns written on insert; score columns, if any, are derived upstream.
#[derive(Serialize)]
struct ResponseInsert<'a> {
    ip_address: Option<&'a str>,
    user_agent: Option<&'a str>,
    completion_time_seconds: i32,
    answers: &'a AnswerSet,
}

impl RestStore {
    pub fn new(client: reqwest::Client, base_url: &str, service_key: String) -> Self {
        Self {
            client,
            base_url: format!("{}/rest/v1", base_url.trim_end_matches('/')),
            service_key,
        }
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/{}", self.base_url, table)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
    }
}

/// PostgREST query parameters for a submission range query.
pub fn submission_filters(query: &SubmissionQuery) -> Vec<(String, String)> {
    let mut params = vec![("select".to_string(), "*".to_string())];
    if let Some(start) = query.start {
        params.push(("submitted_at".to_string(), format!("gte.{}", iso(start))));
    }
    if let Some(end) = query.end {
        params.push(("submitted_at".to_string(), format!("lte.{}", iso(end))));
    }
    params.push(("order".to_string(), "submitted_at.desc".to_string()));
    params.push(("limit".to_string(), query.limit.max(0).to_string()));
    if query.offset > 0 {
        params.push(("offset".to_string(), query.offset.to_string()));
    }
    params
}

fn admin_filters(email: &str) -> Vec<(String, String)> {
    vec![
        ("select".to_string(), "*".to_string()),
        ("email".to_string(), format!("eq.{email}")),
        ("is_active".to_string(), "eq.true".to_string()),
    ]
}

#[async_trait]
impl SurveyStore for RestStore {
    fn backend(&self) -> &'static str {
        "rest"
    }

    async fn insert_submission(&self, new: &NewSubmission) -> Result<Submission, StoreError> {
        let body = ResponseInsert {
            ip_address: new.ip_address.as_deref(),
            user_agent: new.user_agent.as_deref(),
            completion_time_seconds: new.completion_time_seconds,
            answers: &new.answers,
        };
        let response = self
            .authorized(self.client.post(self.table_url(RESPONSES)))
            .header("Prefer", "return=representation")
            .json(&body)
            .send()
            .await?;
        let value: Value = read_json(RESPONSES, response).await?;
        first_record(RESPONSES, value)?.ok_or_else(|| StoreError::Decode {
            endpoint: RESPONSES.to_string(),
            reason: "insert returned no rows".to_string(),
        })
    }

    async fn log_access(&self, entry: &AccessLogEntry) -> Result<(), StoreError> {
        let response = self
            .authorized(self.client.post(self.table_url(ACCESS_LOG)))
            .json(entry)
            .send()
            .await?;
        expect_success(ACCESS_LOG, response).await
    }

    async fn list_submissions(&self, query: &SubmissionQuery) -> Result<Vec<Submission>, StoreError> {
        let response = self
            .authorized(self.client.get(self.table_url(RESPONSES)))
            .query(&submission_filters(query))
            .send()
            .await?;
        read_json(RESPONSES, response).await
    }

    async fn find_admin_by_email(&self, email: &str) -> Result<Option<AdminRecord>, StoreError> {
        let response = self
            .authorized(self.client.get(self.table_url(ADMIN_USERS)))
            .query(&admin_filters(email))
            .send()
            .await?;
        let value: Value = read_json(ADMIN_USERS, response).await?;
        first_record(ADMIN_USERS, value)
    }

    async fn touch_admin_login(&self, admin_id: Uuid) -> Result<(), StoreError> {
        let response = self
            .authorized(self.client.patch(self.table_url(ADMIN_USERS)))
            .query(&[("id", format!("eq.{admin_id}"))])
            .json(&json!({ "last_login": iso(Utc::now()) }))
            .send()
            .await?;
        expect_success(ADMIN_USERS, response).await
    }

    async fn health(&self) -> Result<(), StoreError> {
        let response = self
            .authorized(self.client.get(self.table_url(RESPONSES)))
            .query(&[("select", "id"), ("limit", "1")])
            .send()
            .await?;
        expect_success(RESPONSES, response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn range_query_uses_postgrest_operators() {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 3, 31, 23, 59, 59).unwrap();
        let params = submission_filters(&SubmissionQuery::between(Some(start), Some(end), 50));
        let pairs: Vec<(&str, &str)> = params.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
        assert_eq!(
            pairs,
            vec![
                ("select", "*"),
                ("submitted_at", "gte.2024-03-01T00:00:00.000000Z"),
                ("submitted_at", "lte.2024-03-31T23:59:59.000000Z"),
                ("order", "submitted_at.desc"),
                ("limit", "50"),
            ]
        );
    }

    #[test]
    fn open_range_only_orders_and_limits() {
        let params = submission_filters(&SubmissionQuery::latest(100));
        assert_eq!(params.len(), 3);
        assert!(params.iter().all(|(k, _)| k != "submitted_at"));
    }

    #[test]
    fn later_pages_carry_an_offset() {
        let params = submission_filters(&SubmissionQuery::latest(500).page(1000));
        assert_eq!(params.last(), Some(&("offset".to_string(), "1000".to_string())));
    }

    #[test]
    fn base_url_gets_rest_prefix_once() {
        let store = RestStore::new(reqwest::Client::new(), "https://abc.supabase.co/", "key".into());
        assert_eq!(store.table_url(RESPONSES), "https://abc.supabase.co/rest/v1/responses");
    }

    #[test]
    fn admin_lookup_filters_active_accounts() {
        let params = admin_filters("rh@empresa.com");
        assert!(params.contains(&("email".to_string(), "eq.rh@empresa.com".to_string())));
        assert!(params.contains(&("is_active".to_string(), "eq.true".to_string())));
    }
}
