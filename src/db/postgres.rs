use super::{NewSubmission, StoreError, SubmissionQuery, SurveyStore};
use crate::domain::{AccessLogEntry, AdminRecord, AnswerSet, Submission};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

#[derive(Debug, FromRow)]
struct SubmissionRow {
    id: Uuid,
    submitted_at: DateTime<Utc>,
    ip_address: Option<String>,
    user_agent: Option<String>,
    completion_time_seconds: i32,
    answers: Json<AnswerSet>,
}

impl From<SubmissionRow> for Submission {
    fn from(row: SubmissionRow) -> Self {
        Submission {
            id: row.id,
            submitted_at: row.submitted_at,
            ip_address: row.ip_address,
            user_agent: row.user_agent,
            completion_time_seconds: row.completion_time_seconds,
            answers: row.answers.0,
        }
    }
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Creates the admin or, if the email exists, resets its password and
    /// reactivates it.
    pub async fn upsert_admin(
        &self,
        email: &str,
        password_hash: &str,
        full_name: Option<&str>,
    ) -> Result<Uuid, StoreError> {
        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO admin_users (id, email, password_hash, full_name, is_active)
            VALUES ($1, $2, $3, $4, true)
            ON CONFLICT (email) DO UPDATE
            SET password_hash = EXCLUDED.password_hash,
                full_name = COALESCE(EXCLUDED.full_name, admin_users.full_name),
                is_active = true
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(password_hash)
        .bind(full_name)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }
}

#[async_trait]
impl SurveyStore for PgStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn insert_submission(&self, new: &NewSubmission) -> Result<Submission, StoreError> {
        let row = sqlx::query_as::<_, SubmissionRow>(
            r#"
            INSERT INTO responses
                (id, ip_address, user_agent, completion_time_seconds, answers, scores, risks)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, submitted_at, ip_address, user_agent, completion_time_seconds, answers
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new.ip_address)
        .bind(&new.user_agent)
        .bind(new.completion_time_seconds)
        .bind(Json(&new.answers))
        .bind(Json(&new.scores))
        .bind(Json(&new.risks))
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn log_access(&self, entry: &AccessLogEntry) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO access_log (ip_address, action, metadata)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(&entry.ip_address)
        .bind(&entry.action)
        .bind(&entry.metadata)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_submissions(&self, query: &SubmissionQuery) -> Result<Vec<Submission>, StoreError> {
        let rows = sqlx::query_as::<_, SubmissionRow>(
            r#"
            SELECT id, submitted_at, ip_address, user_agent, completion_time_seconds, answers
            FROM responses
            WHERE ($1::timestamptz IS NULL OR submitted_at >= $1)
              AND ($2::timestamptz IS NULL OR submitted_at <= $2)
            ORDER BY submitted_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(query.start)
        .bind(query.end)
        .bind(query.limit)
        .bind(query.offset.max(0))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Submission::from).collect())
    }

    async fn find_admin_by_email(&self, email: &str) -> Result<Option<AdminRecord>, StoreError> {
        let admin = sqlx::query_as::<_, AdminRecord>(
            r#"
            SELECT id, email, password_hash, full_name, is_active, created_at, last_login
            FROM admin_users
            WHERE email = $1
              AND is_active = true
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(admin)
    }

    async fn touch_admin_login(&self, admin_id: Uuid) -> Result<(), StoreError> {
        sqlx::query("UPDATE admin_users SET last_login = NOW() WHERE id = $1")
            .bind(admin_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn health(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
