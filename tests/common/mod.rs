#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Request, Response};
use axum::Router;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower::ServiceExt;
use uuid::Uuid;

use riscos_map::config::AppConfig;
use riscos_map::db::seed::hash_password;
use riscos_map::db::{NewSubmission, StoreError, SubmissionQuery, SurveyStore};
use riscos_map::domain::{AccessLogEntry, AdminRecord, AnswerSet, Submission};
use riscos_map::state::AppState;
use riscos_map::web;

pub const ADMIN_EMAIL: &str = "rh@empresa.com";
pub const ADMIN_PASSWORD: &str = "senha-muito-segura";

/// In-memory store with the same ordering and filtering contract as the real backends.
#[derive(Default)]
pub struct MemoryStore {
    submissions: RwLock<Vec<Submission>>,
    admins: RwLock<Vec<AdminRecord>>,
    access_log: RwLock<Vec<AccessLogEntry>>,
    unreachable: AtomicBool,
}

impl MemoryStore {
    pub async fn add_admin(&self, email: &str, password: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.admins.write().await.push(AdminRecord {
            id,
            email: email.to_string(),
            password_hash: hash_password(password).expect("hashing should succeed"),
            full_name: Some("Recursos Humanos".to_string()),
            is_active: true,
            created_at: Utc::now(),
            last_login: None,
        });
        id
    }

    pub async fn deactivate(&self, email: &str) {
        for admin in self.admins.write().await.iter_mut() {
            if admin.email == email {
                admin.is_active = false;
            }
        }
    }

    pub async fn admin(&self, email: &str) -> Option<AdminRecord> {
        self.admins
            .read()
            .await
            .iter()
            .find(|a| a.email == email)
            .cloned()
    }

    pub async fn push(&self, answers: AnswerSet, submitted_at: DateTime<Utc>, ip: &str) {
        self.submissions.write().await.push(Submission {
            id: Uuid::new_v4(),
            submitted_at,
            ip_address: Some(ip.to_string()),
            user_agent: None,
            completion_time_seconds: 240,
            answers,
        });
    }

    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    pub async fn submissions(&self) -> Vec<Submission> {
        self.submissions.read().await.clone()
    }

    pub async fn access_log(&self) -> Vec<AccessLogEntry> {
        self.access_log.read().await.clone()
    }
}

#[async_trait]
impl SurveyStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn insert_submission(&self, new: &NewSubmission) -> Result<Submission, StoreError> {
        let submission = Submission {
            id: Uuid::new_v4(),
            submitted_at: Utc::now(),
            ip_address: new.ip_address.clone(),
            user_agent: new.user_agent.clone(),
            completion_time_seconds: new.completion_time_seconds,
            answers: new.answers.clone(),
        };
        self.submissions.write().await.push(submission.clone());
        Ok(submission)
    }

    async fn log_access(&self, entry: &AccessLogEntry) -> Result<(), StoreError> {
        self.access_log.write().await.push(entry.clone());
        Ok(())
    }

    async fn list_submissions(&self, query: &SubmissionQuery) -> Result<Vec<Submission>, StoreError> {
        let mut rows: Vec<Submission> = self
            .submissions
            .read()
            .await
            .iter()
            .filter(|s| query.start.map_or(true, |start| s.submitted_at >= start))
            .filter(|s| query.end.map_or(true, |end| s.submitted_at <= end))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
        Ok(rows
            .into_iter()
            .skip(usize::try_from(query.offset).unwrap_or(0))
            .take(usize::try_from(query.limit).unwrap_or(0))
            .collect())
    }

    async fn find_admin_by_email(&self, email: &str) -> Result<Option<AdminRecord>, StoreError> {
        Ok(self
            .admins
            .read()
            .await
            .iter()
            .find(|a| a.email == email && a.is_active)
            .cloned())
    }

    async fn touch_admin_login(&self, admin_id: Uuid) -> Result<(), StoreError> {
        for admin in self.admins.write().await.iter_mut() {
            if admin.id == admin_id {
                admin.last_login = Some(Utc::now());
            }
        }
        Ok(())
    }

    async fn health(&self) -> Result<(), StoreError> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(StoreError::Upstream {
                endpoint: "memory".to_string(),
                status: 503,
                body: "offline".to_string(),
            });
        }
        Ok(())
    }
}

pub fn test_vars() -> HashMap<&'static str, &'static str> {
    HashMap::from([
        ("DATABASE_URL", "postgres://unused/riscos"),
        ("JWT_SECRET", "test-secret-that-is-long-enough-for-hmac"),
        ("RISK_LOW_MAX", "3"),
        ("RISK_MODERATE_MAX", "5"),
        ("RISK_HIGH_MAX", "7"),
        ("IP_HASH_SALT", "sal-de-teste"),
    ])
}

/// Builds the application exactly as `main` does, backed by `store`.
pub fn build_test_app_with(store: Arc<MemoryStore>, vars: HashMap<&'static str, &'static str>) -> Router {
    let config = AppConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string()))
        .expect("test configuration should be valid");
    let state = AppState::new(&config, store).expect("state should build");
    web::app(Arc::new(state), &config.cors_origins)
}

pub fn build_test_app(store: Arc<MemoryStore>) -> Router {
    build_test_app_with(store, test_vars())
}

pub fn full_answers() -> AnswerSet {
    AnswerSet {
        demandas: vec![5, 6, 4, 7, 5, 6, 7, 8],
        controle: vec![3, 4, 5, 4, 3, 4, 5],
        relacionamento: vec![2, 1, 2, 3],
        cargo: vec![4, 5, 4, 6],
        mudanca: vec![5, 6, 5],
        apoio_chefia: vec![7, 6, 7, 8, 6],
        apoio_colegas: vec![4, 5, 4, 5],
    }
}

pub fn critical_answers() -> AnswerSet {
    AnswerSet {
        demandas: vec![9; 8],
        controle: vec![9; 7],
        relacionamento: vec![9; 4],
        cargo: vec![9; 4],
        mudanca: vec![9; 3],
        apoio_chefia: vec![9; 5],
        apoio_colegas: vec![9; 4],
    }
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should be readable")
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).expect("body should be JSON")
}

fn request(method: &str, uri: &str, ip: &str, token: Option<&str>, body: Option<serde_json::Value>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("x-forwarded-for", ip);
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    let body = match body {
        Some(json) => {
            builder = builder.header(CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    builder.body(body).expect("request should build")
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    app.oneshot(request("GET", uri, "198.51.100.1", None, None))
        .await
        .expect("request should succeed")
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    app.oneshot(request("GET", uri, "198.51.100.1", Some(token), None))
        .await
        .expect("request should succeed")
}

pub async fn post_json(app: Router, uri: &str, ip: &str, body: serde_json::Value) -> Response<Body> {
    app.oneshot(request("POST", uri, ip, None, Some(body)))
        .await
        .expect("request should succeed")
}

pub async fn post_auth(app: Router, uri: &str, token: &str, body: Option<serde_json::Value>) -> Response<Body> {
    app.oneshot(request("POST", uri, "198.51.100.1", Some(token), body))
        .await
        .expect("request should succeed")
}

/// Seeds the admin account and returns a bearer token for it.
pub async fn admin_token(app: Router, store: &MemoryStore) -> String {
    if store.admin(ADMIN_EMAIL).await.is_none() {
        store.add_admin(ADMIN_EMAIL, ADMIN_PASSWORD).await;
    }
    let response = post_json(
        app,
        "/api/auth/login",
        "198.51.100.200",
        serde_json::json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD }),
    )
    .await;
    assert_eq!(response.status(), 200);
    body_json(response).await["access_token"]
        .as_str()
        .expect("token should be a string")
        .to_string()
}
