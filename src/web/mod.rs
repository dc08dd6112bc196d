pub mod admin;
pub mod auth;
pub mod form;
pub mod session;

use crate::middleware;
use crate::state::SharedState;
use axum::{http::HeaderValue, routing::get, Json, Router};
use serde_json::{json, Value};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub const SERVICE_NAME: &str = "riscos-psicossociais-map";

async fn root() -> Json<Value> {
    Json(json!({
        "message": "API Riscos Psicossociais MAP",
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "status": "operational",
    }))
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub fn routes(state: SharedState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .nest("/api/form", form::router(state.clone()))
        .nest("/api/auth", auth::router(state.clone()))
        .nest("/api/admin", admin::router(state))
}

pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let base = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return base.allow_origin(Any);
    }
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();
    base.allow_origin(AllowOrigin::list(allowed))
}

/// Full application: routes plus timing, tracing and CORS layers.
pub fn app(state: SharedState, cors_origins: &[String]) -> Router {
    Router::new()
        .merge(routes(state))
        .layer(axum::middleware::from_fn(middleware::process_time))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(cors_origins))
}
