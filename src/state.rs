use crate::config::{AppConfig, ConfigError};
use crate::db::DynStore;
use crate::middleware::{IpPseudonymizer, RateLimiter};
use crate::scoring::{LikertScale, ScoringEngine};
use crate::web::session::JwtConfig;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: DynStore,
    pub engine: Arc<ScoringEngine>,
    pub jwt: JwtConfig,
    pub scale: LikertScale,
    pub ip_pseudonymizer: IpPseudonymizer,
    pub login_limiter: RateLimiter,
    pub submit_limiter: RateLimiter,
    pub report_limit: i64,
    pub export_limit: i64,
}

impl AppState {
    pub fn new(config: &AppConfig, store: DynStore) -> Result<Self, ConfigError> {
        let ip_pseudonymizer =
            IpPseudonymizer::new(config.ip_hash_salt.as_deref()).map_err(|e| ConfigError::Invalid {
                key: "IP_HASH_SALT",
                value: "<redacted>".to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            store,
            engine: Arc::new(ScoringEngine::new(&config.scoring)),
            jwt: config.jwt.clone(),
            scale: config.scale,
            ip_pseudonymizer,
            login_limiter: RateLimiter::new(config.login_rate),
            submit_limiter: RateLimiter::new(config.submit_rate),
            report_limit: config.report_limit,
            export_limit: config.export_limit,
        })
    }
}

pub type SharedState = Arc<AppState>;
