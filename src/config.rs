use crate::db::seed::BootstrapAdmin;
use crate::scoring::{ConfigurationError, LikertScale, ScoringConfig};
use crate::web::session::JwtConfig;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

/// One year; longer sessions are refused at startup.
pub const MAX_JWT_EXPIRY_HOURS: i64 = 24 * 365;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required setting `{0}`")]
    Missing(&'static str),
    #[error("invalid value `{value}` for `{key}`: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
    #[error("no store configured: set DATABASE_URL, SUPABASE_URL or N8N_BASE_URL")]
    NoStore,
    #[error(transparent)]
    Scoring(#[from] ConfigurationError),
}

/// Where submissions and admin accounts live.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreConfig {
    Postgres { url: String, max_connections: u32 },
    Rest {
        base_url: String,
        service_key: String,
        timeout: Duration,
    },
    Webhook { base_url: String, timeout: Duration },
}

impl StoreConfig {
    pub fn name(&self) -> &'static str {
        match self {
            StoreConfig::Postgres { .. } => "postgres",
            StoreConfig::Rest { .. } => "rest",
            StoreConfig::Webhook { .. } => "webhook",
        }
    }
}

/// `max_requests` per `window` for one client IP.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimit {
    pub max_requests: usize,
    pub window: Duration,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub environment: String,
    pub cors_origins: Vec<String>,
    pub store: StoreConfig,
    pub jwt: JwtConfig,
    pub scoring: ScoringConfig,
    pub scale: LikertScale,
    pub ip_hash_salt: Option<String>,
    pub login_rate: RateLimit,
    pub submit_rate: RateLimit,
    pub report_limit: i64,
    pub export_limit: i64,
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from a key lookup.
    ///
    /// | Env Var                     | Default        |
    /// |-----------------------------|----------------|
    /// | `BIND_ADDR`                 | `0.0.0.0:PORT` |
    /// | `PORT`                      | `3000`         |
    /// | `APP_ENV`                   | `development`  |
    /// | `CORS_ORIGINS`              | `*`            |
    /// | `STORE_BACKEND`             | inferred       |
    /// | `DATABASE_MAX_CONNECTIONS`  | `10`           |
    /// | `HTTP_TIMEOUT_SECS`         | `30`           |
    /// | `JWT_SECRET`                | **required**   |
    /// | `JWT_EXPIRY_HOURS`          | `24` (max 8760)|
    /// | `LIKERT_MIN` / `LIKERT_MAX` | `1` / `10`     |
    /// | `LOGIN_RATE_LIMIT`          | `5/60`         |
    /// | `SUBMIT_RATE_LIMIT`         | `10/60`        |
    /// | `REPORT_LIMIT`              | `100`          |
    /// | `EXPORT_LIMIT`              | `10000`        |
    ///
    /// Risk thresholds are read by [`ScoringConfig::from_lookup`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bind_addr = match get("BIND_ADDR") {
            Some(raw) => parse("BIND_ADDR", &raw)?,
            None => {
                let port: u16 = parse_or("PORT", get("PORT"), 3000)?;
                SocketAddr::from(([0, 0, 0, 0], port))
            }
        };

        let cors_origins = get("CORS_ORIGINS")
            .unwrap_or_else(|| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let timeout = Duration::from_secs(parse_or("HTTP_TIMEOUT_SECS", get("HTTP_TIMEOUT_SECS"), 30)?);
        let backend = match get("STORE_BACKEND") {
            Some(name) => name.to_lowercase(),
            None if get("DATABASE_URL").is_some() => "postgres".to_string(),
            None if get("SUPABASE_URL").is_some() => "rest".to_string(),
            None if get("N8N_BASE_URL").is_some() => "webhook".to_string(),
            None => return Err(ConfigError::NoStore),
        };
        let store = match backend.as_str() {
            "postgres" => StoreConfig::Postgres {
                url: get("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?,
                max_connections: parse_or(
                    "DATABASE_MAX_CONNECTIONS",
                    get("DATABASE_MAX_CONNECTIONS"),
                    10,
                )?,
            },
            "rest" => StoreConfig::Rest {
                base_url: get("SUPABASE_URL").ok_or(ConfigError::Missing("SUPABASE_URL"))?,
                service_key: get("SUPABASE_SERVICE_ROLE_KEY")
                    .ok_or(ConfigError::Missing("SUPABASE_SERVICE_ROLE_KEY"))?,
                timeout,
            },
            "webhook" => StoreConfig::Webhook {
                base_url: get("N8N_BASE_URL").ok_or(ConfigError::Missing("N8N_BASE_URL"))?,
                timeout,
            },
            other => {
                return Err(ConfigError::Invalid {
                    key: "STORE_BACKEND",
                    value: other.to_string(),
                    reason: "expected postgres, rest or webhook".to_string(),
                })
            }
        };

        let jwt = JwtConfig {
            secret: get("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?,
            expiry_hours: parse_or("JWT_EXPIRY_HOURS", get("JWT_EXPIRY_HOURS"), 24)?,
        };
        if !(1..=MAX_JWT_EXPIRY_HOURS).contains(&jwt.expiry_hours) {
            return Err(ConfigError::Invalid {
                key: "JWT_EXPIRY_HOURS",
                value: jwt.expiry_hours.to_string(),
                reason: format!("must be between 1 and {MAX_JWT_EXPIRY_HOURS}"),
            });
        }

        let scoring = ScoringConfig::from_lookup(&lookup)?;
        let scale = LikertScale::new(
            parse_or("LIKERT_MIN", get("LIKERT_MIN"), 1)?,
            parse_or("LIKERT_MAX", get("LIKERT_MAX"), 10)?,
        )?;

        let bootstrap_admin = match get("ADMIN_EMAIL") {
            Some(email) => Some(BootstrapAdmin {
                email: email.to_lowercase(),
                password: get("ADMIN_PASSWORD").ok_or(ConfigError::Missing("ADMIN_PASSWORD"))?,
                full_name: get("ADMIN_FULL_NAME"),
            }),
            None => None,
        };

        Ok(Self {
            bind_addr,
            environment: get("APP_ENV").unwrap_or_else(|| "development".to_string()),
            cors_origins,
            store,
            jwt,
            scoring,
            scale,
            ip_hash_salt: get("IP_HASH_SALT"),
            login_rate: parse_rate("LOGIN_RATE_LIMIT", get("LOGIN_RATE_LIMIT"), 5)?,
            submit_rate: parse_rate("SUBMIT_RATE_LIMIT", get("SUBMIT_RATE_LIMIT"), 10)?,
            report_limit: parse_positive("REPORT_LIMIT", get("REPORT_LIMIT"), 100)?,
            export_limit: parse_positive("EXPORT_LIMIT", get("EXPORT_LIMIT"), 10_000)?,
            bootstrap_admin,
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }
}

fn parse<T>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
        key,
        value: raw.to_string(),
        reason: e.to_string(),
    })
}

fn parse_or<T>(key: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        Some(raw) => parse(key, &raw),
        None => Ok(default),
    }
}

fn parse_positive(key: &'static str, raw: Option<String>, default: i64) -> Result<i64, ConfigError> {
    let value = parse_or(key, raw, default)?;
    if value <= 0 {
        return Err(ConfigError::Invalid {
            key,
            value: value.to_string(),
            reason: "must be positive".to_string(),
        });
    }
    Ok(value)
}

/// Accepts `N` (per 60 seconds) or `N/SECONDS`.
fn parse_rate(key: &'static str, raw: Option<String>, default_max: usize) -> Result<RateLimit, ConfigError> {
    let Some(raw) = raw else {
        return Ok(RateLimit {
            max_requests: default_max,
            window: Duration::from_secs(60),
        });
    };
    let (max, secs) = match raw.split_once('/') {
        Some((max, secs)) => (max.trim(), secs.trim()),
        None => (raw.as_str(), "60"),
    };
    let max_requests: usize = parse(key, max)?;
    let secs: u64 = parse(key, secs)?;
    if max_requests == 0 || secs == 0 {
        return Err(ConfigError::Invalid {
            key,
            value: raw.clone(),
            reason: "limit and window must be positive".to_string(),
        });
    }
    Ok(RateLimit {
        max_requests,
        window: Duration::from_secs(secs),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn base() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("DATABASE_URL", "postgres://localhost/riscos"),
            ("JWT_SECRET", "test-secret"),
            ("RISK_LOW_MAX", "3"),
            ("RISK_MODERATE_MAX", "5"),
            ("RISK_HIGH_MAX", "9"),
        ])
    }

    fn load(vars: &HashMap<&'static str, &'static str>) -> Result<AppConfig, ConfigError> {
        AppConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string()))
    }

    #[test]
    fn defaults_apply() {
        let config = load(&base()).unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:3000".parse::<SocketAddr>().unwrap());
        assert_eq!(config.cors_origins, vec!["*".to_string()]);
        assert_eq!(config.store.name(), "postgres");
        assert_eq!(config.jwt.expiry_hours, 24);
        assert_eq!((config.scale.min(), config.scale.max()), (1, 10));
        assert_eq!(config.login_rate.max_requests, 5);
        assert_eq!(config.submit_rate.max_requests, 10);
        assert_eq!(config.submit_rate.window, Duration::from_secs(60));
        assert_eq!(config.report_limit, 100);
        assert_eq!(config.export_limit, 10_000);
        assert!(config.bootstrap_admin.is_none());
        assert!(!config.is_production());
    }

    #[test]
    fn backend_is_inferred_from_urls() {
        let mut vars = base();
        vars.remove("DATABASE_URL");
        vars.insert("SUPABASE_URL", "https://x.supabase.co");
        vars.insert("SUPABASE_SERVICE_ROLE_KEY", "service");
        assert_eq!(load(&vars).unwrap().store.name(), "rest");

        vars.remove("SUPABASE_URL");
        vars.insert("N8N_BASE_URL", "https://n8n.local/webhook");
        assert_eq!(load(&vars).unwrap().store.name(), "webhook");

        vars.remove("N8N_BASE_URL");
        assert!(matches!(load(&vars), Err(ConfigError::NoStore)));
    }

    #[test]
    fn explicit_backend_requires_its_settings() {
        let mut vars = base();
        vars.insert("STORE_BACKEND", "rest");
        assert!(matches!(load(&vars), Err(ConfigError::Missing("SUPABASE_URL"))));

        vars.insert("STORE_BACKEND", "mongo");
        assert!(matches!(
            load(&vars),
            Err(ConfigError::Invalid {
                key: "STORE_BACKEND",
                ..
            })
        ));
    }

    #[test]
    fn missing_thresholds_are_fatal() {
        let mut vars = base();
        vars.remove("RISK_HIGH_MAX");
        assert!(matches!(
            load(&vars),
            Err(ConfigError::Scoring(ConfigurationError::Missing(_)))
        ));

        let mut vars = base();
        vars.insert("RISK_MODERATE_MAX", "2");
        assert!(matches!(
            load(&vars),
            Err(ConfigError::Scoring(ConfigurationError::NotIncreasing { .. }))
        ));
    }

    #[test]
    fn jwt_secret_is_required() {
        let mut vars = base();
        vars.remove("JWT_SECRET");
        assert!(matches!(load(&vars), Err(ConfigError::Missing("JWT_SECRET"))));
    }

    #[test]
    fn jwt_expiry_is_bounded() {
        let mut vars = base();
        vars.insert("JWT_EXPIRY_HOURS", "8760");
        assert_eq!(load(&vars).unwrap().jwt.expiry_hours, MAX_JWT_EXPIRY_HOURS);

        for bad in ["0", "-1", "8761", "9223372036854775807"] {
            vars.insert("JWT_EXPIRY_HOURS", bad);
            assert!(matches!(
                load(&vars),
                Err(ConfigError::Invalid {
                    key: "JWT_EXPIRY_HOURS",
                    ..
                })
            ));
        }
    }

    #[test]
    fn rate_limits_accept_window_suffix() {
        let mut vars = base();
        vars.insert("LOGIN_RATE_LIMIT", "3/300");
        vars.insert("SUBMIT_RATE_LIMIT", "20");
        let config = load(&vars).unwrap();
        assert_eq!(config.login_rate.max_requests, 3);
        assert_eq!(config.login_rate.window, Duration::from_secs(300));
        assert_eq!(config.submit_rate.max_requests, 20);

        vars.insert("SUBMIT_RATE_LIMIT", "0/60");
        assert!(load(&vars).is_err());
    }

    #[test]
    fn bootstrap_admin_needs_password() {
        let mut vars = base();
        vars.insert("ADMIN_EMAIL", " RH@Empresa.com ");
        assert!(matches!(load(&vars), Err(ConfigError::Missing("ADMIN_PASSWORD"))));

        vars.insert("ADMIN_PASSWORD", "segredo");
        let admin = load(&vars).unwrap().bootstrap_admin.unwrap();
        assert_eq!(admin.email, "rh@empresa.com");
    }

    #[test]
    fn bind_addr_overrides_port() {
        let mut vars = base();
        vars.insert("PORT", "8080");
        assert_eq!(load(&vars).unwrap().bind_addr.port(), 8080);
        vars.insert("BIND_ADDR", "127.0.0.1:9000");
        assert_eq!(load(&vars).unwrap().bind_addr, "127.0.0.1:9000".parse::<SocketAddr>().unwrap());
    }
}
