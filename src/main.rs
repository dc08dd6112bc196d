use riscos_map::config::AppConfig;
use riscos_map::state::{AppState, SharedState};
use riscos_map::{db, web};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env().map_err(|e| {
        tracing::error!("Invalid configuration: {}", e);
        e
    })?;
    tracing::info!(
        environment = %config.environment,
        store = config.store.name(),
        "Starting riscos-map {}",
        env!("CARGO_PKG_VERSION")
    );

    if config.is_production() && config.cors_origins.iter().any(|o| o == "*") {
        tracing::warn!("CORS allows any origin in production; set CORS_ORIGINS");
    }

    let store = db::open(&config.store, config.bootstrap_admin.as_ref()).await?;
    let state = AppState::new(&config, store)?;

    tracing::info!("Risk thresholds in effect:");
    for (dimension, t) in state.engine.threshold_table().iter() {
        tracing::info!(
            "  - {:<15} baixo <= {}, moderado <= {}, alto <= {}",
            dimension.as_str(),
            t.low_max(),
            t.moderate_max(),
            t.high_max()
        );
    }
    tracing::info!(
        "Answer scale {}..={}, IP pseudonymisation {}",
        config.scale.min(),
        config.scale.max(),
        if state.ip_pseudonymizer.is_enabled() { "on" } else { "off" }
    );

    let shared: SharedState = Arc::new(state);
    let app = web::app(shared, &config.cors_origins);

    tracing::info!("Listening on {}", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;
    Ok(())
}
