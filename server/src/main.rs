mod error;
mod forecast_client;
mod handlers;
mod models;

use axum::{
    routing::{get, post},
    Router,
};
use ffi_bridge::BridgeConfig;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use forecast_client::ForecastClient;

#[derive(Clone)]
pub struct AppState {
    pub forecasts: Arc<ForecastClient>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "weather_gateway=debug,ffi_bridge=debug,weather_ffi=info,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load config from env
    dotenvy::dotenv().ok();
    let port = std::env::var("PORT").unwrap_or_else(|_| "8080".to_string());
    let timeout_ms: u64 = std::env::var("REQUEST_TIMEOUT_MS")
        .ok()
        .and_then(|ms| ms.parse().ok())
        .unwrap_or(10_000);
    let bridge_config = BridgeConfig::from_env()?;

    tracing::info!(
        "Bridge contexts: background={} target={}",
        bridge_config.background_label,
        bridge_config.target_label
    );
    tracing::info!("Request timeout: {} ms", timeout_ms);

    let forecasts = ForecastClient::start(&bridge_config, Duration::from_millis(timeout_ms))?;
    let state = AppState {
        forecasts: Arc::new(forecasts),
    };

    let app = Router::new()
        .route("/v1/status", get(handlers::get_status))
        .route("/v1/weather", post(handlers::post_weather))
        .route("/v1/weather/:zip_code", get(handlers::get_weather))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    tracing::info!("Gateway listening on port {}", port);

    axum::serve(listener, app).await?;
    Ok(())
}
