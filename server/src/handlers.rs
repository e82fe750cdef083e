use crate::error::ApiError;
use crate::models::*;
use crate::AppState;
use axum::{
    extract::{Path, State},
    Json,
};

// GET /v1/status
pub async fn get_status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(state.forecasts.status())
}

// GET /v1/weather/:zip_code
pub async fn get_weather(
    State(state): State<AppState>,
    Path(zip_code): Path<String>,
) -> Result<Json<WeatherReport>, ApiError> {
    tracing::info!("Fetching weather for {}...", zip_code);
    let report = state.forecasts.fetch(&zip_code).await?;
    Ok(Json(report))
}

// POST /v1/weather
pub async fn post_weather(
    State(state): State<AppState>,
    Json(body): Json<WeatherRequest>,
) -> Result<Json<WeatherReport>, ApiError> {
    tracing::info!("Fetching weather for {}...", body.zip_code);
    let report = state.forecasts.fetch(&body.zip_code).await?;
    Ok(Json(report))
}
