use ffi_bridge::LedgerSnapshot;
use serde::{Deserialize, Serialize};

// ============ Weather Types ============

/// Request shape expected by the weather library.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WeatherRequest {
    pub zip_code: String,
}

/// Forecast as answered by the weather library.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WeatherReport {
    pub city_name: String,
    pub weather_description: String,
    /// Fahrenheit
    pub temperature: String,
}

// ============ API Response Types ============

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub background_context: String,
    pub target_context: String,
    pub contexts: LedgerSnapshot,
    pub in_flight: u64,
    pub live_contexts: usize,
    pub is_healthy: bool,
}
