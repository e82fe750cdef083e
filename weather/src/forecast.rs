//! In-process forecast lookup standing in for the remote weather service.

use std::collections::HashMap;
use std::env;
use std::thread;
use std::time::Duration;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Input of `fetch_weather`, JSON encoded by the caller.
#[derive(Default, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct WeatherRequest {
    /// A zip code to use for weather request.
    #[serde(rename = "zipCode")]
    pub zip_code: String,
}

/// Weather result.
#[derive(Default, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct WeatherResponse {
    /// The name of the city from the supplied zip code.
    #[serde(rename = "cityName")]
    pub city_name: String,

    /// General description of current weather.
    #[serde(rename = "weatherDescription")]
    pub weather_description: String,

    /// Temperature in Fahrenheit.
    pub temperature: String,
}

impl WeatherResponse {
    pub fn new(city_name: &str, weather_description: &str, temperature: &str) -> Self {
        Self {
            city_name: city_name.to_string(),
            weather_description: weather_description.to_string(),
            temperature: temperature.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ForecastTable {
    entries: HashMap<String, WeatherResponse>,
    latency: Duration,
}

impl ForecastTable {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn builtin() -> Self {
        let mut table = Self::empty();
        table.insert("11211", WeatherResponse::new("Brooklyn", "clear sky", "72"));
        table.insert("10001", WeatherResponse::new("New York", "broken clouds", "68"));
        table.insert("60614", WeatherResponse::new("Chicago", "light rain", "49"));
        table.insert("94103", WeatherResponse::new("San Francisco", "mist", "58"));
        table.insert("98101", WeatherResponse::new("Seattle", "overcast clouds", "53"));
        table
    }

    /// Builtin table, delayed by `WEATHER_LATENCY_MS` if set.
    pub fn from_env() -> Self {
        let latency = match env::var("WEATHER_LATENCY_MS") {
            Ok(value) => value.trim().parse().unwrap_or_else(|e| {
                warn!("ignoring WEATHER_LATENCY_MS={:?}: {}", value, e);
                0
            }),
            Err(_) => 0,
        };
        Self::builtin().with_latency(Duration::from_millis(latency))
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn insert(&mut self, zip_code: &str, forecast: WeatherResponse) -> Option<WeatherResponse> {
        self.entries.insert(zip_code.to_string(), forecast)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Blocks for the configured latency, then answers from the table.
    pub fn lookup(&self, request: &WeatherRequest) -> Result<WeatherResponse> {
        if !self.latency.is_zero() {
            thread::sleep(self.latency);
        }
        let zip_code = request.zip_code.trim();
        debug!("looking up forecast for {}", zip_code);
        self.entries
            .get(zip_code)
            .cloned()
            .ok_or_else(|| Error::UnknownZipCode(zip_code.to_string()))
    }
}
