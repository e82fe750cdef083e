use crate::error::ApiError;
use crate::models::*;
use ffi_bridge::{
    Bridge, BridgeConfig, Error as BridgeError, EventLoop, ForeignFn, JsonCodec, WorkerPool,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;

pub struct ForecastClient {
    bridge: Bridge,
    codec: JsonCodec<WeatherRequest, WeatherReport>,
    timeout: Duration,
    // Declared last so the bridge is dropped before the loop it delivers to.
    event_loop: EventLoop,
}

impl ForecastClient {
    /// Client backed by the linked weather library.
    pub fn start(config: &BridgeConfig, timeout: Duration) -> Result<Self, ApiError> {
        Self::with_foreign(weather_ffi::fetch_weather, config, timeout)
    }

    pub fn with_foreign(
        foreign: ForeignFn,
        config: &BridgeConfig,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let pool = WorkerPool::from_config(config)?;
        let event_loop = EventLoop::from_config(config)?;
        let bridge = Bridge::new(foreign, Arc::new(pool), Arc::new(event_loop.handle()));

        Ok(Self {
            bridge,
            codec: JsonCodec::new(),
            timeout,
            event_loop,
        })
    }

    pub async fn fetch(&self, zip_code: &str) -> Result<WeatherReport, ApiError> {
        let zip_code = normalize_zip_code(zip_code)?;
        let request = WeatherRequest {
            zip_code: zip_code.clone(),
        };

        let (tx, rx) = oneshot::channel();
        let id = self.bridge.call_with(&self.codec, &request, move |result| {
            // Runs on the event loop.
            if let Ok(report) = &result {
                tracing::info!(
                    "Done! Weather for {}: {} and {}ºF",
                    report.city_name,
                    report.weather_description,
                    report.temperature
                );
            }
            let _ = tx.send(result);
        })?;

        tracing::debug!("Waiting on weather lookup {} for {}", id, zip_code);

        match tokio::time::timeout(self.timeout, rx).await {
            Ok(Ok(Ok(report))) => Ok(report),
            Ok(Ok(Err(BridgeError::MissingResponse))) => {
                Err(ApiError::ForecastUnavailable(zip_code))
            }
            Ok(Ok(Err(err))) => Err(err.into()),
            Ok(Err(_)) => Err(ApiError::Internal(format!(
                "completion for {} was dropped",
                id
            ))),
            Err(_) => {
                // The context stays with the library; it shows up as in flight.
                tracing::warn!("Weather lookup {} timed out after {:?}", id, self.timeout);
                Err(ApiError::Timeout(format!(
                    "no answer for {} within {} ms",
                    zip_code,
                    self.timeout.as_millis()
                )))
            }
        }
    }

    pub fn status(&self) -> StatusResponse {
        let contexts = self.bridge.ledger().snapshot();
        StatusResponse {
            background_context: self.bridge.background().to_string(),
            target_context: self.event_loop.label().to_string(),
            contexts,
            in_flight: contexts.in_flight(),
            live_contexts: ffi_bridge::live_contexts(),
            // More reclaims than transfers means a handle came back twice.
            is_healthy: contexts.reclaimed <= contexts.transferred,
        }
    }
}

/// US zip codes: five ASCII digits.
fn normalize_zip_code(zip_code: &str) -> Result<String, ApiError> {
    let zip_code = zip_code.trim();
    if zip_code.len() != 5 || !zip_code.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ApiError::InvalidZipCode(zip_code.to_string()));
    }
    Ok(zip_code.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::{c_char, c_void, CString};
    use tokio_test::assert_ok;

    const TIMEOUT: Duration = Duration::from_secs(5);

    unsafe extern "C" fn never_answers(
        _request: *const c_char,
        _callback: ffi_bridge::ResponseCallback,
        _context: *mut c_void,
    ) {
    }

    unsafe extern "C" fn answers_garbage(
        _request: *const c_char,
        callback: ffi_bridge::ResponseCallback,
        context: *mut c_void,
    ) {
        let body = CString::new("{\"cityName\":42}").unwrap();
        unsafe { callback(body.as_ptr(), context) };
    }

    fn config(name: &str) -> BridgeConfig {
        BridgeConfig {
            worker_threads: 1,
            max_blocking_threads: 4,
            background_label: format!("{name}.work"),
            target_label: format!("{name}.main"),
        }
    }

    #[tokio::test]
    async fn fetches_brooklyn() {
        let client = assert_ok!(ForecastClient::start(&config("brooklyn"), TIMEOUT));
        let report = assert_ok!(client.fetch("11211").await);
        assert_eq!(report.city_name, "Brooklyn");
        assert_eq!(report.weather_description, "clear sky");
        assert_eq!(report.temperature, "72");

        let status = client.status();
        assert_eq!(status.in_flight, 0);
        assert_eq!(status.contexts.created, 1);
        assert_eq!(status.target_context, "brooklyn.main");
    }

    #[tokio::test]
    async fn unknown_zip_code_is_unavailable() {
        let client = assert_ok!(ForecastClient::start(&config("unknown"), TIMEOUT));
        let err = client.fetch("00000").await.unwrap_err();
        assert!(matches!(err, ApiError::ForecastUnavailable(zip) if zip == "00000"));
    }

    #[tokio::test]
    async fn malformed_zip_code_never_reaches_the_bridge() {
        let client = assert_ok!(ForecastClient::start(&config("malformed"), TIMEOUT));
        for zip in ["", "1121", "112111", "ab123"] {
            let err = client.fetch(zip).await.unwrap_err();
            assert!(matches!(err, ApiError::InvalidZipCode(_)), "{zip}: {err:?}");
        }
        assert_eq!(client.status().contexts.created, 0);
    }

    #[tokio::test]
    async fn bad_payload_is_a_bad_foreign_response() {
        let client = assert_ok!(ForecastClient::with_foreign(
            answers_garbage,
            &config("garbage"),
            TIMEOUT
        ));
        let err = client.fetch("11211").await.unwrap_err();
        assert!(matches!(err, ApiError::BadForeignResponse(_)), "{err:?}");
    }

    #[tokio::test]
    async fn silent_library_times_out_and_stays_in_flight() {
        let client = assert_ok!(ForecastClient::with_foreign(
            never_answers,
            &config("silent"),
            Duration::from_millis(50)
        ));
        let err = client.fetch("11211").await.unwrap_err();
        assert!(matches!(err, ApiError::Timeout(_)), "{err:?}");

        let status = client.status();
        assert_eq!(status.in_flight, 1);
        assert!(status.is_healthy);
    }

    #[test]
    fn zip_codes_are_trimmed() {
        assert_eq!(normalize_zip_code(" 11211 ").unwrap(), "11211");
    }
}
