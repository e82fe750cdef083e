//! C entry points. The signatures here must match `include/weather_ffi.h`.

use std::ffi::{c_char, c_void, CStr, CString};
use std::ptr;
use std::sync::OnceLock;

use log::{info, warn};

use crate::error::{Error, Result};
use crate::forecast::{ForecastTable, WeatherRequest};

/// Callback invoked by `fetch_weather` once it has an answer.
///
/// * `response_json` - JSON-encoded `WeatherResponse`, or null on failure.
///   Freed as soon as the callback returns.
/// * `context` - the pointer passed to `fetch_weather`, returned untouched
pub type ResponseCallbackWithContext =
    unsafe extern "C" fn(response_json: *const c_char, context: *mut c_void);

/// Global forecast table
static FORECASTS: OnceLock<ForecastTable> = OnceLock::new();

/// Install the table `fetch_weather` answers from. Only the first call wins;
/// without one, the builtin table is used.
pub fn install(table: ForecastTable) -> Result<()> {
    let entries = table.len();
    FORECASTS.set(table).map_err(|_| Error::AlreadyInstalled)?;
    info!("installed forecast table with {} entries", entries);
    Ok(())
}

fn forecasts() -> &'static ForecastTable {
    FORECASTS.get_or_init(ForecastTable::from_env)
}

/// Fetches the weather for a zip code and reports it through `callback`.
///
/// `callback` is invoked exactly once, on the calling thread, before this
/// function returns.
///
/// # Parameters
///
/// * `request_json` - JSON-encoded `WeatherRequest`
/// * `callback` - invoked with the JSON-encoded response, or null on failure
/// * `context` - opaque pointer handed back to `callback` unaltered
///
/// # Safety
///
/// `request_json` must be null or a valid null-terminated string for the
/// duration of the call.
#[no_mangle]
pub unsafe extern "C" fn fetch_weather(
    request_json: *const c_char,
    callback: ResponseCallbackWithContext,
    context: *mut c_void,
) {
    let response_json = match unsafe { respond(request_json, forecasts()) } {
        Ok(json) => Some(json),
        Err(e) => {
            warn!("fetch_weather failed: {}", e);
            None
        }
    };

    let response_ptr = response_json.as_ref().map_or(ptr::null(), |json| json.as_ptr());
    unsafe { callback(response_ptr, context) };

    // The callback had to copy what it needed; the string is released here.
    drop(response_json);
}

unsafe fn respond(request_json: *const c_char, table: &ForecastTable) -> Result<CString> {
    if request_json.is_null() {
        return Err(Error::request("null request"));
    }
    let request_json = unsafe { CStr::from_ptr(request_json) }
        .to_str()
        .map_err(Error::request)?;
    let request: WeatherRequest = serde_json::from_str(request_json).map_err(Error::request)?;
    let response = table.lookup(&request)?;
    let response_json = serde_json::to_string(&response).map_err(Error::encode)?;
    CString::new(response_json).map_err(Error::encode)
}
