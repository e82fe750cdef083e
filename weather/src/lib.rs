//! Weather lookup callable from C.
//!
//! `fetch_weather` takes a JSON request, answers through a plain C callback
//! and hands the caller's opaque context pointer back untouched, so the caller
//! can find its own state again without the callback capturing anything.

pub mod error;
pub mod ffi;
pub mod forecast;

pub use error::{Error, Result};
pub use ffi::{fetch_weather, install, ResponseCallbackWithContext};
pub use forecast::{ForecastTable, WeatherRequest, WeatherResponse};
