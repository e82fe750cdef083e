//! C-side shapes of the boundary: the foreign function signature, the
//! callback it invokes, and the payloads that travel through both.

use std::ffi::{c_char, c_void, CStr, CString};
use std::str;

use crate::error::{Error, Result};

/// Callback the foreign side invokes exactly once when its work is done.
///
/// * `response` - null-terminated payload, or null on failure. Only valid for
///   the duration of the call.
/// * `context` - the handle passed to the foreign function, returned untouched
pub type ResponseCallback = unsafe extern "C" fn(response: *const c_char, context: *mut c_void);

/// Signature of a foreign function the bridge can drive.
///
/// * `request` - null-terminated payload, borrowed for the duration of the call
/// * `callback` - invoked once with the response and `context`
/// * `context` - opaque handle the foreign side must hand back to `callback`
pub type ForeignFn =
    unsafe extern "C" fn(request: *const c_char, callback: ResponseCallback, context: *mut c_void);

/// Encoded request, validated to be passable as a C string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request(CString);

impl Request {
    /// Fails with [`Error::Encode`] if the payload contains a NUL byte.
    pub fn new(payload: impl Into<Vec<u8>>) -> Result<Self> {
        Ok(Self(CString::new(payload)?))
    }

    pub fn as_ptr(&self) -> *const c_char {
        self.0.as_ptr()
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

/// Response payload owned by the Rust side.
///
/// An empty response is still a response; failure is represented by the
/// absence of a `Response`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Response(Vec<u8>);

impl Response {
    /// Copy a foreign, null-terminated response into owned memory.
    ///
    /// # Safety
    ///
    /// `ptr` must be null or point to a null-terminated buffer that stays valid
    /// until this function returns.
    pub unsafe fn copy_from(ptr: *const c_char) -> Option<Self> {
        if ptr.is_null() {
            return None;
        }
        let bytes = unsafe { CStr::from_ptr(ptr) }.to_bytes();
        Some(Self(bytes.to_vec()))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_str(&self) -> Result<&str> {
        str::from_utf8(&self.0).map_err(Error::decode)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for Response {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&str> for Response {
    fn from(text: &str) -> Self {
        Self(text.as_bytes().to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_rejects_interior_nul() {
        let err = Request::new(b"zip\0code".to_vec()).unwrap_err();
        assert!(matches!(err, Error::Encode(_)), "unexpected error: {err}");
    }

    #[test]
    fn request_is_null_terminated() {
        let request = Request::new("{\"zipCode\":\"11211\"}").unwrap();
        let copied = unsafe { CStr::from_ptr(request.as_ptr()) };
        assert_eq!(copied.to_bytes(), request.as_bytes());
    }

    #[test]
    fn null_response_is_absent() {
        assert_eq!(unsafe { Response::copy_from(std::ptr::null()) }, None);
    }

    #[test]
    fn empty_response_is_present() {
        let empty = CString::new("").unwrap();
        let response = unsafe { Response::copy_from(empty.as_ptr()) }.unwrap();
        assert!(response.is_empty());
    }

    #[test]
    fn copied_response_outlives_foreign_buffer() {
        let foreign = CString::new("{\"cityName\":\"Brooklyn\"}").unwrap();
        let response = unsafe { Response::copy_from(foreign.as_ptr()) }.unwrap();
        drop(foreign);
        assert_eq!(response.to_str().unwrap(), "{\"cityName\":\"Brooklyn\"}");
    }

    #[test]
    fn invalid_utf8_is_a_decode_error() {
        let response = Response::from(vec![0xff, 0xfe]);
        assert!(matches!(response.to_str(), Err(Error::Decode(_))));
    }
}
