use std::{ffi::NulError, fmt, result};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("encode error: {0}")]
    Encode(String),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("foreign call returned no response")]
    MissingResponse,
    #[error("execution context `{0}` is closed")]
    Closed(String),
    #[error("config error: {0}")]
    Config(String),
    #[error("runtime error: {0}")]
    Runtime(String),
}

pub type Result<T> = result::Result<T, Error>;

impl Error {
    pub fn encode<T: fmt::Display>(inner: T) -> Self {
        Self::Encode(inner.to_string())
    }
    pub fn decode<T: fmt::Display>(inner: T) -> Self {
        Self::Decode(inner.to_string())
    }
    pub fn config<T: fmt::Display>(inner: T) -> Self {
        Self::Config(inner.to_string())
    }
    pub fn argument_should_be_positive(name: &str) -> Self {
        Self::Config(format!("argument {} should be positive", name))
    }
    pub fn closed(label: &str) -> Self {
        Self::Closed(label.to_string())
    }
}

impl From<NulError> for Error {
    fn from(err: NulError) -> Self {
        Error::Encode(format!(
            "request contains a NUL byte at offset {}",
            err.nul_position()
        ))
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Runtime(err.to_string())
    }
}
