use std::{fmt, result};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid request: {0}")]
    Request(String),
    #[error("no forecast for zip code {0}")]
    UnknownZipCode(String),
    #[error("encode error: {0}")]
    Encode(String),
    #[error("forecast table is already installed")]
    AlreadyInstalled,
}

pub type Result<T> = result::Result<T, Error>;

impl Error {
    pub fn request<T: fmt::Display>(inner: T) -> Self {
        Self::Request(inner.to_string())
    }
    pub fn encode<T: fmt::Display>(inner: T) -> Self {
        Self::Encode(inner.to_string())
    }
}
