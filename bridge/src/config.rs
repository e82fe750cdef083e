use std::env;
use std::str::FromStr;

use crate::error::{Error, Result};

pub const DEFAULT_BACKGROUND_LABEL: &str = "bridge.work";
pub const DEFAULT_TARGET_LABEL: &str = "bridge.main";

/// Sizing and naming of the execution contexts behind a bridge.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BridgeConfig {
    pub worker_threads: usize,
    pub max_blocking_threads: usize,
    pub background_label: String,
    pub target_label: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            worker_threads: 2,
            max_blocking_threads: 16,
            background_label: DEFAULT_BACKGROUND_LABEL.to_string(),
            target_label: DEFAULT_TARGET_LABEL.to_string(),
        }
    }
}

impl BridgeConfig {
    /// Load from `BRIDGE_*` environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let config = Self {
            worker_threads: parse_or(&lookup, "BRIDGE_WORKER_THREADS", defaults.worker_threads)?,
            max_blocking_threads: parse_or(
                &lookup,
                "BRIDGE_MAX_BLOCKING_THREADS",
                defaults.max_blocking_threads,
            )?,
            background_label: lookup("BRIDGE_BACKGROUND_LABEL")
                .unwrap_or(defaults.background_label),
            target_label: lookup("BRIDGE_TARGET_LABEL").unwrap_or(defaults.target_label),
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.worker_threads == 0 {
            return Err(Error::argument_should_be_positive("BRIDGE_WORKER_THREADS"));
        }
        if self.max_blocking_threads == 0 {
            return Err(Error::argument_should_be_positive(
                "BRIDGE_MAX_BLOCKING_THREADS",
            ));
        }
        if self.background_label == self.target_label {
            return Err(Error::config(
                "background and target contexts must have distinct labels",
            ));
        }
        Ok(())
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|e| Error::config(format!("{key}={value:?}: {e}"))),
        None => Ok(default),
    }
}
